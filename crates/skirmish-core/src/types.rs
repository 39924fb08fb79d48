//! Fundamental geometric and simulation types.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 3D position in world space (meters).
/// x = East, y = Up (altitude), z = North.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity in world space (m/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Simulation time tracking. Advanced by the caller-supplied dt each tick,
/// so the driver controls the step size.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Distance to another position in meters (3D).
    pub fn distance_to(&self, other: &Position) -> f32 {
        (other.to_vec3() - self.to_vec3()).length()
    }

    /// Horizontal distance (ignoring altitude).
    pub fn flat_distance_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Normalized direction toward another position, horizontal plane only.
    /// Returns +X if the two points are coincident.
    pub fn flat_direction_to(&self, other: &Position) -> Vec3 {
        let d = Vec3::new(other.x - self.x, 0.0, other.z - self.z);
        if d.length_squared() < 1e-6 {
            Vec3::X
        } else {
            d.normalize()
        }
    }

    /// Bearing to another position in radians (0 = North, clockwise).
    pub fn bearing_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        dx.atan2(dz).rem_euclid(std::f32::consts::TAU)
    }

    /// Offset this position along a horizontal bearing by `distance` meters.
    pub fn offset_bearing(&self, bearing: f32, distance: f32) -> Position {
        Position::new(
            self.x + bearing.sin() * distance,
            self.y,
            self.z + bearing.cos() * distance,
        )
    }
}

impl Velocity {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Speed magnitude (m/s).
    pub fn speed(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Horizontal speed (ignoring vertical component).
    pub fn flat_speed(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    /// Heading in radians (0 = North, clockwise). Undefined when stationary;
    /// callers should fall back to the agent's stored facing.
    pub fn heading(&self) -> f32 {
        self.x.atan2(self.z).rem_euclid(std::f32::consts::TAU)
    }
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// Axis-aligned bounding box for static obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Position,
    pub max: Position,
}

impl Aabb {
    pub fn new(min: Position, max: Position) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Height of the box (used as cover relief magnitude).
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Segment/box intersection via the slab method.
    /// Returns true if the segment from `a` to `b` passes through the box.
    pub fn intersects_segment(&self, a: &Position, b: &Position) -> bool {
        let dir = b.to_vec3() - a.to_vec3();
        let origin = a.to_vec3();
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;

        let min = self.min.to_vec3();
        let max = self.max.to_vec3();

        for axis in 0..3 {
            let d = dir[axis];
            let o = origin[axis];
            if d.abs() < 1e-6 {
                // Parallel to this slab; miss if origin is outside it
                if o < min[axis] || o > max[axis] {
                    return false;
                }
            } else {
                let inv = 1.0 / d;
                let mut t0 = (min[axis] - o) * inv;
                let mut t1 = (max[axis] - o) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return false;
                }
            }
        }
        true
    }
}
