//! Flank maneuver geometry and role assignment.
//!
//! Pure planning: side selection, waypoint computation, and the
//! suppressor/flanker split. The sim's flanking coordinator drives the
//! resulting operation through its phases.

use rand::Rng;

use skirmish_core::constants::*;
use skirmish_core::enums::FlankSide;
use skirmish_core::providers::TerrainProvider;
use skirmish_core::types::Position;

/// Compute the flank waypoint on a given side: a fixed angular offset from
/// the target-to-squad axis, at stand-off distance from the target.
pub fn flank_waypoint(target: &Position, squad_centroid: &Position, side: FlankSide) -> Position {
    let back_bearing = target.bearing_to(squad_centroid);
    let offset = match side {
        FlankSide::Left => FLANK_ANGLE_OFFSET_RAD,
        FlankSide::Right => -FLANK_ANGLE_OFFSET_RAD,
    };
    let mut waypoint = target.offset_bearing(back_bearing + offset, FLANK_STANDOFF);
    waypoint.y = target.y;
    waypoint
}

/// Pick a flank side by sampling terrain height along both lateral routes
/// and preferring the higher-ground side. Ties (and absent terrain) break
/// randomly so the maneuver stays unpredictable.
pub fn choose_side(
    squad_centroid: &Position,
    target: &Position,
    terrain: Option<&dyn TerrainProvider>,
    rng: &mut impl Rng,
) -> FlankSide {
    let mut coin = || if rng.gen_bool(0.5) { FlankSide::Left } else { FlankSide::Right };

    let Some(terrain) = terrain else {
        return coin();
    };

    let left = route_height(squad_centroid, target, FlankSide::Left, terrain);
    let right = route_height(squad_centroid, target, FlankSide::Right, terrain);

    if (left - right).abs() < 0.5 {
        coin()
    } else if left > right {
        FlankSide::Left
    } else {
        FlankSide::Right
    }
}

/// Summed terrain height along the route from the squad centroid to the
/// flank waypoint on one side.
fn route_height(
    squad_centroid: &Position,
    target: &Position,
    side: FlankSide,
    terrain: &dyn TerrainProvider,
) -> f32 {
    let waypoint = flank_waypoint(target, squad_centroid, side);
    let mut total = 0.0;
    for i in 1..=FLANK_SIDE_SAMPLES {
        let t = i as f32 / (FLANK_SIDE_SAMPLES + 1) as f32;
        let x = squad_centroid.x + (waypoint.x - squad_centroid.x) * t;
        let z = squad_centroid.z + (waypoint.z - squad_centroid.z) * t;
        total += terrain.height_at(x, z);
    }
    total
}

/// Split living members into suppressors and flankers: the leader plus one
/// other member suppress, the rest flank. Rebalances so both lists end up
/// non-empty whenever two or more members exist.
pub fn split_roles<T: Copy + PartialEq>(members: &[T], leader: Option<T>) -> (Vec<T>, Vec<T>) {
    let mut suppressors: Vec<T> = Vec::new();
    let mut flankers: Vec<T> = Vec::new();

    if let Some(l) = leader {
        if members.contains(&l) {
            suppressors.push(l);
        }
    }
    for &m in members {
        if Some(m) == leader {
            continue;
        }
        if suppressors.len() < 2 {
            suppressors.push(m);
        } else {
            flankers.push(m);
        }
    }

    // Natural split failed; steal back so both roles are filled.
    if flankers.is_empty() && suppressors.len() > 1 {
        if let Some(moved) = suppressors.pop() {
            flankers.push(moved);
        }
    }
    if suppressors.is_empty() && flankers.len() > 1 {
        if let Some(moved) = flankers.pop() {
            suppressors.push(moved);
        }
    }

    (suppressors, flankers)
}

/// Destination for the `index`-th of `count` flankers: spread around the
/// flank waypoint by small angular offsets so the squad does not stack on
/// one point.
pub fn flanker_destination(
    waypoint: &Position,
    target: &Position,
    index: usize,
    count: usize,
) -> Position {
    if count <= 1 {
        return *waypoint;
    }
    let bearing = target.bearing_to(waypoint);
    let centered = index as f32 - (count as f32 - 1.0) * 0.5;
    let standoff = target.flat_distance_to(waypoint);
    let mut dest = target.offset_bearing(bearing + centered * FLANK_SPREAD_RAD, standoff);
    dest.y = waypoint.y;
    dest
}
