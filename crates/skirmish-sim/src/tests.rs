//! Tests for the coordinator: detection, morale, cover occupancy, target
//! distribution, flanking lifecycle, zone defense, and the raycast budget.

use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use skirmish_core::constants::*;
use skirmish_core::enums::*;
use skirmish_core::providers::{ObstacleProvider, TerrainHit, TerrainProvider, Zone, ZoneProvider};
use skirmish_core::types::{Aabb, Position};

use crate::combatant::{Combatant, PlayerProxy, TargetRef};
use crate::cover::CoverSystem;
use crate::engine::{Providers, SimConfig, TacticalCoordinator};
use crate::roster::Roster;
use crate::targeting::{find_target, TargetDistributor};
use crate::visibility::{LosEvaluator, ObserverView};
use crate::world_setup::{spawn_combatant, spawn_line};

// ---- Test providers ----

struct FlatTerrain;

impl TerrainProvider for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        0.0
    }
    fn raycast(&self, _origin: Position, _dir: glam::Vec3, _max: f32) -> Option<TerrainHit> {
        None
    }
}

/// Flat ground with a single raised ridge along x = 20.
struct RidgeTerrain;

impl TerrainProvider for RidgeTerrain {
    fn height_at(&self, x: f32, _z: f32) -> f32 {
        if (x - 20.0).abs() <= 2.5 {
            2.0
        } else {
            0.0
        }
    }
    fn raycast(&self, origin: Position, dir: glam::Vec3, max: f32) -> Option<TerrainHit> {
        // Coarse march against the heightfield.
        let steps = (max / 0.5) as i32;
        for i in 1..=steps {
            let t = i as f32 * 0.5;
            let p = origin.to_vec3() + dir * t;
            if self.height_at(p.x, p.z) > p.y {
                return Some(TerrainHit { distance: t });
            }
        }
        None
    }
}

struct StaticObstacles(Vec<Aabb>);

impl ObstacleProvider for StaticObstacles {
    fn obstacles_near(&self, center: Position, radius: f32) -> Vec<Aabb> {
        self.0
            .iter()
            .filter(|a| a.center().flat_distance_to(&center) <= radius + 10.0)
            .copied()
            .collect()
    }
}

struct StaticZones(Vec<Zone>);

impl ZoneProvider for StaticZones {
    fn zones(&self) -> Vec<Zone> {
        self.0.clone()
    }
}

fn flat_providers() -> Providers {
    Providers {
        terrain: Some(Box::new(FlatTerrain)),
        ..Default::default()
    }
}

fn coordinator(config: SimConfig, providers: Providers) -> TacticalCoordinator {
    TacticalCoordinator::new(config, providers)
}

/// Simple external mover: step every agent toward its destination.
fn step_movers(coord: &mut TacticalCoordinator, speed: f32, dt: f32) {
    let moves: Vec<(Entity, Position)> = coord
        .world()
        .query::<(&Combatant, &Position)>()
        .iter()
        .filter_map(|(e, (c, pos))| {
            let dest = c.destination?;
            if !c.alive {
                return None;
            }
            let step = (speed * dt).min(pos.flat_distance_to(&dest));
            let dir = pos.flat_direction_to(&dest);
            Some((e, Position::from_vec3(pos.to_vec3() + dir * step)))
        })
        .collect();
    for (e, p) in moves {
        if let Ok(mut pos) = coord.world_mut().get::<&mut Position>(e) {
            *pos = p;
        }
    }
}

// ---- Determinism ----

#[test]
fn test_same_seed_same_decisions() {
    let build = || {
        let mut c = coordinator(
            SimConfig {
                seed: 777,
                ..Default::default()
            },
            flat_providers(),
        );
        let blue = spawn_line(c.world_mut(), Faction::Blufor, 4, Position::new(0.0, 0.0, 0.0), 3.0);
        c.create_squad(blue);
        spawn_line(c.world_mut(), Faction::Redfor, 3, Position::new(0.0, 0.0, 35.0), 3.0);
        c
    };
    let mut a = build();
    let mut b = build();

    for _ in 0..200 {
        a.tick(1.0 / 30.0);
        b.tick(1.0 / 30.0);
    }

    let dump = |c: &TacticalCoordinator| {
        let mut rows: Vec<String> = c
            .world()
            .query::<(&Combatant, &Position)>()
            .iter()
            .map(|(e, (c, pos))| {
                format!(
                    "{:?} {:?} {:?} {} {}",
                    e,
                    c.state,
                    c.target,
                    c.facing,
                    serde_json::to_string(&(pos, c.destination)).unwrap()
                )
            })
            .collect();
        rows.sort();
        rows.join("\n")
    };
    assert_eq!(dump(&a), dump(&b), "decisions diverged with same seed");
}

// ---- Detection and engagement ----

#[test]
fn test_point_blank_contact_alerts_in_one_tick() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(0.0, 0.0, 0.0));
    let b = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 5.0));

    c.tick(1.0 / 30.0);

    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert_eq!(ca.state, BehaviorState::Alert);
    assert_eq!(ca.target, Some(TargetRef::Agent(b)));
    assert!(ca.reaction_timer > 0.0);
    drop(ca);

    let cb = c.world().get::<&Combatant>(b).unwrap();
    assert_eq!(cb.state, BehaviorState::Alert);
}

#[test]
fn test_alert_opens_up_after_reaction_delay() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(0.0, 0.0, 0.0));
    spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 8.0));

    // Reaction delay is capped, so this comfortably covers it.
    let ticks = ((REACTION_MAX_SECS as f64 + 1.0) * 30.0) as usize;
    for _ in 0..ticks {
        c.tick(1.0 / 30.0);
    }

    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert_eq!(ca.state, BehaviorState::Engaging);
    // Close combat forces full auto.
    assert!(ca.full_auto);
}

#[test]
fn test_engagement_lapses_when_target_lost() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(0.0, 0.0, 0.0));
    let b = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 8.0));

    for _ in 0..120 {
        c.tick(1.0 / 30.0);
    }
    assert_eq!(c.world().get::<&Combatant>(a).unwrap().state, BehaviorState::Engaging);

    // Kill the target; the survivor must wind all the way down.
    c.report_damage(b, 1000.0, None);
    for _ in 0..((ALERT_TIMEOUT_SECS + SUPPRESS_FIRE_SECS + 2.0) * 30.0) as usize {
        c.tick(1.0 / 30.0);
    }

    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert_eq!(ca.state, BehaviorState::Patrolling);
    assert_eq!(ca.target, None);
}

#[test]
fn test_player_proxy_is_hunted() {
    let mut c = coordinator(
        SimConfig {
            player_hunter_faction: Some(Faction::Redfor),
            ..Default::default()
        },
        flat_providers(),
    );
    let hunter = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 0.0));
    let friendly = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(100.0, 0.0, 100.0));
    c.set_player_proxy(Some(PlayerProxy {
        position: Position::new(0.0, 0.0, 10.0),
        alive: true,
    }));

    c.tick(1.0 / 30.0);

    let ch = c.world().get::<&Combatant>(hunter).unwrap();
    assert_eq!(ch.target, Some(TargetRef::Player));
    drop(ch);
    // The non-hunter faction ignores the proxy.
    let cf = c.world().get::<&Combatant>(friendly).unwrap();
    assert_ne!(cf.target, Some(TargetRef::Player));
}

// ---- Morale ----

#[test]
fn test_suppression_decays_to_zero_and_never_below() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::default());
    c.world_mut().get::<&mut Combatant>(a).unwrap().suppression = 1.0;

    // 1.0 at 0.3/s drains in ~3.33 simulated seconds.
    let dt = 1.0 / 30.0;
    for _ in 0..(4.0 * 30.0) as usize {
        c.tick(dt);
        let s = c.world().get::<&Combatant>(a).unwrap().suppression;
        assert!(s >= 0.0, "suppression went negative: {s}");
    }
    assert_eq!(c.world().get::<&Combatant>(a).unwrap().suppression, 0.0);
}

#[test]
fn test_damage_report_raises_morale_pressure_and_reveals_attacker() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::default());
    let shooter = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 50.0));

    c.tick(1.0 / 30.0);
    c.report_damage(a, 10.0, Some(TargetRef::Agent(shooter)));

    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert!(ca.suppression > 0.0);
    assert!(ca.panic > 0.0);
    assert_eq!(ca.health, 90.0);
    assert_eq!(ca.target, Some(TargetRef::Agent(shooter)));
    // Panic degrades the runtime skill copy.
    assert!(ca.skill.accuracy < 1.0);
}

// ---- Cover ----

#[test]
fn test_cover_occupancy_is_exclusive() {
    let mut world = hecs::World::new();
    let a = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let b = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let mut roster = Roster::default();
    roster.rebuild(&world);

    let mut cover = CoverSystem::default();
    let spot = Position::new(20.0, 0.0, 20.0);

    cover.claim(a, spot, 0.0);
    assert_eq!(cover.occupant(spot), Some(a));

    // Last claim wins; the spot never has two holders.
    cover.claim(b, spot, 0.0);
    assert_eq!(cover.occupant(spot), Some(b));
    assert_eq!(cover.occupied_count(), 1);

    // A claimed spot is not offered to another seeker.
    let providers = Providers {
        terrain: Some(Box::new(RidgeTerrain)),
        ..Default::default()
    };
    let agent_pos = Position::new(10.0, 0.0, 0.0);
    let threat = Position::new(40.0, 0.0, 0.0);
    let first = cover
        .find_best_cover(a, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, 0.0)
        .expect("ridge should yield cover");
    cover.claim(a, first.position, 0.0);
    if let Some(second) =
        cover.find_best_cover(b, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, 0.0)
    {
        assert_ne!(crate::cover::cover_key(first.position), crate::cover::cover_key(second.position));
    }
}

#[test]
fn test_obstacle_cover_prefers_far_side_from_threat() {
    let mut world = hecs::World::new();
    let a = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let mut roster = Roster::default();
    roster.rebuild(&world);

    let wall = Aabb::new(Position::new(18.0, 0.0, -2.0), Position::new(22.0, 2.0, 2.0));
    let providers = Providers {
        obstacles: Some(Box::new(StaticObstacles(vec![wall]))),
        ..Default::default()
    };
    let agent_pos = Position::new(10.0, 0.0, 0.0);
    let threat = Position::new(40.0, 0.0, 0.0);

    let mut cover = CoverSystem::default();
    let spot = cover
        .find_best_cover(a, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, 0.0)
        .expect("wall should yield cover");
    // Far side means the agent's side here: x below the wall center.
    assert!(spot.position.x < 20.0, "expected near-side spot, got {:?}", spot.position);
    assert_eq!(spot.source, CoverSource::StaticObstacle);
}

#[test]
fn test_claim_from_holder_not_using_cover_is_reclaimed() {
    let mut world = hecs::World::new();
    let a = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let b = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let mut roster = Roster::default();
    roster.rebuild(&world);

    let wall = Aabb::new(Position::new(18.0, 0.0, -2.0), Position::new(22.0, 2.0, 2.0));
    let providers = Providers {
        obstacles: Some(Box::new(StaticObstacles(vec![wall]))),
        ..Default::default()
    };
    let agent_pos = Position::new(10.0, 0.0, 0.0);
    let threat = Position::new(40.0, 0.0, 0.0);

    let mut cover = CoverSystem::default();
    let best = cover
        .find_best_cover(b, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, 0.0)
        .expect("wall should yield cover");

    // Park a claim on the best spot from an agent who is patrolling, not
    // in cover and not moving to it. Once past the fresh-claim grace the
    // spot is up for grabs again and the dangling claim is purged.
    cover.claim(a, best.position, 0.0);
    let later = COVER_CLAIM_GRACE_SECS + 0.1;
    let again = cover
        .find_best_cover(b, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, later)
        .expect("spot should be offered again");
    assert_eq!(
        crate::cover::cover_key(again.position),
        crate::cover::cover_key(best.position)
    );
    assert_eq!(cover.occupant(best.position), None, "stale claim purged");
}

#[test]
fn test_fresh_claim_blocks_even_before_roster_catches_up() {
    let mut world = hecs::World::new();
    let a = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let b = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let mut roster = Roster::default();
    roster.rebuild(&world);

    let wall = Aabb::new(Position::new(18.0, 0.0, -2.0), Position::new(22.0, 2.0, 2.0));
    let providers = Providers {
        obstacles: Some(Box::new(StaticObstacles(vec![wall]))),
        ..Default::default()
    };
    let agent_pos = Position::new(10.0, 0.0, 0.0);
    let threat = Position::new(40.0, 0.0, 0.0);

    let mut cover = CoverSystem::default();
    let best = cover
        .find_best_cover(a, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, 0.0)
        .expect("wall should yield cover");
    // The claimant's roster view still says Patrolling, as it would for a
    // claim made earlier in the same tick.
    cover.claim(a, best.position, 0.0);

    if let Some(second) =
        cover.find_best_cover(b, agent_pos, threat, COVER_SEARCH_RADIUS, &providers, &roster, 0.0)
    {
        assert_ne!(
            crate::cover::cover_key(second.position),
            crate::cover::cover_key(best.position)
        );
    }
    assert_eq!(cover.occupant(best.position), Some(a));
}

#[test]
fn test_dead_agent_releases_cover_and_coordination_state() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::default());
    let spot = Position::new(5.0, 0.0, 5.0);
    {
        let mut ca = c.world_mut().get::<&mut Combatant>(a).unwrap();
        ca.in_cover = true;
        ca.cover_pos = Some(spot);
        ca.destination = Some(spot);
        ca.flanking = true;
    }
    // Claim through the engine-owned service by walking the same path a
    // live agent would: direct claim, then death.
    c.report_damage(a, 1000.0, None);
    c.tick(1.0 / 30.0);

    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert_eq!(ca.state, BehaviorState::Dead);
    assert!(!ca.alive);
    assert!(!ca.in_cover);
    assert!(!ca.flanking);
    assert_eq!(ca.cover_pos, None);
    assert_eq!(ca.destination, None);
    drop(ca);
    assert_eq!(c.cover_occupant(spot), None);
}

// ---- Target distribution ----

#[test]
fn test_clustered_allies_spread_fire() {
    let mut world = hecs::World::new();
    let allies: Vec<Entity> = (0..5)
        .map(|i| {
            spawn_combatant(
                &mut world,
                Faction::Blufor,
                SquadRole::Rifleman,
                Position::new(i as f32 * 2.0, 0.0, 0.0),
            )
        })
        .collect();
    let e1 = spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(2.0, 0.0, 30.0));
    let e2 = spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(6.0, 0.0, 30.0));

    let mut roster = Roster::default();
    roster.rebuild(&world);
    let mut distributor = TargetDistributor::default();
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    let mut picked = std::collections::HashSet::new();
    for &a in &allies {
        let pos = *world.get::<&Position>(a).unwrap();
        let choice = find_target(
            a,
            Faction::Blufor,
            pos,
            80.0,
            &roster,
            None,
            &distributor,
            None,
            &mut rng,
        )
        .expect("enemies in range");
        // Commit the pick the way the behavior handlers do.
        distributor.register(choice.target);
        picked.insert(choice.target);
    }

    assert!(picked.contains(&TargetRef::Agent(e1)));
    assert!(picked.contains(&TargetRef::Agent(e2)));
}

#[test]
fn test_isolated_agent_takes_nearest() {
    let mut world = hecs::World::new();
    let lone = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let near = spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 20.0));
    spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 40.0));

    let mut roster = Roster::default();
    roster.rebuild(&world);
    let mut distributor = TargetDistributor::default();
    // Pile counts onto the near target; an isolated picker ignores them.
    for _ in 0..10 {
        distributor.register(TargetRef::Agent(near));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let choice = find_target(
        lone,
        Faction::Blufor,
        Position::default(),
        80.0,
        &roster,
        None,
        &distributor,
        None,
        &mut rng,
    )
    .unwrap();
    assert_eq!(choice.target, TargetRef::Agent(near));
}

#[test]
fn test_occluded_contact_does_not_inflate_targeter_counts() {
    let mut c = coordinator(
        SimConfig::default(),
        Providers {
            terrain: Some(Box::new(RidgeTerrain)),
            ..Default::default()
        },
    );
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(0.0, 0.0, 0.0));
    let enemy = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(40.0, 0.0, 0.0));

    // The ridge keeps both sides blind; nobody ever commits to a target,
    // so the shared counts must stay at zero between rebuilds.
    for _ in 0..7 {
        c.tick(1.0 / 30.0);
    }

    assert_eq!(c.world().get::<&Combatant>(a).unwrap().target, None);
    assert_eq!(c.targeter_count(TargetRef::Agent(enemy)), 0);
    assert_eq!(c.targeter_count(TargetRef::Agent(a)), 0);
}

// ---- Line of sight and the raycast budget ----

#[test]
fn test_fov_gate_rejects_without_spending_budget() {
    let mut world = hecs::World::new();
    let observer = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let target = spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, -10.0));

    let mut los = LosEvaluator::default();
    los.begin_tick(8, 0.0);
    let view = ObserverView {
        pos: Position::default(),
        facing: 0.0, // North; target is due South
        fov_rad: 2.1,
        visual_range: 80.0,
        detail: SimDetail::Full,
    };
    let providers = Providers::default();
    let visible = los.can_see(
        observer,
        &view,
        TargetRef::Agent(target),
        Position::new(0.0, 0.0, -10.0),
        &providers,
        0.0,
    );
    assert!(!visible);
    assert_eq!(los.budget.remaining(), 8, "FOV rejection must not spend budget");
}

#[test]
fn test_exhausted_budget_falls_back_to_cache_else_blind() {
    let mut world = hecs::World::new();
    let observer = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let target = spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 30.0));

    let mut los = LosEvaluator::default();
    let providers = Providers::default();
    let view = ObserverView {
        pos: Position::default(),
        facing: 0.0,
        fov_rad: 2.1,
        visual_range: 80.0,
        detail: SimDetail::Full,
    };
    let t = TargetRef::Agent(target);
    let tpos = Position::new(0.0, 0.0, 30.0);

    // No budget, no cache: conservative false, denial recorded.
    los.begin_tick(0, 0.0);
    assert!(!los.can_see(observer, &view, t, tpos, &providers, 0.0));
    assert_eq!(los.budget.denials(), 1);

    // With budget the real answer lands in the cache.
    los.begin_tick(1, 0.1);
    assert!(los.can_see(observer, &view, t, tpos, &providers, 0.1));

    // Budget gone again, cache stale: the stale value is served.
    los.begin_tick(0, 1.0);
    assert!(los.can_see(observer, &view, t, tpos, &providers, 1.0));
    assert_eq!(los.budget.denials(), 2);
}

#[test]
fn test_zero_budget_keeps_distant_agents_blind() {
    let mut c = coordinator(
        SimConfig {
            raycast_budget: 0,
            ..Default::default()
        },
        flat_providers(),
    );
    // Beyond the always-detect radius, so sight requires a raycast.
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(0.0, 0.0, 0.0));
    spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 30.0));

    for _ in 0..60 {
        c.tick(1.0 / 30.0);
    }
    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert_eq!(ca.state, BehaviorState::Patrolling);
    drop(ca);
    assert!(c.raycast_denials() > 0);
}

#[test]
fn test_ridge_blocks_sight() {
    let mut world = hecs::World::new();
    let observer = spawn_combatant(&mut world, Faction::Blufor, SquadRole::Rifleman, Position::default());
    let target = spawn_combatant(&mut world, Faction::Redfor, SquadRole::Rifleman, Position::new(40.0, 0.0, 0.0));

    let mut los = LosEvaluator::default();
    los.begin_tick(8, 0.0);
    let providers = Providers {
        terrain: Some(Box::new(RidgeTerrain)),
        ..Default::default()
    };
    let view = ObserverView {
        pos: Position::new(0.0, 1.0, 0.0),
        facing: std::f32::consts::FRAC_PI_2, // East
        fov_rad: 2.1,
        visual_range: 80.0,
        detail: SimDetail::Full,
    };
    let visible = los.can_see(
        observer,
        &view,
        TargetRef::Agent(target),
        Position::new(40.0, 1.0, 0.0),
        &providers,
        0.0,
    );
    assert!(!visible, "the ridge at x=20 should block the line");
}

// ---- Flanking ----

fn engaged_squad() -> (TacticalCoordinator, crate::squad::SquadId, Vec<Entity>, Entity) {
    let mut c = coordinator(
        SimConfig {
            seed: 5,
            ..Default::default()
        },
        flat_providers(),
    );
    let members = spawn_line(c.world_mut(), Faction::Blufor, 4, Position::new(0.0, 0.0, 0.0), 3.0);
    let squad = c.create_squad(members.clone());
    let enemy = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(4.0, 0.0, 40.0));

    // Everyone already committed on the same contact.
    for &m in &members {
        let mut cm = c.world_mut().get::<&mut Combatant>(m).unwrap();
        cm.state = BehaviorState::Engaging;
        cm.target = Some(TargetRef::Agent(enemy));
        cm.alert_until = 1.0e9;
    }
    // Recent incoming fire makes the squad flank-eligible.
    c.report_damage(members[1], 5.0, Some(TargetRef::Agent(enemy)));
    (c, squad, members, enemy)
}

#[test]
fn test_flank_initiates_with_both_roles_filled() {
    let (mut c, squad, _members, _enemy) = engaged_squad();
    c.tick(1.0 / 30.0);

    let op = c.flank_operation(squad).expect("flank should start");
    assert!(!op.suppressors.is_empty());
    assert!(!op.flankers.is_empty());
    assert!(matches!(op.status, FlankStatus::Planning | FlankStatus::Suppressing));
}

#[test]
fn test_flank_suppression_then_movement_orders() {
    let (mut c, squad, _members, _enemy) = engaged_squad();
    let dt = 1.0 / 30.0;

    // Through planning into the suppression phase.
    c.tick(dt);
    c.tick(dt);
    let op = c.flank_operation(squad).unwrap();
    assert_eq!(op.status, FlankStatus::Suppressing);
    let suppressors = op.suppressors.clone();
    for &s in &suppressors {
        let cs = c.world().get::<&Combatant>(s).unwrap();
        assert_eq!(cs.state, BehaviorState::Suppressing);
        assert!(cs.full_auto);
        assert!(cs.suppress_until > 0.0);
    }

    // Run out the suppression timer; flankers get routes.
    for _ in 0..((FLANK_SUPPRESS_SECS + 0.5) * 30.0) as usize {
        c.tick(dt);
    }
    let op = c.flank_operation(squad).unwrap();
    assert_eq!(op.status, FlankStatus::Flanking);
    let flankers = op.flankers.clone();
    for &f in &flankers {
        let cf = c.world().get::<&Combatant>(f).unwrap();
        assert_eq!(cf.state, BehaviorState::Advancing);
        assert!(cf.destination.is_some(), "flanker needs a route");
    }
}

#[test]
fn test_flank_assault_after_arrival_then_complete() {
    let (mut c, squad, _members, _enemy) = engaged_squad();
    let dt = 1.0 / 30.0;

    for _ in 0..((FLANK_SUPPRESS_SECS + 1.0) * 30.0) as usize {
        c.tick(dt);
    }
    assert_eq!(c.flank_operation(squad).unwrap().status, FlankStatus::Flanking);

    // Walk the flankers in; past the arrival fraction everyone assaults.
    for _ in 0..(20.0 * 30.0) as usize {
        step_movers(&mut c, 5.0, dt as f32);
        c.tick(dt);
        if c.flank_operation(squad).map(|op| op.status) != Some(FlankStatus::Flanking) {
            break;
        }
    }
    let op = c.flank_operation(squad).expect("operation still observable");
    assert_eq!(op.status, FlankStatus::Engaging);
    let participants: Vec<Entity> = op.suppressors.iter().chain(op.flankers.iter()).copied().collect();
    for &p in &participants {
        let cp = c.world().get::<&Combatant>(p).unwrap();
        assert_eq!(cp.state, BehaviorState::Engaging);
    }

    // The assault phase times out into completion.
    for _ in 0..((FLANK_ENGAGE_SECS + 1.0) * 30.0) as usize {
        c.tick(dt);
        if c.flank_operation(squad).is_none() {
            break;
        }
        if c.flank_operation(squad).map(|op| op.status) == Some(FlankStatus::Complete) {
            break;
        }
    }
    // Complete stays observable for one tick, then the op is dropped.
    if let Some(op) = c.flank_operation(squad) {
        assert_eq!(op.status, FlankStatus::Complete);
        c.tick(dt);
        assert!(c.flank_operation(squad).is_none());
    }
}

#[test]
fn test_flank_aborts_on_casualties_and_clears_orders() {
    let (mut c, squad, members, _enemy) = engaged_squad();
    let dt = 1.0 / 30.0;
    for _ in 0..((FLANK_SUPPRESS_SECS + 1.0) * 30.0) as usize {
        c.tick(dt);
    }
    assert_eq!(c.flank_operation(squad).unwrap().status, FlankStatus::Flanking);

    c.report_damage(members[2], 1000.0, None);
    c.report_damage(members[3], 1000.0, None);
    c.tick(dt);

    let op = c.flank_operation(squad).expect("aborted op observable for a tick");
    assert_eq!(op.status, FlankStatus::Aborted);
    for &m in &members {
        let cm = c.world().get::<&Combatant>(m).unwrap();
        assert!(!cm.flanking);
        assert!(!cm.full_auto);
        assert_eq!(cm.destination, None);
        assert_eq!(cm.suppress_until, 0.0);
    }
}

#[test]
fn test_flank_arming_drops_interrupted_cover_moves() {
    let (mut c, squad, members, _enemy) = engaged_squad();
    let dt = 1.0 / 30.0;

    // One member is mid-move to a cover spot when the flank spins up.
    let spot = Position::new(6.0, 0.0, 6.0);
    {
        let mut cm = c.world_mut().get::<&mut Combatant>(members[3]).unwrap();
        cm.state = BehaviorState::SeekingCover;
        cm.cover_pos = Some(spot);
        cm.destination = Some(spot);
    }

    // Far enough to arm both roles, whichever one the member drew.
    for _ in 0..((FLANK_SUPPRESS_SECS + 1.0) * 30.0) as usize {
        c.tick(dt);
    }
    assert!(c.flank_operation(squad).is_some());

    let cm = c.world().get::<&Combatant>(members[3]).unwrap();
    assert_ne!(cm.state, BehaviorState::SeekingCover);
    assert_eq!(cm.cover_pos, None, "half-finished cover move must be dropped");
    assert!(!cm.in_cover);
    drop(cm);
    assert_eq!(c.cover_claims(), 0);
}

#[test]
fn test_small_squad_never_flanks() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let members = spawn_line(c.world_mut(), Faction::Blufor, 2, Position::new(0.0, 0.0, 0.0), 3.0);
    let squad = c.create_squad(members.clone());
    let enemy = spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 40.0));
    for &m in &members {
        let mut cm = c.world_mut().get::<&mut Combatant>(m).unwrap();
        cm.state = BehaviorState::Engaging;
        cm.target = Some(TargetRef::Agent(enemy));
        cm.alert_until = 1.0e9;
    }
    c.report_damage(members[0], 1.0, None);

    for _ in 0..90 {
        c.tick(1.0 / 30.0);
    }
    assert!(c.flank_operation(squad).is_none());
}

// ---- Zone defense ----

#[test]
fn test_idle_patrollers_are_posted_to_zone_quota() {
    let zone = Zone {
        position: Position::new(10.0, 0.0, 10.0),
        radius: 10.0,
        owner: Faction::Blufor,
    };
    let mut c = coordinator(
        SimConfig::default(),
        Providers {
            terrain: Some(Box::new(FlatTerrain)),
            zones: Some(Box::new(StaticZones(vec![zone]))),
            ..Default::default()
        },
    );
    let members = spawn_line(c.world_mut(), Faction::Blufor, 3, Position::new(0.0, 0.0, 0.0), 2.0);
    c.create_squad(members.clone());

    c.tick(1.0 / 30.0);

    let defenders: Vec<Entity> = members
        .iter()
        .copied()
        .filter(|&m| c.world().get::<&Combatant>(m).unwrap().guard_state == BehaviorState::Defending)
        .collect();
    // Quota for a 3-strong squad is one post.
    assert_eq!(defenders.len(), 1);
    let cd = c.world().get::<&Combatant>(defenders[0]).unwrap();
    assert_ne!(cd.role, SquadRole::Leader);
    let anchor = cd.defend_anchor.expect("defender gets a perimeter anchor");
    let d = anchor.flat_distance_to(&zone.position);
    assert!((d - zone.radius * ZONE_PERIMETER_FRACTION).abs() < 0.01);
}

#[test]
fn test_defender_ignores_distant_contacts() {
    let zone = Zone {
        position: Position::new(0.0, 0.0, 0.0),
        radius: 10.0,
        owner: Faction::Blufor,
    };
    let mut c = coordinator(
        SimConfig::default(),
        Providers {
            zones: Some(Box::new(StaticZones(vec![zone]))),
            ..Default::default()
        },
    );
    let a = spawn_combatant(c.world_mut(), Faction::Blufor, SquadRole::Rifleman, Position::new(2.0, 0.0, 0.0));
    // Far outside the defender detection range, and outside the enemy's
    // own visual range so neither side closes the distance.
    spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 120.0));

    let dt = 1.0 / 30.0;
    for _ in 0..(12.0 * 30.0) as usize {
        c.tick(dt);
        step_movers(&mut c, 4.0, dt as f32);
    }

    let ca = c.world().get::<&Combatant>(a).unwrap();
    assert_eq!(ca.guard_state, BehaviorState::Defending);
    assert_eq!(ca.state, BehaviorState::Defending, "distant enemy must not trip a defender");
}

// ---- Squad commands ----

#[test]
fn test_hold_position_moves_members_to_anchor() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let members = spawn_line(c.world_mut(), Faction::Blufor, 3, Position::new(0.0, 0.0, 0.0), 2.0);
    let squad = c.create_squad(members.clone());
    let anchor = Position::new(50.0, 0.0, 50.0);
    c.set_squad_command(squad, SquadCommandKind::HoldPosition, Some(anchor));

    c.tick(1.0 / 30.0);

    for &m in &members {
        let cm = c.world().get::<&Combatant>(m).unwrap();
        assert_eq!(cm.destination, Some(anchor));
    }
}

#[test]
fn test_follow_forms_a_ring() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let members = spawn_line(c.world_mut(), Faction::Blufor, 4, Position::new(0.0, 0.0, 0.0), 2.0);
    let squad = c.create_squad(members.clone());
    let anchor = Position::new(30.0, 0.0, 30.0);
    c.set_squad_command(squad, SquadCommandKind::Follow, Some(anchor));

    c.tick(1.0 / 30.0);

    let mut slots = std::collections::HashSet::new();
    for &m in &members {
        let cm = c.world().get::<&Combatant>(m).unwrap();
        let dest = cm.destination.expect("follow assigns a slot");
        let d = dest.flat_distance_to(&anchor);
        assert!((d - FOLLOW_RING_RADIUS).abs() < 0.01);
        slots.insert(crate::cover::cover_key(dest));
    }
    assert_eq!(slots.len(), members.len(), "slots must not stack");
}

#[test]
fn test_commands_do_not_override_combat() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let members = spawn_line(c.world_mut(), Faction::Blufor, 2, Position::new(0.0, 0.0, 0.0), 2.0);
    let squad = c.create_squad(members.clone());
    spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 8.0));
    c.set_squad_command(squad, SquadCommandKind::HoldPosition, Some(Position::new(50.0, 0.0, 50.0)));

    for _ in 0..60 {
        c.tick(1.0 / 30.0);
    }
    for &m in &members {
        let cm = c.world().get::<&Combatant>(m).unwrap();
        assert!(
            cm.state != BehaviorState::Patrolling,
            "point-blank enemy should pull members into combat"
        );
        assert_ne!(cm.target, None);
    }
}

// ---- Lifecycle ----

#[test]
fn test_reset_clears_everything() {
    let mut c = coordinator(SimConfig::default(), flat_providers());
    let members = spawn_line(c.world_mut(), Faction::Blufor, 3, Position::new(0.0, 0.0, 0.0), 2.0);
    c.create_squad(members);
    spawn_combatant(c.world_mut(), Faction::Redfor, SquadRole::Rifleman, Position::new(0.0, 0.0, 10.0));
    for _ in 0..30 {
        c.tick(1.0 / 30.0);
    }

    c.reset();

    assert_eq!(c.world().len(), 0);
    assert_eq!(c.time().tick, 0);
    assert_eq!(c.cover_claims(), 0);
    assert_eq!(c.raycast_denials(), 0);
}
