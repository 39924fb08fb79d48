//! The tactical coordinator: owns the world, squads, services, and the
//! per-tick pipeline.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use skirmish_core::constants::*;
use skirmish_core::enums::{Faction, SquadCommandKind, SquadRole};
use skirmish_core::providers::{ObstacleProvider, SmokeProvider, TerrainProvider, ZoneProvider};
use skirmish_core::types::{Position, SimTime};

use crate::combatant::{Combatant, PlayerProxy, TargetRef};
use crate::cover::CoverSystem;
use crate::flanking::FlankingCoordinator;
use crate::roster::{Roster, SpatialQuery};
use crate::squad::{Squad, SquadId};
use crate::systems::{behavior, cleanup, morale, squad_command, zone_defense};
use crate::targeting::TargetDistributor;
use crate::visibility::LosEvaluator;
use crate::world_setup::spawn_combatant;

/// Coordinator configuration. All randomness flows from `seed`, so two
/// runs with identical configuration and inputs produce identical
/// decisions.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub seed: u64,
    /// Shared raycast budget per tick.
    pub raycast_budget: u32,
    /// Faction whose members will hunt the player proxy, when set.
    pub player_hunter_faction: Option<Faction>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            raycast_budget: RAYCAST_BUDGET_PER_TICK,
            player_hunter_faction: None,
        }
    }
}

/// Pluggable external collaborators. Every slot is optional; a missing
/// provider disables the dependent feature instead of erroring.
#[derive(Default)]
pub struct Providers {
    pub spatial: Option<Box<dyn SpatialQuery>>,
    pub terrain: Option<Box<dyn TerrainProvider>>,
    pub obstacles: Option<Box<dyn ObstacleProvider>>,
    pub zones: Option<Box<dyn ZoneProvider>>,
    pub smoke: Option<Box<dyn SmokeProvider>>,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("spatial", &self.spatial.is_some())
            .field("terrain", &self.terrain.is_some())
            .field("obstacles", &self.obstacles.is_some())
            .field("zones", &self.zones.is_some())
            .field("smoke", &self.smoke.is_some())
            .finish()
    }
}

/// The whole tactical AI core. The embedding simulation calls `tick` once
/// per step, pushes damage reports and the player position in, and reads
/// destinations, facings, and weapon intents back off the components.
pub struct TacticalCoordinator {
    config: SimConfig,
    world: World,
    time: SimTime,
    squads: HashMap<SquadId, Squad>,
    next_squad_id: u32,
    providers: Providers,

    los: LosEvaluator,
    cover: CoverSystem,
    distributor: TargetDistributor,
    flanking: FlankingCoordinator,
    roster: Roster,
    rng: ChaCha8Rng,

    player: Option<PlayerProxy>,
    last_zone_pass_at: f64,
}

impl TacticalCoordinator {
    pub fn new(config: SimConfig, providers: Providers) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        info!(seed = config.seed, "tactical coordinator up");
        Self {
            config,
            world: World::new(),
            time: SimTime::default(),
            squads: HashMap::new(),
            next_squad_id: 0,
            providers,
            los: LosEvaluator::default(),
            cover: CoverSystem::default(),
            distributor: TargetDistributor::default(),
            flanking: FlankingCoordinator::default(),
            roster: Roster::default(),
            rng,
            player: None,
            last_zone_pass_at: f64::NEG_INFINITY,
        }
    }

    /// Advance the whole core by one tick of `dt` seconds.
    ///
    /// Pipeline order: death cleanup, roster snapshot, service upkeep,
    /// squad coordination, morale decay, then the per-agent behavior
    /// machine and squad-command translation. Agents are processed in
    /// world iteration order within one tick.
    pub fn tick(&mut self, dt: f64) {
        self.time.advance(dt);
        let now = self.time.elapsed_secs;

        self.los.begin_tick(self.config.raycast_budget, now);
        cleanup::run(&mut self.world, &mut self.cover);
        self.roster.rebuild(&self.world);
        self.cover.cleanup(&self.roster, now);
        self.distributor.maybe_rebuild(&self.roster, now);

        let player = self.player_pair();
        self.flanking.run(
            &mut self.world,
            &mut self.squads,
            &self.providers,
            &mut self.cover,
            &self.roster,
            player.as_ref().map(|(p, f)| (p, *f)),
            &mut self.rng,
            now,
        );

        if now - self.last_zone_pass_at >= ZONE_PASS_INTERVAL_SECS {
            self.last_zone_pass_at = now;
            zone_defense::run(&mut self.world, &self.squads, &self.providers, &mut self.rng, now);
        }

        morale::run(&mut self.world, dt);

        // Behavior pass: one dispatch per living agent. The handler only
        // holds the agent's own component; everything else goes through
        // the snapshot and services.
        let agents: Vec<(Entity, Position)> = self
            .roster
            .iter()
            .filter(|v| v.alive)
            .map(|v| (v.entity, v.pos))
            .collect();
        let mut ctx = behavior::TickCtx {
            roster: &self.roster,
            los: &mut self.los,
            cover: &mut self.cover,
            distributor: &mut self.distributor,
            providers: &self.providers,
            player,
            rng: &mut self.rng,
            now,
            dt,
        };
        for (entity, pos) in agents {
            if let Ok(mut c) = self.world.get::<&mut Combatant>(entity) {
                behavior::dispatch(entity, pos, &mut c, &mut ctx);
            }
        }
        drop(ctx);

        squad_command::run(&mut self.world, &self.squads, &mut self.rng);
    }

    // --- population -------------------------------------------------------

    /// Spawn one combatant. Ownership of despawn stays with the caller via
    /// `world_mut`.
    pub fn spawn(&mut self, faction: Faction, role: SquadRole, pos: Position) -> Entity {
        spawn_combatant(&mut self.world, faction, role, pos)
    }

    /// Group existing combatants into a squad. The first leader-role
    /// member (or the first member) becomes leader.
    pub fn create_squad(&mut self, members: Vec<Entity>) -> SquadId {
        let id = SquadId(self.next_squad_id);
        self.next_squad_id += 1;

        let leader = members
            .iter()
            .copied()
            .find(|&e| {
                self.world
                    .get::<&Combatant>(e)
                    .map(|c| c.role == SquadRole::Leader)
                    .unwrap_or(false)
            })
            .or_else(|| members.first().copied());

        for &e in &members {
            if let Ok(mut c) = self.world.get::<&mut Combatant>(e) {
                c.squad = Some(id);
            }
        }
        self.squads.insert(id, Squad::new(members, leader));
        id
    }

    /// Issue a standing order to a squad.
    pub fn set_squad_command(
        &mut self,
        id: SquadId,
        command: SquadCommandKind,
        anchor: Option<Position>,
    ) {
        if let Some(squad) = self.squads.get_mut(&id) {
            squad.command = command;
            if anchor.is_some() {
                squad.anchor = anchor;
            }
        }
    }

    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    pub fn squad_mut(&mut self, id: SquadId) -> Option<&mut Squad> {
        self.squads.get_mut(&id)
    }

    // --- external events --------------------------------------------------

    /// Report that `entity` took `amount` damage, optionally from a known
    /// attacker. Applies health, suppression, and panic, and timestamps
    /// the squad for flank eligibility.
    pub fn report_damage(&mut self, entity: Entity, amount: f32, from: Option<TargetRef>) {
        let now = self.time.elapsed_secs;
        let mut squad_hit = None;
        if let Ok(mut c) = self.world.get::<&mut Combatant>(entity) {
            if !c.alive {
                return;
            }
            c.health -= amount;
            c.last_hit_at = now;
            c.suppression = (c.suppression + SUPPRESSION_PER_HIT).min(1.0);
            c.panic = (c.panic + PANIC_PER_HIT).min(1.0);
            c.refresh_skill();
            if c.health <= 0.0 {
                c.alive = false;
            } else if c.target.is_none() {
                // Getting shot reveals the attacker even without sight.
                if let Some(attacker) = from {
                    c.target = Some(attacker);
                    c.alert_until = now + ALERT_TIMEOUT_SECS;
                }
            }
            squad_hit = c.squad;
        }
        if let Some(id) = squad_hit {
            if let Some(squad) = self.squads.get_mut(&id) {
                squad.last_damage_at = now;
            }
        }
    }

    /// Push the player proxy's current position and liveness.
    pub fn set_player_proxy(&mut self, proxy: Option<PlayerProxy>) {
        self.player = proxy;
    }

    // --- introspection ----------------------------------------------------

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn providers_mut(&mut self) -> &mut Providers {
        &mut self.providers
    }

    /// Raycast denials recorded since startup or reset.
    pub fn raycast_denials(&self) -> u64 {
        self.los.budget.denials()
    }

    /// Current shared targeter count for one target.
    pub fn targeter_count(&self, target: TargetRef) -> u32 {
        self.distributor.count(target)
    }

    /// Active or just-finished flank operation for a squad.
    pub fn flank_operation(&self, id: SquadId) -> Option<&crate::flanking::FlankingOperation> {
        self.flanking.operation(id)
    }

    /// Holder of the cover spot at `pos`, if claimed.
    pub fn cover_occupant(&self, pos: Position) -> Option<Entity> {
        self.cover.occupant(pos)
    }

    pub fn cover_claims(&self) -> usize {
        self.cover.occupied_count()
    }

    /// Clear all transient state: world, squads, caches, clocks, RNG.
    pub fn reset(&mut self) {
        self.world = World::new();
        self.time = SimTime::default();
        self.squads.clear();
        self.next_squad_id = 0;
        self.los.reset();
        self.cover.reset();
        self.distributor.reset();
        self.flanking.reset();
        self.roster = Roster::default();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.player = None;
        self.last_zone_pass_at = f64::NEG_INFINITY;
    }

    fn player_pair(&self) -> Option<(PlayerProxy, Faction)> {
        match (self.player, self.config.player_hunter_faction) {
            (Some(proxy), Some(faction)) => Some((proxy, faction)),
            _ => None,
        }
    }
}
