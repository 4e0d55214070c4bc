//! Demo map for headless runs
//!
//! An open square arena with a ring of spawn points, a few rock obstacles,
//! scattered loot and a four-stage zone. Layout draws come from the match
//! stream before the roster is built, so the seed fixes both.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::bots::setup::{BotSetup, RosterSettings};
use crate::bots::state::BehaviourType;
use crate::config::MatchConfig;
use crate::error::{BotError, Result};
use crate::game::catalog::{BotCatalog, GameModeConfig, ItemCatalog, WeaponId};
use crate::game::circle::{CircleStage, ShrinkingCircle};
use crate::game::constants::character::MELEE_SLOT;
use crate::game::nav::StraightLineNav;
use crate::game::physics::{Obstacle, OpenFieldPhysics};
use crate::game::world::{
    Character, ChestKind, CollectableKind, ConsumableKind, PlayerSpawner, SpawnerKind, WeaponSlot, World,
};
use crate::sim::Simulation;
use crate::util::fixed::Fp;
use crate::util::rng::SimRng;
use crate::util::vec2::Vec2;

/// Half edge of the walkable square
pub const MAP_HALF_EXTENT: Fp = Fp::from_int(100);
const ZONE_RADIUS: Fp = Fp::from_int(90);
const SPAWN_RING_RADIUS: Fp = Fp::from_int(70);
const LOOT_RADIUS: Fp = Fp::from_int(80);
const LOOT_COUNT: usize = 80;

fn obstacles() -> Vec<Obstacle> {
    vec![
        Obstacle::new(Vec2::from_ints(20, 15), Fp::from_int(4)),
        Obstacle::new(Vec2::from_ints(-35, 30), Fp::from_int(6)),
        Obstacle::new(Vec2::from_ints(-10, -40), Fp::from_int(5)),
        Obstacle::new(Vec2::from_ints(45, -25), Fp::from_int(3)),
    ]
}

fn zone_stages() -> Vec<CircleStage> {
    let stage = |delay: i64, duration: i64, fraction: i64, dps: i64| CircleStage {
        delay: Fp::from_int(delay),
        duration: Fp::from_int(duration),
        radius_fraction: Fp::from_milli(fraction),
        damage_per_second: Fp::from_int(dps),
    };
    vec![stage(30, 20, 600, 2), stage(20, 15, 500, 5), stage(15, 10, 400, 10), stage(10, 10, 0, 20)]
}

/// Loot mix by draw: mostly consumables, some weapons, the odd chest
fn loot_kind(roll: i32, weapon: WeaponId) -> CollectableKind {
    match roll {
        0..=2 => CollectableKind::Consumable(ConsumableKind::Ammo),
        3..=4 => CollectableKind::Consumable(ConsumableKind::Health),
        5..=6 => CollectableKind::Consumable(ConsumableKind::Shield),
        7 => CollectableKind::Consumable(ConsumableKind::Special),
        8..=10 => CollectableKind::Weapon { id: weapon, rarity: 1, golden: roll == 10 },
        11 => CollectableKind::Chest(ChestKind::Equipment),
        _ => CollectableKind::Chest(ChestKind::Legendary),
    }
}

fn ring_point(index: usize, count: usize, radius: Fp) -> Vec2 {
    let angle = Fp::TWO_PI.mul_int(index as i64).div_int(count.max(1) as i64);
    Vec2::from_angle(angle) * radius
}

/// Human seat placeholders; they stand still at their spawn
fn spawn_humans(world: &mut World, config: &MatchConfig, items: &ItemCatalog) {
    let team_size = config.team_size.max(1);
    for seat in 0..config.humans {
        let mut character = Character::new(1 + (seat / team_size) as i32);
        character.skill_rating = config.average_trophies;
        character.weapon_slots[MELEE_SLOT] = items.melee_weapon().map(|w| WeaponSlot::from_spec(w, 0, false));
        let position = ring_point(seat as usize, config.max_players as usize, SPAWN_RING_RADIUS - Fp::TWO);
        world.spawn_character(position, character);
    }
}

/// Build the demo world and fill it with bots
pub fn demo(config: &MatchConfig, catalog: BotCatalog, items: ItemCatalog) -> Result<Simulation> {
    config.validate().map_err(BotError::InvalidConfig)?;
    let mut rng = SimRng::seed_from_u64(config.seed);
    let mut world = World::new(config.engine.chunk_size, config.delta_time());
    world.circle = Some(ShrinkingCircle::new(Vec2::ZERO, ZONE_RADIUS, zone_stages()));

    let spawn_count = config.max_players as usize;
    for index in 0..spawn_count {
        let kind = match index {
            0 => SpawnerKind::BotOfType(BehaviourType::StaticShooting),
            1 | 2 => SpawnerKind::AnyBot,
            _ => SpawnerKind::Player,
        };
        world.spawn_spawner(
            ring_point(index, spawn_count, SPAWN_RING_RADIUS),
            PlayerSpawner { kind, activation_time: Fp::ZERO },
        );
    }

    let physics = OpenFieldPhysics::new(obstacles());
    let weapons: Vec<WeaponId> = items.weapon_pool().iter().map(|w| w.id).collect();
    let mut placed = 0;
    while placed < LOOT_COUNT {
        let position = Vec2::new(
            rng.range_fp(-LOOT_RADIUS, LOOT_RADIUS),
            rng.range_fp(-LOOT_RADIUS, LOOT_RADIUS),
        );
        let roll = rng.range_i32(0, 13);
        let weapon = weapons.choose(&mut rng).copied().unwrap_or(0);
        if physics.is_blocked(position) {
            continue;
        }
        world.spawn_collectable(position, loot_kind(roll, weapon));
        placed += 1;
    }

    spawn_humans(&mut world, config, &items);

    let game_mode = GameModeConfig::battle_royale(config.max_players, config.team_size);
    let settings = RosterSettings {
        map_max_players: config.max_players,
        difficulty_override: config.difficulty_override,
    };
    let setup = BotSetup::new(catalog, items.clone(), game_mode, settings);
    let bots = setup.initialize_bots(&mut world, &mut rng)?;

    info!(
        "Demo map ready: {} spawners, {} pickups, {} humans, {} bots (seed {})",
        spawn_count,
        world.collectables.len(),
        config.humans,
        bots.len(),
        config.seed
    );

    let nav = StraightLineNav::new(MAP_HALF_EXTENT, obstacles());
    Ok(Simulation::new(world, config.engine.clone(), nav, physics, items, rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_fills_every_seat() {
        let config = MatchConfig { max_players: 10, humans: 2, ..MatchConfig::default() };
        let sim = demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()).unwrap();
        assert_eq!(sim.world.characters.len(), 10);
        assert_eq!(sim.world.bots.len(), 8);
        assert_eq!(sim.world.collectables.len(), LOOT_COUNT);
        assert!(sim.world.circle.is_some());
    }

    #[test]
    fn test_forced_static_shooter_seated() {
        let config = MatchConfig { max_players: 6, ..MatchConfig::default() };
        let sim = demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()).unwrap();
        assert!(sim.world.bots.iter().any(|(_, b)| b.behaviour == BehaviourType::StaticShooting));
    }

    #[test]
    fn test_loot_avoids_obstacles() {
        let config = MatchConfig::default();
        let sim = demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()).unwrap();
        for (index, _) in sim.world.collectables.iter() {
            let position = sim.world.transforms.get(index).unwrap().position;
            assert!(!sim.physics.is_blocked(position));
        }
    }

    #[test]
    fn test_team_humans_share_teams() {
        let config = MatchConfig { max_players: 8, team_size: 2, humans: 3, ..MatchConfig::default() };
        let sim = demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()).unwrap();
        let human_teams: Vec<i32> = sim.world.characters_iter().filter(|(_, c)| !c.is_bot).map(|(_, c)| c.team).collect();
        assert_eq!(human_teams, vec![1, 1, 2]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatchConfig { team_size: 0, ..MatchConfig::default() };
        let err = demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()).err();
        assert!(matches!(err, Some(BotError::InvalidConfig(_))));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let layout = |seed: u64| {
            let config = MatchConfig { seed, ..MatchConfig::default() };
            let sim = demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()).unwrap();
            sim.world
                .collectables
                .iter()
                .map(|(index, c)| (sim.world.transforms.get(index).map(|t| t.position), c.kind))
                .collect::<Vec<_>>()
        };
        let first = layout(21);
        assert_eq!(first, layout(21));
        assert_ne!(first, layout(22));

        let pool: Vec<WeaponId> = ItemCatalog::builtin().weapon_pool().iter().map(|w| w.id).collect();
        for (_, kind) in &first {
            if let CollectableKind::Weapon { id, .. } = kind {
                assert!(pool.contains(id));
            }
        }
    }

    #[test]
    fn test_loot_kind_table() {
        assert_eq!(loot_kind(0, 2), CollectableKind::Consumable(ConsumableKind::Ammo));
        assert_eq!(loot_kind(10, 3), CollectableKind::Weapon { id: 3, rarity: 1, golden: true });
        assert_eq!(loot_kind(12, 3), CollectableKind::Chest(ChestKind::Legendary));
    }
}
