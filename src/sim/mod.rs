//! Headless lockstep match
//!
//! Drives the world clock, the zone, navigation, pickups and hit-scan fire
//! around the bot system so a whole match can run without a client. Every
//! step is a pure function of the world, the seed and the config, so two runs
//! with the same inputs produce the same decision stream.

pub mod result;
pub mod scenario;

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;
use tracing::debug;

use crate::bots::state::MoveTarget;
use crate::bots::system::{BotCharacterSystem, BotDecision};
use crate::config::EngineConfig;
use crate::game::catalog::ItemCatalog;
use crate::game::circle::{self, CircleEvent};
use crate::game::constants::character::{CHEST_HEIGHT, MELEE_SLOT, WEAPON_SLOT_COUNT};
use crate::game::constants::sim::*;
use crate::game::entity::EntityHandle;
use crate::game::nav::StraightLineNav;
use crate::game::physics::{LineOfSight, OpenFieldPhysics};
use crate::game::revive::{self, ReviveEvent};
use crate::game::world::{
    Character, ChestKind, CollectableKind, Collecting, Collector, ConsumableKind, DamageOutcome, SpecialKind, WeaponSlot,
    World,
};
use crate::util::fixed::Fp;
use crate::util::rng::SimRng;
use crate::util::vec2::Vec3;

pub use result::{determine_result, check_match_end, CharacterRanking, MatchEndReason, MatchResult};

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub result: MatchResult,
    pub decisions: Vec<BotDecision>,
}

pub struct Simulation {
    pub world: World,
    pub bots: BotCharacterSystem,
    pub nav: StraightLineNav,
    pub physics: OpenFieldPhysics,
    pub items: ItemCatalog,
    pub rng: SimRng,
}

#[derive(Debug, Clone, Copy)]
struct Shot {
    shooter: EntityHandle,
    target: EntityHandle,
    damage: Fp,
    ranged: bool,
}

impl Simulation {
    pub fn new(
        world: World,
        config: EngineConfig,
        nav: StraightLineNav,
        physics: OpenFieldPhysics,
        items: ItemCatalog,
        rng: SimRng,
    ) -> Self {
        Self {
            world,
            bots: BotCharacterSystem::new(config),
            nav,
            physics,
            items,
            rng,
        }
    }

    /// Advance one tick; returns the bot decisions made during it
    pub fn step(&mut self) -> Vec<BotDecision> {
        self.world.advance();

        for event in circle::update(&mut self.world) {
            match event {
                CircleEvent::StageScheduled { stage, target_radius, starts_at } => {
                    debug!("Zone stage {} scheduled: radius {} at {}", stage, target_radius, starts_at);
                }
                CircleEvent::CharacterEliminated { entity } => {
                    debug!("{} eliminated by the zone", entity);
                }
                CircleEvent::CharacterKnockedOut { entity } => {
                    debug!("{} knocked out by the zone", entity);
                }
                CircleEvent::CharacterDamaged { .. } => {}
            }
        }

        for event in revive::update(&mut self.world) {
            match event {
                ReviveEvent::StartedReviving { entity } => debug!("{} is being revived", entity),
                ReviveEvent::Revived { entity } => debug!("{} revived", entity),
                ReviveEvent::BledOut { entity } => debug!("{} bled out", entity),
            }
        }

        let mut decisions = Vec::new();
        let dt = self.world.delta_time;
        for event in self.nav.step(&mut self.world, dt) {
            decisions.extend(self.bots.on_nav_event(&mut self.world, event));
        }

        self.resolve_pickups();
        self.resolve_fire();

        decisions.extend(self.bots.update(&mut self.world, &mut self.nav, &self.physics, &mut self.rng));
        decisions
    }

    /// Step until one team is left or `tick_limit` is reached
    pub fn run(&mut self, tick_limit: u64) -> MatchOutcome {
        let mut decisions = Vec::new();
        let end_reason = loop {
            if let Some(reason) = check_match_end(&self.world, tick_limit) {
                break reason;
            }
            decisions.extend(self.step());
        };
        MatchOutcome {
            result: determine_result(&self.world, end_reason),
            decisions,
        }
    }

    fn resolve_pickups(&mut self) {
        let now = self.world.time;

        // Finish collections whose timer ran out; the earliest collector wins
        let mut finished: SmallVec<[(EntityHandle, Collector, CollectableKind); 4]> = SmallVec::new();
        for (index, collectable) in self.world.collectables.iter() {
            let Some(item) = self.world.entities.handle_at(index) else {
                continue;
            };
            let done = collectable
                .collectors
                .iter()
                .filter(|c| c.end_time <= now)
                .min_by_key(|c| (c.end_time, c.entity.index()));
            if let Some(&collector) = done {
                finished.push((item, collector, collectable.kind));
            }
        }

        for (item, collector, kind) in finished {
            if !self.world.character(collector.entity).is_some_and(Character::is_standing) {
                if let Some(collectable) = self.world.collectable_mut(item) {
                    collectable.collectors.retain(|c| c.entity != collector.entity);
                }
                continue;
            }
            if let Some(character) = self.world.character_mut(collector.entity) {
                apply_pickup(character, kind, &self.items);
                debug!("{} collected {} ({:?})", collector.entity, item, kind);
            }
            self.world.despawn(item);
        }

        // Drop timers pointing at items that are gone
        let entities = &self.world.entities;
        for (_, character) in self.world.characters.iter_mut() {
            if character.collecting.is_some_and(|c| !entities.contains(c.item)) {
                character.collecting = None;
            }
        }

        // Start collecting for bots standing on their reserved pickup
        let mut starting: SmallVec<[(EntityHandle, EntityHandle, Fp); 4]> = SmallVec::new();
        for (index, bot) in self.world.bots.iter() {
            let Some(MoveTarget::Entity(item)) = bot.move_target else {
                continue;
            };
            let Some(entity) = self.world.entities.handle_at(index) else {
                continue;
            };
            let Some(character) = self.world.character(entity) else {
                continue;
            };
            if !character.alive || character.collecting.is_some() {
                continue;
            }
            let Some(collectable) = self.world.collectable(item) else {
                continue;
            };
            if collectable.is_collecting(entity) {
                continue;
            }
            let (Some(from), Some(to)) = (self.world.position(entity), self.world.position(item)) else {
                continue;
            };
            if from.distance_sq_to(to) <= COLLECT_REACH_SQR {
                starting.push((entity, item, collect_time(collectable.kind)));
            }
        }

        for (entity, item, duration) in starting {
            let end_time = now + duration;
            if let Some(collectable) = self.world.collectable_mut(item) {
                collectable.collectors.push(Collector { entity, end_time });
            }
            if let Some(character) = self.world.character_mut(entity) {
                character.collecting = Some(Collecting { item, end_time });
            }
        }
    }

    /// Hit-scan damage for every bot holding the trigger on a visible target
    fn resolve_fire(&mut self) {
        let now = self.world.time;
        let dt = self.world.delta_time;

        let mut shots: SmallVec<[Shot; 8]> = SmallVec::new();
        for (index, bot) in self.world.bots.iter() {
            let Some(target) = bot.target else {
                continue;
            };
            let Some(shooter) = self.world.entities.handle_at(index) else {
                continue;
            };
            let Some(character) = self.world.character(shooter) else {
                continue;
            };
            if !character.is_standing() || !character.aim.pressed {
                continue;
            }
            let Some(weapon) = character.current_weapon() else {
                continue;
            };
            if !weapon.melee && character.ammo <= Fp::ZERO {
                continue;
            }
            let (Some(from), Some(to)) = (self.world.position(shooter), self.world.position(target)) else {
                continue;
            };
            if from.distance_sq_to(to) > weapon.range * weapon.range {
                continue;
            }
            let hit = self.physics.linecast(
                &self.world,
                Vec3::from_ground(from, CHEST_HEIGHT),
                Vec3::from_ground(to, CHEST_HEIGHT),
                shooter,
            );
            if hit.and_then(|h| h.entity) != Some(target) {
                continue;
            }
            shots.push(Shot {
                shooter,
                target,
                damage: weapon.damage_per_second * dt * character.damage_done_factor(now),
                ranged: !weapon.melee,
            });
        }

        for shot in shots {
            if shot.ranged {
                if let Some(character) = self.world.character_mut(shot.shooter) {
                    character.ammo = (character.ammo - AMMO_PER_SECOND * dt).max(Fp::ZERO);
                }
            }
            let Some(victim) = self.world.character(shot.target) else {
                continue;
            };
            let damage = shot.damage * victim.damage_taken_factor(now);
            match self.world.apply_damage(shot.target, Some(shot.shooter), damage) {
                DamageOutcome::Eliminated => debug!("{} eliminated {}", shot.shooter, shot.target),
                DamageOutcome::KnockedOut => debug!("{} knocked out {}", shot.shooter, shot.target),
                DamageOutcome::Hurt | DamageOutcome::Ignored => {}
            }
        }
    }
}

fn collect_time(kind: CollectableKind) -> Fp {
    match kind {
        CollectableKind::Consumable(_) => COLLECT_TIME_CONSUMABLE,
        CollectableKind::Weapon { .. } => COLLECT_TIME_WEAPON,
        CollectableKind::Chest(_) => COLLECT_TIME_CHEST,
    }
}

fn apply_pickup(character: &mut Character, kind: CollectableKind, items: &ItemCatalog) {
    character.collecting = None;
    match kind {
        CollectableKind::Weapon { id, rarity, golden } => {
            let Some(spec) = items.weapon(id) else {
                return;
            };
            let slot = (0..WEAPON_SLOT_COUNT)
                .filter(|&s| s != MELEE_SLOT)
                .find(|&s| character.weapon_slots[s].is_none())
                .unwrap_or(if character.current_slot == MELEE_SLOT { 1 } else { character.current_slot });
            character.weapon_slots[slot] = Some(WeaponSlot::from_spec(spec, rarity, golden));
            character.equip_slot(slot);
        }
        CollectableKind::Consumable(ConsumableKind::Ammo) => {
            character.ammo = (character.ammo + CONSUMABLE_AMOUNT).min(character.max_ammo);
        }
        CollectableKind::Consumable(ConsumableKind::Health) => {
            character.health = (character.health + CONSUMABLE_AMOUNT).min(character.max_health);
        }
        CollectableKind::Consumable(ConsumableKind::Shield) => {
            character.shield = (character.shield + CONSUMABLE_AMOUNT).min(character.max_shield);
        }
        CollectableKind::Consumable(ConsumableKind::Special) => {
            for special in character.specials.iter_mut().filter(|s| s.kind != SpecialKind::None) {
                special.charges = special.charges.saturating_add(1);
            }
        }
        CollectableKind::Chest(chest) => {
            character.equipment_count = character.equipment_count.saturating_add(1).min(character.max_equipment);
            if chest == ChestKind::Legendary {
                character.shield = character.max_shield;
            }
        }
    }
}

/// Order-sensitive fingerprint of a decision stream
pub fn decision_digest(decisions: &[BotDecision]) -> u64 {
    let mut hasher = FxHasher::default();
    decisions.hash(&mut hasher);
    hasher.finish()
}
