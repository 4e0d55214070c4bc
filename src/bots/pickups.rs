//! Item priority resolver
//!
//! Candidates come from the 3x3 chunk window around the bot. Each category
//! keeps two slots, the overall nearest and the nearest inside the close
//! radius, in a fixed-size array indexed by category. Tiers are resolved
//! close-first, then far, one tier at a time.

use crate::bots::movement::move_to_entity;
use crate::bots::state::{BotState, MoveTarget};
use crate::bots::system::BotAction;
use crate::bots::zone::is_pickup_position_safe;
use crate::bots::BotCtx;
use crate::game::catalog::WeaponId;
use crate::game::constants::pickups::*;
use crate::game::entity::EntityHandle;
use crate::game::world::{Character, ChestKind, CollectableKind, ConsumableKind};
use crate::util::fixed::Fp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PickupCategory {
    FavoriteWeapon,
    LegendaryChest,
    GoldenWeapon,
    Weapon,
    Health,
    Shield,
    EquipmentChest,
    SpecialCharge,
    Ammo,
}

impl PickupCategory {
    pub const COUNT: usize = 9;

    pub fn classify(kind: &CollectableKind, favorite: Option<WeaponId>) -> Self {
        match *kind {
            CollectableKind::Weapon { id, .. } if favorite == Some(id) => PickupCategory::FavoriteWeapon,
            CollectableKind::Weapon { golden: true, .. } => PickupCategory::GoldenWeapon,
            CollectableKind::Weapon { .. } => PickupCategory::Weapon,
            CollectableKind::Consumable(ConsumableKind::Ammo) => PickupCategory::Ammo,
            CollectableKind::Consumable(ConsumableKind::Health) => PickupCategory::Health,
            CollectableKind::Consumable(ConsumableKind::Shield) => PickupCategory::Shield,
            CollectableKind::Consumable(ConsumableKind::Special) => PickupCategory::SpecialCharge,
            CollectableKind::Chest(ChestKind::Equipment) => PickupCategory::EquipmentChest,
            CollectableKind::Chest(ChestKind::Legendary) => PickupCategory::LegendaryChest,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Highest priority first
const PRIORITY_TIERS: [&[PickupCategory]; 4] = [
    &[PickupCategory::FavoriteWeapon, PickupCategory::LegendaryChest, PickupCategory::GoldenWeapon],
    &[PickupCategory::Weapon],
    &[PickupCategory::Health, PickupCategory::Shield, PickupCategory::EquipmentChest],
    &[PickupCategory::SpecialCharge, PickupCategory::Ammo],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub entity: EntityHandle,
    pub distance_sq: Fp,
    pub golden: bool,
}

impl Candidate {
    /// Nearer wins; on a tie golden beats plain
    fn beats(&self, other: &Candidate) -> bool {
        self.distance_sq < other.distance_sq || (self.distance_sq == other.distance_sq && self.golden && !other.golden)
    }
}

/// Nearest and nearest-close candidate per category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupCandidates {
    nearest: [Option<Candidate>; PickupCategory::COUNT],
    close: [Option<Candidate>; PickupCategory::COUNT],
}

impl PickupCandidates {
    pub fn offer(&mut self, category: PickupCategory, candidate: Candidate, close_radius_sq: Fp) {
        let slot = category.slot();
        if self.nearest[slot].map_or(true, |current| candidate.beats(&current)) {
            self.nearest[slot] = Some(candidate);
        }
        if candidate.distance_sq <= close_radius_sq && self.close[slot].map_or(true, |current| candidate.beats(&current)) {
            self.close[slot] = Some(candidate);
        }
    }

    pub fn nearest(&self, category: PickupCategory) -> Option<&Candidate> {
        self.nearest[category.slot()].as_ref()
    }

    pub fn close(&self, category: PickupCategory) -> Option<&Candidate> {
        self.close[category.slot()].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.nearest.iter().all(Option::is_none)
    }
}

/// Does the bot want an item of this category?
///
/// `close` selects the relaxed thresholds used for adjacent pickups.
pub fn has_need(
    category: PickupCategory,
    candidate: &Candidate,
    character: &Character,
    bot: &BotState,
    now: Fp,
    close: bool,
) -> bool {
    match category {
        PickupCategory::FavoriteWeapon => match bot.favorite_weapon.and_then(|id| character.holds_weapon(id)) {
            None => true,
            Some(held) => candidate.golden && !held.golden,
        },
        PickupCategory::LegendaryChest => true,
        PickupCategory::GoldenWeapon => !character.has_golden_weapon(),
        PickupCategory::Weapon => !character.has_ranged_weapon() || character.ammo <= Fp::ZERO,
        PickupCategory::Health if close => character.health < character.max_health,
        PickupCategory::Health => character.health_ratio() < HEALTH_FAR_NEED,
        PickupCategory::Shield if close => character.shield < character.max_shield,
        PickupCategory::Shield => character.shield_ratio() < SHIELD_FAR_NEED,
        PickupCategory::EquipmentChest => character.equipment_count < character.max_equipment,
        PickupCategory::SpecialCharge if close => character.specials.iter().any(|s| !s.is_usable(now)),
        PickupCategory::SpecialCharge => character.specials.iter().all(|s| !s.is_usable(now)),
        PickupCategory::Ammo if close => character.ammo_ratio() < AMMO_CLOSE_NEED,
        PickupCategory::Ammo => character.ammo_ratio() < AMMO_FAR_NEED,
    }
}

/// Classify every eligible pickup around the bot
pub fn gather_candidates(ctx: &BotCtx, bot: &BotState) -> PickupCandidates {
    let mut candidates = PickupCandidates::default();
    let world = &*ctx.world;
    let Some(team) = world.team_of(ctx.entity) else {
        return candidates;
    };
    let position = ctx.position();
    let teammates = world.team_members(team, ctx.entity);
    let close_radius_sq = ctx.config.close_pickup_radius * ctx.config.close_pickup_radius;

    for item in world.chunks.query_neighborhood(position) {
        if bot.is_invalid_move_target(item) || world.is_reserved_by_other(item, ctx.entity) {
            continue;
        }
        let (Some(collectable), Some(item_position)) = (world.collectable(item), world.position(item)) else {
            continue;
        };
        let contested = teammates.iter().any(|&mate| {
            collectable.is_collecting(mate)
                || world.bot(mate).is_some_and(|b| b.move_target == Some(MoveTarget::Entity(item)))
        });
        if contested {
            continue;
        }

        let distance_sq = position.distance_sq_to(item_position);
        if !bot.vision_range_sqr.is_negative() && distance_sq > bot.vision_range_sqr {
            continue;
        }
        if !is_pickup_position_safe(&ctx.zone, bot, item_position) {
            continue;
        }

        let golden = matches!(collectable.kind, CollectableKind::Weapon { golden: true, .. });
        let category = PickupCategory::classify(&collectable.kind, bot.favorite_weapon);
        candidates.offer(category, Candidate { entity: item, distance_sq, golden }, close_radius_sq);
    }
    candidates
}

/// Best pickup and whether it came from the close set
pub fn choose_best_pickup(ctx: &BotCtx, bot: &BotState) -> Option<(EntityHandle, bool)> {
    let character = ctx.world.character(ctx.entity)?;
    let candidates = gather_candidates(ctx, bot);
    if candidates.is_empty() {
        return None;
    }
    let now = ctx.now();

    for tier in PRIORITY_TIERS {
        for &category in tier {
            if let Some(candidate) = candidates.close(category) {
                if has_need(category, candidate, character, bot, now, true) {
                    return Some((candidate.entity, true));
                }
            }
        }
        for &category in tier {
            if let Some(candidate) = candidates.nearest(category) {
                if has_need(category, candidate, character, bot, now, false) {
                    return Some((candidate.entity, false));
                }
            }
        }
    }
    None
}

/// Path to the best pickup; true if the bot is now heading for one
pub fn try_go_for_best_pickup(ctx: &mut BotCtx, bot: &mut BotState) -> bool {
    let Some((item, close)) = choose_best_pickup(ctx, bot) else {
        return false;
    };
    if bot.move_target == Some(MoveTarget::Entity(item)) && ctx.nav.is_active(ctx.entity) {
        return true;
    }
    if !move_to_entity(ctx, bot, item) {
        return false;
    }
    ctx.record(BotAction::Collect { item, close });
    true
}
