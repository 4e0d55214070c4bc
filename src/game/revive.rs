//! Knock-out and revive
//!
//! In team modes a lethal hit downs a character instead of eliminating it
//! while a teammate is still standing. Standing teammates within reach
//! revive it after `TIME_TO_REVIVE` of uninterrupted help; left alone it
//! bleeds out a slice of max health every `BLEED_INTERVAL`.

use smallvec::SmallVec;

use crate::game::constants::revive::*;
use crate::game::entity::EntityHandle;
use crate::game::world::{Character, DamageOutcome, World};
use crate::util::fixed::Fp;

/// Downed state carried by a character
#[derive(Debug, Clone, PartialEq)]
pub struct KnockedOut {
    /// Credited with the kill if the character never gets up
    pub by: Option<EntityHandle>,
    pub knocked_at: Fp,
    /// Teammates currently reviving, in slot order
    pub revivers: SmallVec<[EntityHandle; 2]>,
    pub end_reviving_at: Fp,
    pub next_damage_at: Fp,
}

impl KnockedOut {
    pub fn new(now: Fp, by: Option<EntityHandle>) -> Self {
        Self {
            by,
            knocked_at: now,
            revivers: SmallVec::new(),
            end_reviving_at: Fp::ZERO,
            next_damage_at: now + BLEED_INTERVAL,
        }
    }

    /// Drop `reviver`; progress resets once nobody is left helping
    pub fn remove_reviver(&mut self, reviver: EntityHandle, now: Fp) {
        let before = self.revivers.len();
        self.revivers.retain(|r| *r != reviver);
        if before > 0 && self.revivers.is_empty() {
            self.end_reviving_at = Fp::ZERO;
            self.next_damage_at = now + BLEED_INTERVAL;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviveEvent {
    StartedReviving { entity: EntityHandle },
    Revived { entity: EntityHandle },
    BledOut { entity: EntityHandle },
}

/// Standing teammates close enough to revive `handle`
fn revivers_of(world: &World, handle: EntityHandle, team: i32) -> SmallVec<[EntityHandle; 2]> {
    let Some(position) = world.position(handle) else {
        return SmallVec::new();
    };
    world
        .team_members(team, handle)
        .into_iter()
        .filter(|mate| world.character(*mate).is_some_and(Character::is_standing))
        .filter(|mate| world.position(*mate).is_some_and(|p| p.distance_sq_to(position) <= REVIVE_RANGE_SQR))
        .collect()
}

/// Advance reviving and bleeding for every knocked-out character
pub fn update(world: &mut World) -> Vec<ReviveEvent> {
    let now = world.time;
    let mut events = Vec::new();
    let downed: SmallVec<[(EntityHandle, i32); 4]> = world
        .characters_iter()
        .filter(|(_, c)| c.alive && c.is_knocked_out())
        .map(|(h, c)| (h, c.team))
        .collect();

    for (entity, team) in downed {
        let revivers = revivers_of(world, entity, team);
        let Some(character) = world.character_mut(entity) else {
            continue;
        };
        let Some(knocked) = character.knocked_out.as_mut() else {
            continue;
        };

        let was_reviving = !knocked.revivers.is_empty();
        if !revivers.is_empty() {
            knocked.revivers = revivers;
            if !was_reviving {
                knocked.end_reviving_at = now + TIME_TO_REVIVE;
                events.push(ReviveEvent::StartedReviving { entity });
            } else if knocked.end_reviving_at <= now {
                character.revive(LIFE_ON_REVIVED);
                events.push(ReviveEvent::Revived { entity });
            }
            continue;
        }

        if was_reviving {
            knocked.revivers.clear();
            knocked.end_reviving_at = Fp::ZERO;
            knocked.next_damage_at = now + BLEED_INTERVAL;
        }
        if knocked.next_damage_at > now {
            continue;
        }
        knocked.next_damage_at = now + BLEED_INTERVAL;
        let by = knocked.by;
        let bleed = character.max_health * BLEED_FRACTION;
        if world.deal_damage(entity, by, bleed) == DamageOutcome::Eliminated {
            events.push(ReviveEvent::BledOut { entity });
        }
    }

    events
}
