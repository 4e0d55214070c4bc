//! Per-bot decision state and its getters/setters
//!
//! `BotState` rides on a character entity. It holds the timers that gate
//! each routine, the weak references to the current target and move target,
//! and the tuning numbers copied from the bot's config at spawn.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::game::catalog::{BotConfig, WeaponId};
use crate::game::constants::combat::LOW_LIFE_RATIO;
use crate::game::constants::decision::STUCK_DETECTION_SQR_DISTANCE;
use crate::game::constants::roster::{DECISION_INTERVAL_JITTER, LOOK_INTERVAL_JITTER};
use crate::game::entity::EntityHandle;
use crate::game::world::Character;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

/// Bot archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviourType {
    /// Never acts
    #[default]
    Idle,
    /// Stands still and shoots whatever it sees
    StaticShooting,
    /// Roams the safe zone and shoots on sight
    WanderAndShoot,
    /// Full battle-royale routine
    FullCombat,
}

/// Where a bot is heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveTarget {
    /// Another entity's position (a pickup)
    Entity(EntityHandle),
    /// A fixed point on the map
    Location(Vec2),
}

/// Why a bot is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementType {
    #[default]
    None,
    Wander,
    GoToSafeArea,
    GoCloserToTeammate,
    Collect,
    Reposition,
    Nudge,
}

#[derive(Debug, Clone)]
pub struct BotState {
    pub behaviour: BehaviourType,
    /// Stable per-bot index; also selects the round-robin tick
    pub name_index: u32,

    pub decision_interval: Fp,
    pub look_for_targets_interval: Fp,
    pub next_decision_time: Fp,
    pub next_look_for_targets_time: Fp,
    pub next_allowed_special_use_time: Fp,

    pub target: Option<EntityHandle>,
    pub move_target: Option<MoveTarget>,
    pub movement_type: MovementType,
    /// Entities this bot failed to path to during its current life
    pub invalid_move_targets: FxHashSet<EntityHandle>,

    /// Negative means unlimited
    pub vision_range_sqr: Fp,
    /// Degrees
    pub accuracy_spread_angle: Fp,
    pub chance_to_use_special: Fp,
    pub special_aiming_deviation: Fp,
    pub special_cooldown_min: Fp,
    pub special_cooldown_max: Fp,
    pub max_aiming_range: Fp,
    pub movement_speed_multiplier: Fp,
    pub max_distance_to_teammate_sqr: Fp,
    pub damage_taken_multiplier: Fp,
    pub damage_done_multiplier: Fp,
    pub loadout_rarity: u8,

    pub favorite_weapon: Option<WeaponId>,
    /// Seconds left before a circle shrink at which the bot starts running
    pub time_start_running_from_circle: Fp,
    pub wander_direction: bool,
    pub stuck_detection_position: Option<Vec2>,
    pub random_teammate: Option<EntityHandle>,
    pub team_size: u32,
    pub spawn_with_player: bool,
    /// Set once the post-spawn speed reset ran
    pub speed_reset: bool,
}

impl BotState {
    pub fn new(behaviour: BehaviourType, name_index: u32) -> Self {
        Self {
            behaviour,
            name_index,
            decision_interval: Fp::ONE,
            look_for_targets_interval: Fp::HALF,
            next_decision_time: Fp::ZERO,
            next_look_for_targets_time: Fp::ZERO,
            next_allowed_special_use_time: Fp::ZERO,
            target: None,
            move_target: None,
            movement_type: MovementType::None,
            invalid_move_targets: FxHashSet::default(),
            vision_range_sqr: Fp::MINUS_ONE,
            accuracy_spread_angle: Fp::ZERO,
            chance_to_use_special: Fp::ZERO,
            special_aiming_deviation: Fp::ZERO,
            special_cooldown_min: Fp::ZERO,
            special_cooldown_max: Fp::ZERO,
            max_aiming_range: Fp::from_int(20),
            movement_speed_multiplier: Fp::ONE,
            max_distance_to_teammate_sqr: Fp::from_int(100),
            damage_taken_multiplier: Fp::ONE,
            damage_done_multiplier: Fp::ONE,
            loadout_rarity: 0,
            favorite_weapon: None,
            time_start_running_from_circle: Fp::from_int(10),
            wander_direction: false,
            stuck_detection_position: None,
            random_teammate: None,
            team_size: 1,
            spawn_with_player: false,
            speed_reset: false,
        }
    }

    /// Copy the tuning numbers from a config entry
    ///
    /// Intervals are offset by the name index so bots sharing a config do not
    /// all re-decide on the same tick.
    pub fn from_config(config: &BotConfig, name_index: u32) -> Self {
        let index = i64::from(name_index);
        Self {
            decision_interval: config.decision_interval + DECISION_INTERVAL_JITTER.mul_int(index),
            look_for_targets_interval: config.look_for_targets_interval + LOOK_INTERVAL_JITTER.mul_int(index),
            vision_range_sqr: config.vision_range_sqr,
            accuracy_spread_angle: config.accuracy_spread_angle,
            chance_to_use_special: config.chance_to_use_special,
            special_aiming_deviation: config.special_aiming_deviation,
            special_cooldown_min: config.special_cooldown_min,
            special_cooldown_max: config.special_cooldown_max,
            max_aiming_range: config.max_aiming_range,
            movement_speed_multiplier: config.movement_speed_multiplier,
            max_distance_to_teammate_sqr: config.max_distance_to_teammate_sqr,
            damage_taken_multiplier: config.damage_taken_multiplier,
            damage_done_multiplier: config.damage_done_multiplier,
            loadout_rarity: config.loadout_rarity,
            ..Self::new(config.behaviour, name_index)
        }
    }

    #[inline]
    pub fn can_take_decision(&self, now: Fp) -> bool {
        now >= self.next_decision_time
    }

    #[inline]
    pub fn set_next_decision_delay(&mut self, now: Fp, seconds: Fp) {
        self.next_decision_time = now + seconds;
    }

    #[inline]
    pub fn can_look_for_targets(&self, now: Fp) -> bool {
        now >= self.next_look_for_targets_time
    }

    pub fn set_search_for_enemy_delay(&mut self, now: Fp) {
        self.next_look_for_targets_time = now + self.look_for_targets_interval;
    }

    /// Commit to a move target; pushes the next decision one interval out
    pub fn set_has_waypoint(&mut self, now: Fp, target: MoveTarget, position: Vec2, movement: MovementType) {
        self.move_target = Some(target);
        self.movement_type = movement;
        self.next_decision_time = now + self.decision_interval;
        self.stuck_detection_position = Some(position);
    }

    /// Drop the move target and make the next decision due now
    ///
    /// Returns the previous target so the caller can release a pickup claim.
    pub fn reset_target_waypoint(&mut self, now: Fp) -> Option<MoveTarget> {
        self.movement_type = MovementType::None;
        self.next_decision_time = now;
        self.stuck_detection_position = None;
        self.move_target.take()
    }

    /// True if the bot barely moved since the last check
    ///
    /// Records `position` as the new reference point otherwise.
    pub fn is_stuck(&mut self, position: Vec2) -> bool {
        if let Some(previous) = self.stuck_detection_position {
            if previous.distance_sq_to(position) < STUCK_DETECTION_SQR_DISTANCE {
                return true;
            }
        }
        self.stuck_detection_position = Some(position);
        false
    }

    #[inline]
    pub fn is_doing_nothing(&self) -> bool {
        self.move_target.is_none() && self.target.is_none()
    }

    #[inline]
    pub fn is_low_life(&self, character: &Character) -> bool {
        character.health_ratio() < LOW_LIFE_RATIO
    }

    pub fn is_invalid_move_target(&self, entity: EntityHandle) -> bool {
        self.invalid_move_targets.contains(&entity)
    }

    /// Entity currently pathed to, if any
    pub fn move_target_entity(&self) -> Option<EntityHandle> {
        match self.move_target {
            Some(MoveTarget::Entity(entity)) => Some(entity),
            _ => None,
        }
    }
}
