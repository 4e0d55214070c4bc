//! Target acquisition
//!
//! `try_aim_at` decides whether a bot can engage a candidate and, if so,
//! which entity it actually ends up engaging. Cheap rejections (self, dead,
//! teammate, out of range) run before any physics query.

use crate::bot_trace;
use crate::bots::combat::lead_target;
use crate::bots::movement::move_to_location;
use crate::bots::state::{BotState, MovementType};
use crate::bots::system::BotAction;
use crate::bots::BotCtx;
use crate::game::constants::character::CHEST_HEIGHT;
use crate::game::constants::combat::{NUDGE_MAX_DISTANCE, NUDGE_MIN_DISTANCE, OVERLAP_SQR_DISTANCE};
use crate::game::entity::EntityHandle;
use crate::util::fixed::Fp;
use crate::util::vec2::{Vec2, Vec3};

/// Result of an engagement check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimOutcome {
    Rejected,
    /// Line of sight confirmed; `target` may differ from the candidate
    Engaged { target: EntityHandle, aim_angle: Fp },
    /// Bots were overlapping; the bot was sent to step apart
    Nudged { target: EntityHandle },
}

impl AimOutcome {
    pub fn engaged_target(self) -> Option<EntityHandle> {
        match self {
            AimOutcome::Rejected => None,
            AimOutcome::Engaged { target, .. } | AimOutcome::Nudged { target } => Some(target),
        }
    }
}

/// Rotate `current` toward `desired` by at most `step` radians
pub fn turn_towards(current: Fp, desired: Fp, step: Fp) -> Fp {
    let delta = (desired - current).wrap_angle();
    if delta.abs() <= step {
        desired.wrap_angle()
    } else if delta.is_negative() {
        (current - step).wrap_angle()
    } else {
        (current + step).wrap_angle()
    }
}

/// Check whether the bot can engage `candidate` within `max_range`
pub fn try_aim_at(ctx: &mut BotCtx, bot: &mut BotState, candidate: EntityHandle, max_range: Fp) -> AimOutcome {
    if candidate == ctx.entity {
        return AimOutcome::Rejected;
    }
    let Some(team) = ctx.world.team_of(ctx.entity) else {
        return AimOutcome::Rejected;
    };
    let Some(other) = ctx.world.character(candidate) else {
        return AimOutcome::Rejected;
    };
    if !other.alive || !other.attackable || other.team == team {
        return AimOutcome::Rejected;
    }
    let (Some(bot_transform), Some(target_transform)) =
        (ctx.world.transform(ctx.entity).copied(), ctx.world.transform(candidate).copied())
    else {
        return AimOutcome::Rejected;
    };
    let bot_ground = bot_transform.position;
    let target_ground = target_transform.position;
    if bot_ground.distance_sq_to(target_ground) > max_range * max_range {
        return AimOutcome::Rejected;
    }

    let bot_chest = Vec3::from_ground(bot_ground, bot_transform.height + CHEST_HEIGHT);
    let target_chest = Vec3::from_ground(target_ground, target_transform.height + CHEST_HEIGHT);

    // Standing inside each other: step apart instead of stalling
    if bot_chest.distance_sq_to(target_chest) < OVERLAP_SQR_DISTANCE {
        let away = (bot_ground - target_ground).normalize();
        let away = if away.is_zero() { Vec2::from_angle(ctx.rng.range_fp(Fp::ZERO, Fp::TWO_PI)) } else { away };
        let distance = ctx.rng.range_fp_inclusive(NUDGE_MIN_DISTANCE, NUDGE_MAX_DISTANCE);
        let point = bot_ground + away * distance;
        if move_to_location(ctx, bot, point, MovementType::Nudge) {
            ctx.record(BotAction::Nudge(point));
            bot_trace!(bot = %ctx.entity, target = %candidate, "nudge apart");
            return AimOutcome::Nudged { target: candidate };
        }
    }

    let hit = ctx.physics.linecast(ctx.world, bot_chest, target_chest, ctx.entity);
    let Some(hit_entity) = hit.and_then(|h| h.entity) else {
        return AimOutcome::Rejected;
    };
    // Whoever stands in the way takes the shot, but never a teammate
    let blocker_is_enemy = ctx.world.character(hit_entity).is_some_and(|c| c.alive && c.attackable && c.team != team);
    if !blocker_is_enemy {
        return AimOutcome::Rejected;
    }

    let projectile_speed = ctx
        .world
        .character(ctx.entity)
        .and_then(|c| c.current_weapon())
        .map_or(Fp::ZERO, |w| w.projectile_speed);
    let aim_point = lead_target(bot_ground, target_ground, target_transform.velocity, projectile_speed);
    let mut aim_direction = aim_point - bot_ground;

    if bot.accuracy_spread_angle > Fp::ZERO {
        let half_spread = (bot.accuracy_spread_angle * Fp::DEG_TO_RAD) / Fp::TWO;
        aim_direction = aim_direction.rotate(ctx.rng.range_fp(-half_spread, half_spread));
    }

    let step = ctx.config.aim_turn_step;
    let Some(character) = ctx.world.character_mut(ctx.entity) else {
        return AimOutcome::Rejected;
    };
    character.aim.angle = turn_towards(character.aim.angle, aim_direction.angle(), step);
    AimOutcome::Engaged { target: hit_entity, aim_angle: character.aim.angle }
}
