//! Movement decisions
//!
//! Every move goes through `move_to_location` or `move_to_entity`, which
//! talk to the navigator and keep the bot's move target, pickup claim and
//! decision timer in step.

use crate::bot_trace;
use crate::bots::state::{BotState, MoveTarget, MovementType};
use crate::bots::system::BotAction;
use crate::bots::zone::{is_in_circle, is_in_circle_with_spare_space};
use crate::bots::BotCtx;
use crate::game::constants::revive::{
    KNOCKED_OUT_FOLLOW_DISTANCE, KNOCKED_OUT_MAX_DISTANCE_SQR, MAX_DISTANCE_TO_TRY_TO_REVIVE_SQR,
    REVIVE_APPROACH_OVERSHOOT,
};
use crate::game::constants::zone::*;
use crate::game::entity::EntityHandle;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

/// Path to a fixed point; false if the navigator rejects it
pub fn move_to_location(ctx: &mut BotCtx, bot: &mut BotState, point: Vec2, movement: MovementType) -> bool {
    if !ctx.nav.set_target(ctx.world, ctx.entity, point) {
        return false;
    }
    let previous = bot.move_target.take();
    ctx.world.release_claim(ctx.entity, previous);
    let (now, position) = (ctx.now(), ctx.position());
    bot.set_has_waypoint(now, MoveTarget::Location(point), position, movement);
    true
}

/// Path to a pickup and reserve it
pub fn move_to_entity(ctx: &mut BotCtx, bot: &mut BotState, item: EntityHandle) -> bool {
    let Some(point) = ctx.world.position(item) else {
        return false;
    };
    if !ctx.nav.set_target(ctx.world, ctx.entity, point) {
        return false;
    }
    let previous = bot.move_target.take();
    if previous != Some(MoveTarget::Entity(item)) {
        ctx.world.release_claim(ctx.entity, previous);
    }
    let (now, position) = (ctx.now(), ctx.position());
    bot.set_has_waypoint(now, MoveTarget::Entity(item), position, MovementType::Collect);
    ctx.world.claim(ctx.entity, item);
    true
}

/// Forget the move target and release its claim
pub fn clear_move_target(ctx: &mut BotCtx, bot: &mut BotState) {
    let previous = bot.reset_target_waypoint(ctx.now());
    ctx.world.release_claim(ctx.entity, previous);
}

/// Drop a move target whose entity no longer exists
pub fn clean_destroyed_move_target(ctx: &mut BotCtx, bot: &mut BotState) -> bool {
    let Some(item) = bot.move_target_entity() else {
        return false;
    };
    if ctx.world.collectable(item).is_some() {
        return false;
    }
    clear_move_target(ctx, bot);
    ctx.nav.stop(ctx.world, ctx.entity, true);
    ctx.record(BotAction::MoveTargetLost);
    true
}

/// Track the nearest living teammate, preferring those still standing
pub fn check_on_teammates(ctx: &mut BotCtx, bot: &mut BotState) {
    let Some(team) = ctx.world.team_of(ctx.entity) else {
        return;
    };
    let position = ctx.position();
    let mut nearest: Option<(EntityHandle, (bool, Fp))> = None;
    for mate in ctx.world.team_members(team, ctx.entity) {
        let Some(character) = ctx.world.character(mate).filter(|c| c.alive) else {
            continue;
        };
        let Some(mate_position) = ctx.world.position(mate) else {
            continue;
        };
        let rank = (character.is_knocked_out(), position.distance_sq_to(mate_position));
        if nearest.map_or(true, |(_, best)| rank < best) {
            nearest = Some((mate, rank));
        }
    }

    bot.random_teammate = nearest.map(|(mate, _)| mate);
    if nearest.is_none() {
        bot.team_size = 1;
    }
}

/// What a bot does about a knocked-out teammate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviveStep {
    /// Already reviving; hold still until done
    Reviving(EntityHandle),
    /// Walking over to revive
    GoTo(EntityHandle, Vec2),
}

/// Head for a knocked-out teammate nobody is reviving yet
///
/// Teammates outside the current circle or beyond revive distance are left
/// alone. The path aims slightly past the teammate so the bot ends up
/// standing on them.
pub fn try_go_revive_teammate(ctx: &mut BotCtx, bot: &mut BotState) -> Option<ReviveStep> {
    let team = ctx.world.team_of(ctx.entity)?;
    let position = ctx.position();
    let now = ctx.now();
    for mate in ctx.world.team_members(team, ctx.entity) {
        let Some(knocked) = ctx.world.character(mate).filter(|c| c.alive).and_then(|c| c.knocked_out.as_ref()) else {
            continue;
        };
        if knocked.revivers.contains(&ctx.entity) {
            bot.set_next_decision_delay(now, bot.decision_interval);
            return Some(ReviveStep::Reviving(mate));
        }
        if !knocked.revivers.is_empty() {
            continue;
        }
        let Some(mate_position) = ctx.world.position(mate) else {
            continue;
        };
        if !is_in_circle(ctx.zone.center, ctx.zone.radius, mate_position) {
            continue;
        }
        let offset = mate_position - position;
        if offset.length_sq() > MAX_DISTANCE_TO_TRY_TO_REVIVE_SQR {
            continue;
        }

        let point = mate_position + offset.normalize() * REVIVE_APPROACH_OVERSHOOT;
        bot.set_next_decision_delay(now, bot.decision_interval);
        if move_to_location(ctx, bot, point, MovementType::GoCloserToTeammate) {
            bot_trace!(bot = %ctx.entity, mate = %mate, "go revive teammate");
            return Some(ReviveStep::GoTo(mate, point));
        }
    }
    None
}

/// Head for a point inside the given circle
///
/// The point lies on the centre-to-bot ray at `R * (0.5 ± 0.33)`, or at the
/// centre itself when the bot stands on it. Returns the destination.
pub fn try_go_to_safe_area(ctx: &mut BotCtx, bot: &mut BotState, center: Vec2, radius: Fp) -> Option<Vec2> {
    if radius < Fp::EPSILON {
        return None;
    }
    if bot.movement_type == MovementType::GoToSafeArea && ctx.nav.is_active(ctx.entity) {
        if let Some(MoveTarget::Location(point)) = bot.move_target {
            return Some(point);
        }
    }

    let ray = (ctx.position() - center).normalize();
    let jitter = ctx.rng.range_fp_inclusive(-SAFE_AREA_RANGE_JITTER, SAFE_AREA_RANGE_JITTER);
    let point = if ray.is_zero() { center } else { center + ray * (radius * (SAFE_AREA_RANGE_BASE + jitter)) };

    if move_to_location(ctx, bot, point, MovementType::GoToSafeArea) {
        bot_trace!(bot = %ctx.entity, x = %point.x, y = %point.y, "go to safe area");
        return Some(point);
    }
    if point != center && move_to_location(ctx, bot, center, MovementType::GoToSafeArea) {
        return Some(center);
    }
    None
}

/// Roam to a random point inside the current circle
///
/// The bearing is the bot's current bearing from the centre, offset by
/// 0.20 to 0.75 radians in its wander direction. Without a circle the bot
/// roams around its own position.
pub fn wander_inside_circle(ctx: &mut BotCtx, bot: &mut BotState) -> Option<Vec2> {
    let position = ctx.position();
    let (center, radius, bearing) = if ctx.zone.has_circle() {
        (ctx.zone.center, ctx.zone.radius, (position - ctx.zone.center).angle())
    } else {
        (position, WANDER_RADIUS_WITHOUT_CIRCLE, ctx.rng.range_fp(Fp::ZERO, Fp::TWO_PI))
    };

    let offset = ctx.rng.range_fp(WANDER_MIN_ANGLE, WANDER_MAX_ANGLE);
    let offset = if bot.wander_direction { offset } else { -offset };
    let distance = radius * ctx.rng.range_fp(WANDER_MIN_RADIUS, WANDER_MAX_RADIUS);
    let point = center + Vec2::from_angle(bearing + offset) * distance;

    move_to_location(ctx, bot, point, MovementType::Wander).then_some(point)
}

/// Close the gap to the tracked teammate when it grows too large
///
/// A knocked-out bot (`real_close`) crawls right up to its teammate and
/// ignores the circle.
pub fn stay_close_to_teammate(ctx: &mut BotCtx, bot: &mut BotState, real_close: bool) -> Option<Vec2> {
    let mate = bot.random_teammate.filter(|m| ctx.world.is_alive(*m))?;
    let mate_position = ctx.world.position(mate)?;
    let position = ctx.position();
    let max_distance_sq = if real_close { KNOCKED_OUT_MAX_DISTANCE_SQR } else { bot.max_distance_to_teammate_sqr };
    if position.distance_sq_to(mate_position) <= max_distance_sq {
        return None;
    }

    let direction = (mate_position - position).normalize();
    let gap = if real_close { KNOCKED_OUT_FOLLOW_DISTANCE } else { TEAMMATE_FOLLOW_DISTANCE };
    let point = mate_position - direction * gap;
    if !real_close && !is_in_circle_with_spare_space(ctx.zone.center, ctx.zone.radius, ctx.zone.is_shrinking, point) {
        return None;
    }
    move_to_location(ctx, bot, point, MovementType::GoCloserToTeammate).then_some(point)
}
