//! Safe-zone predicates
//!
//! Pure containment tests over a per-tick snapshot of the shrinking circle.
//! A radius below the smallest representable step means "no circle", and
//! every predicate then answers true.

use crate::bots::state::BotState;
use crate::game::constants::zone::{SHRINKING_SPARE_SPACE, STATIC_SPARE_SPACE};
use crate::game::world::World;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

/// Circle state shared by every bot during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneContext {
    /// Current (moving) circle
    pub center: Vec2,
    pub radius: Fp,
    pub is_shrinking: bool,
    /// Where the circle ends up after the current stage
    pub target_center: Vec2,
    pub target_radius: Fp,
    pub time_to_shrink: Fp,
}

impl ZoneContext {
    pub fn from_world(world: &World) -> Self {
        let Some(circle) = world.circle.as_ref() else {
            return Self::default();
        };
        let (center, radius) = circle.moving_circle(world.time);
        Self {
            center,
            radius,
            is_shrinking: circle.is_shrinking(world.time),
            target_center: circle.target_center,
            target_radius: circle.target_radius,
            time_to_shrink: circle.time_to_shrink(world.time),
        }
    }

    #[inline]
    pub fn has_circle(&self) -> bool {
        self.radius >= Fp::EPSILON
    }
}

/// Plain containment
pub fn is_in_circle(center: Vec2, radius: Fp, point: Vec2) -> bool {
    if radius < Fp::EPSILON {
        return true;
    }
    point.distance_sq_to(center) <= radius * radius
}

/// Containment with a margin, wider while the circle shrinks
pub fn is_in_circle_with_spare_space(center: Vec2, radius: Fp, is_shrinking: bool, point: Vec2) -> bool {
    if radius < Fp::EPSILON {
        return true;
    }
    let distance_sq = point.distance_sq_to(center);
    let factor = if is_shrinking { SHRINKING_SPARE_SPACE } else { STATIC_SPARE_SPACE };
    distance_sq <= radius * radius * factor
}

/// True while the bot can stay at `point` without fleeing
pub fn is_position_safe(zone: &ZoneContext, bot: &BotState, point: Vec2) -> bool {
    if !zone.has_circle() || zone.target_radius < Fp::EPSILON {
        return true;
    }
    if is_in_circle(zone.target_center, zone.target_radius, point) {
        return true;
    }
    !zone.is_shrinking && zone.time_to_shrink > bot.time_start_running_from_circle
}

/// Pickup eligibility: inside the current circle with margin, and safe
pub fn is_pickup_position_safe(zone: &ZoneContext, bot: &BotState, point: Vec2) -> bool {
    is_in_circle_with_spare_space(zone.center, zone.radius, zone.is_shrinking, point)
        && is_position_safe(zone, bot, point)
}
