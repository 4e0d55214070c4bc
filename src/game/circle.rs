//! Shrinking safe-zone circle
//!
//! Handles zone stages, the interpolated moving circle, and circle damage for
//! characters caught outside it.

use crate::game::entity::EntityHandle;
use crate::game::world::{DamageOutcome, World};
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

/// One contraction step of the zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleStage {
    /// Wait before the stage starts shrinking (seconds)
    pub delay: Fp,
    /// Shrink duration (seconds)
    pub duration: Fp,
    /// Target radius as a fraction of the current radius
    pub radius_fraction: Fp,
    /// Damage per second applied outside the circle
    pub damage_per_second: Fp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkingCircle {
    pub center: Vec2,
    pub radius: Fp,
    pub target_center: Vec2,
    pub target_radius: Fp,
    pub shrinking_start_time: Fp,
    pub shrinking_duration: Fp,
    pub damage_per_second: Fp,
    stages: Vec<CircleStage>,
    step: usize,
}

/// Zone events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircleEvent {
    /// A new stage was scheduled
    StageScheduled { stage: usize, target_radius: Fp, starts_at: Fp },
    /// Character took circle damage this tick
    CharacterDamaged { entity: EntityHandle, amount: Fp },
    /// Character was knocked out by the circle
    CharacterKnockedOut { entity: EntityHandle },
    /// Character was eliminated by the circle
    CharacterEliminated { entity: EntityHandle },
}

impl ShrinkingCircle {
    /// Build a circle whose first stage starts at `stages[0].delay`
    pub fn new(center: Vec2, radius: Fp, stages: Vec<CircleStage>) -> Self {
        let mut circle = Self {
            center,
            radius,
            target_center: center,
            target_radius: radius,
            shrinking_start_time: Fp::MAX,
            shrinking_duration: Fp::ZERO,
            damage_per_second: Fp::ZERO,
            stages,
            step: 0,
        };
        circle.schedule(Fp::ZERO);
        circle
    }

    /// Static circle that never shrinks
    pub fn fixed(center: Vec2, radius: Fp) -> Self {
        Self::new(center, radius, Vec::new())
    }

    fn schedule(&mut self, now: Fp) -> Option<CircleEvent> {
        let stage = *self.stages.get(self.step)?;
        self.target_center = self.center;
        self.target_radius = self.radius * stage.radius_fraction;
        self.shrinking_start_time = now + stage.delay;
        self.shrinking_duration = stage.duration;
        self.damage_per_second = stage.damage_per_second;
        self.step += 1;
        Some(CircleEvent::StageScheduled {
            stage: self.step,
            target_radius: self.target_radius,
            starts_at: self.shrinking_start_time,
        })
    }

    /// Stage bookkeeping; returns the event when a new stage is scheduled
    pub fn update(&mut self, now: Fp) -> Option<CircleEvent> {
        if self.shrinking_start_time == Fp::MAX {
            return None;
        }
        if now < self.shrinking_start_time + self.shrinking_duration {
            return None;
        }
        self.center = self.target_center;
        self.radius = self.target_radius;
        let event = self.schedule(now);
        if event.is_none() {
            // Final stage reached; the zone stays put
            self.shrinking_start_time = Fp::MAX;
        }
        event
    }

    /// The shrinking started (and the zone has not settled for good)
    #[inline]
    pub fn is_shrinking(&self, now: Fp) -> bool {
        self.shrinking_start_time <= now
    }

    /// Seconds left until the next shrink; negative while shrinking
    #[inline]
    pub fn time_to_shrink(&self, now: Fp) -> Fp {
        if self.shrinking_start_time == Fp::MAX {
            Fp::MAX
        } else {
            self.shrinking_start_time - now
        }
    }

    /// Current interpolated centre and radius
    pub fn moving_circle(&self, now: Fp) -> (Vec2, Fp) {
        if now <= self.shrinking_start_time || self.shrinking_duration <= Fp::ZERO {
            if now >= self.shrinking_start_time {
                return (self.target_center, self.target_radius);
            }
            return (self.center, self.radius);
        }
        let t = ((now - self.shrinking_start_time) / self.shrinking_duration).clamp(Fp::ZERO, Fp::ONE);
        (
            self.center.lerp(self.target_center, t),
            Fp::lerp(self.radius, self.target_radius, t),
        )
    }

    pub fn contains(&self, now: Fp, point: Vec2) -> bool {
        let (center, radius) = self.moving_circle(now);
        point.distance_sq_to(center) <= radius * radius
    }

    pub fn stage(&self) -> usize {
        self.step
    }
}

/// Advance the zone and apply circle damage for this tick
pub fn update(world: &mut World) -> Vec<CircleEvent> {
    let mut events = Vec::new();
    let now = world.time;
    let dt = world.delta_time;

    let Some(circle) = world.circle.as_mut() else {
        return events;
    };
    events.extend(circle.update(now));
    let (center, radius) = circle.moving_circle(now);
    let damage = circle.damage_per_second * dt;
    let radius_sq = radius * radius;

    let mut outside = Vec::new();
    for (index, character) in world.characters.iter_mut() {
        if !character.alive {
            character.taking_circle_damage = false;
            continue;
        }
        let Some(transform) = world.transforms.get(index) else {
            continue;
        };
        let is_outside = transform.position.distance_sq_to(center) > radius_sq;
        character.taking_circle_damage = is_outside && damage > Fp::ZERO;
        if character.taking_circle_damage {
            outside.push(index);
        }
    }

    for index in outside {
        let Some(entity) = world.entities.handle_at(index) else {
            continue;
        };
        events.push(CircleEvent::CharacterDamaged { entity, amount: damage });
        match world.apply_damage(entity, None, damage) {
            DamageOutcome::Eliminated => events.push(CircleEvent::CharacterEliminated { entity }),
            DamageOutcome::KnockedOut => events.push(CircleEvent::CharacterKnockedOut { entity }),
            DamageOutcome::Hurt | DamageOutcome::Ignored => {}
        }
    }

    events
}
