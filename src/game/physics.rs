//! Line-of-sight queries
//!
//! The decision engine only ever asks one physics question: what is the first
//! thing a segment between two points hits. `OpenFieldPhysics` answers it for
//! a flat map with circular static obstacles and round characters.

use crate::game::constants::character::RADIUS;
use crate::game::entity::EntityHandle;
use crate::game::world::World;
use crate::util::fixed::Fp;
use crate::util::vec2::{Vec2, Vec3};

/// First contact of a linecast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHit {
    /// `None` for static geometry
    pub entity: Option<EntityHandle>,
    pub point: Vec3,
}

pub trait LineOfSight {
    /// First hit along `from -> to`, skipping `ignore`
    fn linecast(&self, world: &World, from: Vec3, to: Vec3, ignore: EntityHandle) -> Option<LineHit>;
}

/// Static circular blocker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    pub center: Vec2,
    pub radius: Fp,
}

impl Obstacle {
    pub fn new(center: Vec2, radius: Fp) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_sq_to(self.center) <= self.radius * self.radius
    }
}

/// Entry parameter t in [0, 1] of a ground segment into a circle
fn segment_circle_entry(from: Vec2, to: Vec2, center: Vec2, radius: Fp) -> Option<Fp> {
    let d = to - from;
    let f = from - center;
    let c = f.length_sq() - radius * radius;
    if c <= Fp::ZERO {
        return Some(Fp::ZERO);
    }
    let a = d.length_sq();
    if a == Fp::ZERO {
        return None;
    }
    let b = f.dot(d).mul_int(2);
    let discriminant = b * b - (a * c).mul_int(4);
    if discriminant.is_negative() {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / a.mul_int(2);
    if t >= Fp::ZERO && t <= Fp::ONE {
        Some(t)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenFieldPhysics {
    pub obstacles: Vec<Obstacle>,
}

impl OpenFieldPhysics {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn is_blocked(&self, point: Vec2) -> bool {
        self.obstacles.iter().any(|o| o.contains(point))
    }
}

impl LineOfSight for OpenFieldPhysics {
    fn linecast(&self, world: &World, from: Vec3, to: Vec3, ignore: EntityHandle) -> Option<LineHit> {
        let start = from.ground();
        let end = to.ground();
        let mut best: Option<(Fp, Option<EntityHandle>)> = None;

        // Strictly smaller t wins; ties keep the earlier candidate
        let mut consider = |t: Fp, entity: Option<EntityHandle>| {
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, entity));
            }
        };

        for obstacle in &self.obstacles {
            if let Some(t) = segment_circle_entry(start, end, obstacle.center, obstacle.radius) {
                consider(t, None);
            }
        }

        for (handle, character) in world.characters_iter() {
            if handle == ignore || !character.alive {
                continue;
            }
            let Some(position) = world.position(handle) else {
                continue;
            };
            if let Some(t) = segment_circle_entry(start, end, position, RADIUS) {
                consider(t, Some(handle));
            }
        }

        best.map(|(t, entity)| LineHit { entity, point: from.lerp(to, t) })
    }
}
