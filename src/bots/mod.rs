//! Bot decision engine
//!
//! One `BotCharacterSystem::update` call per tick drives every bot. Each pass
//! works on a `BotCtx`, which bundles the world, the navigation and physics
//! services, the shared random stream and the engine config, so every
//! routine below sees its dependencies in its signature.

pub mod combat;
pub mod movement;
pub mod perception;
pub mod pickups;
pub mod setup;
pub mod state;
pub mod system;
pub mod trace;
pub mod zone;

use crate::config::EngineConfig;
use crate::game::entity::EntityHandle;
use crate::game::nav::Navigation;
use crate::game::physics::LineOfSight;
use crate::game::world::World;
use crate::util::fixed::Fp;
use crate::util::rng::SimRng;
use crate::util::vec2::Vec2;

pub use setup::{BotSetup, RosterSettings};
pub use state::{BehaviourType, BotState, MoveTarget, MovementType};
pub use system::{BotAction, BotCharacterSystem, BotDecision};
pub use zone::ZoneContext;

/// Everything one bot pass may touch
pub struct BotCtx<'a> {
    pub world: &'a mut World,
    pub nav: &'a mut dyn Navigation,
    pub physics: &'a dyn LineOfSight,
    pub rng: &'a mut SimRng,
    pub config: &'a EngineConfig,
    pub zone: ZoneContext,
    /// The bot being processed
    pub entity: EntityHandle,
    pub decisions: &'a mut Vec<BotDecision>,
}

impl BotCtx<'_> {
    #[inline]
    pub fn now(&self) -> Fp {
        self.world.time
    }

    /// Current ground position of the bot
    pub fn position(&self) -> Vec2 {
        self.world.position(self.entity).unwrap_or_default()
    }

    /// Append to the tick's decision log
    pub fn record(&mut self, action: BotAction) {
        self.decisions.push(BotDecision { tick: self.world.tick, bot: self.entity, action });
    }
}
