//! Tuning constants, grouped by the system that reads them

use crate::util::fixed::Fp;

/// Shared character defaults
pub mod character {
    use super::Fp;

    /// Weapon slots per character; slot 0 always holds the melee weapon
    pub const WEAPON_SLOT_COUNT: usize = 3;
    /// Melee slot index
    pub const MELEE_SLOT: usize = 0;
    /// Special-ability slots per character
    pub const SPECIAL_SLOT_COUNT: usize = 2;
    pub const DEFAULT_MAX_HEALTH: Fp = Fp::from_int(100);
    pub const DEFAULT_MAX_SHIELD: Fp = Fp::from_int(100);
    pub const DEFAULT_MAX_AMMO: Fp = Fp::from_int(100);
    /// Base movement speed (units per second)
    pub const DEFAULT_SPEED: Fp = Fp::from_int(6);
    pub const DEFAULT_MAX_EQUIPMENT: u8 = 4;
    /// Height above the ground used as "chest" for line-of-sight casts
    pub const CHEST_HEIGHT: Fp = Fp::ONE;
    /// Collision radius used by the reference physics
    pub const RADIUS: Fp = Fp::HALF;
    /// Minimum delay between two activations of the same special
    pub const SPECIAL_REUSE_DELAY: Fp = Fp::from_int(1);
}

/// Special-ability effects applied by the world
pub mod specials {
    use super::Fp;

    /// Blast radius of thrown specials
    pub const SPECIAL_BLAST_RADIUS: Fp = Fp::from_milli(2500);
    pub const SPECIAL_BLAST_DAMAGE: Fp = Fp::from_int(30);
    /// Shield granted by the self buff
    pub const SPECIAL_SHIELD_AMOUNT: Fp = Fp::from_int(50);
    /// Charges handed to each bot at spawn
    pub const STARTING_CHARGES: u8 = 1;
}

/// Decision orchestration timings
pub mod decision {
    use super::Fp;

    /// Default round-robin window (ticks)
    pub const DEFAULT_TICK_WINDOW: u32 = 15;
    /// Default post-spawn grace period (seconds)
    pub const DEFAULT_SPAWN_GRACE: Fp = Fp::from_int(2);
    /// Delay after a collection ends before the next decision
    pub const COLLECT_WAIT_PADDING: Fp = Fp::from_milli(100);
    /// Forced re-decision delay after a navigation callback
    pub const NAV_RETRY_DELAY: Fp = Fp::from_ratio(1, 100);
    /// Re-decision delay for a bot with nothing to do
    pub const IDLE_RETRY_DELAY: Fp = Fp::from_ratio(5, 100);
    /// A bot that moved less than this (squared) between passes is stuck
    pub const STUCK_DETECTION_SQR_DISTANCE: Fp = Fp::from_milli(100);
}

/// Targeting and combat micro-behaviour
pub mod combat {
    use super::Fp;

    /// Two characters closer than this (squared) are treated as overlapping
    pub const OVERLAP_SQR_DISTANCE: Fp = Fp::from_milli(200);
    pub const NUDGE_MIN_DISTANCE: Fp = Fp::from_int(1);
    pub const NUDGE_MAX_DISTANCE: Fp = Fp::from_int(3);
    /// Default aim interpolation step per decision pass (radians)
    pub const DEFAULT_AIM_TURN_STEP: Fp = Fp::HALF;
    /// Health ratio under which a bot counts as low life
    pub const LOW_LIFE_RATIO: Fp = Fp::from_milli(200);
    /// Vitality gap at which a bot stops circling its target
    pub const LOSING_BADLY_MARGIN: Fp = Fp::HALF;
    /// Retreat distance bounds, as a fraction of weapon range
    pub const RETREAT_MIN_FRACTION: Fp = Fp::from_milli(330);
    pub const RETREAT_MAX_FRACTION: Fp = Fp::from_milli(660);
    /// Strafe rotation bounds around the target (radians)
    pub const STRAFE_MIN_ANGLE: Fp = Fp::from_milli(350);
    pub const STRAFE_MAX_ANGLE: Fp = Fp::from_milli(800);
}

/// Safe-zone margins and movement geometry
pub mod zone {
    use super::Fp;

    /// Fraction of r² still considered safe while the circle shrinks
    pub const SHRINKING_SPARE_SPACE: Fp = Fp::from_milli(300);
    /// Fraction of r² considered safe while the circle is static
    pub const STATIC_SPARE_SPACE: Fp = Fp::from_milli(750);
    /// Flee destination: centre + ray * R * (BASE ± JITTER)
    pub const SAFE_AREA_RANGE_BASE: Fp = Fp::HALF;
    pub const SAFE_AREA_RANGE_JITTER: Fp = Fp::from_milli(330);
    /// Wander bearing offset bounds (radians)
    pub const WANDER_MIN_ANGLE: Fp = Fp::from_milli(200);
    pub const WANDER_MAX_ANGLE: Fp = Fp::from_milli(750);
    /// Wander distance bounds, as a fraction of circle radius
    pub const WANDER_MIN_RADIUS: Fp = Fp::from_milli(250);
    pub const WANDER_MAX_RADIUS: Fp = Fp::from_milli(750);
    /// Wander radius around the bot when no circle exists
    pub const WANDER_RADIUS_WITHOUT_CIRCLE: Fp = Fp::from_int(12);
    /// How far short of a teammate a follower stops
    pub const TEAMMATE_FOLLOW_DISTANCE: Fp = Fp::from_int(5);
}

/// Knock-out and revive rules for team modes
pub mod revive {
    use super::Fp;

    /// Knock-outs a character can come back from in one match
    pub const MAX_KNOCKOUTS: u8 = 2;
    /// Health pool handed to a knocked-out character, as a fraction of max health
    pub const LIFE_ON_KNOCKED_OUT: Fp = Fp::ONE;
    /// Health restored on revive, as a fraction of max health
    pub const LIFE_ON_REVIVED: Fp = Fp::from_milli(300);
    /// Hits on a knocked-out character are scaled by this
    pub const KNOCKED_OUT_DAMAGE_FACTOR: Fp = Fp::HALF;
    /// Bleed-out tick while nobody is reviving
    pub const BLEED_INTERVAL: Fp = Fp::ONE;
    /// Health lost per bleed tick, as a fraction of max health
    pub const BLEED_FRACTION: Fp = Fp::from_milli(50);
    /// Teammates this close (squared) to a knocked-out character revive it
    pub const REVIVE_RANGE_SQR: Fp = Fp::from_int(2);
    /// Seconds of uninterrupted reviving needed
    pub const TIME_TO_REVIVE: Fp = Fp::from_int(3);
    /// Bots only walk over to revive teammates this close (squared)
    pub const MAX_DISTANCE_TO_TRY_TO_REVIVE_SQR: Fp = Fp::from_int(625);
    /// How far past the teammate a reviving bot aims its path
    pub const REVIVE_APPROACH_OVERSHOOT: Fp = Fp::HALF;
    /// A knocked-out bot crawls this close to its teammate
    pub const KNOCKED_OUT_FOLLOW_DISTANCE: Fp = Fp::from_milli(1500);
    /// Gap (squared) a knocked-out bot tolerates before crawling closer
    pub const KNOCKED_OUT_MAX_DISTANCE_SQR: Fp = Fp::from_int(3);
}

/// Pickup need thresholds
pub mod pickups {
    use super::Fp;

    /// Default chunk edge (world units)
    pub const DEFAULT_CHUNK_SIZE: Fp = Fp::from_int(16);
    /// Default "already basically adjacent" radius
    pub const DEFAULT_CLOSE_RADIUS: Fp = Fp::from_int(3);
    pub const AMMO_CLOSE_NEED: Fp = Fp::from_milli(990);
    pub const AMMO_FAR_NEED: Fp = Fp::HALF;
    pub const HEALTH_FAR_NEED: Fp = Fp::HALF;
    pub const SHIELD_FAR_NEED: Fp = Fp::HALF;
}

/// Match-start roster population
pub mod roster {
    use super::Fp;

    /// First team id handed to bot-only parties
    pub const TEAM_ID_START_BOT_PARTIES: i32 = 100;
    /// First team id handed to solo bots
    pub const TEAM_ID_START_SOLO: i32 = 1000;
    /// Skill-rating jitter, drawn from [-JITTER, JITTER)
    pub const SKILL_RATING_JITTER: i32 = 50;
    /// Per-name-index decision interval offset
    pub const DECISION_INTERVAL_JITTER: Fp = Fp::from_milli(1);
    /// Per-name-index look-for-targets interval offset
    pub const LOOK_INTERVAL_JITTER: Fp = Fp::from_ratio(1, 10_000);
    /// Bounds for "don't panic until this much time is left" (seconds)
    pub const CIRCLE_PANIC_MIN: Fp = Fp::from_int(2);
    pub const CIRCLE_PANIC_MAX: Fp = Fp::from_int(30);
    /// Stat modifier duration that never expires
    pub const INFINITE_DURATION: Fp = Fp::MAX;
}

/// Headless harness rules
pub mod sim {
    use super::Fp;

    /// Default tick rate in Hz
    pub const TICK_RATE: u32 = 30;
    /// Distance (squared) at which a character starts collecting an item
    pub const COLLECT_REACH_SQR: Fp = Fp::ONE;
    pub const COLLECT_TIME_CONSUMABLE: Fp = Fp::from_milli(250);
    pub const COLLECT_TIME_WEAPON: Fp = Fp::HALF;
    pub const COLLECT_TIME_CHEST: Fp = Fp::ONE;
    /// Ammo burned per second of ranged fire
    pub const AMMO_PER_SECOND: Fp = Fp::from_int(8);
    /// Amount restored by a consumable
    pub const CONSUMABLE_AMOUNT: Fp = Fp::from_int(50);
}
