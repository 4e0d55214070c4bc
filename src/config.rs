use std::path::PathBuf;
use std::str::FromStr;

use crate::game::constants::{combat, decision, pickups, sim};
use crate::util::fixed::Fp;

/// Read and parse one environment variable, warning on bad input
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
            None
        }
    }
}

/// Engine tunables shared by every bot
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Round-robin window in ticks; each bot runs once per window
    pub tick_window: u32,
    /// Seconds after spawning during which a bot does nothing
    pub spawn_grace: Fp,
    /// Collectable chunk edge in world units
    pub chunk_size: Fp,
    /// Pickups within this radius count as close range
    pub close_pickup_radius: Fp,
    /// Aim interpolation step per pass, radians
    pub aim_turn_step: Fp,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_window: decision::DEFAULT_TICK_WINDOW,
            spawn_grace: decision::DEFAULT_SPAWN_GRACE,
            chunk_size: pickups::DEFAULT_CHUNK_SIZE,
            close_pickup_radius: pickups::DEFAULT_CLOSE_RADIUS,
            aim_turn_step: combat::DEFAULT_AIM_TURN_STEP,
        }
    }
}

impl EngineConfig {
    /// Load config from environment or use defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(window) = env_parse::<u32>("BOTS_TICK_WINDOW") {
            if window > 0 {
                config.tick_window = window;
            } else {
                tracing::warn!("BOTS_TICK_WINDOW must be > 0, using default");
            }
        }

        if let Some(grace) = env_parse::<Fp>("BOTS_SPAWN_GRACE") {
            config.spawn_grace = grace;
        }

        if let Some(size) = env_parse::<Fp>("BOTS_CHUNK_SIZE") {
            config.chunk_size = size;
        }

        if let Some(radius) = env_parse::<Fp>("BOTS_CLOSE_PICKUP_RADIUS") {
            config.close_pickup_radius = radius;
        }

        if let Some(step) = env_parse::<Fp>("BOTS_AIM_TURN_STEP") {
            config.aim_turn_step = step;
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_window == 0 {
            return Err("tick_window must be at least 1".to_string());
        }
        if self.spawn_grace.is_negative() {
            return Err("spawn_grace cannot be negative".to_string());
        }
        if self.chunk_size <= Fp::ZERO {
            return Err("chunk_size must be positive".to_string());
        }
        if self.close_pickup_radius.is_negative() {
            return Err("close_pickup_radius cannot be negative".to_string());
        }
        if self.aim_turn_step <= Fp::ZERO {
            return Err("aim_turn_step must be positive".to_string());
        }
        Ok(())
    }
}

/// Headless match configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub seed: u64,
    /// Ticks to simulate
    pub ticks: u64,
    pub tick_rate: u32,
    pub max_players: u32,
    pub team_size: u32,
    /// Human placeholders spawned before the roster fills the rest
    pub humans: u32,
    /// Skill rating given to the human placeholders
    pub average_trophies: u32,
    /// Optional JSON bot catalog
    pub catalog_path: Option<PathBuf>,
    /// Forces one difficulty instead of the trophy lookup
    pub difficulty_override: Option<u32>,
    pub engine: EngineConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            ticks: 3_000,
            tick_rate: sim::TICK_RATE,
            max_players: 24,
            team_size: 1,
            humans: 0,
            average_trophies: 0,
            catalog_path: None,
            difficulty_override: None,
            engine: EngineConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self {
            engine: EngineConfig::from_env(),
            ..Self::default()
        };

        if let Some(seed) = env_parse::<u64>("MATCH_SEED") {
            config.seed = seed;
        }

        if let Some(ticks) = env_parse::<u64>("MATCH_TICKS") {
            config.ticks = ticks;
        }

        if let Some(rate) = env_parse::<u32>("MATCH_TICK_RATE") {
            if (1..=240).contains(&rate) {
                config.tick_rate = rate;
            } else {
                tracing::warn!("MATCH_TICK_RATE must be 1-240, using default");
            }
        }

        if let Some(max_players) = env_parse::<u32>("MATCH_MAX_PLAYERS") {
            config.max_players = max_players;
        }

        if let Some(team_size) = env_parse::<u32>("MATCH_TEAM_SIZE") {
            config.team_size = team_size;
        }

        if let Some(humans) = env_parse::<u32>("MATCH_HUMANS") {
            config.humans = humans;
        }

        if let Some(trophies) = env_parse::<u32>("MATCH_AVERAGE_TROPHIES") {
            config.average_trophies = trophies;
        }

        if let Ok(path) = std::env::var("BOTS_CATALOG_PATH") {
            if !path.trim().is_empty() {
                config.catalog_path = Some(PathBuf::from(path));
            }
        }

        if let Some(difficulty) = env_parse::<u32>("BOTS_DIFFICULTY_OVERRIDE") {
            config.difficulty_override = Some(difficulty);
        }

        config
    }

    /// Seconds per tick
    pub fn delta_time(&self) -> Fp {
        Fp::from_ratio(1, i64::from(self.tick_rate.max(1)))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        if self.tick_rate == 0 {
            return Err("tick_rate must be at least 1".to_string());
        }
        if self.max_players == 0 {
            return Err("max_players must be at least 1".to_string());
        }
        if self.team_size == 0 {
            return Err("team_size must be at least 1".to_string());
        }
        if self.team_size > self.max_players {
            return Err("team_size cannot exceed max_players".to_string());
        }
        if self.humans > self.max_players {
            return Err("humans cannot exceed max_players".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_window, 15);
        assert_eq!(config.spawn_grace, Fp::from_int(2));
        assert_eq!(config.chunk_size, Fp::from_int(16));
        assert_eq!(config.close_pickup_radius, Fp::from_int(3));
        assert_eq!(config.aim_turn_step, Fp::HALF);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_validate_rejects_zero_window() {
        let config = EngineConfig { tick_window: 0, ..EngineConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_match_validate() {
        let mut config = MatchConfig::default();
        assert!(config.validate().is_ok());
        config.team_size = 30;
        assert!(config.validate().is_err());
        config.team_size = 2;
        config.humans = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default() {
        let config = MatchConfig::load_or_default();
        assert!(config.tick_rate > 0);
        assert!(config.engine.tick_window > 0);
    }

    #[test]
    fn test_delta_time() {
        let config = MatchConfig { tick_rate: 20, ..MatchConfig::default() };
        assert_eq!(config.delta_time(), Fp::from_ratio(1, 20));
    }
}
