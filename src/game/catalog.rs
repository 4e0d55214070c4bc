//! Read-only data tables consumed by roster setup
//!
//! Bot archetype configs, difficulty-by-trophies buckets, item pools and the
//! game-mode description. All of them are owned outside the decision engine,
//! looked up by key and never mutated by it. They deserialize from JSON so a
//! host can ship its own content; `builtin()` constructors provide the demo set.

use crate::bots::state::BehaviourType;
use crate::util::fixed::Fp;
use serde::{Deserialize, Serialize};

pub type WeaponId = u16;

/// One bot archetype entry, keyed by difficulty and game mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub difficulty: u32,
    pub game_mode: String,
    pub behaviour: BehaviourType,
    pub decision_interval: Fp,
    pub look_for_targets_interval: Fp,
    /// Negative means unlimited
    pub vision_range_sqr: Fp,
    /// Full spread cone in degrees
    pub accuracy_spread_angle: Fp,
    pub chance_to_use_special: Fp,
    pub special_aiming_deviation: Fp,
    pub special_cooldown_min: Fp,
    pub special_cooldown_max: Fp,
    pub max_aiming_range: Fp,
    pub movement_speed_multiplier: Fp,
    pub max_distance_to_teammate_sqr: Fp,
    #[serde(default = "one")]
    pub damage_taken_multiplier: Fp,
    #[serde(default = "one")]
    pub damage_done_multiplier: Fp,
    #[serde(default)]
    pub loadout_rarity: u8,
}

fn one() -> Fp {
    Fp::ONE
}

/// Trophy bucket mapping to a difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotDifficulty {
    pub min_trophies: u32,
    pub max_trophies: u32,
    pub difficulty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotCatalog {
    pub configs: Vec<BotConfig>,
    pub difficulties: Vec<BotDifficulty>,
    /// Size of the bot name pool; name indices run 1..=count
    pub bot_name_count: u32,
}

impl BotCatalog {
    /// First difficulty bucket containing `trophies`
    pub fn difficulty_for_trophies(&self, trophies: u32) -> Option<u32> {
        self.difficulties
            .iter()
            .find(|d| trophies >= d.min_trophies && trophies <= d.max_trophies)
            .map(|d| d.difficulty)
    }

    /// Configs for a game mode, optionally restricted to one difficulty
    pub fn configs_for(&self, game_mode: &str, difficulty: Option<u32>) -> Vec<&BotConfig> {
        self.configs
            .iter()
            .filter(|c| c.game_mode == game_mode)
            .filter(|c| difficulty.map_or(true, |d| c.difficulty == d))
            .collect()
    }

    pub fn builtin() -> Self {
        let base = BotConfig {
            difficulty: 0,
            game_mode: "battle_royale".to_string(),
            behaviour: BehaviourType::FullCombat,
            decision_interval: Fp::from_milli(1500),
            look_for_targets_interval: Fp::from_milli(500),
            vision_range_sqr: Fp::from_int(40 * 40),
            accuracy_spread_angle: Fp::from_int(20),
            chance_to_use_special: Fp::from_milli(100),
            special_aiming_deviation: Fp::from_int(2),
            special_cooldown_min: Fp::from_int(8),
            special_cooldown_max: Fp::from_int(15),
            max_aiming_range: Fp::from_int(18),
            movement_speed_multiplier: Fp::from_milli(900),
            max_distance_to_teammate_sqr: Fp::from_int(15 * 15),
            damage_taken_multiplier: Fp::from_milli(1200),
            damage_done_multiplier: Fp::from_milli(800),
            loadout_rarity: 0,
        };

        let veteran = BotConfig {
            difficulty: 1,
            decision_interval: Fp::ONE,
            look_for_targets_interval: Fp::from_milli(300),
            vision_range_sqr: Fp::MINUS_ONE,
            accuracy_spread_angle: Fp::from_int(8),
            chance_to_use_special: Fp::from_milli(250),
            max_aiming_range: Fp::from_int(24),
            movement_speed_multiplier: Fp::ONE,
            damage_taken_multiplier: Fp::ONE,
            damage_done_multiplier: Fp::ONE,
            loadout_rarity: 2,
            ..base.clone()
        };

        let wanderer = BotConfig {
            behaviour: BehaviourType::WanderAndShoot,
            accuracy_spread_angle: Fp::from_int(30),
            ..base.clone()
        };

        let turret = BotConfig {
            behaviour: BehaviourType::StaticShooting,
            ..base.clone()
        };

        Self {
            configs: vec![base, wanderer, turret, veteran],
            difficulties: vec![
                BotDifficulty { min_trophies: 0, max_trophies: 999, difficulty: 0 },
                BotDifficulty { min_trophies: 1000, max_trophies: u32::MAX, difficulty: 1 },
            ],
            bot_name_count: 64,
        }
    }
}

/// Weapon definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub id: WeaponId,
    pub name: String,
    #[serde(default)]
    pub melee: bool,
    pub range: Fp,
    /// Zero for hit-scan and melee weapons
    #[serde(default)]
    pub projectile_speed: Fp,
    /// Movement speed factor while aiming
    pub aiming_movement_speed: Fp,
    pub damage_per_second: Fp,
}

/// Item and cosmetic pools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub weapons: Vec<WeaponSpec>,
    #[serde(default)]
    pub skins: Vec<u32>,
    #[serde(default)]
    pub death_markers: Vec<u32>,
    #[serde(default)]
    pub gliders: Vec<u32>,
}

impl ItemCatalog {
    pub fn weapon(&self, id: WeaponId) -> Option<&WeaponSpec> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn melee_weapon(&self) -> Option<&WeaponSpec> {
        self.weapons.iter().find(|w| w.melee)
    }

    /// Non-melee weapons in catalog order
    pub fn weapon_pool(&self) -> Vec<&WeaponSpec> {
        self.weapons.iter().filter(|w| !w.melee).collect()
    }

    pub fn builtin() -> Self {
        let weapon = |id: WeaponId, name: &str, range: i64, speed: i64, aiming: i64, dps: i64| WeaponSpec {
            id,
            name: name.to_string(),
            melee: false,
            range: Fp::from_int(range),
            projectile_speed: Fp::from_int(speed),
            aiming_movement_speed: Fp::from_milli(aiming),
            damage_per_second: Fp::from_int(dps),
        };

        Self {
            weapons: vec![
                WeaponSpec {
                    id: 1,
                    name: "hammer".to_string(),
                    melee: true,
                    range: Fp::from_milli(1500),
                    projectile_speed: Fp::ZERO,
                    aiming_movement_speed: Fp::ONE,
                    damage_per_second: Fp::from_int(30),
                },
                weapon(2, "rifle", 20, 40, 700, 22),
                weapon(3, "shotgun", 8, 25, 850, 40),
                weapon(4, "smg", 12, 35, 900, 28),
                weapon(5, "sniper", 30, 80, 500, 18),
            ],
            skins: vec![10, 11, 12, 13],
            death_markers: vec![20, 21],
            gliders: vec![30, 31, 32],
        }
    }
}

/// Game-mode rules relevant to bots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModeConfig {
    pub id: String,
    /// Borrow another mode's bot configs when set
    #[serde(default)]
    pub use_bots_from_game_mode: Option<String>,
    pub max_players: u32,
    #[serde(default)]
    pub teams: bool,
    #[serde(default = "solo")]
    pub max_players_in_team: u32,
    /// Forces every bot into this team when non-zero
    #[serde(default)]
    pub bots_team_override: i32,
    #[serde(default = "enabled")]
    pub allow_bots: bool,
}

fn solo() -> u32 {
    1
}

fn enabled() -> bool {
    true
}

impl GameModeConfig {
    /// Key used to look up bot configs
    pub fn bot_config_key(&self) -> &str {
        match &self.use_bots_from_game_mode {
            Some(key) if !key.trim().is_empty() => key,
            _ => &self.id,
        }
    }

    pub fn team_size(&self) -> u32 {
        if self.teams { self.max_players_in_team.max(1) } else { 1 }
    }

    pub fn battle_royale(max_players: u32, team_size: u32) -> Self {
        Self {
            id: "battle_royale".to_string(),
            use_bots_from_game_mode: None,
            max_players,
            teams: team_size > 1,
            max_players_in_team: team_size.max(1),
            bots_team_override: 0,
            allow_bots: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_for_trophies() {
        let catalog = BotCatalog::builtin();
        assert_eq!(catalog.difficulty_for_trophies(0), Some(0));
        assert_eq!(catalog.difficulty_for_trophies(999), Some(0));
        assert_eq!(catalog.difficulty_for_trophies(1500), Some(1));
    }

    #[test]
    fn test_configs_for_filters_mode_and_difficulty() {
        let catalog = BotCatalog::builtin();
        assert_eq!(catalog.configs_for("battle_royale", Some(0)).len(), 3);
        assert_eq!(catalog.configs_for("battle_royale", Some(1)).len(), 1);
        assert_eq!(catalog.configs_for("battle_royale", None).len(), 4);
        assert!(catalog.configs_for("deathmatch", None).is_empty());
    }

    #[test]
    fn test_weapon_pool_excludes_melee() {
        let items = ItemCatalog::builtin();
        assert!(items.weapon_pool().iter().all(|w| !w.melee));
        assert_eq!(items.melee_weapon().map(|w| w.id), Some(1));
    }

    #[test]
    fn test_bot_config_key_fallback() {
        let mut mode = GameModeConfig::battle_royale(10, 1);
        assert_eq!(mode.bot_config_key(), "battle_royale");
        mode.use_bots_from_game_mode = Some("  ".to_string());
        assert_eq!(mode.bot_config_key(), "battle_royale");
        mode.use_bots_from_game_mode = Some("training".to_string());
        assert_eq!(mode.bot_config_key(), "training");
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "configs": [{
                "difficulty": 2,
                "game_mode": "duos",
                "behaviour": "WanderAndShoot",
                "decision_interval": "1.25",
                "look_for_targets_interval": 0.5,
                "vision_range_sqr": -1,
                "accuracy_spread_angle": 10,
                "chance_to_use_special": "0.2",
                "special_aiming_deviation": 1,
                "special_cooldown_min": 5,
                "special_cooldown_max": 9,
                "max_aiming_range": 20,
                "movement_speed_multiplier": 1,
                "max_distance_to_teammate_sqr": 100
            }],
            "difficulties": [{ "min_trophies": 0, "max_trophies": 500, "difficulty": 2 }],
            "bot_name_count": 8
        }"#;
        let catalog: BotCatalog = serde_json::from_str(json).unwrap();
        let config = &catalog.configs[0];
        assert_eq!(config.behaviour, BehaviourType::WanderAndShoot);
        assert_eq!(config.decision_interval, Fp::from_milli(1250));
        assert_eq!(config.damage_taken_multiplier, Fp::ONE);
        assert!(config.vision_range_sqr.is_negative());
    }
}
