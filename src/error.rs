//! Library error type

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BotError {
    #[error("no bot configs for game mode '{game_mode}' (difficulty {difficulty:?})")]
    NoBotConfigs { game_mode: String, difficulty: Option<u32> },

    #[error("no player spawn points in the world")]
    NoSpawnPoints,

    #[error("not enough bot names: need {needed}, have {available}")]
    NotEnoughBotNames { needed: usize, available: usize },

    #[error("item catalog has no ranged weapons")]
    EmptyWeaponPool,

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BotError::NoBotConfigs { game_mode: "duos".to_string(), difficulty: Some(2) };
        assert_eq!(err.to_string(), "no bot configs for game mode 'duos' (difficulty Some(2))");
        let err = BotError::NotEnoughBotNames { needed: 5, available: 3 };
        assert_eq!(err.to_string(), "not enough bot names: need 5, have 3");
    }
}
