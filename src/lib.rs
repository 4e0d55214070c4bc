//! Royale Bots Library
//!
//! Deterministic bot decision engine for a fixed-point lockstep battle
//! royale, plus a headless match harness that drives it.
//!
//! # Features
//!
//! - `bot-trace` - Per-decision debug tracing for every bot pass (off by default)

pub mod config;
pub mod error;
pub mod util;
pub mod game;
pub mod bots;
pub mod sim;

pub use bots::{BotAction, BotCharacterSystem, BotDecision, BotSetup, RosterSettings};
pub use error::{BotError, Result};
pub use sim::{MatchOutcome, MatchResult, Simulation};
