//! Error types for the training_core library.
//!
//! Two kinds of failure live here. [`Error`] covers real faults (I/O, bad
//! documents, invalid configuration). [`Rejected`] covers business-rule
//! refusals: a rejected command is a no-op that leaves the player state
//! untouched.

use crate::Unit;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Result of a game command: the applied effect, or the reason it was a no-op
pub type Outcome<T> = std::result::Result<T, Rejected>;

/// Core error type for training_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Why a command did nothing
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("no plan item with id {0}")]
    UnknownPlanItem(String),

    #[error("activity {0} is not in the catalog")]
    UnknownActivity(String),

    #[error("plan item {0} is already completed today")]
    AlreadyCompletedToday(String),

    #[error("plan item {plan_item_id} already done {times_per_week}x this week")]
    WeeklyCapReached {
        plan_item_id: String,
        times_per_week: u8,
    },

    #[error("progressive overload does not fit activity {activity_id} measured in {unit}")]
    OverloadShapeMismatch { activity_id: String, unit: Unit },

    #[error("business {0} is not in the catalog")]
    UnknownBusiness(String),

    #[error("no owned business with id {0}")]
    UnknownInstance(String),

    #[error("business {0} is already owned")]
    AlreadyOwned(String),

    #[error("business {def_id} unlocks at level {unlock_level}")]
    BusinessLocked { def_id: String, unlock_level: u32 },

    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: u64, available: u64 },

    #[error("no upgrade {0} on this business")]
    UnknownUpgrade(String),

    #[error("upgrade {upgrade_id} is already at max level {max_level}")]
    UpgradeMaxed { upgrade_id: String, max_level: u32 },

    #[error("not enough business money: need {needed}, have {available}")]
    InsufficientBusinessMoney { needed: u64, available: u64 },

    #[error("requires player level {required} (currently {current})")]
    LevelRequirement { required: u32, current: u32 },

    #[error("no cycles ready to claim on {0}")]
    NoCyclesReady(String),
}
