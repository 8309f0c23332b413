#![forbid(unsafe_code)]

//! Core game engine for the training game.
//!
//! Completing planned exercises earns XP and gold; gold buys businesses
//! that accrue XP and money over wall-clock time.
//!
//! This crate provides:
//! - Domain types (activities, plan items, businesses, player state)
//! - Catalog management
//! - Scheduling, completion rewards and progressive overload
//! - Business accrual, claims and upgrades
//! - Persistence (atomic state file, backups, CSV export)

pub mod types;
pub mod error;
pub mod calendar;
pub mod level;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod state;
pub mod progression;
pub mod schedule;
pub mod plan;
pub mod streak;
pub mod business;
pub mod session;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Outcome, Rejected, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use state::{JsonStateFile, MemorySink, StateSink};
pub use session::GameSession;
pub use level::{player_level, LevelUp};
pub use schedule::{complete_activity, get_due_today, Completion};
pub use plan::{confirm_plan_item, remove_plan_item, PlanItemDraft};
pub use business::{claim_interest, get_available_cycles, purchase_business, purchase_upgrade};
pub use streak::roll_day;
