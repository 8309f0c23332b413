//! Core domain types for the training game.
//!
//! This module defines the fundamental types used throughout the system:
//! - Activity definitions and training plan items
//! - Progressive overload state
//! - Completion records and player statistics
//! - Business definitions, upgrades and owned instances
//! - The player state document tying it all together

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Activity Types
// ============================================================================

/// Measurement unit of an activity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Reps,
    Min,
    Sec,
}

impl Unit {
    /// Whether plan items for this unit are measured as sets x reps
    pub fn is_reps(self) -> bool {
        matches!(self, Unit::Reps)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Reps => write!(f, "reps"),
            Unit::Min => write!(f, "min"),
            Unit::Sec => write!(f, "sec"),
        }
    }
}

/// An activity definition (e.g., "Push-ups")
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: String,
    pub name: String,
    pub unit: Unit,
    /// XP granted per unit of effective amount
    pub xp_multiplier: f64,
    /// Gold granted per unit of effective amount
    pub gold_multiplier: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Suggested amounts shown when configuring a plan item
    #[serde(default)]
    pub durations: Vec<u32>,
}

// ============================================================================
// Training Plan Types
// ============================================================================

/// How often a plan item recurs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly { times_per_week: u8 },
}

/// Static target amount of a plan item
///
/// The shape follows the referenced activity's unit: reps activities use
/// sets x reps, time activities use a scalar value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Amount {
    Scalar { value: u32, unit: Unit },
    Sets { sets: u32, reps: u32 },
}

/// How often progressive overload is allowed to advance
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionRate {
    /// Every completion advances
    Session,
    /// At most one advance per ISO week
    Weekly,
}

impl fmt::Display for ProgressionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionRate::Session => write!(f, "session"),
            ProgressionRate::Weekly => write!(f, "weekly"),
        }
    }
}

/// Sets x reps progression
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepsOverload {
    pub rate: ProgressionRate,
    pub start_sets: u32,
    pub start_reps: u32,
    pub max_sets: u32,
    pub max_reps: u32,
    pub reps_increment: u32,
    pub current_sets: u32,
    pub current_reps: u32,
    #[serde(default)]
    pub last_progression_week: Option<String>,
}

/// Duration progression (minutes or seconds)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeOverload {
    pub rate: ProgressionRate,
    pub min: u32,
    pub max: u32,
    pub increment: u32,
    pub current_target: u32,
    pub unit: Unit,
    #[serde(default)]
    pub last_progression_week: Option<String>,
}

/// Progressive overload state attached to a plan item
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressiveOverload {
    Reps(RepsOverload),
    Time(TimeOverload),
}

impl ProgressiveOverload {
    pub fn rate(&self) -> ProgressionRate {
        match self {
            ProgressiveOverload::Reps(po) => po.rate,
            ProgressiveOverload::Time(po) => po.rate,
        }
    }

    pub fn last_progression_week(&self) -> Option<&str> {
        match self {
            ProgressiveOverload::Reps(po) => po.last_progression_week.as_deref(),
            ProgressiveOverload::Time(po) => po.last_progression_week.as_deref(),
        }
    }

    /// True once the terminal state is reached and further advances are no-ops
    pub fn is_maxed(&self) -> bool {
        match self {
            ProgressiveOverload::Reps(po) => {
                po.current_sets >= po.max_sets && po.current_reps >= po.max_reps
            }
            ProgressiveOverload::Time(po) => po.current_target >= po.max,
        }
    }
}

/// A user-configured recurring training activity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingPlanItem {
    pub id: String,
    /// Weak reference into the catalog; items whose activity is missing are inert
    pub activity_id: String,
    pub frequency: Frequency,
    pub amount: Amount,
    #[serde(default)]
    pub progressive_overload: Option<ProgressiveOverload>,
}

/// The player's training plan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<TrainingPlanItem>,
}

impl Default for TrainingPlan {
    fn default() -> Self {
        Self {
            id: generate_id("plan"),
            created_at: None,
            updated_at: None,
            items: Vec::new(),
        }
    }
}

/// A recorded completion of a plan item
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionRecord {
    pub plan_item_id: String,
    pub completed_at: DateTime<Utc>,
    pub xp_earned: u64,
    pub gold_earned: u64,
}

/// Aggregate lifetime counters
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Stats {
    pub total_activities_completed: u64,
    pub total_xp_earned: u64,
    pub total_gold_earned: u64,
    pub longest_streak: u32,
    pub current_streak: u32,
}

// ============================================================================
// Business Types
// ============================================================================

/// What an upgrade does per purchased level
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Additive bonus to the per-cycle yield multipliers
    Boost {
        #[serde(default)]
        xp_boost_per_level: f64,
        #[serde(default)]
        money_boost_per_level: f64,
    },
    /// Extra claimable cycles that can be stored
    ClaimStorage { claim_storage_bonus: u32 },
}

/// An upgrade purchasable on an owned business
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UpgradeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub effect: UpgradeEffect,
    pub base_cost: u64,
    pub cost_multiplier: f64,
    pub max_level: u32,
    /// Minimum player level (not business level) required to buy
    #[serde(default)]
    pub level_req_base: u32,
}

/// A business definition from the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BusinessDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub base_cost: u64,
    pub base_xp_per_cycle: u64,
    pub base_money_per_cycle: u64,
    #[serde(default = "default_cycle_duration_hours")]
    pub cycle_duration_hours: f64,
    #[serde(default = "default_base_max_claims")]
    pub base_max_claims: u32,
    #[serde(default)]
    pub unlock_level: u32,
    #[serde(default = "default_xp_per_business_level")]
    pub xp_per_business_level: u64,
    #[serde(default)]
    pub upgrades: Vec<UpgradeDefinition>,
}

impl BusinessDefinition {
    pub fn upgrade(&self, upgrade_id: &str) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|u| u.id == upgrade_id)
    }
}

fn default_cycle_duration_hours() -> f64 {
    8.0
}

fn default_base_max_claims() -> u32 {
    5
}

fn default_xp_per_business_level() -> u64 {
    100
}

/// A business owned by the player
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OwnedBusiness {
    pub instance_id: String,
    pub def_id: String,
    pub purchased_at: DateTime<Utc>,
    pub gold_invested: u64,
    pub business_xp: u64,
    pub business_level: u32,
    pub business_money: u64,
    pub last_claim_at: DateTime<Utc>,
    /// Purchased level per upgrade id; missing means level 0
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
}

impl OwnedBusiness {
    pub fn upgrade_level(&self, upgrade_id: &str) -> u32 {
        self.upgrades.get(upgrade_id).copied().unwrap_or(0)
    }
}

// ============================================================================
// Player State
// ============================================================================

/// The single mutable player document
///
/// Missing fields fall back to their defaults when deserializing, so older
/// or partial documents load cleanly.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerState {
    pub xp: u64,
    pub gold: u64,
    /// Date key of the last day roll, used for streak tracking
    pub last_date: Option<String>,
    pub training_plan: TrainingPlan,
    /// Date key (`YYYY-MM-DD`) to the completions of that day
    pub completions: BTreeMap<String, Vec<CompletionRecord>>,
    /// ISO week key to per-plan-item completion counts
    pub weekly_completions: BTreeMap<String, BTreeMap<String, u32>>,
    pub businesses: Vec<OwnedBusiness>,
    pub stats: Stats,
}

impl PlayerState {
    pub fn plan_item(&self, plan_item_id: &str) -> Option<&TrainingPlanItem> {
        self.training_plan
            .items
            .iter()
            .find(|i| i.id == plan_item_id)
    }

    pub fn business(&self, instance_id: &str) -> Option<&OwnedBusiness> {
        self.businesses
            .iter()
            .find(|b| b.instance_id == instance_id)
    }

    pub fn owns_business(&self, def_id: &str) -> bool {
        self.businesses.iter().any(|b| b.def_id == def_id)
    }

    /// Current player level derived from total XP
    pub fn level(&self) -> u32 {
        crate::level::player_level(self.xp)
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The read-only reference tables of activities and businesses
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub activities: Vec<ActivityDefinition>,
    pub businesses: Vec<BusinessDefinition>,
}

/// Generate a short prefixed identifier (e.g. `pi_3f9a1c2b`)
pub fn generate_id(prefix: &str) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &raw[..8])
}
