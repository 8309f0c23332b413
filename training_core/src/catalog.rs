//! Catalog of activities and businesses.
//!
//! The catalog is read-only reference data. A built-in default catalog is
//! provided; hosts can replace it with JSON documents (see
//! [`Catalog::from_json`] and [`Catalog::load`]).

use crate::config::CatalogConfig;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn activity(
    id: &str,
    name: &str,
    unit: Unit,
    xp_multiplier: f64,
    gold_multiplier: f64,
    tags: &[&str],
    durations: &[u32],
) -> ActivityDefinition {
    ActivityDefinition {
        id: id.into(),
        name: name.into(),
        unit,
        xp_multiplier,
        gold_multiplier,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        durations: durations.to_vec(),
    }
}

/// Builds the default catalog with built-in activities and businesses
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    // ========================================================================
    // Activities
    // ========================================================================

    let activities = vec![
        activity(
            "pushups",
            "Push-ups",
            Unit::Reps,
            1.0,
            0.5,
            &["strength", "upper_body", "bodyweight"],
            &[10, 20, 30],
        ),
        activity(
            "squats",
            "Squats",
            Unit::Reps,
            0.8,
            0.4,
            &["strength", "lower_body", "bodyweight"],
            &[15, 25, 40],
        ),
        activity(
            "pullups",
            "Pull-ups",
            Unit::Reps,
            3.0,
            1.0,
            &["strength", "upper_body", "pull"],
            &[3, 5, 8],
        ),
        activity(
            "situps",
            "Sit-ups",
            Unit::Reps,
            0.6,
            0.3,
            &["strength", "core", "bodyweight"],
            &[15, 25, 40],
        ),
        activity(
            "lunges",
            "Lunges",
            Unit::Reps,
            0.8,
            0.4,
            &["strength", "lower_body"],
            &[10, 16, 24],
        ),
        activity(
            "plank",
            "Plank",
            Unit::Sec,
            0.5,
            0.2,
            &["core", "isometric"],
            &[30, 60, 90],
        ),
        activity(
            "wall_sit",
            "Wall Sit",
            Unit::Sec,
            0.4,
            0.2,
            &["lower_body", "isometric"],
            &[30, 45, 60],
        ),
        activity(
            "running",
            "Running",
            Unit::Min,
            5.0,
            2.0,
            &["cardio", "outdoor"],
            &[15, 30, 45],
        ),
        activity(
            "cycling",
            "Cycling",
            Unit::Min,
            3.0,
            1.5,
            &["cardio", "outdoor"],
            &[20, 40, 60],
        ),
        activity(
            "walking",
            "Walking",
            Unit::Min,
            1.0,
            0.5,
            &["cardio", "low_impact"],
            &[20, 30, 60],
        ),
        activity(
            "yoga",
            "Yoga",
            Unit::Min,
            2.0,
            1.0,
            &["mobility", "low_impact"],
            &[10, 20, 30],
        ),
        activity(
            "stretching",
            "Stretching",
            Unit::Min,
            1.5,
            0.5,
            &["mobility", "recovery"],
            &[5, 10, 15],
        ),
    ];

    // ========================================================================
    // Businesses
    // ========================================================================

    let businesses = vec![
        BusinessDefinition {
            id: "lemonade_stand".into(),
            name: "Lemonade Stand".into(),
            icon: "🍋".into(),
            base_cost: 50,
            base_xp_per_cycle: 10,
            base_money_per_cycle: 5,
            cycle_duration_hours: 8.0,
            base_max_claims: 5,
            unlock_level: 0,
            xp_per_business_level: 100,
            upgrades: vec![
                UpgradeDefinition {
                    id: "fresh_lemons".into(),
                    name: "Fresh Lemons".into(),
                    description: "Better lemons, happier customers".into(),
                    effect: UpgradeEffect::Boost {
                        xp_boost_per_level: 0.1,
                        money_boost_per_level: 0.25,
                    },
                    base_cost: 30,
                    cost_multiplier: 1.5,
                    max_level: 5,
                    level_req_base: 0,
                },
                UpgradeDefinition {
                    id: "bigger_cooler".into(),
                    name: "Bigger Cooler".into(),
                    description: "Keeps more stock between visits".into(),
                    effect: UpgradeEffect::ClaimStorage {
                        claim_storage_bonus: 1,
                    },
                    base_cost: 40,
                    cost_multiplier: 1.6,
                    max_level: 3,
                    level_req_base: 2,
                },
            ],
        },
        BusinessDefinition {
            id: "bakery".into(),
            name: "Bakery".into(),
            icon: "🥐".into(),
            base_cost: 250,
            base_xp_per_cycle: 25,
            base_money_per_cycle: 15,
            cycle_duration_hours: 8.0,
            base_max_claims: 5,
            unlock_level: 3,
            xp_per_business_level: 150,
            upgrades: vec![
                UpgradeDefinition {
                    id: "stone_oven".into(),
                    name: "Stone Oven".into(),
                    description: "Bakes faster and better".into(),
                    effect: UpgradeEffect::Boost {
                        xp_boost_per_level: 0.1,
                        money_boost_per_level: 0.2,
                    },
                    base_cost: 60,
                    cost_multiplier: 1.5,
                    max_level: 5,
                    level_req_base: 3,
                },
                UpgradeDefinition {
                    id: "pantry".into(),
                    name: "Pantry".into(),
                    description: "Room for more unsold goods".into(),
                    effect: UpgradeEffect::ClaimStorage {
                        claim_storage_bonus: 1,
                    },
                    base_cost: 80,
                    cost_multiplier: 1.6,
                    max_level: 3,
                    level_req_base: 5,
                },
            ],
        },
        BusinessDefinition {
            id: "gym".into(),
            name: "Gym".into(),
            icon: "🏋".into(),
            base_cost: 750,
            base_xp_per_cycle: 60,
            base_money_per_cycle: 40,
            cycle_duration_hours: 12.0,
            base_max_claims: 4,
            unlock_level: 6,
            xp_per_business_level: 250,
            upgrades: vec![
                UpgradeDefinition {
                    id: "new_equipment".into(),
                    name: "New Equipment".into(),
                    description: "Members train harder".into(),
                    effect: UpgradeEffect::Boost {
                        xp_boost_per_level: 0.15,
                        money_boost_per_level: 0.2,
                    },
                    base_cost: 150,
                    cost_multiplier: 1.7,
                    max_level: 5,
                    level_req_base: 6,
                },
                UpgradeDefinition {
                    id: "locker_rooms".into(),
                    name: "Locker Rooms".into(),
                    description: "More members between claims".into(),
                    effect: UpgradeEffect::ClaimStorage {
                        claim_storage_bonus: 2,
                    },
                    base_cost: 200,
                    cost_multiplier: 1.8,
                    max_level: 2,
                    level_req_base: 8,
                },
            ],
        },
        BusinessDefinition {
            id: "tech_startup".into(),
            name: "Tech Startup".into(),
            icon: "💻".into(),
            base_cost: 2000,
            base_xp_per_cycle: 150,
            base_money_per_cycle: 100,
            cycle_duration_hours: 24.0,
            base_max_claims: 3,
            unlock_level: 10,
            xp_per_business_level: 500,
            upgrades: vec![UpgradeDefinition {
                id: "cloud_servers".into(),
                name: "Cloud Servers".into(),
                description: "Scale without limits".into(),
                effect: UpgradeEffect::Boost {
                    xp_boost_per_level: 0.2,
                    money_boost_per_level: 0.3,
                },
                base_cost: 500,
                cost_multiplier: 2.0,
                max_level: 4,
                level_req_base: 12,
            }],
        },
    ];

    Catalog {
        activities,
        businesses,
    }
}

impl Catalog {
    pub fn activity(&self, activity_id: &str) -> Option<&ActivityDefinition> {
        self.activities.iter().find(|a| a.id == activity_id)
    }

    pub fn business(&self, def_id: &str) -> Option<&BusinessDefinition> {
        self.businesses.iter().find(|b| b.id == def_id)
    }

    /// Activities carrying the given tag, in catalog order
    pub fn activities_tagged<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a ActivityDefinition> + 'a {
        self.activities
            .iter()
            .filter(move |a| a.tags.iter().any(|t| t == tag))
    }

    /// Parse a catalog from two JSON documents (arrays of definitions)
    pub fn from_json(activities_json: &str, businesses_json: &str) -> Result<Self> {
        let activities: Vec<ActivityDefinition> = serde_json::from_str(activities_json)?;
        let businesses: Vec<BusinessDefinition> = serde_json::from_str(businesses_json)?;
        Ok(Catalog {
            activities,
            businesses,
        })
    }

    /// Load the catalog described by the config
    ///
    /// Tables without a configured path come from the built-in catalog.
    pub fn load(config: &CatalogConfig) -> Result<Self> {
        let default = get_default_catalog();

        let activities = match &config.activities {
            Some(path) => read_table(path)?,
            None => default.activities.clone(),
        };
        let businesses = match &config.businesses {
            Some(path) => read_table(path)?,
            None => default.businesses.clone(),
        };

        let catalog = Catalog {
            activities,
            businesses,
        };

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        Ok(catalog)
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for def in &self.activities {
            if def.id.is_empty() {
                errors.push("Activity has empty ID".to_string());
            }
            if !seen.insert(def.id.as_str()) {
                errors.push(format!("Duplicate activity ID '{}'", def.id));
            }
            if def.name.is_empty() {
                errors.push(format!("Activity '{}' has empty name", def.id));
            }
            if !(def.xp_multiplier >= 0.0) || !(def.gold_multiplier >= 0.0) {
                errors.push(format!(
                    "Activity '{}' has a negative or invalid multiplier",
                    def.id
                ));
            }
        }

        let mut seen = HashSet::new();
        for def in &self.businesses {
            if def.id.is_empty() {
                errors.push("Business has empty ID".to_string());
            }
            if !seen.insert(def.id.as_str()) {
                errors.push(format!("Duplicate business ID '{}'", def.id));
            }
            if !(def.cycle_duration_hours > 0.0) {
                errors.push(format!(
                    "Business '{}': cycle duration must be positive",
                    def.id
                ));
            }
            if def.base_max_claims == 0 {
                errors.push(format!("Business '{}': base max claims is 0", def.id));
            }
            if def.xp_per_business_level == 0 {
                errors.push(format!(
                    "Business '{}': xp per business level is 0",
                    def.id
                ));
            }

            let mut upgrade_ids = HashSet::new();
            for upg in &def.upgrades {
                if !upgrade_ids.insert(upg.id.as_str()) {
                    errors.push(format!(
                        "Business '{}': duplicate upgrade ID '{}'",
                        def.id, upg.id
                    ));
                }
                if !(upg.cost_multiplier > 1.0) {
                    errors.push(format!(
                        "Upgrade '{}': cost multiplier {} must be > 1",
                        upg.id, upg.cost_multiplier
                    ));
                }
                if upg.max_level == 0 {
                    errors.push(format!("Upgrade '{}': max level is 0", upg.id));
                }
                match upg.effect {
                    UpgradeEffect::Boost {
                        xp_boost_per_level,
                        money_boost_per_level,
                    } => {
                        if xp_boost_per_level <= 0.0 && money_boost_per_level <= 0.0 {
                            errors.push(format!("Upgrade '{}': boost has no effect", upg.id));
                        }
                    }
                    UpgradeEffect::ClaimStorage {
                        claim_storage_bonus,
                    } => {
                        if claim_storage_bonus == 0 {
                            errors.push(format!(
                                "Upgrade '{}': claim storage bonus is 0",
                                upg.id
                            ));
                        }
                    }
                }
            }
        }

        errors
    }
}

fn read_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = std::fs::read_to_string(path)?;
    let table = serde_json::from_str(&contents)?;
    tracing::info!("Loaded catalog table from {:?}", path);
    Ok(table)
}
