//! Training plan editing.
//!
//! Plan items are created and updated from loosely-typed drafts (as typed
//! into a form). Numbers are coerced into valid bounds instead of being
//! rejected. When an item with progressive overload is edited, the
//! progress made so far is kept and clamped into the new bounds.

use crate::{
    generate_id, ActivityDefinition, Amount, Catalog, Frequency, Outcome, PlayerState,
    ProgressionRate, ProgressiveOverload, Rejected, RepsOverload, TimeOverload,
    TrainingPlanItem,
};
use chrono::{DateTime, Utc};

/// Requested frequency of a plan item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrequencyDraft {
    Daily,
    /// Clamped to 1..=7
    Weekly { times_per_week: i64 },
}

/// Requested amount; only the fields matching the activity's unit are used
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountDraft {
    pub sets: i64,
    pub reps: i64,
    pub value: i64,
}

impl Default for AmountDraft {
    fn default() -> Self {
        Self {
            sets: 1,
            reps: 1,
            value: 1,
        }
    }
}

/// Requested progressive overload bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverloadDraft {
    Reps {
        rate: ProgressionRate,
        start_sets: i64,
        start_reps: i64,
        max_sets: i64,
        max_reps: i64,
        reps_increment: i64,
    },
    Time {
        rate: ProgressionRate,
        start: i64,
        max: i64,
        increment: i64,
    },
}

/// Everything needed to create or update a plan item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanItemDraft {
    pub activity_id: String,
    pub frequency: FrequencyDraft,
    pub amount: AmountDraft,
    pub overload: Option<OverloadDraft>,
}

fn at_least(min: u32, value: i64) -> u32 {
    u32::try_from(value.max(i64::from(min))).unwrap_or(u32::MAX)
}

fn coerce_frequency(draft: FrequencyDraft) -> Frequency {
    match draft {
        FrequencyDraft::Daily => Frequency::Daily,
        FrequencyDraft::Weekly { times_per_week } => Frequency::Weekly {
            // Clamped to 1..=7, so the narrowing cast is lossless
            times_per_week: times_per_week.clamp(1, 7) as u8,
        },
    }
}

fn coerce_amount(def: &ActivityDefinition, draft: AmountDraft) -> Amount {
    if def.unit.is_reps() {
        Amount::Sets {
            sets: at_least(1, draft.sets),
            reps: at_least(1, draft.reps),
        }
    } else {
        Amount::Scalar {
            value: at_least(1, draft.value),
            unit: def.unit,
        }
    }
}

/// Build the overload for a draft, carrying over progress from `existing`
fn build_overload(
    def: &ActivityDefinition,
    draft: OverloadDraft,
    existing: Option<&ProgressiveOverload>,
) -> Outcome<ProgressiveOverload> {
    match draft {
        OverloadDraft::Reps {
            rate,
            start_sets,
            start_reps,
            max_sets,
            max_reps,
            reps_increment,
        } if def.unit.is_reps() => {
            let start_sets = at_least(1, start_sets);
            let start_reps = at_least(1, start_reps);
            let max_sets = at_least(start_sets, max_sets);
            let max_reps = at_least(start_reps, max_reps);

            let (current_sets, current_reps, last_progression_week) = match existing {
                Some(ProgressiveOverload::Reps(old)) => (
                    old.current_sets.clamp(start_sets, max_sets),
                    old.current_reps.clamp(start_reps, max_reps),
                    old.last_progression_week.clone(),
                ),
                _ => (start_sets, start_reps, None),
            };

            Ok(ProgressiveOverload::Reps(RepsOverload {
                rate,
                start_sets,
                start_reps,
                max_sets,
                max_reps,
                reps_increment: at_least(1, reps_increment),
                current_sets,
                current_reps,
                last_progression_week,
            }))
        }
        OverloadDraft::Time {
            rate,
            start,
            max,
            increment,
        } if !def.unit.is_reps() => {
            let min = at_least(1, start);
            let max = at_least(min.saturating_add(1), max);

            let (current_target, last_progression_week) = match existing {
                Some(ProgressiveOverload::Time(old)) => (
                    old.current_target.clamp(min, max),
                    old.last_progression_week.clone(),
                ),
                _ => (min, None),
            };

            Ok(ProgressiveOverload::Time(TimeOverload {
                rate,
                min,
                max,
                increment: at_least(1, increment),
                current_target,
                unit: def.unit,
                last_progression_week,
            }))
        }
        _ => Err(Rejected::OverloadShapeMismatch {
            activity_id: def.id.clone(),
            unit: def.unit,
        }),
    }
}

/// Create a plan item, or update the one named by `editing`
///
/// Returns the id of the created or updated item.
pub fn confirm_plan_item(
    state: &mut PlayerState,
    catalog: &Catalog,
    editing: Option<&str>,
    draft: PlanItemDraft,
    now: DateTime<Utc>,
) -> Outcome<String> {
    let def = catalog
        .activity(&draft.activity_id)
        .ok_or_else(|| Rejected::UnknownActivity(draft.activity_id.clone()))?;

    let existing = match editing {
        Some(id) => Some(
            state
                .plan_item(id)
                .ok_or_else(|| Rejected::UnknownPlanItem(id.to_string()))?,
        ),
        None => None,
    };

    let frequency = coerce_frequency(draft.frequency);
    let amount = coerce_amount(def, draft.amount);
    let progressive_overload = match draft.overload {
        Some(overload) => Some(build_overload(
            def,
            overload,
            existing.and_then(|item| item.progressive_overload.as_ref()),
        )?),
        None => None,
    };

    let plan = &mut state.training_plan;
    let id = match editing.and_then(|id| plan.items.iter_mut().find(|i| i.id == id)) {
        Some(item) => {
            item.activity_id = def.id.clone();
            item.frequency = frequency;
            item.amount = amount;
            item.progressive_overload = progressive_overload;
            tracing::info!("Updated plan item {}", item.id);
            item.id.clone()
        }
        None => {
            let id = generate_id("pi");
            plan.items.push(TrainingPlanItem {
                id: id.clone(),
                activity_id: def.id.clone(),
                frequency,
                amount,
                progressive_overload,
            });
            tracing::info!("Added plan item {} for {}", id, def.name);
            id
        }
    };

    plan.created_at.get_or_insert(now);
    plan.updated_at = Some(now);
    Ok(id)
}

/// Remove a plan item; completion history is kept
pub fn remove_plan_item(
    state: &mut PlayerState,
    plan_item_id: &str,
    now: DateTime<Utc>,
) -> Outcome<TrainingPlanItem> {
    let plan = &mut state.training_plan;
    let index = plan
        .items
        .iter()
        .position(|i| i.id == plan_item_id)
        .ok_or_else(|| Rejected::UnknownPlanItem(plan_item_id.to_string()))?;

    let removed = plan.items.remove(index);
    plan.updated_at = Some(now);
    tracing::info!("Removed plan item {}", plan_item_id);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_default_catalog, Unit};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()
    }

    fn reps_draft(overload: Option<OverloadDraft>) -> PlanItemDraft {
        PlanItemDraft {
            activity_id: "pushups".into(),
            frequency: FrequencyDraft::Daily,
            amount: AmountDraft {
                sets: 3,
                reps: 10,
                value: 0,
            },
            overload,
        }
    }

    fn reps_overload(start_reps: i64, max_reps: i64) -> OverloadDraft {
        OverloadDraft::Reps {
            rate: ProgressionRate::Session,
            start_sets: 2,
            start_reps,
            max_sets: 4,
            max_reps,
            reps_increment: 2,
        }
    }

    #[test]
    fn test_add_plan_item() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();

        let id = confirm_plan_item(&mut state, &catalog, None, reps_draft(None), now()).unwrap();

        let item = state.plan_item(&id).unwrap();
        assert!(id.starts_with("pi_"));
        assert_eq!(item.amount, Amount::Sets { sets: 3, reps: 10 });
        assert_eq!(item.frequency, Frequency::Daily);
        assert!(item.progressive_overload.is_none());
        assert_eq!(state.training_plan.created_at, Some(now()));
        assert_eq!(state.training_plan.updated_at, Some(now()));
    }

    #[test]
    fn test_inputs_are_coerced() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();

        let draft = PlanItemDraft {
            activity_id: "running".into(),
            frequency: FrequencyDraft::Weekly { times_per_week: 12 },
            amount: AmountDraft {
                sets: 5,
                reps: 5,
                value: -3,
            },
            overload: Some(OverloadDraft::Time {
                rate: ProgressionRate::Weekly,
                start: 30,
                max: 10,
                increment: 0,
            }),
        };
        let id = confirm_plan_item(&mut state, &catalog, None, draft, now()).unwrap();
        let item = state.plan_item(&id).unwrap();

        assert_eq!(item.frequency, Frequency::Weekly { times_per_week: 7 });
        assert_eq!(
            item.amount,
            Amount::Scalar {
                value: 1,
                unit: Unit::Min
            }
        );
        match item.progressive_overload.as_ref().unwrap() {
            ProgressiveOverload::Time(po) => {
                assert_eq!((po.min, po.max, po.increment), (30, 31, 1));
                assert_eq!(po.current_target, 30);
                assert_eq!(po.unit, Unit::Min);
            }
            ProgressiveOverload::Reps(_) => panic!("expected time overload"),
        }
    }

    #[test]
    fn test_weekly_frequency_floor() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let mut draft = reps_draft(None);
        draft.frequency = FrequencyDraft::Weekly { times_per_week: 0 };

        let id = confirm_plan_item(&mut state, &catalog, None, draft, now()).unwrap();
        assert_eq!(
            state.plan_item(&id).unwrap().frequency,
            Frequency::Weekly { times_per_week: 1 }
        );
    }

    #[test]
    fn test_reps_overload_bounds_coerced() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let draft = reps_draft(Some(OverloadDraft::Reps {
            rate: ProgressionRate::Session,
            start_sets: 3,
            start_reps: 8,
            max_sets: 1,
            max_reps: 4,
            reps_increment: -1,
        }));

        let id = confirm_plan_item(&mut state, &catalog, None, draft, now()).unwrap();
        match state.plan_item(&id).unwrap().progressive_overload.as_ref().unwrap() {
            ProgressiveOverload::Reps(po) => {
                assert_eq!((po.max_sets, po.max_reps), (3, 8));
                assert_eq!(po.reps_increment, 1);
                assert_eq!((po.current_sets, po.current_reps), (3, 8));
            }
            ProgressiveOverload::Time(_) => panic!("expected reps overload"),
        }
    }

    #[test]
    fn test_edit_preserves_and_clamps_progress() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let id = confirm_plan_item(
            &mut state,
            &catalog,
            None,
            reps_draft(Some(reps_overload(5, 12))),
            now(),
        )
        .unwrap();

        // Simulate progress: 3 x 11, advanced this week
        if let Some(ProgressiveOverload::Reps(po)) = state
            .training_plan
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .and_then(|i| i.progressive_overload.as_mut())
        {
            po.current_sets = 3;
            po.current_reps = 11;
            po.last_progression_week = Some("2026-W42".into());
        }

        // Lower the rep ceiling to 10
        let edited = confirm_plan_item(
            &mut state,
            &catalog,
            Some(&id),
            reps_draft(Some(reps_overload(5, 10))),
            now(),
        )
        .unwrap();
        assert_eq!(edited, id);
        assert_eq!(state.training_plan.items.len(), 1);

        match state.plan_item(&id).unwrap().progressive_overload.as_ref().unwrap() {
            ProgressiveOverload::Reps(po) => {
                assert_eq!((po.current_sets, po.current_reps), (3, 10));
                assert_eq!(po.last_progression_week.as_deref(), Some("2026-W42"));
            }
            ProgressiveOverload::Time(_) => panic!("expected reps overload"),
        }
    }

    #[test]
    fn test_edit_raising_start_lifts_progress() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let id = confirm_plan_item(
            &mut state,
            &catalog,
            None,
            reps_draft(Some(reps_overload(5, 12))),
            now(),
        )
        .unwrap();

        confirm_plan_item(
            &mut state,
            &catalog,
            Some(&id),
            reps_draft(Some(reps_overload(8, 12))),
            now(),
        )
        .unwrap();

        match state.plan_item(&id).unwrap().progressive_overload.as_ref().unwrap() {
            ProgressiveOverload::Reps(po) => assert_eq!(po.current_reps, 8),
            ProgressiveOverload::Time(_) => panic!("expected reps overload"),
        }
    }

    #[test]
    fn test_overload_shape_must_match_unit() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let draft = PlanItemDraft {
            activity_id: "plank".into(),
            frequency: FrequencyDraft::Daily,
            amount: AmountDraft::default(),
            overload: Some(reps_overload(5, 12)),
        };

        assert_eq!(
            confirm_plan_item(&mut state, &catalog, None, draft, now()),
            Err(Rejected::OverloadShapeMismatch {
                activity_id: "plank".into(),
                unit: Unit::Sec
            })
        );
        assert!(state.training_plan.items.is_empty());
    }

    #[test]
    fn test_unknown_references_rejected() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();

        let mut draft = reps_draft(None);
        draft.activity_id = "juggling".into();
        assert_eq!(
            confirm_plan_item(&mut state, &catalog, None, draft, now()),
            Err(Rejected::UnknownActivity("juggling".into()))
        );

        assert_eq!(
            confirm_plan_item(&mut state, &catalog, Some("pi_nope"), reps_draft(None), now()),
            Err(Rejected::UnknownPlanItem("pi_nope".into()))
        );
        assert!(state.training_plan.items.is_empty());
    }

    #[test]
    fn test_oversized_increments_complete_cleanly() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let reps = confirm_plan_item(
            &mut state,
            &catalog,
            None,
            reps_draft(Some(OverloadDraft::Reps {
                rate: ProgressionRate::Session,
                start_sets: 2,
                start_reps: 5,
                max_sets: 4,
                max_reps: 12,
                reps_increment: 5_000_000_000,
            })),
            now(),
        )
        .unwrap();
        let timed = confirm_plan_item(
            &mut state,
            &catalog,
            None,
            PlanItemDraft {
                activity_id: "plank".into(),
                frequency: FrequencyDraft::Daily,
                amount: AmountDraft::default(),
                overload: Some(OverloadDraft::Time {
                    rate: ProgressionRate::Session,
                    start: 30,
                    max: 90,
                    increment: i64::MAX,
                }),
            },
            now(),
        )
        .unwrap();

        crate::schedule::complete_activity(&mut state, &catalog, &reps, now()).unwrap();
        crate::schedule::complete_activity(&mut state, &catalog, &timed, now()).unwrap();

        match state.plan_item(&reps).unwrap().progressive_overload.as_ref().unwrap() {
            ProgressiveOverload::Reps(po) => {
                assert_eq!(po.reps_increment, u32::MAX);
                assert_eq!((po.current_sets, po.current_reps), (3, 5));
            }
            ProgressiveOverload::Time(_) => panic!("expected reps overload"),
        }
        match state.plan_item(&timed).unwrap().progressive_overload.as_ref().unwrap() {
            ProgressiveOverload::Time(po) => assert_eq!(po.current_target, 90),
            ProgressiveOverload::Reps(_) => panic!("expected time overload"),
        }
    }

    #[test]
    fn test_remove_plan_item() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        let id = confirm_plan_item(&mut state, &catalog, None, reps_draft(None), now()).unwrap();

        let removed = remove_plan_item(&mut state, &id, now()).unwrap();
        assert_eq!(removed.id, id);
        assert!(state.training_plan.items.is_empty());

        assert_eq!(
            remove_plan_item(&mut state, &id, now()),
            Err(Rejected::UnknownPlanItem(id.clone()))
        );
    }
}
