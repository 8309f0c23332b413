//! Scheduling and completion of training plan items.
//!
//! A daily item is due every day and can be completed once per calendar
//! day. A weekly item is due until it has been completed `times_per_week`
//! times in the current ISO week; it has no per-day guard, so it may be
//! completed several times on the same day as long as the weekly cap
//! allows.

use crate::calendar::{date_key, week_key};
use crate::level::{detect_level_up, LevelUp};
use crate::progression::{advance_progressive_overload, overload_target_label};
use crate::{
    business, Amount, Catalog, CompletionRecord, Frequency, Outcome, PlayerState,
    ProgressiveOverload, Rejected, TrainingPlanItem,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rewards and side effects of an accepted completion
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Completion {
    pub plan_item_id: String,
    pub xp_earned: u64,
    pub gold_earned: u64,
    /// Whether progressive overload raised the target
    pub progressed: bool,
    pub level_up: Option<LevelUp>,
}

/// Number of completions of a plan item within a week
pub fn weekly_count(
    weekly_completions: &BTreeMap<String, BTreeMap<String, u32>>,
    plan_item_id: &str,
    week: &str,
) -> u32 {
    weekly_completions
        .get(week)
        .and_then(|counts| counts.get(plan_item_id))
        .copied()
        .unwrap_or(0)
}

/// Whether the plan item has a completion record for the given date key
pub fn is_completed_today(
    completions: &BTreeMap<String, Vec<CompletionRecord>>,
    plan_item_id: &str,
    today: &str,
) -> bool {
    completions
        .get(today)
        .map(|records| records.iter().any(|c| c.plan_item_id == plan_item_id))
        .unwrap_or(false)
}

/// Plan items due today
///
/// Daily items are always listed (completed ones stay visible; check
/// [`is_completed_today`] to mark them done). Weekly items are listed
/// while under their weekly cap. Items whose activity is missing from
/// the catalog are skipped.
pub fn get_due_today<'a>(
    state: &'a PlayerState,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Vec<&'a TrainingPlanItem> {
    let week = week_key(now);

    state
        .training_plan
        .items
        .iter()
        .filter(|item| {
            if catalog.activity(&item.activity_id).is_none() {
                tracing::warn!(
                    "Plan item {} references unknown activity {}",
                    item.id,
                    item.activity_id
                );
                return false;
            }
            match item.frequency {
                Frequency::Daily => true,
                Frequency::Weekly { times_per_week } => {
                    weekly_count(&state.weekly_completions, &item.id, &week)
                        < u32::from(times_per_week)
                }
            }
        })
        .collect()
}

/// Due items that still need doing today
///
/// Same as [`get_due_today`] without the daily items already completed.
pub fn pending_today<'a>(
    state: &'a PlayerState,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Vec<&'a TrainingPlanItem> {
    let today = date_key(now);
    get_due_today(state, catalog, now)
        .into_iter()
        .filter(|item| match item.frequency {
            Frequency::Daily => !is_completed_today(&state.completions, &item.id, &today),
            Frequency::Weekly { .. } => true,
        })
        .collect()
}

/// The quantity driving rewards for a plan item
///
/// Progressive overload, when present, overrides the static amount.
pub fn effective_amount(item: &TrainingPlanItem) -> u64 {
    match &item.progressive_overload {
        Some(ProgressiveOverload::Reps(po)) => {
            u64::from(po.current_sets) * u64::from(po.current_reps)
        }
        Some(ProgressiveOverload::Time(po)) => u64::from(po.current_target),
        None => match item.amount {
            Amount::Sets { sets, reps } => u64::from(sets) * u64::from(reps),
            Amount::Scalar { value, .. } => u64::from(value),
        },
    }
}

/// Human-readable current target of a plan item
pub fn amount_label(item: &TrainingPlanItem) -> String {
    match &item.progressive_overload {
        Some(po) => overload_target_label(po),
        None => match &item.amount {
            Amount::Sets { sets, reps } => format!("{} x {} reps", sets, reps),
            Amount::Scalar { value, unit } => format!("{} {}", value, unit),
        },
    }
}

/// `Daily`, or weekly progress such as `2/3 this week`
pub fn frequency_label(state: &PlayerState, item: &TrainingPlanItem, now: DateTime<Utc>) -> String {
    match item.frequency {
        Frequency::Daily => "Daily".to_string(),
        Frequency::Weekly { times_per_week } => {
            let done = weekly_count(&state.weekly_completions, &item.id, &week_key(now));
            format!("{}/{} this week", done, times_per_week)
        }
    }
}

/// XP and gold for completing `amount` of an activity
pub fn rewards_for(amount: u64, xp_multiplier: f64, gold_multiplier: f64) -> (u64, u64) {
    let amount = amount as f64;
    let xp = (amount * xp_multiplier).round() as u64;
    let gold = ((amount * gold_multiplier).floor() as u64).max(1);
    (xp, gold)
}

/// Complete a plan item
///
/// Re-completing a daily item on the same day, or a weekly item past its
/// cap, is rejected without touching the state. On success the completion
/// is recorded for today, the weekly counter is bumped (for every
/// frequency type), rewards and lifetime stats are credited, and
/// progressive overload advances.
pub fn complete_activity(
    state: &mut PlayerState,
    catalog: &Catalog,
    plan_item_id: &str,
    now: DateTime<Utc>,
) -> Outcome<Completion> {
    let today = date_key(now);
    let week = week_key(now);

    let item = state
        .plan_item(plan_item_id)
        .ok_or_else(|| Rejected::UnknownPlanItem(plan_item_id.to_string()))?;
    let def = catalog
        .activity(&item.activity_id)
        .ok_or_else(|| Rejected::UnknownActivity(item.activity_id.clone()))?;

    match item.frequency {
        Frequency::Daily => {
            if is_completed_today(&state.completions, plan_item_id, &today) {
                tracing::debug!("Plan item {} already completed on {}", plan_item_id, today);
                return Err(Rejected::AlreadyCompletedToday(plan_item_id.to_string()));
            }
        }
        Frequency::Weekly { times_per_week } => {
            if weekly_count(&state.weekly_completions, plan_item_id, &week)
                >= u32::from(times_per_week)
            {
                tracing::debug!(
                    "Plan item {} reached {}x for {}",
                    plan_item_id,
                    times_per_week,
                    week
                );
                return Err(Rejected::WeeklyCapReached {
                    plan_item_id: plan_item_id.to_string(),
                    times_per_week,
                });
            }
        }
    }

    let amount = effective_amount(item);
    let (xp_earned, gold_earned) = rewards_for(amount, def.xp_multiplier, def.gold_multiplier);
    let xp_before = state.xp;

    state
        .completions
        .entry(today)
        .or_default()
        .push(CompletionRecord {
            plan_item_id: plan_item_id.to_string(),
            completed_at: now,
            xp_earned,
            gold_earned,
        });

    *state
        .weekly_completions
        .entry(week.clone())
        .or_default()
        .entry(plan_item_id.to_string())
        .or_insert(0) += 1;

    state.xp += xp_earned;
    state.gold += gold_earned;
    state.stats.total_activities_completed += 1;
    state.stats.total_xp_earned += xp_earned;
    state.stats.total_gold_earned += gold_earned;

    let progressed = state
        .training_plan
        .items
        .iter_mut()
        .find(|i| i.id == plan_item_id)
        .and_then(|i| i.progressive_overload.as_mut())
        .map(|po| advance_progressive_overload(po, &week))
        .unwrap_or(false);

    let level_up = detect_level_up(xp_before, state.xp).map(|(previous, current)| LevelUp {
        previous,
        current,
        unlocks: business::check_unlocks(state, catalog, current)
            .into_iter()
            .map(|def| def.id.clone())
            .collect(),
    });

    tracing::info!(
        "Completed {} (+{} XP, +{} gold{})",
        plan_item_id,
        xp_earned,
        gold_earned,
        if progressed { ", progressed" } else { "" }
    );

    Ok(Completion {
        plan_item_id: plan_item_id.to_string(),
        xp_earned,
        gold_earned,
        progressed,
        level_up,
    })
}
