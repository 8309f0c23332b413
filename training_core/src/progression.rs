//! Progressive overload: raising a plan item's target over time.
//!
//! Progression rules:
//! - Reps: reps climb by the increment until the rep ceiling, then one
//!   more set is added and reps reset to the starting value. At max sets
//!   and max reps the state is frozen.
//! - Time: the target climbs by the increment, capped at the maximum.
//!
//! Session-rate overload advances on every completion; weekly-rate
//! overload advances at most once per ISO week.

use crate::{ProgressionRate, ProgressiveOverload, RepsOverload, TimeOverload};

/// Advance a reps overload by one step
///
/// Returns true if the target changed.
pub fn advance_reps(po: &mut RepsOverload) -> bool {
    let before = (po.current_sets, po.current_reps);

    let new_reps = po.current_reps.saturating_add(po.reps_increment);
    if new_reps <= po.max_reps {
        po.current_reps = new_reps;
        tracing::debug!("Reps progression: increased reps to {}", po.current_reps);
    } else if po.current_sets < po.max_sets {
        // Rep ceiling reached - add a set and start the reps over
        po.current_sets += 1;
        po.current_reps = po.start_reps;
        tracing::debug!(
            "Reps progression: added set ({} sets), reset reps to {}",
            po.current_sets,
            po.current_reps
        );
    } else {
        po.current_sets = po.max_sets;
        po.current_reps = po.max_reps;
        tracing::debug!(
            "Reps progression: at max ({} x {})",
            po.max_sets,
            po.max_reps
        );
    }

    before != (po.current_sets, po.current_reps)
}

/// Advance a time overload by one step
///
/// Returns true if the target changed.
pub fn advance_time(po: &mut TimeOverload) -> bool {
    let before = po.current_target;
    po.current_target = po.max.min(po.current_target.saturating_add(po.increment));
    tracing::debug!(
        "Time progression: target {} -> {} {}",
        before,
        po.current_target,
        po.unit
    );
    before != po.current_target
}

/// Advance progressive overload after a completion
///
/// Weekly-rate overload that already advanced during `week` is left
/// untouched. Otherwise the week is recorded and one step is applied.
/// Returns true if the target changed.
pub fn advance_progressive_overload(po: &mut ProgressiveOverload, week: &str) -> bool {
    if po.rate() == ProgressionRate::Weekly {
        if po.last_progression_week() == Some(week) {
            tracing::debug!("Weekly progression already applied for {}", week);
            return false;
        }
        let marker = Some(week.to_string());
        match po {
            ProgressiveOverload::Reps(reps) => reps.last_progression_week = marker,
            ProgressiveOverload::Time(time) => time.last_progression_week = marker,
        }
    }

    match po {
        ProgressiveOverload::Reps(reps) => advance_reps(reps),
        ProgressiveOverload::Time(time) => advance_time(time),
    }
}

/// Human-readable current target, e.g. `3 x 10 reps` or `45 min`
pub fn overload_target_label(po: &ProgressiveOverload) -> String {
    match po {
        ProgressiveOverload::Reps(reps) => {
            format!("{} x {} reps", reps.current_sets, reps.current_reps)
        }
        ProgressiveOverload::Time(time) => format!("{} {}", time.current_target, time.unit),
    }
}

/// Short status line describing where the overload is heading
pub fn overload_status_label(po: &ProgressiveOverload) -> String {
    let rate = match po.rate() {
        ProgressionRate::Weekly => "/week",
        ProgressionRate::Session => "/session",
    };
    match po {
        ProgressiveOverload::Reps(reps) => format!(
            "Progressive ({}): {}x{} -> {}x{}",
            rate, reps.current_sets, reps.current_reps, reps.max_sets, reps.max_reps
        ),
        ProgressiveOverload::Time(time) => format!(
            "Progressive ({}): {} -> {} {}",
            rate, time.current_target, time.max, time.unit
        ),
    }
}
