//! Day rollover and streak tracking.

use crate::calendar::{date_key, previous_date_key};
use crate::PlayerState;
use chrono::{DateTime, Utc};

/// Roll the player's day forward to `now`
///
/// The first rollover of a new day looks at yesterday: any completion
/// extends the current streak, while a gap of more than a day resets it.
/// Returns whether the state changed.
pub fn roll_day(state: &mut PlayerState, now: DateTime<Utc>) -> bool {
    let today = date_key(now);

    let Some(last_date) = state.last_date.as_deref() else {
        state.last_date = Some(today);
        return true;
    };

    if last_date == today {
        return false;
    }

    let yesterday = previous_date_key(now);
    let trained_yesterday = state
        .completions
        .get(&yesterday)
        .is_some_and(|records| !records.is_empty());

    let stats = &mut state.stats;
    if trained_yesterday {
        stats.current_streak += 1;
        stats.longest_streak = stats.longest_streak.max(stats.current_streak);
        tracing::debug!("Streak extended to {}", stats.current_streak);
    } else if last_date != yesterday {
        if stats.current_streak > 0 {
            tracing::info!("Streak of {} days broken", stats.current_streak);
        }
        stats.current_streak = 0;
    }

    state.last_date = Some(today);
    true
}
