//! Player level derivation.
//!
//! Level is a pure function of total XP, shared by the scheduler (to
//! report level-ups) and the business engine (to gate unlocks and
//! upgrades).

use serde::Serialize;

/// XP needed per player level
pub const XP_PER_LEVEL: u64 = 100;

/// Player level for a total XP amount
pub fn player_level(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL).unwrap_or(u32::MAX)
}

/// XP gathered inside the current level
pub fn xp_progress(xp: u64) -> u64 {
    xp % XP_PER_LEVEL
}

/// XP still missing to reach the next level
pub fn xp_to_next_level(xp: u64) -> u64 {
    XP_PER_LEVEL - xp_progress(xp)
}

/// A level increase caused by an XP-granting command
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub previous: u32,
    pub current: u32,
    /// Businesses now purchasable (unlocked and not yet owned)
    pub unlocks: Vec<String>,
}

/// Compare levels around an XP change; `Some((previous, current))` on level-up
pub fn detect_level_up(xp_before: u64, xp_after: u64) -> Option<(u32, u32)> {
    let previous = player_level(xp_before);
    let current = player_level(xp_after);
    (current > previous).then_some((previous, current))
}
