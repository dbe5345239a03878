//! Streak, XP and rank calculations.
//!
//! All functions are pure; callers persist the values they return.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// XP awarded for finishing a learning material.
pub const TOPIC_COMPLETION_XP: u32 = 50;
/// XP awarded for finishing a flashcard deck.
pub const FLASHCARD_COMPLETION_XP: u32 = 30;

/// XP added to the milestone once past the top rank.
const MILESTONE_STEP: u32 = 500;

/// Quiz XP tiers, highest first: (minimum percent, xp).
const QUIZ_TIERS: [(u32, u32); 3] = [(90, 100), (70, 70), (50, 50)];
const QUIZ_BASE_XP: u32 = 30;

/// Learner rank derived from total XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Pemula,
    Menengah,
    Ahli,
    Master,
}

impl Rank {
    pub const ALL: [Rank; 4] = [Rank::Pemula, Rank::Menengah, Rank::Ahli, Rank::Master];

    /// Minimum XP for this rank.
    pub fn threshold(self) -> u32 {
        match self {
            Self::Pemula => 0,
            Self::Menengah => 200,
            Self::Ahli => 500,
            Self::Master => 1000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pemula => "Pemula",
            Self::Menengah => "Menengah",
            Self::Ahli => "Ahli",
            Self::Master => "Master",
        }
    }
}

/// Next streak value given the last activity and the current time.
///
/// Days are compared in `now`'s timezone. Same day keeps the streak, the
/// previous day extends it, anything else restarts it at 1.
pub fn update_streak<Tz: TimeZone>(
    current: u32,
    last_activity: Option<DateTime<Utc>>,
    now: DateTime<Tz>,
) -> u32 {
    let Some(last) = last_activity else {
        return 1;
    };

    let today = now.date_naive();
    let last_day = last.with_timezone(&now.timezone()).date_naive();

    if last_day == today {
        current
    } else if today.pred_opt() == Some(last_day) {
        current.saturating_add(1)
    } else {
        1
    }
}

/// [`update_streak`] against the local calendar.
pub fn update_streak_local(current: u32, last_activity: Option<DateTime<Utc>>) -> u32 {
    update_streak(current, last_activity, Local::now())
}

/// XP reward for a quiz score.
///
/// `total` must be non-zero.
pub fn xp_for_quiz(score: u32, total: u32) -> u32 {
    debug_assert!(total > 0, "xp_for_quiz requires at least one question");
    if total == 0 {
        return QUIZ_BASE_XP;
    }

    let percent = u64::from(score) * 100 / u64::from(total);
    QUIZ_TIERS
        .iter()
        .find(|(min, _)| percent >= u64::from(*min))
        .map(|(_, xp)| *xp)
        .unwrap_or(QUIZ_BASE_XP)
}

/// Highest rank whose threshold does not exceed `xp`.
pub fn rank_for_xp(xp: u32) -> Rank {
    Rank::ALL
        .iter()
        .rev()
        .copied()
        .find(|rank| xp >= rank.threshold())
        .unwrap_or(Rank::Pemula)
}

/// Next threshold strictly above `xp`, or `xp + 500` past the top rank.
pub fn next_milestone(xp: u32) -> u32 {
    Rank::ALL
        .iter()
        .map(|rank| rank.threshold())
        .find(|threshold| *threshold > xp)
        .unwrap_or_else(|| xp.saturating_add(MILESTONE_STEP))
}

/// Fraction (0.0..=1.0) of the way from the current rank threshold to the
/// next milestone.
pub fn milestone_progress(xp: u32) -> f64 {
    let base = rank_for_xp(xp).threshold();
    let target = next_milestone(xp);
    if target <= base {
        return 1.0;
    }
    (f64::from(xp - base) / f64::from(target - base)).clamp(0.0, 1.0)
}
