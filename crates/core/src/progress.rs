//! Pure progress arithmetic shared by the record model and the services.

use chrono::NaiveDate;

use crate::model::TopicProgress;

/// Upper bound of every percentage field.
pub const MAX_PERCENT: u8 = 100;

/// Clamps any integer into `[0, 100]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_PERCENT)) as u8
}

/// Rounds half away from zero and clamps into `[0, 100]`.
#[must_use]
pub fn round_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round() as i64;
    clamp_percent(rounded)
}

/// Unweighted mean of topic progress, rounded to the nearest integer.
///
/// Returns `0` for an empty topic list.
#[must_use]
pub fn overall_progress(topics: &[TopicProgress]) -> u8 {
    if topics.is_empty() {
        return 0;
    }
    let sum: u64 = topics.iter().map(|t| u64::from(t.progress)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / topics.len() as f64;
    round_percent(mean)
}

/// Streak after completing a session on `today`.
///
/// - no previous session: 1
/// - previous session on the same calendar day: unchanged (at least 1)
/// - previous session exactly one day earlier: incremented
/// - any other gap: reset to 1
#[must_use]
pub fn next_streak(last_session: Option<NaiveDate>, streak: u32, today: NaiveDate) -> u32 {
    let Some(last) = last_session else {
        return 1;
    };
    match today.signed_duration_since(last).num_days() {
        0 => streak.max(1),
        1 => streak.saturating_add(1),
        _ => 1,
    }
}

/// Derived scores of a single practice session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionScore {
    pub attempted: u32,
    pub accuracy: f64,
    pub progress_bump: u8,
    pub recent_score: u8,
}

impl SessionScore {
    /// Scores a session from its answer counts.
    ///
    /// Accuracy is `0` when nothing was attempted. The progress bump never
    /// exceeds `max_bump`, however many questions were answered.
    #[must_use]
    pub fn from_counts(correct: u32, incorrect: u32, max_bump: u8) -> Self {
        let attempted = correct.saturating_add(incorrect);
        let accuracy = if attempted == 0 {
            0.0
        } else {
            f64::from(correct) / f64::from(attempted)
        };
        Self {
            attempted,
            accuracy,
            progress_bump: round_percent(accuracy * f64::from(max_bump)),
            recent_score: round_percent(accuracy * f64::from(MAX_PERCENT)),
        }
    }
}
