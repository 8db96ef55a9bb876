//! Attendance statistics derived from a meeting's participants.

use serde::Serialize;

use crate::backend::Participant;

/// Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedStats {
    /// Every participant, with or without a recorded duration.
    pub total_participants: usize,
    pub avg_duration_seconds: Option<f64>,
    pub min_duration_seconds: Option<i64>,
    pub max_duration_seconds: Option<i64>,
    pub total_duration_seconds: Option<i64>,
}

/// Aggregate participant durations.
///
/// Participants without a duration count toward the total but are left out
/// of every duration figure. A recorded duration of zero is still a duration.
/// A total too large for `i64` is reported as absent.
pub fn compute_stats(participants: &[Participant]) -> DerivedStats {
    let durations: Vec<i64> = participants
        .iter()
        .filter_map(|p| p.duration_seconds)
        .collect();

    // Summed wide so pathological durations cannot overflow.
    let sum: i128 = durations.iter().map(|&d| i128::from(d)).sum();
    let has_durations = !durations.is_empty();

    DerivedStats {
        total_participants: participants.len(),
        avg_duration_seconds: has_durations.then(|| sum as f64 / durations.len() as f64),
        min_duration_seconds: durations.iter().copied().min(),
        max_duration_seconds: durations.iter().copied().max(),
        total_duration_seconds: has_durations
            .then(|| i64::try_from(sum).ok())
            .flatten(),
    }
}

/// `"1h 05m"`, `"12m 30s"`, `"45s"`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
