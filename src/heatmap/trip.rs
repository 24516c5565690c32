use chrono::TimeDelta;

use crate::model::Sample;

use super::HeatmapError;

/// Splits time-ordered samples into trips wherever two neighbouring samples
/// are more than `time_threshold_minutes` apart.
///
/// Trips borrow from `samples` and together cover all of it, in order.
pub fn segment(
    samples: &[Sample],
    time_threshold_minutes: f64,
) -> Result<Vec<&[Sample]>, HeatmapError> {
    if !(time_threshold_minutes >= 0.0) {
        return Err(HeatmapError::InvalidParameter(format!(
            "time threshold must be a non-negative number of minutes, got {time_threshold_minutes}"
        )));
    }

    let mut trips = Vec::new();
    let mut start = 0;
    for (i, pair) in samples.windows(2).enumerate() {
        let gap = pair[1].timestamp - pair[0].timestamp;
        if gap < TimeDelta::zero() {
            return Err(HeatmapError::Unsorted { index: i + 1 });
        }
        let minutes = gap
            .num_microseconds()
            .map_or(f64::INFINITY, |us| us as f64 / 60_000_000.0);
        if minutes > time_threshold_minutes {
            trips.push(&samples[start..=i]);
            start = i + 1;
        }
    }
    if start < samples.len() {
        trips.push(&samples[start..]);
    }

    Ok(trips)
}
