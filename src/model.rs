use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored speed observation, as read back for the heatmap.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_difference: i32,
    pub timestamp: DateTime<Utc>,
}

/// A speed observation compared against the posted limit, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub current_speed: i32,
    pub road_speed_limit: i32,
    pub timestamp: Option<DateTime<Utc>>,
}

impl SpeedRecord {
    /// How far above the posted limit the observation was. Driving under the
    /// limit counts as no deviation.
    pub fn speed_difference(&self) -> i32 {
        self.current_speed
            .saturating_sub(self.road_speed_limit)
            .max(0)
    }
}
