use chrono::{DateTime, Utc};

pub const DEFAULT_DAY_RATE: f64 = 10_000.0;

/// Flat daily rate applied to waiting time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetentionTariff {
    pub day_rate: f64,
}

impl DetentionTariff {
    pub fn new(day_rate: f64) -> Self {
        Self { day_rate }
    }

    pub fn cost_for(&self, wait_hours: f64) -> f64 {
        wait_hours / 24.0 * self.day_rate
    }
}

impl Default for DetentionTariff {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_RATE)
    }
}

/// Unrounded hours between arrival and departure. Departures reported
/// before the arrival clamp to zero.
pub fn wait_hours(arrival: DateTime<Utc>, departure: DateTime<Utc>) -> f64 {
    let millis = (departure - arrival).num_milliseconds();
    (millis as f64 / 3_600_000.0).max(0.0)
}
