use crate::models::{CapacityThresholds, CongestionLevel};

/// Highest threshold met wins. Total over every count.
pub fn classify(thresholds: &CapacityThresholds, count: u32) -> CongestionLevel {
    if count >= thresholds.critical {
        CongestionLevel::Critical
    } else if count >= thresholds.high {
        CongestionLevel::High
    } else if count >= thresholds.normal {
        CongestionLevel::Moderate
    } else {
        CongestionLevel::Normal
    }
}
