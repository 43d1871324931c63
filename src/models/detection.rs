use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::vessel::NavigationStatus;

/// Severity of a zone's occupancy, ordered from least to most congested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CongestionLevel {
    Normal,
    Moderate,
    High,
    Critical,
}

impl CongestionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Normal => "NORMAL",
            CongestionLevel::Moderate => "MODERATE",
            CongestionLevel::High => "HIGH",
            CongestionLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown congestion level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for CongestionLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(CongestionLevel::Normal),
            "MODERATE" => Ok(CongestionLevel::Moderate),
            "HIGH" => Ok(CongestionLevel::High),
            "CRITICAL" => Ok(CongestionLevel::Critical),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

/// A vessel's stay in a congestion zone.
///
/// At most one record per (vessel, port) has `is_active == true`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CongestionDetection {
    pub id: Uuid,
    pub vessel_id: String,
    pub port_id: String,
    pub zone_id: String,
    pub detected_at: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub navigation_status: NavigationStatus,
    pub last_position: GeoPoint,
    /// Active detections already in the zone when this vessel arrived.
    pub vessel_count_at_arrival: u32,
    pub congestion_level: CongestionLevel,
    pub is_active: bool,
    pub departure_time: Option<DateTime<Utc>>,
    pub wait_time_hours: Option<f64>,
    pub estimated_detention_cost: Option<f64>,
}

impl CongestionDetection {
    pub fn key(&self) -> DetectionKey {
        DetectionKey::new(&self.vessel_id, &self.port_id)
    }
}

/// Fields supplied by the detector when opening a stay.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDetection {
    pub vessel_id: String,
    pub port_id: String,
    pub zone_id: String,
    pub arrival_time: DateTime<Utc>,
    pub navigation_status: NavigationStatus,
    pub position: GeoPoint,
    pub vessel_count_at_arrival: u32,
    pub congestion_level: CongestionLevel,
}

impl NewDetection {
    pub fn into_detection(self, id: Uuid, detected_at: DateTime<Utc>) -> CongestionDetection {
        CongestionDetection {
            id,
            vessel_id: self.vessel_id,
            port_id: self.port_id,
            zone_id: self.zone_id,
            detected_at,
            arrival_time: self.arrival_time,
            navigation_status: self.navigation_status,
            last_position: self.position,
            vessel_count_at_arrival: self.vessel_count_at_arrival,
            congestion_level: self.congestion_level,
            is_active: true,
            departure_time: None,
            wait_time_hours: None,
            estimated_detention_cost: None,
        }
    }
}

/// Departure fields written when a stay is closed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionClosure {
    pub departure_time: DateTime<Utc>,
    pub wait_time_hours: f64,
    pub estimated_detention_cost: f64,
}

/// Serialization key for the create-or-update sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DetectionKey {
    pub vessel_id: String,
    pub port_id: String,
}

impl DetectionKey {
    pub fn new(vessel_id: &str, port_id: &str) -> Self {
        Self {
            vessel_id: vessel_id.to_string(),
            port_id: port_id.to_string(),
        }
    }
}

impl fmt::Display for DetectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.vessel_id, self.port_id)
    }
}
