use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::{GeoPoint, GeometryError, Polygon};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    Anchorage,
    BerthApproach,
    Channel,
    PilotBoarding,
    Other,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Anchorage => "ANCHORAGE",
            ZoneType::BerthApproach => "BERTH_APPROACH",
            ZoneType::Channel => "CHANNEL",
            ZoneType::PilotBoarding => "PILOT_BOARDING",
            ZoneType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = std::convert::Infallible;

    /// Unrecognised catalog tags fall back to `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ANCHORAGE" => ZoneType::Anchorage,
            "BERTH_APPROACH" => ZoneType::BerthApproach,
            "CHANNEL" => ZoneType::Channel,
            "PILOT_BOARDING" => ZoneType::PilotBoarding,
            _ => ZoneType::Other,
        })
    }
}

/// Occupancy boundaries, ascending: normal <= high <= critical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityThresholds {
    pub normal: u32,
    pub high: u32,
    pub critical: u32,
}

impl CapacityThresholds {
    pub fn new(normal: u32, high: u32, critical: u32) -> Self {
        Self { normal, high, critical }
    }

    pub fn is_ascending(&self) -> bool {
        self.normal <= self.high && self.high <= self.critical
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CongestionZone {
    pub id: String,
    pub port_id: String,
    pub name: String,
    pub zone_type: ZoneType,
    /// Ordered (lat, lon) ring; closing edge implicit.
    pub boundary: Vec<GeoPoint>,
    /// Higher priority zones are checked first.
    pub priority: i32,
    pub thresholds: CapacityThresholds,
    pub is_active: bool,
}

impl CongestionZone {
    pub fn polygon(&self) -> Result<Polygon, GeometryError> {
        Polygon::new(&self.boundary)
    }
}
