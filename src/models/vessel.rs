use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::GeoPoint;

/// AIS navigation status as reported by the ingest collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationStatus {
    Underway,
    AtAnchor,
    Moored,
    NotUnderCommand,
    RestrictedManoeuvrability,
    ConstrainedByDraught,
    Aground,
    Fishing,
    Sailing,
    Unknown,
}

impl NavigationStatus {
    pub const ALL: [NavigationStatus; 10] = [
        NavigationStatus::Underway,
        NavigationStatus::AtAnchor,
        NavigationStatus::Moored,
        NavigationStatus::NotUnderCommand,
        NavigationStatus::RestrictedManoeuvrability,
        NavigationStatus::ConstrainedByDraught,
        NavigationStatus::Aground,
        NavigationStatus::Fishing,
        NavigationStatus::Sailing,
        NavigationStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationStatus::Underway => "UNDERWAY",
            NavigationStatus::AtAnchor => "AT_ANCHOR",
            NavigationStatus::Moored => "MOORED",
            NavigationStatus::NotUnderCommand => "NOT_UNDER_COMMAND",
            NavigationStatus::RestrictedManoeuvrability => "RESTRICTED_MANOEUVRABILITY",
            NavigationStatus::ConstrainedByDraught => "CONSTRAINED_BY_DRAUGHT",
            NavigationStatus::Aground => "AGROUND",
            NavigationStatus::Fishing => "FISHING",
            NavigationStatus::Sailing => "SAILING",
            NavigationStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for NavigationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown navigation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for NavigationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        NavigationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus(wanted.to_string()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    pub vessel_id: String,
    pub position: GeoPoint,
    pub navigation_status: NavigationStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureSignal {
    pub vessel_id: String,
    pub departure_time: DateTime<Utc>,
}

/// One line of the ingest stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IngestMessage {
    Position(PositionUpdate),
    Departure(DepartureSignal),
}
