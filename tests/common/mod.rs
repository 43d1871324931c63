#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use harborwatch::geo::GeoPoint;
use harborwatch::models::{
    CapacityThresholds, CongestionZone, DepartureSignal, NavigationStatus, Port, PositionUpdate,
    ZoneType,
};
use harborwatch::{CongestionDetector, DetectorSettings, EventPublisher, InMemoryRepository};

pub const PORT_RTM: &str = "port-nlrtm";
pub const PORT_ANR: &str = "port-beanr";
pub const ZONE_APPROACH: &str = "zone-maas-approach";
pub const ZONE_ANCHORAGE: &str = "zone-maas-anchorage";
pub const ZONE_SCHELDT: &str = "zone-scheldt-anchorage";

/// Inside the inner anchorage (and therefore the approach too).
pub const IN_ANCHORAGE: GeoPoint = GeoPoint { lat: 51.95, lon: 4.04 };
/// Inside the approach only.
pub const IN_APPROACH: GeoPoint = GeoPoint { lat: 51.88, lon: 4.15 };
/// Near Rotterdam but outside every zone.
pub const NEAR_RTM_NO_ZONE: GeoPoint = GeoPoint { lat: 52.10, lon: 4.05 };
/// Inside the Scheldt anchorage near Antwerp.
pub const IN_SCHELDT: GeoPoint = GeoPoint { lat: 51.30, lon: 4.30 };
/// Mid-Atlantic.
pub const OPEN_SEA: GeoPoint = GeoPoint { lat: 40.0, lon: -30.0 };

pub fn rect(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(lat0, lon0),
        GeoPoint::new(lat0, lon1),
        GeoPoint::new(lat1, lon1),
        GeoPoint::new(lat1, lon0),
    ]
}

pub fn zone(id: &str, port_id: &str, priority: i32, boundary: Vec<GeoPoint>) -> CongestionZone {
    CongestionZone {
        id: id.to_string(),
        port_id: port_id.to_string(),
        name: id.to_string(),
        zone_type: ZoneType::Anchorage,
        boundary,
        priority,
        thresholds: CapacityThresholds::new(5, 10, 20),
        is_active: true,
    }
}

pub fn catalog() -> InMemoryRepository {
    let mut approach = zone(ZONE_APPROACH, PORT_RTM, 1, rect(51.85, 3.90, 52.05, 4.20));
    approach.zone_type = ZoneType::BerthApproach;

    InMemoryRepository::with_catalog(
        vec![
            Port::new(PORT_RTM, "NLRTM", "Rotterdam", 51.95, 4.05),
            Port::new(PORT_ANR, "BEANR", "Antwerp", 51.26, 4.40),
        ],
        vec![
            approach,
            zone(ZONE_ANCHORAGE, PORT_RTM, 5, rect(51.93, 4.00, 51.97, 4.08)),
            zone(ZONE_SCHELDT, PORT_ANR, 1, rect(51.25, 4.20, 51.35, 4.40)),
        ],
    )
}

pub fn detector_with(repo: Arc<InMemoryRepository>, settings: DetectorSettings) -> CongestionDetector {
    CongestionDetector::new(repo, settings, EventPublisher::default())
}

pub fn detector(repo: Arc<InMemoryRepository>) -> CongestionDetector {
    detector_with(repo, DetectorSettings::default())
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
}

pub fn report(vessel: &str, at: GeoPoint, status: NavigationStatus, ts: DateTime<Utc>) -> PositionUpdate {
    PositionUpdate {
        vessel_id: vessel.to_string(),
        position: at,
        navigation_status: status,
        timestamp: ts,
    }
}

pub fn anchored(vessel: &str, at: GeoPoint) -> PositionUpdate {
    report(vessel, at, NavigationStatus::AtAnchor, t0())
}

pub fn departure(vessel: &str, at: DateTime<Utc>) -> DepartureSignal {
    DepartureSignal {
        vessel_id: vessel.to_string(),
        departure_time: at,
    }
}
