pub mod detection;
pub mod port;
pub mod vessel;
pub mod zone;

pub use crate::geo::GeoPoint;
pub use detection::{
    CongestionDetection, CongestionLevel, DetectionClosure, DetectionKey, NewDetection,
};
pub use port::Port;
pub use vessel::{DepartureSignal, IngestMessage, NavigationStatus, PositionUpdate};
pub use zone::{CapacityThresholds, CongestionZone, ZoneType};
