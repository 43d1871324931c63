//! Vessel congestion detection for port anchorages and approaches.
//!
//! Position reports are matched to the nearest port and its highest-priority
//! congestion zone; stationary vessels open a detection that records the
//! zone's congestion level on arrival, and a departure signal closes it with
//! the wait time and an estimated detention cost.

pub mod config;
pub mod error;
pub mod geo;
pub mod logger;
pub mod models;
pub mod repository;
pub mod services;

pub use error::EngineError;
pub use repository::{CongestionRepository, InMemoryRepository, RepositoryError};
pub use services::detector::{
    ClosedDetection, CongestionDetector, DetectorSettings, IgnoreReason, PositionOutcome,
    ZoneStatus,
};
pub use services::events::{DetectionEvent, EventPublisher};
