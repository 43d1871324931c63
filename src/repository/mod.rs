pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::geo::{BoundingBox, GeoPoint};
use crate::models::{
    CongestionDetection, CongestionZone, DetectionClosure, NavigationStatus, NewDetection, Port,
};

pub use memory::InMemoryRepository;
pub use postgres::PgCongestionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The storage-side uniqueness rule on active detections was violated.
    #[error("an active detection already exists for vessel {vessel_id} at port {port_id}")]
    Conflict { vessel_id: String, port_id: String },

    #[error("corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Storage seam for the detector. Implementations must reject a second
/// active detection for the same (vessel, port) with
/// [`RepositoryError::Conflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CongestionRepository: Send + Sync {
    async fn find_ports_near(&self, bbox: BoundingBox) -> RepoResult<Vec<Port>>;

    /// Active zones of a port, priority descending, ties in stable catalog order.
    async fn find_active_zones(&self, port_id: &str) -> RepoResult<Vec<CongestionZone>>;

    async fn find_active_detection(
        &self,
        vessel_id: &str,
        port_id: &str,
    ) -> RepoResult<Option<CongestionDetection>>;

    async fn count_active_in_zone(&self, zone_id: &str) -> RepoResult<u32>;

    async fn create_detection(&self, record: NewDetection) -> RepoResult<CongestionDetection>;

    async fn update_detection_position(
        &self,
        id: Uuid,
        position: GeoPoint,
        navigation_status: NavigationStatus,
    ) -> RepoResult<()>;

    /// Returns `false` when the detection was not active (already closed or missing).
    async fn close_detection(&self, id: Uuid, closure: DetectionClosure) -> RepoResult<bool>;

    async fn find_all_active_for_vessel(
        &self,
        vessel_id: &str,
    ) -> RepoResult<Vec<CongestionDetection>>;
}
