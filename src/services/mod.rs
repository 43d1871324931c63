pub mod classifier;
pub mod detector;
pub mod detention;
pub mod events;
pub mod ingest;
pub mod lock_manager;
pub mod port_locator;
pub mod zone_resolver;

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::repository::{CongestionRepository, PgCongestionRepository};
use detector::CongestionDetector;
use events::EventPublisher;

/// Wiring for a running engine: pool, repository and detector, built once
/// and passed around explicitly.
pub struct EngineState {
    pub db: PgPool,
    pub config: EngineConfig,
    pub detector: Arc<CongestionDetector>,
}

impl EngineState {
    pub fn new(db: PgPool, config: EngineConfig) -> Self {
        let repo: Arc<dyn CongestionRepository> = Arc::new(PgCongestionRepository::new(db.clone()));
        let detector = Arc::new(CongestionDetector::new(
            repo,
            config.detector_settings(),
            EventPublisher::new(config.event_buffer),
        ));

        Self {
            db,
            config,
            detector,
        }
    }
}
