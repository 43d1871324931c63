use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::CongestionLevel;

pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Lifecycle of a detection, published after the repository write succeeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectionEvent {
    Arrival {
        detection_id: Uuid,
        vessel_id: String,
        port_id: String,
        zone_id: String,
        arrival_time: DateTime<Utc>,
        vessel_count_at_arrival: u32,
        congestion_level: CongestionLevel,
    },
    Departure {
        detection_id: Uuid,
        vessel_id: String,
        port_id: String,
        zone_id: String,
        departure_time: DateTime<Utc>,
        wait_time_hours: f64,
        estimated_detention_cost: f64,
    },
}

impl DetectionEvent {
    pub fn detection_id(&self) -> Uuid {
        match self {
            DetectionEvent::Arrival { detection_id, .. }
            | DetectionEvent::Departure { detection_id, .. } => *detection_id,
        }
    }
}

pub struct EventPublisher {
    sender: broadcast::Sender<DetectionEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Having no subscribers is normal; the event is simply dropped.
    pub fn publish(&self, event: DetectionEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            tracing::trace!(detection_id = %event.detection_id(), "no event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
