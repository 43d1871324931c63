use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{
    CongestionDetection, CongestionLevel, CongestionZone, DepartureSignal, DetectionClosure,
    DetectionKey, NavigationStatus, NewDetection, PositionUpdate,
};
use crate::repository::{CongestionRepository, RepositoryError};
use crate::services::classifier::classify;
use crate::services::detention::{wait_hours, DetentionTariff};
use crate::services::events::{DetectionEvent, EventPublisher};
use crate::services::lock_manager::KeyedLocks;
use crate::services::port_locator::PortLocator;
use crate::services::zone_resolver::resolve_zone;

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub locator: PortLocator,
    pub tariff: DetentionTariff,
    /// Statuses that count as waiting in a zone.
    pub stationary: HashSet<NavigationStatus>,
    /// Classify arrivals on the occupancy including the arriving vessel.
    /// Off by default: the level reflects the vessels already waiting, so
    /// 9 waiting against `high = 10` is MODERATE unless this is set.
    pub include_arriving_vessel: bool,
}

impl DetectorSettings {
    pub fn is_stationary(&self, status: NavigationStatus) -> bool {
        self.stationary.contains(&status)
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            locator: PortLocator::default(),
            tariff: DetentionTariff::default(),
            stationary: [NavigationStatus::AtAnchor, NavigationStatus::Moored]
                .into_iter()
                .collect(),
            include_arriving_vessel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IgnoreReason {
    InvalidPosition,
    NotStationary(NavigationStatus),
    NoPort,
    NoZone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionOutcome {
    Ignored(IgnoreReason),
    Opened(CongestionDetection),
    Refreshed { detection_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedDetection {
    pub detection_id: Uuid,
    pub vessel_id: String,
    pub port_id: String,
    pub zone_id: String,
    pub arrival_time: DateTime<Utc>,
    pub closure: DetectionClosure,
}

/// Live occupancy of a zone, classified against its thresholds right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStatus {
    pub zone_id: String,
    pub active_vessels: u32,
    pub level: CongestionLevel,
}

/// Per-(vessel, port) stay tracker.
///
/// NONE -> ACTIVE on the first stationary report inside a zone, ACTIVE ->
/// NONE on a departure signal. While ACTIVE, further reports only refresh
/// position and status; zone and congestion level stay as recorded on
/// arrival.
pub struct CongestionDetector {
    repo: Arc<dyn CongestionRepository>,
    settings: DetectorSettings,
    locks: KeyedLocks,
    events: EventPublisher,
}

impl CongestionDetector {
    pub fn new(
        repo: Arc<dyn CongestionRepository>,
        settings: DetectorSettings,
        events: EventPublisher,
    ) -> Self {
        Self {
            repo,
            settings,
            locks: KeyedLocks::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DetectionEvent> {
        self.events.subscribe()
    }

    #[tracing::instrument(skip_all, fields(vessel_id = %update.vessel_id))]
    pub async fn process_position(
        &self,
        update: &PositionUpdate,
    ) -> Result<PositionOutcome, EngineError> {
        if !update.position.is_valid() {
            tracing::debug!(lat = update.position.lat, lon = update.position.lon, "invalid position");
            return Ok(PositionOutcome::Ignored(IgnoreReason::InvalidPosition));
        }
        if !self.settings.is_stationary(update.navigation_status) {
            return Ok(PositionOutcome::Ignored(IgnoreReason::NotStationary(
                update.navigation_status,
            )));
        }

        let repo = self.repo.as_ref();
        let Some(port_match) = self.settings.locator.locate(repo, &update.position).await? else {
            tracing::debug!("no port within range");
            return Ok(PositionOutcome::Ignored(IgnoreReason::NoPort));
        };
        let port = port_match.port;

        let Some(zone) = resolve_zone(repo, &port.id, &update.position).await? else {
            tracing::debug!(port_id = %port.id, "position outside every active zone");
            return Ok(PositionOutcome::Ignored(IgnoreReason::NoZone));
        };

        let key = DetectionKey::new(&update.vessel_id, &port.id);
        let _guard = self.locks.lock(&key).await;

        if let Some(existing) = repo.find_active_detection(&key.vessel_id, &key.port_id).await? {
            return self.refresh(&existing, update).await;
        }

        let vessel_count = repo.count_active_in_zone(&zone.id).await?;
        let occupancy = if self.settings.include_arriving_vessel {
            vessel_count.saturating_add(1)
        } else {
            vessel_count
        };
        let level = classify(&zone.thresholds, occupancy);
        let record = NewDetection {
            vessel_id: update.vessel_id.clone(),
            port_id: port.id.clone(),
            zone_id: zone.id.clone(),
            arrival_time: update.timestamp,
            navigation_status: update.navigation_status,
            position: update.position,
            vessel_count_at_arrival: vessel_count,
            congestion_level: level,
        };

        match repo.create_detection(record).await {
            Ok(detection) => {
                tracing::info!(
                    detection_id = %detection.id,
                    port = %port.locode,
                    zone = %zone.name,
                    vessel_count,
                    level = %level,
                    "congestion detection opened"
                );
                self.events.publish(DetectionEvent::Arrival {
                    detection_id: detection.id,
                    vessel_id: detection.vessel_id.clone(),
                    port_id: detection.port_id.clone(),
                    zone_id: detection.zone_id.clone(),
                    arrival_time: detection.arrival_time,
                    vessel_count_at_arrival: detection.vessel_count_at_arrival,
                    congestion_level: detection.congestion_level,
                });
                Ok(PositionOutcome::Opened(detection))
            }
            Err(conflict @ RepositoryError::Conflict { .. }) => {
                // Another writer opened the stay first; fold into its record.
                tracing::warn!(key = %key, "active detection created concurrently");
                match repo.find_active_detection(&key.vessel_id, &key.port_id).await? {
                    Some(existing) => self.refresh(&existing, update).await,
                    None => Err(conflict.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn refresh(
        &self,
        existing: &CongestionDetection,
        update: &PositionUpdate,
    ) -> Result<PositionOutcome, EngineError> {
        self.repo
            .update_detection_position(existing.id, update.position, update.navigation_status)
            .await?;
        tracing::debug!(detection_id = %existing.id, "position refreshed");
        Ok(PositionOutcome::Refreshed {
            detection_id: existing.id,
        })
    }

    /// Closes every active detection of the vessel, whatever the port.
    #[tracing::instrument(skip_all, fields(vessel_id = %signal.vessel_id))]
    pub async fn process_departure(
        &self,
        signal: &DepartureSignal,
    ) -> Result<Vec<ClosedDetection>, EngineError> {
        let active = self
            .repo
            .find_all_active_for_vessel(&signal.vessel_id)
            .await?;
        if active.is_empty() {
            tracing::debug!("departure for vessel without active detection");
            return Ok(Vec::new());
        }

        let mut closed = Vec::with_capacity(active.len());
        for detection in active {
            let _guard = self.locks.lock(&detection.key()).await;

            let hours = wait_hours(detection.arrival_time, signal.departure_time);
            let closure = DetectionClosure {
                departure_time: signal.departure_time,
                wait_time_hours: hours,
                estimated_detention_cost: self.settings.tariff.cost_for(hours),
            };
            if !self.repo.close_detection(detection.id, closure).await? {
                tracing::debug!(detection_id = %detection.id, "detection already closed");
                continue;
            }

            tracing::info!(
                detection_id = %detection.id,
                port_id = %detection.port_id,
                wait_time_hours = hours,
                cost = closure.estimated_detention_cost,
                "congestion detection closed"
            );
            self.events.publish(DetectionEvent::Departure {
                detection_id: detection.id,
                vessel_id: detection.vessel_id.clone(),
                port_id: detection.port_id.clone(),
                zone_id: detection.zone_id.clone(),
                departure_time: closure.departure_time,
                wait_time_hours: closure.wait_time_hours,
                estimated_detention_cost: closure.estimated_detention_cost,
            });
            closed.push(ClosedDetection {
                detection_id: detection.id,
                vessel_id: detection.vessel_id,
                port_id: detection.port_id,
                zone_id: detection.zone_id,
                arrival_time: detection.arrival_time,
                closure,
            });
        }
        Ok(closed)
    }

    pub async fn zone_status(&self, zone: &CongestionZone) -> Result<ZoneStatus, EngineError> {
        let active_vessels = self.repo.count_active_in_zone(&zone.id).await?;
        Ok(ZoneStatus {
            zone_id: zone.id.clone(),
            active_vessels,
            level: classify(&zone.thresholds, active_vessels),
        })
    }
}
