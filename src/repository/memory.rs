use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::{CongestionRepository, RepoResult, RepositoryError};
use crate::geo::{BoundingBox, GeoPoint};
use crate::models::{
    CongestionDetection, CongestionZone, DetectionClosure, DetectionKey, NavigationStatus,
    NewDetection, Port,
};

/// Process-local repository. Used by tests and by embedders that keep the
/// catalog in memory.
pub struct InMemoryRepository {
    ports: RwLock<Vec<Port>>,
    zones: RwLock<Vec<CongestionZone>>,
    detections: DashMap<Uuid, CongestionDetection>,
    // (vessel, port) -> id of the active detection; the uniqueness guard.
    active: DashMap<DetectionKey, Uuid>,
    offline: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            ports: RwLock::new(Vec::new()),
            zones: RwLock::new(Vec::new()),
            detections: DashMap::new(),
            active: DashMap::new(),
            offline: AtomicBool::new(false),
        }
    }

    pub fn with_catalog(ports: Vec<Port>, zones: Vec<CongestionZone>) -> Self {
        let repo = Self::new();
        *repo.ports.write() = ports;
        *repo.zones.write() = zones;
        repo
    }

    pub fn add_port(&self, port: Port) {
        self.ports.write().push(port);
    }

    pub fn add_zone(&self, zone: CongestionZone) {
        self.zones.write().push(zone);
    }

    /// Toggle a zone without deleting it. Returns `false` if the id is unknown.
    pub fn set_zone_active(&self, zone_id: &str, active: bool) -> bool {
        let mut zones = self.zones.write();
        match zones.iter_mut().find(|z| z.id == zone_id) {
            Some(zone) => {
                zone.is_active = active;
                true
            }
            None => false,
        }
    }

    /// Simulate a storage outage: every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn detection(&self, id: Uuid) -> Option<CongestionDetection> {
        self.detections.get(&id).map(|d| d.clone())
    }

    pub fn detections(&self) -> Vec<CongestionDetection> {
        let mut all: Vec<CongestionDetection> =
            self.detections.iter().map(|d| d.value().clone()).collect();
        all.sort_by_key(|d| (d.detected_at, d.id));
        all
    }

    fn ensure_online(&self) -> RepoResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CongestionRepository for InMemoryRepository {
    async fn find_ports_near(&self, bbox: BoundingBox) -> RepoResult<Vec<Port>> {
        self.ensure_online()?;
        Ok(self
            .ports
            .read()
            .iter()
            .filter(|p| bbox.contains(&p.centroid))
            .cloned()
            .collect())
    }

    async fn find_active_zones(&self, port_id: &str) -> RepoResult<Vec<CongestionZone>> {
        self.ensure_online()?;
        let mut zones: Vec<CongestionZone> = self
            .zones
            .read()
            .iter()
            .filter(|z| z.port_id == port_id && z.is_active)
            .cloned()
            .collect();
        // sort_by is stable, so equal priorities keep insertion order
        zones.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(zones)
    }

    async fn find_active_detection(
        &self,
        vessel_id: &str,
        port_id: &str,
    ) -> RepoResult<Option<CongestionDetection>> {
        self.ensure_online()?;
        let id = match self.active.get(&DetectionKey::new(vessel_id, port_id)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.detection(id).filter(|d| d.is_active))
    }

    async fn count_active_in_zone(&self, zone_id: &str) -> RepoResult<u32> {
        self.ensure_online()?;
        let count = self
            .detections
            .iter()
            .filter(|d| d.is_active && d.zone_id == zone_id)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create_detection(&self, record: NewDetection) -> RepoResult<CongestionDetection> {
        self.ensure_online()?;
        let key = DetectionKey::new(&record.vessel_id, &record.port_id);
        match self.active.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RepositoryError::Conflict {
                vessel_id: record.vessel_id,
                port_id: record.port_id,
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let detection = record.into_detection(Uuid::new_v4(), Utc::now());
                self.detections.insert(detection.id, detection.clone());
                slot.insert(detection.id);
                Ok(detection)
            }
        }
    }

    async fn update_detection_position(
        &self,
        id: Uuid,
        position: GeoPoint,
        navigation_status: NavigationStatus,
    ) -> RepoResult<()> {
        self.ensure_online()?;
        if let Some(mut detection) = self.detections.get_mut(&id) {
            if detection.is_active {
                detection.last_position = position;
                detection.navigation_status = navigation_status;
            }
        }
        Ok(())
    }

    async fn close_detection(&self, id: Uuid, closure: DetectionClosure) -> RepoResult<bool> {
        self.ensure_online()?;
        let key = {
            let Some(mut detection) = self.detections.get_mut(&id) else {
                return Ok(false);
            };
            if !detection.is_active {
                return Ok(false);
            }
            detection.is_active = false;
            detection.departure_time = Some(closure.departure_time);
            detection.wait_time_hours = Some(closure.wait_time_hours);
            detection.estimated_detention_cost = Some(closure.estimated_detention_cost);
            detection.value().key()
        };
        // detections guard is released before touching the index
        self.active.remove_if(&key, |_, active_id| *active_id == id);
        Ok(true)
    }

    async fn find_all_active_for_vessel(
        &self,
        vessel_id: &str,
    ) -> RepoResult<Vec<CongestionDetection>> {
        self.ensure_online()?;
        let mut active: Vec<CongestionDetection> = self
            .detections
            .iter()
            .filter(|d| d.is_active && d.vessel_id == vessel_id)
            .map(|d| d.value().clone())
            .collect();
        active.sort_by_key(|d| d.arrival_time);
        Ok(active)
    }
}
