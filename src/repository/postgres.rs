use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CongestionRepository, RepoResult, RepositoryError};
use crate::geo::{BoundingBox, GeoPoint};
use crate::models::{
    CapacityThresholds, CongestionDetection, CongestionLevel, CongestionZone, DetectionClosure,
    NavigationStatus, NewDetection, Port, ZoneType,
};

const UNIQUE_VIOLATION: &str = "23505";

const DETECTION_COLUMNS: &str = "id, vessel_id, port_id, zone_id, detected_at, arrival_time, \
     navigation_status, last_lat, last_lon, vessel_count_at_arrival, congestion_level, \
     is_active, departure_time, wait_time_hours, estimated_detention_cost";

pub struct PgCongestionRepository {
    pool: PgPool,
}

impl PgCongestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CongestionRepository for PgCongestionRepository {
    async fn find_ports_near(&self, bbox: BoundingBox) -> RepoResult<Vec<Port>> {
        let lon_clause = if bbox.crosses_antimeridian() {
            "(longitude >= $3 OR longitude <= $4)"
        } else {
            "longitude BETWEEN $3 AND $4"
        };
        let sql = format!(
            "SELECT id, locode, name, latitude, longitude FROM ports \
             WHERE latitude BETWEEN $1 AND $2 AND {lon_clause} ORDER BY id"
        );

        let rows = sqlx::query_as::<_, PortRow>(&sql)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(Port::from).collect())
    }

    async fn find_active_zones(&self, port_id: &str) -> RepoResult<Vec<CongestionZone>> {
        let rows = sqlx::query_as::<_, ZoneRow>(
            "SELECT id, port_id, name, zone_type, boundary, priority, normal_capacity, \
             high_capacity, critical_capacity, is_active FROM congestion_zones \
             WHERE port_id = $1 AND is_active ORDER BY priority DESC, id ASC",
        )
        .bind(port_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(CongestionZone::from).collect())
    }

    async fn find_active_detection(
        &self,
        vessel_id: &str,
        port_id: &str,
    ) -> RepoResult<Option<CongestionDetection>> {
        let sql = format!(
            "SELECT {DETECTION_COLUMNS} FROM congestion_detections \
             WHERE vessel_id = $1 AND port_id = $2 AND is_active"
        );
        let row = sqlx::query_as::<_, DetectionRow>(&sql)
            .bind(vessel_id)
            .bind(port_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(CongestionDetection::try_from).transpose()
    }

    async fn count_active_in_zone(&self, zone_id: &str) -> RepoResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM congestion_detections WHERE zone_id = $1 AND is_active",
        )
        .bind(zone_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create_detection(&self, record: NewDetection) -> RepoResult<CongestionDetection> {
        let sql = format!(
            "INSERT INTO congestion_detections ({DETECTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, NULL, NULL, NULL) \
             RETURNING {DETECTION_COLUMNS}"
        );
        let count = i32::try_from(record.vessel_count_at_arrival).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, DetectionRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&record.vessel_id)
            .bind(&record.port_id)
            .bind(&record.zone_id)
            .bind(Utc::now())
            .bind(record.arrival_time)
            .bind(record.navigation_status.as_str())
            .bind(record.position.lat)
            .bind(record.position.lon)
            .bind(count)
            .bind(record.congestion_level.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    RepositoryError::Conflict {
                        vessel_id: record.vessel_id.clone(),
                        port_id: record.port_id.clone(),
                    }
                }
                other => storage_error(other),
            })?;

        CongestionDetection::try_from(row)
    }

    async fn update_detection_position(
        &self,
        id: Uuid,
        position: GeoPoint,
        navigation_status: NavigationStatus,
    ) -> RepoResult<()> {
        sqlx::query(
            "UPDATE congestion_detections SET last_lat = $2, last_lon = $3, navigation_status = $4 \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .bind(position.lat)
        .bind(position.lon)
        .bind(navigation_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn close_detection(&self, id: Uuid, closure: DetectionClosure) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE congestion_detections SET is_active = FALSE, departure_time = $2, \
             wait_time_hours = $3, estimated_detention_cost = $4 \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .bind(closure.departure_time)
        .bind(closure.wait_time_hours)
        .bind(closure.estimated_detention_cost)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_all_active_for_vessel(
        &self,
        vessel_id: &str,
    ) -> RepoResult<Vec<CongestionDetection>> {
        let sql = format!(
            "SELECT {DETECTION_COLUMNS} FROM congestion_detections \
             WHERE vessel_id = $1 AND is_active ORDER BY arrival_time"
        );
        let rows = sqlx::query_as::<_, DetectionRow>(&sql)
            .bind(vessel_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter().map(CongestionDetection::try_from).collect()
    }
}

/// Connection-level failures are reported as `Unavailable`, everything else
/// as a plain database error.
fn storage_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Unavailable(err.to_string())
        }
        other => RepositoryError::Database(other),
    }
}

#[derive(sqlx::FromRow)]
struct PortRow {
    id: String,
    locode: String,
    name: String,
    latitude: f64,
    longitude: f64,
}

impl From<PortRow> for Port {
    fn from(row: PortRow) -> Self {
        Port {
            id: row.id,
            locode: row.locode,
            name: row.name,
            centroid: GeoPoint::new(row.latitude, row.longitude),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ZoneRow {
    id: String,
    port_id: String,
    name: String,
    zone_type: String,
    boundary: serde_json::Value,
    priority: i32,
    normal_capacity: i32,
    high_capacity: i32,
    critical_capacity: i32,
    is_active: bool,
}

impl From<ZoneRow> for CongestionZone {
    fn from(row: ZoneRow) -> Self {
        // An undecodable ring becomes empty; the resolver skips it as malformed.
        let boundary = decode_ring(row.boundary).unwrap_or_else(|err| {
            tracing::warn!(zone_id = %row.id, error = %err, "undecodable zone boundary");
            Vec::new()
        });
        let capacity = |value: i32| u32::try_from(value).unwrap_or(0);

        CongestionZone {
            zone_type: row.zone_type.parse().unwrap_or(ZoneType::Other),
            thresholds: CapacityThresholds::new(
                capacity(row.normal_capacity),
                capacity(row.high_capacity),
                capacity(row.critical_capacity),
            ),
            id: row.id,
            port_id: row.port_id,
            name: row.name,
            boundary,
            priority: row.priority,
            is_active: row.is_active,
        }
    }
}

/// Accepts either `[{"lat":..,"lon":..}, ...]` or GeoJSON-style `[[lon, lat], ...]`.
/// Pairs are tried first: a derived `GeoPoint` would also accept `[a, b]`
/// and read it as `[lat, lon]`.
fn decode_ring(value: serde_json::Value) -> Result<Vec<GeoPoint>, serde_json::Error> {
    if let Ok(pairs) = serde_json::from_value::<Vec<[f64; 2]>>(value.clone()) {
        return Ok(pairs.into_iter().map(|[lon, lat]| GeoPoint::new(lat, lon)).collect());
    }
    serde_json::from_value::<Vec<GeoPoint>>(value)
}

#[derive(sqlx::FromRow)]
struct DetectionRow {
    id: Uuid,
    vessel_id: String,
    port_id: String,
    zone_id: String,
    detected_at: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    navigation_status: String,
    last_lat: f64,
    last_lon: f64,
    vessel_count_at_arrival: i32,
    congestion_level: String,
    is_active: bool,
    departure_time: Option<DateTime<Utc>>,
    wait_time_hours: Option<f64>,
    estimated_detention_cost: Option<f64>,
}

impl TryFrom<DetectionRow> for CongestionDetection {
    type Error = RepositoryError;

    fn try_from(row: DetectionRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| RepositoryError::Corrupt {
            entity: "congestion_detection",
            id: row.id.to_string(),
            reason,
        };
        let navigation_status = row
            .navigation_status
            .parse::<NavigationStatus>()
            .map_err(|e| corrupt(e.to_string()))?;
        let congestion_level = row
            .congestion_level
            .parse::<CongestionLevel>()
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(CongestionDetection {
            id: row.id,
            vessel_id: row.vessel_id,
            port_id: row.port_id,
            zone_id: row.zone_id,
            detected_at: row.detected_at,
            arrival_time: row.arrival_time,
            navigation_status,
            last_position: GeoPoint::new(row.last_lat, row.last_lon),
            vessel_count_at_arrival: u32::try_from(row.vessel_count_at_arrival).unwrap_or(0),
            congestion_level,
            is_active: row.is_active,
            departure_time: row.departure_time,
            wait_time_hours: row.wait_time_hours,
            estimated_detention_cost: row.estimated_detention_cost,
        })
    }
}
