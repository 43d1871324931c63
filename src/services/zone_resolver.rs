use crate::geo::GeoPoint;
use crate::models::CongestionZone;
use crate::repository::{CongestionRepository, RepoResult};

/// Highest-priority active zone of `port_id` containing `point`.
pub async fn resolve_zone(
    repo: &dyn CongestionRepository,
    port_id: &str,
    point: &GeoPoint,
) -> RepoResult<Option<CongestionZone>> {
    let zones = repo.find_active_zones(port_id).await?;
    Ok(first_containing(&zones, point).cloned())
}

/// Checks zones by descending priority and returns the first hit. Equal
/// priorities keep the order they were given in. Inactive zones and zones
/// with a degenerate boundary are skipped.
pub fn first_containing<'a>(
    zones: &'a [CongestionZone],
    point: &GeoPoint,
) -> Option<&'a CongestionZone> {
    let mut ordered: Vec<&CongestionZone> = zones.iter().filter(|z| z.is_active).collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    ordered.into_iter().find(|zone| match zone.polygon() {
        Ok(polygon) if polygon.contains(point) => {
            if !zone.thresholds.is_ascending() {
                tracing::warn!(
                    zone_id = %zone.id,
                    thresholds = ?zone.thresholds,
                    "zone capacity thresholds are not ascending"
                );
            }
            true
        }
        Ok(_) => false,
        Err(err) => {
            tracing::warn!(zone_id = %zone.id, error = %err, "skipping zone with malformed boundary");
            false
        }
    })
}
