use crate::geo::{BoundingBox, GeoPoint};
use crate::models::Port;
use crate::repository::{CongestionRepository, RepoResult};

pub const DEFAULT_SEARCH_RADIUS_NM: f64 = 50.0;
pub const DEFAULT_BBOX_DEGREES: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct PortMatch {
    pub port: Port,
    pub distance_nm: f64,
}

/// Finds the single nearest port to a position.
#[derive(Debug, Clone, Copy)]
pub struct PortLocator {
    /// Matches must be strictly closer than this.
    pub radius_nm: f64,
    /// Half-width of the pre-filter box.
    pub bbox_degrees: f64,
}

impl PortLocator {
    pub fn new(radius_nm: f64, bbox_degrees: f64) -> Self {
        Self {
            radius_nm,
            bbox_degrees,
        }
    }

    pub async fn locate(
        &self,
        repo: &dyn CongestionRepository,
        position: &GeoPoint,
    ) -> RepoResult<Option<PortMatch>> {
        let bbox = BoundingBox::around(position, self.bbox_degrees);
        let candidates = repo.find_ports_near(bbox).await?;
        tracing::trace!(candidates = candidates.len(), "ports in pre-filter box");
        Ok(self.nearest(candidates, position))
    }

    /// First minimum wins on ties.
    pub fn nearest(&self, candidates: Vec<Port>, position: &GeoPoint) -> Option<PortMatch> {
        let mut best: Option<PortMatch> = None;
        for port in candidates {
            let distance_nm = port.centroid.distance_nm(position);
            let closer = match &best {
                Some(current) => distance_nm < current.distance_nm,
                None => true,
            };
            if closer {
                best = Some(PortMatch { port, distance_nm });
            }
        }
        best.filter(|m| m.distance_nm < self.radius_nm)
    }
}

impl Default for PortLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_RADIUS_NM, DEFAULT_BBOX_DEGREES)
    }
}
