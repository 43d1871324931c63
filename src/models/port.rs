use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Port reference data. Maintained by the external catalog, read-only here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    /// UN/LOCODE, e.g. `NLRTM`.
    pub locode: String,
    pub name: String,
    pub centroid: GeoPoint,
}

impl Port {
    pub fn new(id: &str, locode: &str, name: &str, lat: f64, lon: f64) -> Self {
        Self {
            id: id.to_string(),
            locode: locode.to_string(),
            name: name.to_string(),
            centroid: GeoPoint::new(lat, lon),
        }
    }
}
