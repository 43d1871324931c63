//! Geodesy primitives: great-circle distance, polygon containment and the
//! bounding box used to pre-filter the port catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn distance_nm(&self, other: &GeoPoint) -> f64 {
        distance_nm(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Great-circle (haversine) distance in nautical miles.
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push near-antipodal pairs just past 1
    let a = a.clamp(0.0, 1.0);
    EARTH_RADIUS_NM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Crossing-number test of `(lat, lon)` against a closed ring.
///
/// Longitude is the x axis, latitude the y axis. The closing edge from the
/// last vertex back to the first is implicit. Points exactly on the boundary
/// follow the half-open rule: on a left or bottom edge they count as inside,
/// on a right or top edge as outside.
pub fn point_in_polygon(lat: f64, lon: f64, ring: &[GeoPoint]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (yi, xi) = (ring[i].lat, ring[i].lon);
        let (yj, xj) = (ring[j].lat, ring[j].lon);
        if (yi > lat) != (yj > lat) {
            let x_cross = (xj - xi) * (lat - yi) / (yj - yi) + xi;
            if lon < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),
    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),
}

/// A validated simple ring. Construction rejects the degenerate boundaries
/// that reference data occasionally carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<GeoPoint>,
}

impl Polygon {
    pub fn new(ring: &[GeoPoint]) -> Result<Self, GeometryError> {
        if let Some(idx) = ring
            .iter()
            .position(|p| !p.lat.is_finite() || !p.lon.is_finite())
        {
            return Err(GeometryError::NonFiniteVertex(idx));
        }

        let mut vertices = ring.to_vec();
        // GeoJSON-style rings repeat the first vertex at the end.
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        vertices.dedup();

        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }
        Ok(Self { ring: vertices })
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point_in_polygon(point.lat, point.lon, &self.ring)
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.ring
    }
}

/// Latitude/longitude box around a position.
///
/// `min_lon > max_lon` means the box wraps across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(center: &GeoPoint, half_width_deg: f64) -> Self {
        Self {
            min_lat: (center.lat - half_width_deg).max(-90.0),
            max_lat: (center.lat + half_width_deg).min(90.0),
            min_lon: wrap_longitude(center.lon - half_width_deg),
            max_lon: wrap_longitude(center.lon + half_width_deg),
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        if point.lat < self.min_lat || point.lat > self.max_lat {
            return false;
        }
        if self.crosses_antimeridian() {
            point.lon >= self.min_lon || point.lon <= self.max_lon
        } else {
            point.lon >= self.min_lon && point.lon <= self.max_lon
        }
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ]
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        assert_eq!(distance_nm(51.95, 4.05, 51.95, 4.05), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let ab = distance_nm(51.95, 4.05, 53.54, 9.98);
        let ba = distance_nm(53.54, 9.98, 51.95, 4.05);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        // One degree along a meridian is ~60 nm.
        let d = distance_nm(10.0, 20.0, 11.0, 20.0);
        assert!((d - 60.04).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_NM;
        for (lat, lon) in [(0.0, 0.0), (51.95, 4.05), (-33.9, 151.2), (89.9, -179.9)] {
            let d = distance_nm(lat, lon, -lat, lon + 180.0);
            assert!(d.is_finite(), "NaN for ({lat}, {lon})");
            assert!((d - half).abs() < 1e-3, "got {d}");
        }
    }

    #[test]
    fn test_point_in_square() {
        let ring = square();
        assert!(point_in_polygon(0.5, 0.5, &ring));
        assert!(!point_in_polygon(1.5, 0.5, &ring));
        assert!(!point_in_polygon(0.5, -0.2, &ring));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // U shape opening north
        let ring = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(3.0, 3.0),
            GeoPoint::new(3.0, 2.0),
            GeoPoint::new(1.0, 2.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(3.0, 1.0),
            GeoPoint::new(3.0, 0.0),
        ];
        assert!(point_in_polygon(2.0, 0.5, &ring));
        assert!(point_in_polygon(2.0, 2.5, &ring));
        assert!(!point_in_polygon(2.0, 1.5, &ring));
    }

    #[test]
    fn test_polygon_rejects_degenerate_rings() {
        assert_eq!(Polygon::new(&[]), Err(GeometryError::TooFewVertices(0)));
        let two = [GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0), GeoPoint::new(0.0, 0.0)];
        assert_eq!(Polygon::new(&two), Err(GeometryError::TooFewVertices(2)));
        let nan = [GeoPoint::new(0.0, 0.0), GeoPoint::new(f64::NAN, 1.0), GeoPoint::new(1.0, 0.0)];
        assert_eq!(Polygon::new(&nan), Err(GeometryError::NonFiniteVertex(1)));
    }

    #[test]
    fn test_polygon_drops_closing_vertex() {
        let mut ring = square();
        ring.push(ring[0]);
        let polygon = Polygon::new(&ring).unwrap();
        assert_eq!(polygon.vertices().len(), 4);
        assert!(polygon.contains(&GeoPoint::new(0.25, 0.75)));
    }

    #[test]
    fn test_bbox_wraps_antimeridian() {
        let bbox = BoundingBox::around(&GeoPoint::new(-17.0, 179.8), 0.5);
        assert!(bbox.crosses_antimeridian());
        assert!(bbox.contains(&GeoPoint::new(-17.2, -179.9)));
        assert!(bbox.contains(&GeoPoint::new(-16.8, 179.5)));
        assert!(!bbox.contains(&GeoPoint::new(-17.0, 178.0)));
    }

    #[test]
    fn test_invalid_points() {
        assert!(GeoPoint::new(45.0, 10.0).is_valid());
        assert!(!GeoPoint::new(91.0, 10.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }
}
