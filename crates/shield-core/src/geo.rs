//! Geographic types and calculations for tower placement and flight paths

use serde::{Deserialize, Serialize};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic position with latitude and longitude
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check if this position is valid
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Calculate distance to another position using Haversine formula
    /// Returns distance in kilometers
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Interpolate between two positions
    /// fraction: 0.0 = self, 1.0 = other
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        let fraction = fraction.clamp(0.0, 1.0);

        GeoPoint::new(
            self.lat + (other.lat - self.lat) * fraction,
            self.lng + (other.lng - self.lng) * fraction,
        )
    }

    /// Convert to [latitude, longitude] array
    pub fn to_array(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(a: [f64; 2]) -> Self {
        Self::new(a[0], a[1])
    }
}

/// Centroid of a polygon's vertices
pub fn centroid(poly: &[GeoPoint]) -> Option<GeoPoint> {
    if poly.is_empty() {
        return None;
    }
    let n = poly.len() as f64;
    Some(GeoPoint::new(
        poly.iter().map(|p| p.lat).sum::<f64>() / n,
        poly.iter().map(|p| p.lng).sum::<f64>() / n,
    ))
}

/// Check if a position is inside a polygon using ray casting
pub fn polygon_contains(poly: &[GeoPoint], position: &GeoPoint) -> bool {
    if poly.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = poly.len();
    let mut j = n - 1;

    for i in 0..n {
        let vi = &poly[i];
        let vj = &poly[j];

        if ((vi.lng > position.lng) != (vj.lng > position.lng))
            && (position.lat
                < (vj.lat - vi.lat) * (position.lng - vi.lng) / (vj.lng - vi.lng) + vi.lat)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_calculation() {
        // Chitkul to Kalpa (approximately 27 km)
        let chitkul = GeoPoint::new(31.3526, 78.4379);
        let kalpa = GeoPoint::new(31.5372, 78.2562);

        let distance = chitkul.distance_to(&kalpa);
        assert!(distance > 20.0 && distance < 35.0);
    }

    #[test]
    fn test_interpolation() {
        let start = GeoPoint::new(0.0, 0.0);
        let end = GeoPoint::new(10.0, 10.0);

        let mid = start.interpolate(&end, 0.5);
        assert!((mid.lat - 5.0).abs() < 0.01);
        assert!((mid.lng - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_interpolation_clamps_fraction() {
        let start = GeoPoint::new(0.0, 0.0);
        let end = GeoPoint::new(10.0, 10.0);

        let over = start.interpolate(&end, 1.5);
        assert_eq!(over, end);
    }

    #[test]
    fn test_centroid() {
        let square = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(2.0, 0.0),
        ];
        let c = centroid(&square).unwrap();
        assert!((c.lat - 1.0).abs() < 1e-9);
        assert!((c.lng - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_contains() {
        let square = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(2.0, 0.0),
        ];

        assert!(polygon_contains(&square, &GeoPoint::new(1.0, 1.0)));
        assert!(!polygon_contains(&square, &GeoPoint::new(3.0, 1.0)));
    }

    #[test]
    fn test_position_validity() {
        assert!(GeoPoint::new(45.0, 90.0).is_valid());
        assert!(!GeoPoint::new(100.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 200.0).is_valid());
    }
}
