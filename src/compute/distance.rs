//! Surface distance between geographic points, leveraging the geo crate.

use crate::types::GeoPoint;
use geo::{Distance, Geodesic, Haversine};
use serde::{Deserialize, Serialize};

/// Distance metrics for ranking candidates.
///
/// - **Geodesic**: ellipsoidal distance (Karney 2013), the default
/// - **Haversine**: spherical approximation, faster and within ~0.5% of geodesic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Geodesic,
    Haversine,
}

/// Distance between two points in kilometers.
///
/// # Examples
///
/// ```rust
/// use geoquery::GeoPoint;
/// use geoquery::compute::distance::{DistanceMetric, distance_km};
///
/// let nyc = GeoPoint::new(40.7128, -74.0060)?;
/// let la = GeoPoint::new(34.0522, -118.2437)?;
///
/// let km = distance_km(&nyc, &la, DistanceMetric::Geodesic);
/// assert!(km > 3_900.0 && km < 4_000.0);
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
pub fn distance_km(from: &GeoPoint, to: &GeoPoint, metric: DistanceMetric) -> f64 {
    let (a, b) = (from.to_point(), to.to_point());
    let meters = match metric {
        DistanceMetric::Geodesic => Geodesic.distance(a, b),
        DistanceMetric::Haversine => Haversine.distance(a, b),
    };
    meters / 1000.0
}
