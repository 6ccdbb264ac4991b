//! Radius to geohash precision selection.

/// Multiplier applied to the radius before choosing a precision and when
/// filtering strict results. Geohash cells are rectangles, not circles, so the
/// raw radius slightly under-covers the search area.
pub const DETECTION_RANGE_BUFFER: f64 = 1.02;

/// Largest radius (km) each precision covers, finest first.
///
/// | Precision | Cell Size (approx) |
/// |-----------|--------------------|
/// | 9         | ~4.8m × 4.8m       |
/// | 8         | ~38m × 19m         |
/// | 7         | ~153m × 153m       |
/// | 6         | ~1.2km × 0.6km     |
/// | 5         | ~4.9km × 4.9km     |
/// | 4         | ~39km × 20km       |
/// | 3         | ~156km × 156km     |
/// | 2         | ~1250km × 625km    |
const RADIUS_THRESHOLDS_KM: [(f64, usize); 8] = [
    (0.00477, 9),
    (0.0382, 8),
    (0.153, 7),
    (1.22, 6),
    (4.89, 5),
    (39.1, 4),
    (156.0, 3),
    (1250.0, 2),
];

/// Precision used when the radius exceeds every threshold.
pub const COARSEST_PRECISION: usize = 1;

/// Number of geohash characters whose cell covers `radius_km`.
///
/// Total and non-increasing in the radius. Non-positive radii fall through to
/// the finest precision; callers validate the radius first.
///
/// # Examples
///
/// ```rust
/// use geoquery::compute::precision::precision_for_radius;
///
/// assert_eq!(precision_for_radius(3.0), 5);
/// assert_eq!(precision_for_radius(5000.0), 1);
/// ```
pub fn precision_for_radius(radius_km: f64) -> usize {
    RADIUS_THRESHOLDS_KM
        .iter()
        .find(|(max_radius, _)| radius_km <= *max_radius)
        .map(|(_, precision)| *precision)
        .unwrap_or(COARSEST_PRECISION)
}

/// Precision for a search of `radius_km`, widened by `buffer`.
pub fn search_precision(radius_km: f64, buffer: f64) -> usize {
    precision_for_radius(radius_km * buffer)
}
