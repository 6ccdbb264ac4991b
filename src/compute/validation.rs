//! Validation for geographic coordinates and search radii.

use crate::compute::geohash::MAX_PRECISION;
use crate::error::{GeoQueryError, Result};

/// Validates a latitude/longitude pair.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]. Non-finite values fail.
///
/// # Examples
///
/// ```
/// use geoquery::compute::validation::validate_lat_lon;
///
/// assert!(validate_lat_lon(40.7128, -74.0060).is_ok());
/// assert!(validate_lat_lon(95.0, -74.0).is_err());
/// assert!(validate_lat_lon(40.0, 200.0).is_err());
/// ```
pub fn validate_lat_lon(latitude: f64, longitude: f64) -> Result<()> {
    let in_range = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);

    if !in_range {
        return Err(GeoQueryError::invalid_coordinate(latitude, longitude));
    }

    Ok(())
}

/// Validates a search radius in kilometers: finite and strictly positive.
///
/// # Examples
///
/// ```
/// use geoquery::compute::validation::validate_radius;
///
/// assert!(validate_radius(3.0).is_ok());
/// assert!(validate_radius(0.0).is_err());
/// assert!(validate_radius(f64::INFINITY).is_err());
/// ```
pub fn validate_radius(radius_km: f64) -> Result<()> {
    if !radius_km.is_finite() {
        return Err(GeoQueryError::InvalidArgument(format!(
            "Radius must be finite, got: {}",
            radius_km
        )));
    }

    if radius_km <= 0.0 {
        return Err(GeoQueryError::InvalidArgument(format!(
            "Radius must be greater than zero, got: {}",
            radius_km
        )));
    }

    Ok(())
}

/// Validates a geohash precision against the range the codec supports (1-12).
pub fn validate_precision(precision: usize) -> Result<()> {
    if !(1..=MAX_PRECISION).contains(&precision) {
        return Err(GeoQueryError::InvalidArgument(format!(
            "Geohash precision must be between 1 and {}, got: {}",
            MAX_PRECISION, precision
        )));
    }
    Ok(())
}
