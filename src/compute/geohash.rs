//! Geohash encoding and neighbor lookup.
//!
//! Encoding and decoding are delegated to the `geohash` crate. Neighbor
//! computation is done here so that cells on the antimeridian wrap around to
//! the other side of the map and cells in the polar rows clamp instead of
//! failing.

use crate::compute::validation::{validate_lat_lon, validate_precision};
use crate::error::{GeoQueryError, Result};
use crate::types::GeoPoint;
use geohash::Coord;

/// The 32-symbol geohash alphabet, in sort order.
pub const BASE32: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest geohash the codec accepts.
pub const MAX_PRECISION: usize = 12;

/// Encode a point as a geohash of `precision` characters.
///
/// # Examples
///
/// ```rust
/// use geoquery::GeoPoint;
/// use geoquery::compute::geohash::encode;
///
/// let point = GeoPoint::new(57.64911, 10.40744)?;
/// assert_eq!(encode(&point, 11)?, "u4pruydqqvj");
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
pub fn encode(point: &GeoPoint, precision: usize) -> Result<String> {
    encode_lat_lon(point.latitude(), point.longitude(), precision)
}

/// Encode a raw latitude/longitude pair, validating both.
pub fn encode_lat_lon(latitude: f64, longitude: f64, precision: usize) -> Result<String> {
    validate_lat_lon(latitude, longitude)?;
    validate_precision(precision)?;

    // The geohash crate folds +90 into the southernmost row; the top row ends just below it.
    let clamped = if latitude >= 90.0 {
        latitude.next_down()
    } else {
        latitude
    };

    geohash::encode(
        Coord {
            x: longitude,
            y: clamped,
        },
        precision,
    )
    .map_err(|_| GeoQueryError::invalid_coordinate(latitude, longitude))
}

/// Center and half-extents of a geohash cell, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub latitude: f64,
    pub longitude: f64,
    pub lat_err: f64,
    pub lon_err: f64,
}

impl CellBounds {
    pub fn min_latitude(&self) -> f64 {
        self.latitude - self.lat_err
    }

    pub fn max_latitude(&self) -> f64 {
        self.latitude + self.lat_err
    }

    pub fn min_longitude(&self) -> f64 {
        self.longitude - self.lon_err
    }

    pub fn max_longitude(&self) -> f64 {
        self.longitude + self.lon_err
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_latitude()..=self.max_latitude()).contains(&point.latitude())
            && (self.min_longitude()..=self.max_longitude()).contains(&point.longitude())
    }
}

/// Check that `hash` is 1-12 characters from the geohash alphabet.
pub fn validate_geohash(hash: &str) -> Result<()> {
    let valid = (1..=MAX_PRECISION).contains(&hash.len())
        && hash.chars().all(|c| BASE32.contains(c));

    if !valid {
        return Err(GeoQueryError::InvalidGeohash(hash.to_string()));
    }
    Ok(())
}

/// Decode a geohash into its cell center and half-extents.
pub fn decode_bounds(hash: &str) -> Result<CellBounds> {
    validate_geohash(hash)?;

    let (center, lon_err, lat_err) =
        geohash::decode(hash).map_err(|_| GeoQueryError::InvalidGeohash(hash.to_string()))?;

    Ok(CellBounds {
        latitude: center.y,
        longitude: center.x,
        lat_err,
        lon_err,
    })
}

/// Shorten a geohash to at most `precision` characters.
///
/// A shorter geohash names the enclosing, coarser cell.
pub fn truncate(hash: &str, precision: usize) -> &str {
    &hash[..precision.min(hash.len())]
}

/// The eight cells surrounding a geohash, at the same precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbors {
    pub n: String,
    pub ne: String,
    pub e: String,
    pub se: String,
    pub s: String,
    pub sw: String,
    pub w: String,
    pub nw: String,
}

impl Neighbors {
    /// Iterate clockwise starting from north.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            &self.n, &self.ne, &self.e, &self.se, &self.s, &self.sw, &self.w, &self.nw,
        ]
        .into_iter()
        .map(String::as_str)
    }

    pub fn into_array(self) -> [String; 8] {
        [
            self.n, self.ne, self.e, self.se, self.s, self.sw, self.w, self.nw,
        ]
    }
}

/// Compute the eight neighbors of `hash`.
///
/// Longitude wraps at ±180, so the east neighbor of a cell on the
/// antimeridian sits at -180. Latitude clamps at ±90: the north neighbors of
/// a cell in the top row resolve to cells in that same row, and the south
/// neighbors of a bottom-row cell stay in the bottom row.
///
/// # Examples
///
/// ```rust
/// use geoquery::compute::geohash::neighbors;
///
/// let nb = neighbors("u4pruyd")?;
/// assert_eq!(nb.n, "u4pruyf");
/// assert_eq!(nb.s, "u4pruy6");
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
pub fn neighbors(hash: &str) -> Result<Neighbors> {
    let bounds = decode_bounds(hash)?;
    let precision = hash.len();

    // Stepping a full cell width from the center lands on the neighbor's center,
    // well clear of any cell edge. A step past a pole stays in the current row.
    let step = |dlat: f64, dlon: f64| -> Result<String> {
        let stepped = bounds.latitude + 2.0 * bounds.lat_err * dlat;
        let latitude = if (-90.0..=90.0).contains(&stepped) {
            stepped
        } else {
            bounds.latitude
        };
        let longitude = wrap_longitude(bounds.longitude + 2.0 * bounds.lon_err * dlon);
        encode_lat_lon(latitude, longitude, precision)
    };

    Ok(Neighbors {
        n: step(1.0, 0.0)?,
        ne: step(1.0, 1.0)?,
        e: step(0.0, 1.0)?,
        se: step(-1.0, 1.0)?,
        s: step(-1.0, 0.0)?,
        sw: step(-1.0, -1.0)?,
        w: step(0.0, -1.0)?,
        nw: step(1.0, -1.0)?,
    })
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}
