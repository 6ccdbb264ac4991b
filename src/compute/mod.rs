//! Geometry and geohash algorithms behind the radius search.
//!
//! Nothing here talks to a store:
//! - [`geohash`]: encoding, decoding, neighbors with antimeridian wrap
//! - [`precision`]: radius to geohash precision table
//! - [`cells`]: the center cell and its neighbors covering a search circle
//! - [`distance`]: great-circle distance in kilometers
//! - [`validation`]: argument checks shared by the public API

pub mod cells;
pub mod distance;
pub mod geohash;
pub mod precision;
pub mod validation;

pub use cells::{CellSet, cells_in_radius, cells_in_radius_capped};
pub use distance::{DistanceMetric, distance_km};
pub use precision::{DETECTION_RANGE_BUFFER, precision_for_radius, search_precision};
