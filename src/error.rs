//! Error types for geoquery.

use thiserror::Error;

/// Boxed error produced by a store implementation when a scan fails.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by radius queries and the pieces they are built from.
#[derive(Debug, Error)]
pub enum GeoQueryError {
    /// Latitude or longitude outside the valid range, or not finite.
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// A geohash with an unsupported length or a symbol outside the alphabet.
    #[error("invalid geohash: {0:?}")]
    InvalidGeohash(String),

    /// A caller-supplied argument that cannot be used (non-positive radius, bad precision).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The point extractor returned nothing for a document that exists.
    #[error("document {id} has no extractable coordinate")]
    MissingCoordinate { id: String },

    /// A range scan for one geohash cell failed; the whole call fails with it.
    #[error("store query for cell {cell:?} failed: {source}")]
    StoreQueryFailed {
        cell: String,
        #[source]
        source: StoreError,
    },

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text or file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    ConfigParse(String),
}

impl GeoQueryError {
    pub(crate) fn invalid_coordinate(latitude: f64, longitude: f64) -> Self {
        GeoQueryError::InvalidCoordinate {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when the error came from the underlying store rather than the caller.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, GeoQueryError::StoreQueryFailed { .. })
    }
}

impl From<serde_json::Error> for GeoQueryError {
    fn from(err: serde_json::Error) -> Self {
        GeoQueryError::ConfigParse(err.to_string())
    }
}

/// Result type for geoquery operations.
pub type Result<T> = std::result::Result<T, GeoQueryError>;
