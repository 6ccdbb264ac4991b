//! Collection configuration.

pub use crate::compute::distance::DistanceMetric;
use crate::compute::geohash::MAX_PRECISION;
use crate::compute::precision::DETECTION_RANGE_BUFFER;
use crate::error::{GeoQueryError, Result};
use crate::reduce::ReduceOptions;
use serde::{Deserialize, Serialize};

/// Settings for a geo-enabled collection.
///
/// Every field has a default, so configuration can be loaded from a partial
/// JSON or TOML document.
///
/// # Example
///
/// ```rust
/// use geoquery::Config;
/// use geoquery::compute::distance::DistanceMetric;
///
/// // Create default config
/// let config = Config::default();
/// assert_eq!(config.geohash_field, "geohash");
///
/// // Load from JSON
/// let json = r#"{
///     "geohash_field": "gh",
///     "distance_metric": "haversine"
/// }"#;
/// let config = Config::from_json_str(json)?;
/// assert_eq!(config.distance_metric, DistanceMetric::Haversine);
/// assert_eq!(config.index_precision, 9);
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the indexed geohash field
    #[serde(default = "Config::default_geohash_field")]
    pub geohash_field: String,

    /// Precision documents are written with (1-12, default: 9)
    #[serde(default = "Config::default_index_precision")]
    pub index_precision: usize,

    /// Radius multiplier compensating for rectangular cells (default: 1.02)
    #[serde(default = "Config::default_detection_buffer")]
    pub detection_buffer: f64,

    /// Distance metric used to rank and filter candidates
    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// Run synchronous cell scans on separate threads
    #[serde(default = "Config::default_parallel_scans")]
    pub parallel_scans: bool,
}

impl Config {
    fn default_geohash_field() -> String {
        "geohash".to_string()
    }

    const fn default_index_precision() -> usize {
        9
    }

    const fn default_detection_buffer() -> f64 {
        DETECTION_RANGE_BUFFER
    }

    const fn default_parallel_scans() -> bool {
        true
    }

    pub fn with_geohash_field(mut self, field: impl Into<String>) -> Self {
        self.geohash_field = field.into();
        self
    }

    pub fn with_index_precision(mut self, precision: usize) -> Self {
        self.index_precision = precision;
        self
    }

    pub fn with_detection_buffer(mut self, buffer: f64) -> Self {
        self.detection_buffer = buffer;
        self
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_parallel_scans(mut self, parallel: bool) -> Self {
        self.parallel_scans = parallel;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.geohash_field.is_empty() {
            return Err(GeoQueryError::InvalidConfig(
                "Geohash field name cannot be empty".to_string(),
            ));
        }

        if !(1..=MAX_PRECISION).contains(&self.index_precision) {
            return Err(GeoQueryError::InvalidConfig(format!(
                "Index precision must be between 1 and {}, got: {}",
                MAX_PRECISION, self.index_precision
            )));
        }

        if !self.detection_buffer.is_finite() || self.detection_buffer < 1.0 {
            return Err(GeoQueryError::InvalidConfig(format!(
                "Detection buffer must be finite and at least 1.0, got: {}",
                self.detection_buffer
            )));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML configuration.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| GeoQueryError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GeoQueryError::ConfigParse(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub(crate) fn reduce_options(&self) -> ReduceOptions {
        ReduceOptions {
            buffer: self.detection_buffer,
            metric: self.distance_metric,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geohash_field: Self::default_geohash_field(),
            index_precision: Self::default_index_precision(),
            detection_buffer: Self::default_detection_buffer(),
            distance_metric: DistanceMetric::default(),
            parallel_scans: Self::default_parallel_scans(),
        }
    }
}
