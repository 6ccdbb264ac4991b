//! Collection builder for flexible configuration
//!
//! This module provides a builder pattern for wrapping a store in a
//! [`GeoCollection`] or [`AsyncGeoCollection`] with non-default settings.

use crate::collection::{AsyncGeoCollection, GeoCollection};
use crate::compute::distance::DistanceMetric;
use crate::config::Config;
use crate::error::Result;
#[cfg(feature = "toml")]
use std::path::PathBuf;

/// Builder for collection configuration.
///
/// # Examples
///
/// ```rust
/// use geoquery::{GeoCollectionBuilder, MemoryStore};
///
/// let collection = GeoCollectionBuilder::new()
///     .geohash_field("cell")
///     .parallel_scans(false)
///     .build(MemoryStore::new())?;
/// assert_eq!(collection.config().geohash_field, "cell");
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Debug)]
pub struct GeoCollectionBuilder {
    #[cfg(feature = "toml")]
    config_path: Option<PathBuf>,
    config: Config,
}

impl GeoCollectionBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "toml")]
            config_path: None,
            config: Config::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a TOML file at build time. Setters called
    /// afterwards do not override the file.
    #[cfg(feature = "toml")]
    pub fn config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Name of the indexed geohash field.
    pub fn geohash_field(mut self, field: impl Into<String>) -> Self {
        self.config = self.config.with_geohash_field(field);
        self
    }

    /// Precision documents are written with.
    pub fn index_precision(mut self, precision: usize) -> Self {
        self.config = self.config.with_index_precision(precision);
        self
    }

    pub fn detection_buffer(mut self, buffer: f64) -> Self {
        self.config = self.config.with_detection_buffer(buffer);
        self
    }

    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config = self.config.with_distance_metric(metric);
        self
    }

    /// Run synchronous cell scans on one thread per cell.
    pub fn parallel_scans(mut self, parallel: bool) -> Self {
        self.config = self.config.with_parallel_scans(parallel);
        self
    }

    fn resolve(self) -> Result<Config> {
        #[cfg(feature = "toml")]
        if let Some(path) = self.config_path {
            return Config::from_toml_file(path);
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Build a collection over a synchronous store.
    pub fn build<S>(self, store: S) -> Result<GeoCollection<S>> {
        GeoCollection::with_config(store, self.resolve()?)
    }

    /// Build a collection over an asynchronous store.
    pub fn build_async<S>(self, store: S) -> Result<AsyncGeoCollection<S>> {
        AsyncGeoCollection::with_config(store, self.resolve()?)
    }
}

impl Default for GeoCollectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoQueryError;
    use crate::store::MemoryStore;

    #[test]
    fn test_builder_default() {
        let collection = GeoCollectionBuilder::new().build(MemoryStore::new()).unwrap();
        assert_eq!(collection.config(), &Config::default());
    }

    #[test]
    fn test_builder_setters() {
        let collection = GeoCollectionBuilder::new()
            .geohash_field("gh")
            .index_precision(7)
            .detection_buffer(1.05)
            .distance_metric(DistanceMetric::Haversine)
            .parallel_scans(false)
            .build_async(MemoryStore::new())
            .unwrap();

        let config = collection.config();
        assert_eq!(config.geohash_field, "gh");
        assert_eq!(config.index_precision, 7);
        assert_eq!(config.detection_buffer, 1.05);
        assert_eq!(config.distance_metric, DistanceMetric::Haversine);
        assert!(!config.parallel_scans);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = GeoCollectionBuilder::new()
            .index_precision(0)
            .build(MemoryStore::new());
        assert!(matches!(result, Err(GeoQueryError::InvalidConfig(_))));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_builder_config_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "index_precision = 8").unwrap();

        let collection = GeoCollectionBuilder::new()
            .config_file(file.path())
            .build(MemoryStore::new())
            .unwrap();
        assert_eq!(collection.config().index_precision, 8);
    }
}
