//! Radius search for document stores that can only range-scan a string field.
//!
//! Documents carry a geohash of their location in an indexed field. A radius
//! search scans the cell containing the center and its eight neighbors,
//! merges the results, and ranks them by great-circle distance.
//!
//! ```rust
//! use geoquery::prelude::*;
//! use serde_json::json;
//!
//! let collection = GeoCollection::new(MemoryStore::new());
//! let center = GeoPoint::new(50.304328, 7.59378)?;
//!
//! for (id, lat, lon) in [("near", 50.3151, 7.5938), ("far", 50.3360, 7.5938)] {
//!     let mut doc = Document::from_value(id, json!({ "at": [lat, lon] }))?;
//!     doc.set("geohash", collection.geohash_for(&GeoPoint::new(lat, lon)?)?);
//!     collection.store().insert(doc);
//! }
//!
//! let query = RadiusQuery::new(center, 3.0, FieldExtractor::new("at")).strict(true);
//! let nearby = collection.fetch_within(&query)?;
//! assert_eq!(nearby.len(), 1);
//! assert_eq!(nearby[0].id(), "near");
//! # Ok::<(), geoquery::GeoQueryError>(())
//! ```

pub mod builder;
pub mod collection;
pub mod compute;
pub mod config;
pub mod error;
pub mod extract;
pub mod query;
pub mod reduce;
pub mod store;
pub mod types;

pub use builder::GeoCollectionBuilder;
pub use collection::{AsyncGeoCollection, GeoCollection, RadiusQuery};
pub use config::Config;
pub use error::{GeoQueryError, Result};

pub use compute::distance::DistanceMetric;
pub use compute::precision::DETECTION_RANGE_BUFFER;

pub use extract::{FieldExtractor, PointExtractor, QueryRefiner};
pub use query::{Direction, FilterOp, Query};

pub use store::{AsyncDocumentStore, DocumentStore, MemoryStore, StoreResult};

pub use types::{Document, DocumentSnapshot, GeoDocument, GeoPoint};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{AsyncGeoCollection, GeoCollection, GeoCollectionBuilder, RadiusQuery};

    pub use crate::{Config, DistanceMetric, GeoQueryError, Result};

    pub use crate::{Document, DocumentSnapshot, GeoDocument, GeoPoint};

    pub use crate::{FieldExtractor, PointExtractor, Query, QueryRefiner};

    pub use crate::{AsyncDocumentStore, DocumentStore, MemoryStore};
}
