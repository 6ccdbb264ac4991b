//! Radius search over a store that only indexes a geohash string field.
//!
//! ## Query Flow
//! ```text
//! 1. Validate the radius
//! 2. Pick a precision for radius × buffer (never finer than the index precision)
//!    and enumerate the center cell + 8 neighbors
//! 3. Build one range scan per cell: [prefix, prefix + '\u{f8ff}')
//! 4. Run every scan concurrently and wait for all of them
//! 5. Merge, dedupe, measure, filter and sort (see `reduce`)
//! ```
//!
//! A call either returns the complete answer or fails: if any scan fails the
//! whole call fails, and no partial list is ever returned.

use crate::builder::GeoCollectionBuilder;
use crate::compute::cells::cells_in_radius_capped;
use crate::compute::geohash::encode;
use crate::compute::validation::validate_radius;
use crate::config::Config;
use crate::error::{GeoQueryError, Result, StoreError};
use crate::extract::{PointExtractor, QueryRefiner};
use crate::query::{Query, cell_query};
use crate::reduce::reduce;
use crate::store::{AsyncDocumentStore, DocumentStore, StoreResult};
use crate::types::{Document, DocumentSnapshot, GeoDocument, GeoPoint};
use log::{debug, trace};
use std::fmt;
use std::sync::Arc;

/// One radius search: center, radius, how to read coordinates, optional
/// query refinement, and whether to filter by exact distance.
///
/// # Examples
///
/// ```rust
/// use geoquery::{FieldExtractor, GeoPoint, RadiusQuery};
///
/// let query = RadiusQuery::new(
///     GeoPoint::new(50.304328, 7.59378)?,
///     3.0,
///     FieldExtractor::new("coordinates"),
/// )
/// .strict(true);
/// assert!(query.is_strict());
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Clone)]
pub struct RadiusQuery {
    center: GeoPoint,
    radius_km: f64,
    extractor: Arc<dyn PointExtractor>,
    refiner: Option<Arc<dyn QueryRefiner>>,
    strict: bool,
}

impl RadiusQuery {
    /// A non-strict search of `radius_km` kilometers around `center`.
    pub fn new(center: GeoPoint, radius_km: f64, extractor: impl PointExtractor + 'static) -> Self {
        Self {
            center,
            radius_km,
            extractor: Arc::new(extractor),
            refiner: None,
            strict: false,
        }
    }

    /// Drop candidates farther than `radius × buffer` from the center.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Apply `refiner` to every cell query before the geohash bounds.
    pub fn refine(mut self, refiner: impl QueryRefiner + 'static) -> Self {
        self.refiner = Some(Arc::new(refiner));
        self
    }

    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn extractor(&self) -> &dyn PointExtractor {
        self.extractor.as_ref()
    }

    pub fn refiner(&self) -> Option<&dyn QueryRefiner> {
        self.refiner.as_deref()
    }
}

impl fmt::Debug for RadiusQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadiusQuery")
            .field("center", &self.center)
            .field("radius_km", &self.radius_km)
            .field("refined", &self.refiner.is_some())
            .field("strict", &self.strict)
            .finish()
    }
}

/// A cell prefix and the scan that covers it.
#[derive(Debug, Clone, PartialEq)]
pub struct CellScan {
    pub cell: String,
    pub query: Query,
}

/// Build the scans for `query`, one per covering cell.
pub fn plan_scans(query: &RadiusQuery, config: &Config) -> Result<Vec<CellScan>> {
    validate_radius(query.radius_km)?;

    let cells = cells_in_radius_capped(
        &query.center,
        query.radius_km,
        config.detection_buffer,
        config.index_precision,
    )?;
    let scans = cells
        .into_iter()
        .map(|cell| {
            let scan = cell_query(Query::new(), &config.geohash_field, &cell, query.refiner());
            CellScan { cell, query: scan }
        })
        .collect();

    Ok(scans)
}

fn scan_failed(cell: &str, source: StoreError) -> GeoQueryError {
    GeoQueryError::StoreQueryFailed {
        cell: cell.to_string(),
        source,
    }
}

/// Radius search over a synchronous store.
///
/// # Examples
///
/// ```rust
/// use geoquery::{Document, FieldExtractor, GeoCollection, GeoPoint, MemoryStore, RadiusQuery};
/// use serde_json::json;
///
/// let collection = GeoCollection::new(MemoryStore::new());
/// let koblenz = GeoPoint::new(50.3569, 7.5890)?;
///
/// let mut doc = Document::from_value(
///     "koblenz",
///     json!({ "coordinates": { "latitude": 50.3569, "longitude": 7.5890 } }),
/// )?;
/// doc.set("geohash", collection.geohash_for(&koblenz)?);
/// collection.store().insert(doc);
///
/// let query = RadiusQuery::new(koblenz, 1.0, FieldExtractor::new("coordinates")).strict(true);
/// let found = collection.fetch_within(&query)?;
/// assert_eq!(found[0].id(), "koblenz");
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Debug)]
pub struct GeoCollection<S> {
    store: S,
    config: Config,
}

impl<S> GeoCollection<S> {
    /// Wrap `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: Config::default(),
        }
    }

    /// Wrap `store` with a validated configuration.
    pub fn with_config(store: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn builder() -> GeoCollectionBuilder {
        GeoCollectionBuilder::new()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Geohash to store on a document located at `point`.
    pub fn geohash_for(&self, point: &GeoPoint) -> Result<String> {
        encode(point, self.config.index_precision)
    }
}

impl<S: DocumentStore> GeoCollection<S> {
    /// Documents within the query radius, nearest first.
    pub fn fetch_within(&self, query: &RadiusQuery) -> Result<Vec<Document>> {
        Ok(self
            .fetch_within_with_distance(query)?
            .into_iter()
            .map(GeoDocument::into_document)
            .collect())
    }

    /// Like [`fetch_within`](Self::fetch_within), keeping each document's distance.
    pub fn fetch_within_with_distance(&self, query: &RadiusQuery) -> Result<Vec<GeoDocument>> {
        let scans = plan_scans(query, &self.config)?;
        let per_cell = self.run_scans(&scans)?;

        reduce(
            per_cell,
            &query.center,
            query.radius_km,
            query.extractor(),
            query.strict,
            self.config.reduce_options(),
        )
    }

    fn run_scans(&self, scans: &[CellScan]) -> Result<Vec<Vec<DocumentSnapshot>>> {
        debug!(
            "issuing {} cell scans ({})",
            scans.len(),
            if self.config.parallel_scans { "parallel" } else { "sequential" }
        );

        let parallel = self.config.parallel_scans && scans.len() > 1;
        let outcomes: Vec<StoreResult<Vec<DocumentSnapshot>>> = if parallel {
            std::thread::scope(|scope| {
                let handles: Vec<_> = scans
                    .iter()
                    .map(|scan| {
                        trace!("scanning cell {}", scan.cell);
                        scope.spawn(move || self.store.run_query(&scan.query))
                    })
                    .collect();

                // Join every scan before looking at any result.
                handles
                    .into_iter()
                    .map(|handle| match handle.join() {
                        Ok(outcome) => outcome,
                        Err(panic) => std::panic::resume_unwind(panic),
                    })
                    .collect()
            })
        } else {
            scans
                .iter()
                .map(|scan| {
                    trace!("scanning cell {}", scan.cell);
                    self.store.run_query(&scan.query)
                })
                .collect()
        };

        scans
            .iter()
            .zip(outcomes)
            .map(|(scan, outcome)| outcome.map_err(|source| scan_failed(&scan.cell, source)))
            .collect()
    }
}

/// Radius search over an asynchronous store.
///
/// All cell scans are started together and awaited as one; dropping the
/// returned future cancels every scan still in flight.
#[derive(Debug)]
pub struct AsyncGeoCollection<S> {
    store: S,
    config: Config,
}

impl<S> AsyncGeoCollection<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: Config::default(),
        }
    }

    pub fn with_config(store: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn geohash_for(&self, point: &GeoPoint) -> Result<String> {
        encode(point, self.config.index_precision)
    }
}

impl<S: AsyncDocumentStore> AsyncGeoCollection<S> {
    /// Documents within the query radius, nearest first.
    pub async fn fetch_within(&self, query: &RadiusQuery) -> Result<Vec<Document>> {
        Ok(self
            .fetch_within_with_distance(query)
            .await?
            .into_iter()
            .map(GeoDocument::into_document)
            .collect())
    }

    /// Like [`fetch_within`](Self::fetch_within), keeping each document's distance.
    pub async fn fetch_within_with_distance(
        &self,
        query: &RadiusQuery,
    ) -> Result<Vec<GeoDocument>> {
        let scans = plan_scans(query, &self.config)?;
        debug!("issuing {} cell scans (async)", scans.len());

        let pending = scans.iter().map(|scan| async move {
            trace!("scanning cell {}", scan.cell);
            self.store
                .run_query_async(&scan.query)
                .await
                .map_err(|source| scan_failed(&scan.cell, source))
        });
        let per_cell = futures::future::try_join_all(pending).await?;

        reduce(
            per_cell,
            &query.center,
            query.radius_km,
            query.extractor(),
            query.strict,
            self.config.reduce_options(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldExtractor;
    use crate::query::FilterOp;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn center() -> GeoPoint {
        GeoPoint::new(50.304328, 7.59378).unwrap()
    }

    #[test]
    fn test_plan_covers_center_cell() {
        let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("at"));
        let scans = plan_scans(&query, &Config::default()).unwrap();

        assert_eq!(scans.len(), 9);
        assert_eq!(scans[0].cell, "u0vqh");
        let range = scans[0].query.field_range().unwrap();
        assert_eq!(range.field, "geohash");
        assert_eq!(range.start_at, json!("u0vqh"));
    }

    #[test]
    fn test_plan_uses_configured_field_and_refiner() {
        let config = Config::default().with_geohash_field("cell");
        let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("at"))
            .refine(|q: Query| q.where_field("open", FilterOp::Eq, json!(true)));
        let scans = plan_scans(&query, &config).unwrap();

        for scan in &scans {
            assert_eq!(scan.query.field_range().unwrap().field, "cell");
            assert_eq!(scan.query.filters().len(), 1);
        }
    }

    #[test]
    fn test_plan_never_finer_than_index_precision() {
        let config = Config::default().with_index_precision(5);
        let query = RadiusQuery::new(center(), 0.5, FieldExtractor::new("at"));
        let scans = plan_scans(&query, &config).unwrap();
        assert!(scans.iter().all(|scan| scan.cell.len() == 5));
    }

    #[test]
    fn test_coarse_index_still_finds_center_document() {
        let collection = GeoCollection::with_config(
            MemoryStore::new(),
            Config::default().with_index_precision(5),
        )
        .unwrap();
        let mut doc = Document::from_value("here", json!({ "at": [50.304328, 7.59378] })).unwrap();
        let hash = collection.geohash_for(&center()).unwrap();
        assert_eq!(hash, "u0vqh");
        doc.set("geohash", hash);
        collection.store().insert(doc);

        for radius in [0.001, 0.5, 3.0] {
            let query = RadiusQuery::new(center(), radius, FieldExtractor::new("at")).strict(true);
            let found = collection.fetch_within(&query).unwrap();
            assert_eq!(found.len(), 1, "radius {}", radius);
        }
    }

    #[test]
    fn test_plan_rejects_bad_radius() {
        for radius in [0.0, -1.0, f64::NAN] {
            let query = RadiusQuery::new(center(), radius, FieldExtractor::new("at"));
            assert!(matches!(
                plan_scans(&query, &Config::default()),
                Err(GeoQueryError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_bad_radius_issues_no_scans() {
        let collection = GeoCollection::new(MemoryStore::new());
        let query = RadiusQuery::new(center(), -3.0, FieldExtractor::new("at"));
        assert!(collection.fetch_within(&query).is_err());
        assert_eq!(collection.store().stats().queries_run, 0);
    }

    #[test]
    fn test_one_scan_per_cell() {
        let collection = GeoCollection::new(MemoryStore::new());
        let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("at"));
        assert!(collection.fetch_within(&query).unwrap().is_empty());
        assert_eq!(collection.store().stats().queries_run, 9);
    }

    #[test]
    fn test_geohash_for_uses_index_precision() {
        let collection = GeoCollection::with_config(
            MemoryStore::new(),
            Config::default().with_index_precision(7),
        )
        .unwrap();
        assert_eq!(collection.geohash_for(&center()).unwrap(), "u0vqhv9");
    }

    #[test]
    fn test_with_config_validates() {
        let config = Config::default().with_detection_buffer(0.5);
        assert!(GeoCollection::with_config(MemoryStore::new(), config.clone()).is_err());
        assert!(AsyncGeoCollection::with_config(MemoryStore::new(), config).is_err());
    }

    #[test]
    fn test_radius_query_debug_hides_strategies() {
        let query = RadiusQuery::new(center(), 1.5, FieldExtractor::new("at")).strict(true);
        let text = format!("{:?}", query);
        assert!(text.contains("radius_km: 1.5"));
        assert!(text.contains("strict: true"));
    }
}
