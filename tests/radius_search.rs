use geoquery::prelude::*;
use geoquery::query::FilterOp;
use geoquery::store::StoreResult;
use parking_lot::Mutex;
use serde_json::json;

const KM_PER_DEGREE_LAT: f64 = 111.2;

fn center() -> GeoPoint {
    GeoPoint::new(50.304328, 7.59378).expect("valid center")
}

fn north_of(origin: &GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(origin.latitude() + km / KM_PER_DEGREE_LAT, origin.longitude())
        .expect("valid point")
}

/// Insert a document at `point` with its geohash and `[lat, lon]` coordinate.
fn place(
    collection: &GeoCollection<MemoryStore>,
    id: &str,
    point: GeoPoint,
    extra: Option<serde_json::Value>,
) {
    let mut doc = Document::from_value(
        id,
        json!({ "coordinates": [point.latitude(), point.longitude()] }),
    )
    .expect("object document");
    doc.set("geohash", collection.geohash_for(&point).expect("geohash"));
    if let Some(serde_json::Value::Object(fields)) = extra {
        for (key, value) in fields {
            doc.set(key, value);
        }
    }
    collection.store().insert(doc);
}

fn koblenz_collection() -> GeoCollection<MemoryStore> {
    let collection = GeoCollection::new(MemoryStore::new());
    let c = center();
    place(&collection, "d35", north_of(&c, 3.5), None);
    place(&collection, "d12", north_of(&c, 1.2), None);
    place(&collection, "d29", north_of(&c, 2.9), None);
    place(&collection, "d70", north_of(&c, 7.0), None);
    collection
}

fn ids(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| d.id()).collect()
}

#[test]
fn test_strict_search_keeps_only_buffered_radius() {
    let collection = koblenz_collection();
    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates")).strict(true);

    let found = collection.fetch_within(&query).unwrap();
    assert_eq!(ids(&found), vec!["d12", "d29"]);
}

#[test]
fn test_non_strict_search_returns_every_scanned_candidate() {
    let collection = koblenz_collection();
    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates"));

    // d35 lies in the northern neighbor cell; d70 lies outside all nine cells.
    let found = collection.fetch_within(&query).unwrap();
    assert_eq!(ids(&found), vec!["d12", "d29", "d35"]);
}

#[test]
fn test_distances_are_sorted_and_reported() {
    let collection = koblenz_collection();
    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates"));

    let found = collection.fetch_within_with_distance(&query).unwrap();
    assert!(found.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    assert!((found[0].distance_km - 1.2).abs() < 0.01);
}

#[test]
fn test_sequential_and_parallel_scans_agree() {
    let parallel = koblenz_collection();
    let sequential = GeoCollection::with_config(
        MemoryStore::new(),
        Config::default().with_parallel_scans(false),
    )
    .unwrap();
    let c = center();
    for km in [3.5, 1.2, 2.9, 7.0] {
        place(&sequential, &format!("d{}", km), north_of(&c, km), None);
    }

    let query = RadiusQuery::new(c, 3.0, FieldExtractor::new("coordinates"));
    let a = parallel.fetch_within_with_distance(&query).unwrap();
    let b = sequential.fetch_within_with_distance(&query).unwrap();

    let da: Vec<f64> = a.iter().map(|d| d.distance_km).collect();
    let db: Vec<f64> = b.iter().map(|d| d.distance_km).collect();
    assert_eq!(da, db);
}

#[test]
fn test_repeated_searches_are_identical() {
    let collection = koblenz_collection();
    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates")).strict(true);

    let first = collection.fetch_within_with_distance(&query).unwrap();
    let second = collection.fetch_within_with_distance(&query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_deleted_documents_are_skipped() {
    let collection = koblenz_collection();
    collection.store().delete("d12");

    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates")).strict(true);
    let found = collection.fetch_within(&query).unwrap();
    assert_eq!(ids(&found), vec!["d29"]);
}

#[test]
fn test_refiner_narrows_every_cell_scan() {
    let collection = GeoCollection::new(MemoryStore::new());
    let c = center();
    place(&collection, "open", north_of(&c, 1.0), Some(json!({ "open": true })));
    place(&collection, "closed", north_of(&c, 0.5), Some(json!({ "open": false })));
    place(&collection, "open-far", north_of(&c, 2.5), Some(json!({ "open": true })));

    let query = RadiusQuery::new(c, 3.0, FieldExtractor::new("coordinates"))
        .refine(|q: Query| q.where_field("open", FilterOp::Eq, json!(true)))
        .strict(true);

    let found = collection.fetch_within(&query).unwrap();
    assert_eq!(ids(&found), vec!["open", "open-far"]);
}

#[test]
fn test_closure_extractor() {
    let collection = koblenz_collection();
    let extractor = |doc: &Document| {
        let pair = doc.get("coordinates")?.as_array()?;
        GeoPoint::new(pair.first()?.as_f64()?, pair.get(1)?.as_f64()?).ok()
    };
    let query = RadiusQuery::new(center(), 3.0, extractor).strict(true);

    let found = collection.fetch_within(&query).unwrap();
    assert_eq!(ids(&found), vec!["d12", "d29"]);
}

/// Records the lower bound of every range scan it runs.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    scanned: Mutex<Vec<String>>,
}

impl DocumentStore for RecordingStore {
    fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        if let Some(range) = query.field_range() {
            let start = range.start_at.as_str().unwrap_or_default().to_string();
            self.scanned.lock().push(start);
        }
        self.inner.run_query(query)
    }
}

#[test]
fn test_one_scan_per_distinct_cell() {
    let collection = GeoCollection::new(RecordingStore::default());
    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates"));
    collection.fetch_within(&query).unwrap();

    let mut scanned = collection.store().scanned.lock().clone();
    assert_eq!(scanned.len(), 9);
    assert!(scanned.contains(&"u0vqh".to_string()));
    assert!(scanned.iter().all(|cell| cell.len() == 5));

    scanned.sort();
    scanned.dedup();
    assert_eq!(scanned.len(), 9);
}

/// Fails every scan of one cell.
struct FailingStore {
    inner: MemoryStore,
    failing_cell: String,
}

impl DocumentStore for FailingStore {
    fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        let start = query.field_range().and_then(|r| r.start_at.as_str());
        if start == Some(self.failing_cell.as_str()) {
            return Err("backend unavailable".into());
        }
        self.inner.run_query(query)
    }
}

#[test]
fn test_store_failure_fails_whole_search() {
    let seeded = koblenz_collection();
    let collection = GeoCollection::new(FailingStore {
        inner: seeded.into_store(),
        failing_cell: "u0vqk".to_string(),
    });
    let query = RadiusQuery::new(center(), 3.0, FieldExtractor::new("coordinates"));

    let err = collection.fetch_within(&query).unwrap_err();
    assert!(err.is_store_failure());
    match err {
        GeoQueryError::StoreQueryFailed { cell, source } => {
            assert_eq!(cell, "u0vqk");
            assert_eq!(source.to_string(), "backend unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_builder_collection_uses_custom_field() {
    let collection = GeoCollectionBuilder::new()
        .geohash_field("cell")
        .build(MemoryStore::new())
        .unwrap();
    let c = center();
    let p = north_of(&c, 1.0);

    let mut doc =
        Document::from_value("x", json!({ "at": { "lat": p.latitude(), "lng": p.longitude() } }))
            .unwrap();
    doc.set("cell", collection.geohash_for(&p).unwrap());
    collection.store().insert(doc);

    let query = RadiusQuery::new(c, 2.0, FieldExtractor::new("at")).strict(true);
    assert_eq!(ids(&collection.fetch_within(&query).unwrap()), vec!["x"]);
}
