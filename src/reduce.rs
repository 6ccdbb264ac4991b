//! Merging per-cell scan results into one ranked answer.
//!
//! # Algorithm
//!
//! 1. Flatten the per-cell results in cell order
//! 2. Skip repeated document IDs (first occurrence wins)
//! 3. Skip snapshots whose document no longer exists
//! 4. Measure the distance from the center to the document's own coordinate
//! 5. In strict mode, drop candidates beyond `radius × buffer`
//! 6. Stable sort by distance, so equal distances keep fetch order

use crate::compute::distance::{DistanceMetric, distance_km};
use crate::compute::precision::DETECTION_RANGE_BUFFER;
use crate::error::{GeoQueryError, Result};
use crate::extract::PointExtractor;
use crate::types::{DocumentSnapshot, GeoDocument, GeoPoint};
use log::{debug, trace};
use rustc_hash::FxHashSet;

/// Knobs shared by every reduction in a collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReduceOptions {
    pub buffer: f64,
    pub metric: DistanceMetric,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            buffer: DETECTION_RANGE_BUFFER,
            metric: DistanceMetric::default(),
        }
    }
}

/// A fetched document paired with its measured distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub document: GeoDocument,
    /// Position in the flattened fetch order.
    pub ordinal: usize,
}

/// Counters describing one reduction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReduceStats {
    /// Snapshots received across all cells
    pub fetched: usize,
    /// Snapshots skipped because their ID was already seen
    pub duplicates: usize,
    /// Snapshots skipped because the document no longer exists
    pub missing: usize,
    /// Candidates dropped by the strict distance filter
    pub out_of_range: usize,
    /// Documents returned
    pub returned: usize,
}

/// Whether a candidate at `distance_km` survives strict filtering.
///
/// Inclusive: a document at exactly `radius_km × buffer` is kept.
pub fn within_radius(distance_km: f64, radius_km: f64, buffer: f64) -> bool {
    distance_km <= radius_km * buffer
}

/// Merge, measure, filter and rank per-cell results.
pub fn reduce<E>(
    per_cell: Vec<Vec<DocumentSnapshot>>,
    center: &GeoPoint,
    radius_km: f64,
    extractor: &E,
    strict: bool,
    options: ReduceOptions,
) -> Result<Vec<GeoDocument>>
where
    E: PointExtractor + ?Sized,
{
    reduce_with_stats(per_cell, center, radius_km, extractor, strict, options)
        .map(|(documents, _)| documents)
}

/// [`reduce`], also returning counters.
pub fn reduce_with_stats<E>(
    per_cell: Vec<Vec<DocumentSnapshot>>,
    center: &GeoPoint,
    radius_km: f64,
    extractor: &E,
    strict: bool,
    options: ReduceOptions,
) -> Result<(Vec<GeoDocument>, ReduceStats)>
where
    E: PointExtractor + ?Sized,
{
    let mut stats = ReduceStats::default();
    let mut seen = FxHashSet::default();
    let mut candidates = Vec::new();

    for (ordinal, snapshot) in per_cell.into_iter().flatten().enumerate() {
        stats.fetched += 1;

        if !seen.insert(snapshot.id().to_string()) {
            stats.duplicates += 1;
            continue;
        }

        if !snapshot.exists() {
            trace!("dropping snapshot {}: document no longer exists", snapshot.id());
            stats.missing += 1;
            continue;
        }
        let Some(document) = snapshot.into_document() else {
            continue;
        };

        let point = extractor
            .extract(&document)
            .ok_or_else(|| GeoQueryError::MissingCoordinate {
                id: document.id().to_string(),
            })?;
        let distance = distance_km(center, &point, options.metric);

        if strict && !within_radius(distance, radius_km, options.buffer) {
            stats.out_of_range += 1;
            continue;
        }

        candidates.push(Candidate {
            document: GeoDocument {
                document,
                distance_km: distance,
            },
            ordinal,
        });
    }

    candidates.sort_by(|a, b| {
        a.document
            .distance_km
            .total_cmp(&b.document.distance_km)
            .then(a.ordinal.cmp(&b.ordinal))
    });
    stats.returned = candidates.len();

    debug!(
        "reduced {} snapshots to {} documents ({} duplicate, {} missing, {} out of range)",
        stats.fetched, stats.returned, stats.duplicates, stats.missing, stats.out_of_range
    );

    Ok((
        candidates.into_iter().map(|c| c.document).collect(),
        stats,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;
    use serde_json::json;

    /// Point `km` kilometers due north of `center`, using ~111.2 km per degree.
    fn north_of(center: &GeoPoint, km: f64) -> GeoPoint {
        GeoPoint::new(center.latitude() + km / 111.2, center.longitude()).unwrap()
    }

    fn located(id: &str, point: GeoPoint) -> DocumentSnapshot {
        DocumentSnapshot::found(
            Document::from_value(
                id,
                json!({"at": [point.latitude(), point.longitude()]}),
            )
            .unwrap(),
        )
    }

    fn extractor() -> impl PointExtractor {
        crate::extract::FieldExtractor::new("at")
    }

    fn ids(docs: &[GeoDocument]) -> Vec<&str> {
        docs.iter().map(|d| d.document.id()).collect()
    }

    fn center() -> GeoPoint {
        GeoPoint::new(50.304328, 7.59378).unwrap()
    }

    #[test]
    fn test_orders_by_distance_with_stable_ties() {
        let c = center();
        let same = north_of(&c, 0.5);
        let per_cell = vec![
            vec![located("far", north_of(&c, 3.1)), located("tie-1", same)],
            vec![located("farthest", north_of(&c, 7.0)), located("tie-2", same)],
        ];

        let result = reduce(per_cell, &c, 10.0, &extractor(), true, ReduceOptions::default()).unwrap();
        assert_eq!(ids(&result), vec!["tie-1", "tie-2", "far", "farthest"]);
        assert!(result.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn test_strict_filters_beyond_buffered_radius() {
        let c = center();
        let per_cell = vec![vec![
            located("d35", north_of(&c, 3.5)),
            located("d12", north_of(&c, 1.2)),
            located("d29", north_of(&c, 2.9)),
        ]];

        let strict = reduce(per_cell.clone(), &c, 3.0, &extractor(), true, ReduceOptions::default())
            .unwrap();
        assert_eq!(ids(&strict), vec!["d12", "d29"]);

        let loose = reduce(per_cell, &c, 3.0, &extractor(), false, ReduceOptions::default()).unwrap();
        assert_eq!(ids(&loose), vec!["d12", "d29", "d35"]);
    }

    #[test]
    fn test_within_radius_boundary() {
        let radius = 3.0;
        let limit = radius * DETECTION_RANGE_BUFFER;
        assert!(within_radius(limit, radius, DETECTION_RANGE_BUFFER));
        assert!(!within_radius(limit.next_up(), radius, DETECTION_RANGE_BUFFER));
        assert!(within_radius(0.0, radius, DETECTION_RANGE_BUFFER));
    }

    #[test]
    fn test_center_document_always_included() {
        let c = center();
        for radius in [0.000_1, 0.01, 1.0, 100.0] {
            let per_cell = vec![vec![located("here", c)]];
            let result = reduce(per_cell, &c, radius, &extractor(), true, ReduceOptions::default())
                .unwrap();
            assert_eq!(ids(&result), vec!["here"]);
            assert!(result[0].distance_km.abs() < 1e-9);
        }
    }

    #[test]
    fn test_duplicates_and_missing_are_dropped() {
        let c = center();
        let per_cell = vec![
            vec![located("a", north_of(&c, 1.0)), DocumentSnapshot::missing("gone")],
            vec![located("a", north_of(&c, 1.0)), located("b", north_of(&c, 0.2))],
        ];

        let (result, stats) =
            reduce_with_stats(per_cell, &c, 5.0, &extractor(), true, ReduceOptions::default())
                .unwrap();
        assert_eq!(ids(&result), vec!["b", "a"]);
        assert_eq!(
            stats,
            ReduceStats {
                fetched: 4,
                duplicates: 1,
                missing: 1,
                out_of_range: 0,
                returned: 2,
            }
        );
    }

    #[test]
    fn test_missing_coordinate_is_an_error() {
        let c = center();
        let bare = DocumentSnapshot::found(Document::from_value("bare", json!({})).unwrap());
        let err = reduce(vec![vec![bare]], &c, 5.0, &extractor(), false, ReduceOptions::default())
            .unwrap_err();
        assert!(matches!(err, GeoQueryError::MissingCoordinate { ref id } if id == "bare"));
    }

    #[test]
    fn test_missing_snapshot_skips_extractor() {
        let c = center();
        let panicking = |_: &Document| -> Option<GeoPoint> { panic!("extractor called") };
        let result = reduce(
            vec![vec![DocumentSnapshot::missing("gone")]],
            &c,
            1.0,
            &panicking,
            true,
            ReduceOptions::default(),
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_distance_comes_from_document_not_cell() {
        let c = center();
        let p = north_of(&c, 2.0);
        let result = reduce(
            vec![vec![located("p", p)]],
            &c,
            3.0,
            &extractor(),
            true,
            ReduceOptions::default(),
        )
        .unwrap();
        let expected = distance_km(&c, &p, DistanceMetric::Geodesic);
        assert_eq!(result[0].distance_km, expected);
    }

    #[test]
    fn test_haversine_option() {
        let c = center();
        let p = north_of(&c, 2.0);
        let options = ReduceOptions {
            metric: DistanceMetric::Haversine,
            ..ReduceOptions::default()
        };
        let result = reduce(vec![vec![located("p", p)]], &c, 3.0, &extractor(), true, options).unwrap();
        assert_eq!(result[0].distance_km, distance_km(&c, &p, DistanceMetric::Haversine));
    }
}
