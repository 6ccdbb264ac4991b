//! Caller-supplied strategies: reading a point out of a document and
//! refining the per-cell query.
//!
//! Both are single-method traits with blanket implementations for closures,
//! so callers can pass either a closure or a dedicated type.

use crate::query::Query;
use crate::types::{Document, GeoPoint};
use serde_json::Value;

/// Reads a document's coordinate.
///
/// Returning `None` for a document that exists is a contract violation and
/// fails the search with `MissingCoordinate`.
pub trait PointExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Option<GeoPoint>;
}

impl<F> PointExtractor for F
where
    F: Fn(&Document) -> Option<GeoPoint> + Send + Sync,
{
    fn extract(&self, document: &Document) -> Option<GeoPoint> {
        self(document)
    }
}

/// Adds filters or ordering to the base query before the geohash bounds are attached.
pub trait QueryRefiner: Send + Sync {
    fn refine(&self, query: Query) -> Query;
}

impl<F> QueryRefiner for F
where
    F: Fn(Query) -> Query + Send + Sync,
{
    fn refine(&self, query: Query) -> Query {
        self(query)
    }
}

/// Extracts a point stored under a single field.
///
/// Accepted shapes:
/// - `{ "latitude": 50.3, "longitude": 7.6 }`
/// - `{ "lat": 50.3, "lng": 7.6 }` (or `"lon"`)
/// - `[50.3, 7.6]` (latitude first)
///
/// ```rust
/// use geoquery::{Document, FieldExtractor, PointExtractor};
/// use serde_json::json;
///
/// let doc = Document::from_value(
///     "koblenz",
///     json!({ "coordinates": { "latitude": 50.35, "longitude": 7.59 } }),
/// )?;
/// let point = FieldExtractor::new("coordinates").extract(&doc).unwrap();
/// assert_eq!(point.latitude(), 50.35);
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExtractor {
    field: String,
}

impl FieldExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl PointExtractor for FieldExtractor {
    fn extract(&self, document: &Document) -> Option<GeoPoint> {
        point_from_value(document.get(&self.field)?)
    }
}

/// Parse a coordinate from one of the shapes [`FieldExtractor`] accepts.
pub fn point_from_value(value: &Value) -> Option<GeoPoint> {
    let (latitude, longitude) = match value {
        Value::Object(map) => {
            let latitude = map.get("latitude").or_else(|| map.get("lat"))?;
            let longitude = map
                .get("longitude")
                .or_else(|| map.get("lng"))
                .or_else(|| map.get("lon"))?;
            (latitude.as_f64()?, longitude.as_f64()?)
        }
        Value::Array(items) if items.len() == 2 => (items[0].as_f64()?, items[1].as_f64()?),
        _ => return None,
    };

    GeoPoint::new(latitude, longitude).ok()
}
