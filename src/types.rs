//! Value types shared by the codec, the store boundary and the reducer.
use crate::compute::validation::validate_lat_lon;
use crate::error::{GeoQueryError, Result};
use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A latitude/longitude pair in degrees.
///
/// Construction validates the ranges, so every `GeoPoint` in circulation is a
/// valid geographic coordinate.
///
/// ```rust
/// use geoquery::GeoPoint;
///
/// let koblenz = GeoPoint::new(50.304328, 7.59378)?;
/// assert_eq!(koblenz.latitude(), 50.304328);
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatLon", into = "LatLon")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct LatLon {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<LatLon> for GeoPoint {
    type Error = GeoQueryError;

    fn try_from(raw: LatLon) -> Result<Self> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for LatLon {
    fn from(point: GeoPoint) -> Self {
        LatLon {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

impl GeoPoint {
    /// Create a point, failing with `InvalidCoordinate` when out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        validate_lat_lon(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The same coordinate as a `geo::Point` (x = longitude, y = latitude).
    pub fn to_point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<GeoPoint> for Point {
    fn from(point: GeoPoint) -> Self {
        point.to_point()
    }
}

impl TryFrom<Point> for GeoPoint {
    type Error = GeoQueryError;

    fn try_from(point: Point) -> Result<Self> {
        GeoPoint::new(point.y(), point.x())
    }
}

/// A stored record: an ID plus a JSON field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON value, which must be an object.
    ///
    /// ```rust
    /// use geoquery::Document;
    /// use serde_json::json;
    ///
    /// let doc = Document::from_value("berlin", json!({ "name": "Berlin" }))?;
    /// assert_eq!(doc.get("name"), Some(&json!("Berlin")));
    /// # Ok::<(), geoquery::GeoQueryError>(())
    /// ```
    pub fn from_value(id: impl Into<String>, value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self::new(id, fields)),
            other => Err(GeoQueryError::InvalidArgument(format!(
                "document body must be a JSON object, got: {}",
                other
            ))),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// The geohash stored under `field`, if it is a string.
    pub fn geohash(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

/// One row returned by a range scan.
///
/// A snapshot can refer to a document that no longer exists: the geohash index
/// may still hold an entry for a document removed after it was indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    id: String,
    data: Option<Map<String, Value>>,
}

impl DocumentSnapshot {
    /// Snapshot of a live document.
    pub fn found(document: Document) -> Self {
        Self {
            id: document.id,
            data: Some(document.fields),
        }
    }

    /// Snapshot of an index entry whose document is gone.
    pub fn missing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    /// Materialize the document; `None` when it does not exist.
    pub fn into_document(self) -> Option<Document> {
        let id = self.id;
        self.data.map(|fields| Document::new(id, fields))
    }
}

impl From<Document> for DocumentSnapshot {
    fn from(document: Document) -> Self {
        DocumentSnapshot::found(document)
    }
}

/// A matched document annotated with its distance from the query center.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDocument {
    pub document: Document,
    /// Distance from the center to the document's own coordinate, in kilometers.
    pub distance_km: f64,
}

impl GeoDocument {
    pub fn into_document(self) -> Document {
        self.document
    }
}
