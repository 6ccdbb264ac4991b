//! Store-agnostic query description and the per-cell range scan builder.
//!
//! A [`Query`] is a plain value: filters, ordering and an optional range on
//! one field. Stores interpret it; the radius search only ever builds one
//! shape of query per geohash cell:
//!
//! ```text
//! <caller refinements> ORDER BY geohash START AT prefix END BEFORE prefix + '\u{f8ff}'
//! ```

use crate::extract::QueryRefiner;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Sorts after every geohash symbol, so `prefix + RANGE_SENTINEL` bounds
/// every geohash that starts with `prefix`.
pub const RANGE_SENTINEL: char = '\u{f8ff}';

/// Comparison used by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// `field <op> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Evaluate against a field map. Missing fields and incomparable values never match.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        let ordering = || compare_values(actual, &self.value);
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Ne => actual != &self.value,
            FilterOp::Lt => ordering() == Some(Ordering::Less),
            FilterOp::Le => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Gt => ordering() == Some(Ordering::Greater),
            FilterOp::Ge => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Half-open range `[start_at, end_before)` over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    pub field: String,
    pub start_at: Value,
    pub end_before: Value,
}

impl FieldRange {
    pub fn contains(&self, fields: &Map<String, Value>) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        let above_start = matches!(
            compare_values(actual, &self.start_at),
            Some(Ordering::Greater | Ordering::Equal)
        );
        let below_end = matches!(
            compare_values(actual, &self.end_before),
            Some(Ordering::Less)
        );
        above_start && below_end
    }
}

/// A query against one collection.
///
/// # Examples
///
/// ```rust
/// use geoquery::query::{FilterOp, Query};
/// use serde_json::json;
///
/// let query = Query::new()
///     .where_field("kind", FilterOp::Eq, json!("cafe"))
///     .where_field("rating", FilterOp::Ge, json!(4));
/// assert_eq!(query.filters().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    filters: Vec<Filter>,
    order_by: Vec<OrderBy>,
    range: Option<FieldRange>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_field(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: Value) -> Self {
        self.where_field(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Restrict `field` to `[start_at, end_before)`. Replaces any earlier range.
    pub fn range(mut self, field: impl Into<String>, start_at: Value, end_before: Value) -> Self {
        self.range = Some(FieldRange {
            field: field.into(),
            start_at,
            end_before,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn field_range(&self) -> Option<&FieldRange> {
        self.range.as_ref()
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a field map passes every filter and the range.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.filters.iter().all(|filter| filter.matches(fields))
            && self.range.as_ref().is_none_or(|range| range.contains(fields))
    }

    /// Compare two field maps by this query's ordering clauses.
    pub fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        for order in &self.order_by {
            let ordering = match (a.get(&order.field), b.get(&order.field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Order two JSON values of the same kind. Mixed kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Inclusive lower and exclusive upper bound covering every geohash under `prefix`.
pub fn cell_range(prefix: &str) -> (String, String) {
    let mut end = String::with_capacity(prefix.len() + RANGE_SENTINEL.len_utf8());
    end.push_str(prefix);
    end.push(RANGE_SENTINEL);
    (prefix.to_string(), end)
}

/// Build the range scan for one geohash cell.
///
/// The refiner sees the base query first; ordering and bounds on
/// `geohash_field` are attached afterwards, so they are always the last clauses.
pub fn cell_query(
    base: Query,
    geohash_field: &str,
    prefix: &str,
    refiner: Option<&dyn QueryRefiner>,
) -> Query {
    let refined = match refiner {
        Some(refiner) => refiner.refine(base),
        None => base,
    };
    let (start, end) = cell_range(prefix);

    refined
        .order_by(geohash_field, Direction::Ascending)
        .range(geohash_field, Value::String(start), Value::String(end))
}
