//! Geohash cells covering a radius search.

use crate::compute::geohash::{encode, neighbors, truncate};
use crate::compute::precision::{COARSEST_PRECISION, search_precision};
use crate::compute::validation::validate_precision;
use crate::error::Result;
use crate::types::GeoPoint;
use log::{debug, warn};
use smallvec::SmallVec;

/// Precision the center is encoded at before truncation.
const CENTER_PRECISION: usize = 9;

/// Deduplicated cell prefixes to scan, the center's own cell first.
///
/// Holds at most nine entries: the center cell plus its eight neighbors.
pub type CellSet = SmallVec<[String; 9]>;

/// Cells to scan for a search of `radius_km` around `center`.
///
/// The center is encoded at precision 9 and truncated to the precision
/// selected for `radius_km × buffer`; that cell and its eight neighbors are
/// returned. Neighbors that coincide (polar rows, very coarse precisions) are
/// collapsed, so the result has between 1 and 9 entries.
///
/// # Examples
///
/// ```rust
/// use geoquery::GeoPoint;
/// use geoquery::compute::cells::cells_in_radius;
///
/// let center = GeoPoint::new(50.304328, 7.59378)?;
/// let cells = cells_in_radius(&center, 3.0, 1.02)?;
/// assert_eq!(cells.len(), 9);
/// assert_eq!(cells[0], "u0vqh");
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
pub fn cells_in_radius(center: &GeoPoint, radius_km: f64, buffer: f64) -> Result<CellSet> {
    cells_in_radius_capped(center, radius_km, buffer, CENTER_PRECISION)
}

/// Like [`cells_in_radius`], never choosing cells finer than `max_precision`.
///
/// Documents indexed with `max_precision` characters sort before every finer
/// prefix of their own cell, so scanning finer cells would skip them.
pub fn cells_in_radius_capped(
    center: &GeoPoint,
    radius_km: f64,
    buffer: f64,
    max_precision: usize,
) -> Result<CellSet> {
    validate_precision(max_precision)?;

    let wanted = search_precision(radius_km, buffer);
    if wanted == COARSEST_PRECISION {
        warn!(
            "radius {} km exceeds the coarsest geohash cell; results may be incomplete",
            radius_km
        );
    }
    let precision = wanted.min(max_precision);
    if precision < wanted {
        warn!(
            "search precision {} capped at index precision {}; scans cover a wider area",
            wanted, max_precision
        );
    }

    let full = encode(center, CENTER_PRECISION)?;
    let own = truncate(&full, precision).to_string();

    let nb = neighbors(&own)?;
    let mut cells = CellSet::new();
    cells.push(own);
    // Clamped polar neighbors can repeat each other or the own cell.
    for neighbor in nb.into_array() {
        push_unique(&mut cells, neighbor);
    }

    debug!(
        "radius {} km -> precision {}, {} cells: {:?}",
        radius_km,
        precision,
        cells.len(),
        cells
    );

    Ok(cells)
}

fn push_unique(cells: &mut CellSet, cell: String) {
    if !cells.contains(&cell) {
        cells.push(cell);
    }
}
