//! R*Tree mirror of the `stops` table.
//!
//! The mirror is maintained only by the triggers below. Nothing in the crate
//! writes to `stops_rtree` directly; every stop insert, update, or delete
//! updates it inside the same statement.

use rusqlite::{Connection, params};

use super::rows::TableRow;
use crate::error::{Error, Result};
use crate::types::{BoundingBox, SpatialEntry, Stop};

pub(crate) const CREATE_RTREE: &str = "CREATE VIRTUAL TABLE IF NOT EXISTS stops_rtree USING rtree(
    id,
    min_lat, max_lat,
    min_lon, max_lon
)";

pub(crate) const CREATE_INSERT_TRIGGER: &str = "CREATE TRIGGER IF NOT EXISTS stops_rtree_insert
AFTER INSERT ON stops
BEGIN
    INSERT INTO stops_rtree (id, min_lat, max_lat, min_lon, max_lon)
    VALUES (new.id, new.lat, new.lat, new.lon, new.lon);
END";

pub(crate) const CREATE_UPDATE_TRIGGER: &str = "CREATE TRIGGER IF NOT EXISTS stops_rtree_update
AFTER UPDATE OF id, lat, lon ON stops
BEGIN
    DELETE FROM stops_rtree WHERE id = old.id;
    INSERT INTO stops_rtree (id, min_lat, max_lat, min_lon, max_lon)
    VALUES (new.id, new.lat, new.lat, new.lon, new.lon);
END";

pub(crate) const CREATE_DELETE_TRIGGER: &str = "CREATE TRIGGER IF NOT EXISTS stops_rtree_delete
AFTER DELETE ON stops
BEGIN
    DELETE FROM stops_rtree WHERE id = old.id;
END";

/// Stops whose location lies inside `bbox`.
///
/// The R*Tree stores 32-bit bounds rounded outward, so candidates are
/// re-checked against the exact coordinates.
pub(crate) fn find_stops_in_bbox(conn: &Connection, bbox: &BoundingBox) -> Result<Vec<Stop>> {
    let sql = format!(
        "{} JOIN stops_rtree AS r ON r.id = stops.id
         WHERE r.max_lat >= ?1 AND r.min_lat <= ?3
           AND r.max_lon >= ?2 AND r.min_lon <= ?4
         ORDER BY stops.stop_id",
        Stop::SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon],
        Stop::from_row,
    )?;

    let candidates = rows
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)?;

    Ok(candidates
        .into_iter()
        .filter(|stop| bbox.contains(stop.lat, stop.lon))
        .collect())
}

pub(crate) fn list_entries(conn: &Connection) -> Result<Vec<SpatialEntry>> {
    let mut stmt =
        conn.prepare("SELECT id, min_lat, max_lat, min_lon, max_lon FROM stops_rtree ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(SpatialEntry {
            stop_row_id: row.get(0)?,
            min_lat: row.get(1)?,
            max_lat: row.get(2)?,
            min_lon: row.get(3)?,
            max_lon: row.get(4)?,
        })
    })?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}
