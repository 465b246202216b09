use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Params};
use tracing::info;

use super::rows::TableRow;
use super::{Store, metadata, schema, spatial};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::*;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// SQLite-backed store behind a bounded connection pool.
///
/// Every pooled connection runs in WAL mode, so readers can list tables
/// while an import holds the write lock for one table batch.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path` with default
    /// pool settings.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut config = StoreConfig::default();
        config.database.path = db_path.as_ref().to_path_buf();
        Self::open(&config)
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let db_path = &config.database.path;
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let busy_timeout = config.database.busy_timeout();
        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            // REPLACE conflicts only fire delete triggers with this on.
            conn.pragma_update(None, "recursive_triggers", "ON")?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.pool.max_connections)
            .min_idle(config.pool.min_idle)
            .idle_timeout(config.pool.idle_timeout())
            .max_lifetime(config.pool.max_lifetime())
            .connection_timeout(Duration::from_secs(30))
            .build(manager)?;

        info!(
            "Opened {} (pool max {})",
            db_path.display(),
            config.pool.max_connections
        );

        Ok(Self { pool })
    }

    pub(crate) fn conn(&self) -> Result<PooledConnection> {
        self.pool.get().map_err(Error::from)
    }

    /// Checks a connection out of the pool.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> Result<PooledConnection> {
        self.conn()
    }
}

fn query_rows<R: TableRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<R>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, R::from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn list_all<R: TableRow>(conn: &Connection) -> Result<Vec<R>> {
    let sql = format!("{} ORDER BY {}", R::SELECT, R::ORDER_BY);
    query_rows(conn, &sql, [])
}

fn count(conn: &Connection, table: Table) -> Result<usize> {
    let n: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.sql_name()),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(n).unwrap_or_default())
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let mut conn = self.conn()?;
        schema::apply(&mut conn)
    }

    // Import metadata

    fn get_import_metadata(&self) -> Result<Option<ImportMetadata>> {
        metadata::load(&*self.conn()?)
    }

    fn set_import_metadata(&self, metadata: &ImportMetadata) -> Result<()> {
        metadata::save(&*self.conn()?, metadata)
    }

    fn clear_all_data(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for table in Table::LOAD_ORDER.iter().rev() {
            tx.execute(&format!("DELETE FROM {}", table.sql_name()), [])?;
        }

        tx.commit()?;
        info!("Cleared all feed tables");
        Ok(())
    }

    // Counts

    fn count_rows(&self, table: Table) -> Result<usize> {
        count(&*self.conn()?, table)
    }

    fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.conn()?;
        let mut counts = TableCounts::default();
        for table in Table::LOAD_ORDER {
            counts.insert(table, count(&conn, table)?);
        }
        Ok(counts)
    }

    // Table listings

    fn list_agencies(&self) -> Result<Vec<Agency>> {
        list_all(&*self.conn()?)
    }

    fn list_routes(&self) -> Result<Vec<Route>> {
        list_all(&*self.conn()?)
    }

    fn list_stops(&self) -> Result<Vec<Stop>> {
        list_all(&*self.conn()?)
    }

    fn get_stop(&self, stop_id: &str) -> Result<Option<Stop>> {
        let sql = format!("{} WHERE stops.stop_id = ?1", Stop::SELECT);
        let mut stops: Vec<Stop> = query_rows(&*self.conn()?, &sql, [stop_id])?;
        Ok(stops.pop())
    }

    fn list_calendars(&self) -> Result<Vec<Calendar>> {
        list_all(&*self.conn()?)
    }

    fn list_calendar_dates(&self) -> Result<Vec<CalendarDate>> {
        list_all(&*self.conn()?)
    }

    fn list_trips(&self) -> Result<Vec<Trip>> {
        list_all(&*self.conn()?)
    }

    fn list_stop_times(&self) -> Result<Vec<StopTime>> {
        list_all(&*self.conn()?)
    }

    fn list_stop_times_for_trip(&self, trip_id: &str) -> Result<Vec<StopTime>> {
        let sql = format!("{} WHERE trip_id = ?1 ORDER BY stop_sequence", StopTime::SELECT);
        query_rows(&*self.conn()?, &sql, [trip_id])
    }

    fn list_shape_points(&self, shape_id: &str) -> Result<Vec<ShapePoint>> {
        let sql = format!("{} WHERE shape_id = ?1 ORDER BY sequence", ShapePoint::SELECT);
        query_rows(&*self.conn()?, &sql, [shape_id])
    }

    // Spatial index

    fn find_stops_in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<Stop>> {
        spatial::find_stops_in_bbox(&*self.conn()?, bbox)
    }

    fn list_spatial_entries(&self) -> Result<Vec<SpatialEntry>> {
        spatial::list_entries(&*self.conn()?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rusqlite::params;
    use tempfile::TempDir;

    use super::*;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: id.to_string(),
            code: None,
            name: Some(format!("Stop {id}")),
            description: None,
            lat,
            lon,
            zone_id: None,
            url: None,
            location_type: Some(0),
            parent_station: None,
            timezone: None,
            wheelchair_boarding: None,
            platform_code: None,
        }
    }

    fn upsert_stops(store: &SqliteStore, stops: &[Stop]) {
        let conn = store.conn().unwrap();
        let mut stmt = conn.prepare(Stop::UPSERT).unwrap();
        for s in stops {
            s.upsert(&mut stmt).unwrap();
        }
    }

    fn assert_mirrored(store: &SqliteStore) {
        let stops = store.list_stops().unwrap();
        let entries = store.list_spatial_entries().unwrap();
        assert_eq!(stops.len(), entries.len());

        let conn = store.conn().unwrap();
        for s in &stops {
            let row_id: i64 = conn
                .query_row("SELECT id FROM stops WHERE stop_id = ?1", [&s.id], |row| {
                    row.get(0)
                })
                .unwrap();
            let matching: Vec<_> = entries.iter().filter(|e| e.stop_row_id == row_id).collect();
            assert_eq!(matching.len(), 1, "stop {} should have one entry", s.id);
            let entry = matching[0];
            // R*Tree bounds are 32-bit floats rounded outward.
            assert!(entry.min_lat <= s.lat && s.lat <= entry.max_lat);
            assert!(entry.min_lon <= s.lon && s.lon <= entry.max_lon);
            assert!(entry.max_lat - entry.min_lat < 1e-4);
            assert!(entry.max_lon - entry.min_lon < 1e-4);
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in Table::LOAD_ORDER {
            assert!(tables.contains(&table.sql_name().to_string()));
        }
        assert!(tables.contains(&"import_metadata".to_string()));
        assert!(tables.contains(&"stops_rtree".to_string()));
    }

    #[test]
    fn test_initialize_is_repeatable() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        upsert_stops(&store, &[stop("S1", 47.0, 8.0)]);

        store.initialize().unwrap();
        drop(store);

        let reopened = open_store(&temp);
        assert_eq!(reopened.count_rows(Table::Stop).unwrap(), 1);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/feeds.db");
        let store = SqliteStore::new(&path).unwrap();
        store.initialize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_spatial_index_follows_inserts_updates_and_deletes() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        upsert_stops(&store, &[stop("S1", 47.37, 8.54), stop("S2", 46.95, 7.44)]);
        assert_mirrored(&store);

        // Upsert moves S1 and keeps a single entry for it.
        upsert_stops(&store, &[stop("S1", 47.50, 8.72)]);
        assert_eq!(store.list_spatial_entries().unwrap().len(), 2);
        assert_mirrored(&store);

        // Plain UPDATE and DELETE through custom SQL are mirrored too.
        {
            let conn = store.connection().unwrap();
            conn.execute(
                "UPDATE stops SET lat = ?1, lon = ?2 WHERE stop_id = 'S2'",
                params![46.0, 7.0],
            )
            .unwrap();
        }
        assert_mirrored(&store);

        {
            let conn = store.connection().unwrap();
            conn.execute("DELETE FROM stops WHERE stop_id = 'S1'", [])
                .unwrap();
        }
        assert_eq!(store.list_spatial_entries().unwrap().len(), 1);
        assert_mirrored(&store);
    }

    #[test]
    fn test_spatial_index_follows_replace_conflicts() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        {
            let conn = store.connection().unwrap();
            conn.execute(
                "INSERT INTO stops (stop_id, lat, lon) VALUES ('S1', 1.0, 2.0)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT OR REPLACE INTO stops (stop_id, lat, lon) VALUES ('S1', 3.0, 4.0)",
                [],
            )
            .unwrap();
        }

        assert_eq!(store.list_spatial_entries().unwrap().len(), 1);
        assert_mirrored(&store);
        assert_eq!(store.get_stop("S1").unwrap().unwrap().lat, 3.0);
    }

    #[test]
    fn test_upsert_keeps_row_id_of_existing_stop() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        upsert_stops(&store, &[stop("S1", 47.0, 8.0)]);
        let before: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT id FROM stops WHERE stop_id = 'S1'", [], |row| {
                row.get(0)
            })
            .unwrap();

        let mut renamed = stop("S1", 47.0, 8.0);
        renamed.name = Some("Renamed".to_string());
        upsert_stops(&store, &[renamed]);

        let after: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT id FROM stops WHERE stop_id = 'S1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(before, after);
        assert_eq!(
            store.get_stop("S1").unwrap().unwrap().name.as_deref(),
            Some("Renamed")
        );
    }

    #[test]
    fn test_find_stops_in_bbox() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        upsert_stops(
            &store,
            &[
                stop("ZRH", 47.3779, 8.5403),
                stop("BRN", 46.9490, 7.4391),
                stop("OER", 47.4118, 8.5446),
            ],
        );

        let bbox = BoundingBox {
            min_lat: 47.3,
            min_lon: 8.4,
            max_lat: 47.5,
            max_lon: 8.6,
        };
        let found: Vec<String> = store
            .find_stops_in_bbox(&bbox)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(found, vec!["OER".to_string(), "ZRH".to_string()]);

        let empty = BoundingBox {
            min_lat: 0.0,
            min_lon: 0.0,
            max_lat: 1.0,
            max_lon: 1.0,
        };
        assert!(store.find_stops_in_bbox(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_clear_all_data_keeps_metadata() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        upsert_stops(&store, &[stop("S1", 47.0, 8.0), stop("S2", 46.0, 7.0)]);
        let metadata = ImportMetadata {
            fingerprint: "abc".to_string(),
            import_time: Utc::now(),
            source: "feed.zip".to_string(),
        };
        store.set_import_metadata(&metadata).unwrap();

        store.clear_all_data().unwrap();

        assert_eq!(store.table_counts().unwrap().total(), 0);
        assert!(store.list_spatial_entries().unwrap().is_empty());
        assert_eq!(store.get_import_metadata().unwrap(), Some(metadata));
    }

    #[test]
    fn test_reads_proceed_during_open_write_transaction() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        upsert_stops(&store, &[stop("S1", 47.0, 8.0)]);

        let mut writer = store.conn().unwrap();
        let tx = writer
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .unwrap();
        tx.execute(
            "INSERT INTO agencies (id, name, url, timezone) VALUES ('A', 'Metro', 'https://a', 'UTC')",
            [],
        )
        .unwrap();

        // Uncommitted rows are invisible, committed ones stay readable.
        assert_eq!(store.count_rows(Table::Agency).unwrap(), 0);
        assert_eq!(store.list_stops().unwrap().len(), 1);

        tx.commit().unwrap();
        assert_eq!(store.count_rows(Table::Agency).unwrap(), 1);
    }
}
