use rusqlite::{Connection, Transaction};
use tracing::debug;

use super::spatial;
use crate::error::{Error, Result};

/// One idempotent DDL statement, named for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct SchemaStep {
    pub name: &'static str,
    pub sql: &'static str,
}

const fn step(name: &'static str, sql: &'static str) -> SchemaStep {
    SchemaStep { name, sql }
}

/// Applied in order inside a single transaction on every startup.
///
/// Domain tables carry no foreign keys: shapes load after the trips that
/// reference them, and feeds are not validated.
pub const SCHEMA: &[SchemaStep] = &[
    step(
        "create agencies",
        "CREATE TABLE IF NOT EXISTS agencies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            timezone TEXT NOT NULL,
            lang TEXT,
            phone TEXT,
            fare_url TEXT,
            email TEXT
        )",
    ),
    step(
        "create routes",
        "CREATE TABLE IF NOT EXISTS routes (
            id TEXT PRIMARY KEY,
            agency_id TEXT,           -- NULL = not set in feed
            short_name TEXT,
            long_name TEXT,
            description TEXT,
            route_type INTEGER NOT NULL,
            url TEXT,
            color TEXT,
            text_color TEXT,
            sort_order INTEGER,
            continuous_pickup INTEGER,
            continuous_drop_off INTEGER
        )",
    ),
    step(
        "create stops",
        // Integer key so the R*Tree can mirror rows by id.
        "CREATE TABLE IF NOT EXISTS stops (
            id INTEGER PRIMARY KEY,
            stop_id TEXT NOT NULL UNIQUE,
            code TEXT,
            name TEXT,
            description TEXT,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            zone_id TEXT,
            url TEXT,
            location_type INTEGER,
            parent_station TEXT,
            timezone TEXT,
            wheelchair_boarding INTEGER,
            platform_code TEXT
        )",
    ),
    step(
        "create calendars",
        "CREATE TABLE IF NOT EXISTS calendars (
            service_id TEXT PRIMARY KEY,
            monday INTEGER NOT NULL CHECK (monday IN (0, 1)),
            tuesday INTEGER NOT NULL CHECK (tuesday IN (0, 1)),
            wednesday INTEGER NOT NULL CHECK (wednesday IN (0, 1)),
            thursday INTEGER NOT NULL CHECK (thursday IN (0, 1)),
            friday INTEGER NOT NULL CHECK (friday IN (0, 1)),
            saturday INTEGER NOT NULL CHECK (saturday IN (0, 1)),
            sunday INTEGER NOT NULL CHECK (sunday IN (0, 1)),
            start_date TEXT NOT NULL,  -- YYYYMMDD
            end_date TEXT NOT NULL
        )",
    ),
    step(
        "create calendar_dates",
        "CREATE TABLE IF NOT EXISTS calendar_dates (
            service_id TEXT NOT NULL,
            date TEXT NOT NULL,
            exception_type INTEGER NOT NULL,
            PRIMARY KEY (service_id, date)
        )",
    ),
    step(
        "create trips",
        "CREATE TABLE IF NOT EXISTS trips (
            id TEXT PRIMARY KEY,
            route_id TEXT NOT NULL,
            service_id TEXT NOT NULL,
            headsign TEXT,
            short_name TEXT,
            direction_id INTEGER,
            block_id TEXT,
            shape_id TEXT,
            wheelchair_accessible INTEGER,
            bikes_allowed INTEGER
        )",
    ),
    step(
        "create stop_times",
        "CREATE TABLE IF NOT EXISTS stop_times (
            trip_id TEXT NOT NULL,
            arrival_time INTEGER,     -- seconds, may exceed 86400
            departure_time INTEGER,
            stop_id TEXT NOT NULL,
            stop_sequence INTEGER NOT NULL,
            stop_headsign TEXT,
            pickup_type INTEGER,
            drop_off_type INTEGER,
            shape_dist_traveled REAL,
            timepoint INTEGER,
            PRIMARY KEY (trip_id, stop_sequence)
        )",
    ),
    step(
        "create shape_points",
        "CREATE TABLE IF NOT EXISTS shape_points (
            shape_id TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            dist_traveled REAL,
            PRIMARY KEY (shape_id, sequence)
        )",
    ),
    step(
        "create import_metadata",
        "CREATE TABLE IF NOT EXISTS import_metadata (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            fingerprint TEXT NOT NULL,
            import_time TEXT NOT NULL,
            source TEXT NOT NULL
        )",
    ),
    step(
        "index routes by agency",
        "CREATE INDEX IF NOT EXISTS idx_routes_agency ON routes(agency_id)",
    ),
    step(
        "index stops by parent station",
        "CREATE INDEX IF NOT EXISTS idx_stops_parent ON stops(parent_station)",
    ),
    step(
        "index trips by route",
        "CREATE INDEX IF NOT EXISTS idx_trips_route ON trips(route_id)",
    ),
    step(
        "index trips by service",
        "CREATE INDEX IF NOT EXISTS idx_trips_service ON trips(service_id)",
    ),
    step(
        "index trips by shape",
        "CREATE INDEX IF NOT EXISTS idx_trips_shape ON trips(shape_id)",
    ),
    step(
        "index stop_times by stop",
        "CREATE INDEX IF NOT EXISTS idx_stop_times_stop ON stop_times(stop_id)",
    ),
    step("create stops_rtree", spatial::CREATE_RTREE),
    step("create stops_rtree insert trigger", spatial::CREATE_INSERT_TRIGGER),
    step("create stops_rtree update trigger", spatial::CREATE_UPDATE_TRIGGER),
    step("create stops_rtree delete trigger", spatial::CREATE_DELETE_TRIGGER),
];

/// Applies [`SCHEMA`]. Safe to call on every startup; a failure leaves no
/// partial schema behind.
pub fn apply(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction().map_err(|source| Error::Schema {
        step: "begin schema transaction",
        source,
    })?;

    for schema_step in SCHEMA {
        run_step(&tx, schema_step)?;
    }

    tx.commit().map_err(|source| Error::Schema {
        step: "commit schema transaction",
        source,
    })
}

fn run_step(tx: &Transaction<'_>, schema_step: &SchemaStep) -> Result<()> {
    debug!(step = schema_step.name, "Applying schema step");
    tx.execute(schema_step.sql, [])
        .map(|_| ())
        .map_err(|source| Error::Schema {
            step: schema_step.name,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_apply_creates_tables_and_triggers() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply(&mut conn).unwrap();

        let tables = object_names(&conn, "table");
        for expected in [
            "agencies",
            "routes",
            "stops",
            "calendars",
            "calendar_dates",
            "trips",
            "stop_times",
            "shape_points",
            "import_metadata",
            "stops_rtree",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }

        assert_eq!(
            object_names(&conn, "trigger"),
            vec![
                "stops_rtree_delete".to_string(),
                "stops_rtree_insert".to_string(),
                "stops_rtree_update".to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO agencies (id, name, url, timezone) VALUES ('A', 'Metro', 'https://a', 'UTC')",
            [],
        )
        .unwrap();

        apply(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM agencies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_each_step_is_idempotent_on_its_own() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply(&mut conn).unwrap();
        for schema_step in SCHEMA {
            conn.execute(schema_step.sql, [])
                .unwrap_or_else(|e| panic!("step '{}' not idempotent: {e}", schema_step.name));
        }
    }

    #[test]
    fn test_failed_step_reports_name_and_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        // A foreign stops table without parent_station breaks its index.
        conn.execute("CREATE TABLE stops (id INTEGER PRIMARY KEY)", [])
            .unwrap();

        let err = apply(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema {
                step: "index stops by parent station",
                ..
            }
        ));

        let tables = object_names(&conn, "table");
        assert!(!tables.contains(&"agencies".to_string()));
    }
}
