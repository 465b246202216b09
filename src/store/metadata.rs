//! Single-slot record of the last successful import.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::types::ImportMetadata;

pub(crate) fn load(conn: &Connection) -> Result<Option<ImportMetadata>> {
    conn.query_row(
        "SELECT fingerprint, import_time, source FROM import_metadata WHERE id = 1",
        [],
        |row| {
            Ok(ImportMetadata {
                fingerprint: row.get(0)?,
                import_time: parse_datetime(&row.get::<_, String>(1)?),
                source: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(Error::from)
}

/// Overwrites the singleton. No history is kept.
pub(crate) fn save(conn: &Connection, metadata: &ImportMetadata) -> Result<()> {
    conn.execute(
        "INSERT INTO import_metadata (id, fingerprint, import_time, source)
         VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
             fingerprint = excluded.fingerprint,
             import_time = excluded.import_time,
             source = excluded.source",
        params![
            metadata.fingerprint,
            format_datetime(&metadata.import_time),
            metadata.source,
        ],
    )?;
    Ok(())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid import_time in database: '{}' - {}", s, e);
            DateTime::<Utc>::UNIX_EPOCH
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::schema;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        schema::apply(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_load_empty_returns_none() {
        assert!(load(&conn()).unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_singleton() {
        let conn = conn();
        let first = ImportMetadata {
            fingerprint: "aa".to_string(),
            import_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            source: "s1".to_string(),
        };
        let second = ImportMetadata {
            fingerprint: "bb".to_string(),
            import_time: Utc::now(),
            source: "s2".to_string(),
        };

        save(&conn, &first).unwrap();
        assert_eq!(load(&conn).unwrap(), Some(first));

        save(&conn, &second).unwrap();
        assert_eq!(load(&conn).unwrap(), Some(second));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM import_metadata", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_parse_datetime_accepts_sqlite_format() {
        let dt = parse_datetime("2024-03-01 12:30:00");
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());
    }
}
