//! Maps parsed feed records to rows and writes them table by table.
//!
//! Every table is loaded in its own IMMEDIATE transaction. A failure rolls
//! back that table only; tables committed earlier in the same load stay.

use std::collections::HashSet;
use std::time::Instant;

use rusqlite::{Connection, TransactionBehavior};
use tracing::debug;

use crate::error::{Error, Result};
use crate::feed::*;
use crate::store::SqliteStore;
use crate::store::rows::TableRow;
use crate::types::*;

/// Rows written between two deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 512;

/// Called after a table commits, with the rows it now holds from this feed.
pub type TableHook<'a> = &'a dyn Fn(Table, usize);

pub struct Loader<'a> {
    store: &'a SqliteStore,
    deadline: Option<Instant>,
    on_table_loaded: Option<TableHook<'a>>,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self {
            store,
            deadline: None,
            on_table_loaded: None,
        }
    }

    /// Abort with [`Error::Cancelled`] once `deadline` has passed.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn on_table_loaded(mut self, hook: Option<TableHook<'a>>) -> Self {
        self.on_table_loaded = hook;
        self
    }

    /// Loads `feed` in dependency order and returns the distinct rows written
    /// per table. Records repeating a key replace the earlier one and are
    /// counted once.
    pub fn load(&self, feed: &Feed) -> Result<TableCounts> {
        let mut conn = self.store.conn()?;
        let mut counts = TableCounts::default();

        let fallback_agency = single_agency_id(&feed.agencies);

        let agencies: Vec<Agency> = feed.agencies.iter().map(agency_row).collect();
        counts.insert(Table::Agency, self.load_table(&mut conn, &agencies)?);

        let routes: Vec<Route> = feed
            .routes
            .iter()
            .map(|route| route_row(route, fallback_agency))
            .collect();
        counts.insert(Table::Route, self.load_table(&mut conn, &routes)?);

        let stops: Vec<Stop> = feed.stops.iter().map(stop_row).collect();
        counts.insert(Table::Stop, self.load_table(&mut conn, &stops)?);

        let calendars: Vec<Calendar> = feed.calendars.iter().map(calendar_row).collect();
        counts.insert(Table::Calendar, self.load_table(&mut conn, &calendars)?);

        let calendar_dates: Vec<CalendarDate> = feed
            .calendar_dates
            .iter()
            .map(calendar_date_row)
            .collect();
        counts.insert(
            Table::CalendarDate,
            self.load_table(&mut conn, &calendar_dates)?,
        );

        let trips: Vec<Trip> = feed.trips.iter().map(trip_row).collect();
        counts.insert(Table::Trip, self.load_table(&mut conn, &trips)?);

        let stop_times: Vec<StopTime> = feed
            .trips
            .iter()
            .flat_map(|trip| {
                trip.stop_times
                    .iter()
                    .map(move |stop_time| stop_time_row(&trip.id, stop_time))
            })
            .collect();
        counts.insert(Table::StopTime, self.load_table(&mut conn, &stop_times)?);

        let shape_points: Vec<ShapePoint> = feed
            .shapes
            .iter()
            .flat_map(|shape| {
                shape
                    .points
                    .iter()
                    .map(move |point| shape_point_row(&shape.id, point))
            })
            .collect();
        counts.insert(Table::Shape, self.load_table(&mut conn, &shape_points)?);

        Ok(counts)
    }

    fn load_table<R: TableRow>(&self, conn: &mut Connection, rows: &[R]) -> Result<usize> {
        let table = R::TABLE;
        let started = Instant::now();
        self.check_deadline(table)?;

        // Dropping `tx` on any early return rolls the batch back.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(Error::transaction(table))?;
        let mut keys = HashSet::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(R::UPSERT).map_err(Error::transaction(table))?;
            for (i, row) in rows.iter().enumerate() {
                if i > 0 && i % DEADLINE_CHECK_INTERVAL == 0 {
                    self.check_deadline(table)?;
                }
                row.upsert(&mut stmt).map_err(Error::transaction(table))?;
                keys.insert(row.key());
            }
        }
        tx.commit().map_err(Error::transaction(table))?;

        let loaded = keys.len();
        debug!(
            table = %table,
            rows = loaded,
            duplicates = rows.len() - loaded,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Loaded table"
        );
        if let Some(hook) = self.on_table_loaded {
            hook(table, loaded);
        }
        Ok(loaded)
    }

    fn check_deadline(&self, table: Table) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::Cancelled { table }),
            _ => Ok(()),
        }
    }
}

/// The id routes without an agency reference fall back to: the sole
/// agency's id, if the feed has exactly one agency and it carries an id.
fn single_agency_id(agencies: &[AgencyRecord]) -> Option<&str> {
    match agencies {
        [only] => only.id.as_deref().filter(|id| !id.is_empty()),
        _ => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

fn agency_row(record: &AgencyRecord) -> Agency {
    Agency {
        id: record.id.clone().unwrap_or_default(),
        name: record.name.clone(),
        url: record.url.clone(),
        timezone: record.timezone.clone(),
        lang: record.lang.clone(),
        phone: record.phone.clone(),
        fare_url: record.fare_url.clone(),
        email: record.email.clone(),
    }
}

fn route_row(record: &RouteRecord, fallback_agency: Option<&str>) -> Route {
    Route {
        id: record.id.clone(),
        agency_id: non_empty(&record.agency_id).or_else(|| fallback_agency.map(str::to_string)),
        short_name: record.short_name.clone(),
        long_name: record.long_name.clone(),
        description: record.description.clone(),
        route_type: record.route_type,
        url: record.url.clone(),
        color: record.color.clone(),
        text_color: record.text_color.clone(),
        sort_order: record.sort_order,
        continuous_pickup: record.continuous_pickup,
        continuous_drop_off: record.continuous_drop_off,
    }
}

fn stop_row(record: &StopRecord) -> Stop {
    Stop {
        id: record.id.clone(),
        code: record.code.clone(),
        name: record.name.clone(),
        description: record.description.clone(),
        lat: record.lat,
        lon: record.lon,
        zone_id: record.zone_id.clone(),
        url: record.url.clone(),
        location_type: record.location_type,
        parent_station: non_empty(&record.parent_station),
        timezone: record.timezone.clone(),
        wheelchair_boarding: record.wheelchair_boarding,
        platform_code: record.platform_code.clone(),
    }
}

fn calendar_row(record: &CalendarRecord) -> Calendar {
    Calendar {
        service_id: record.service_id.clone(),
        monday: i32::from(record.monday),
        tuesday: i32::from(record.tuesday),
        wednesday: i32::from(record.wednesday),
        thursday: i32::from(record.thursday),
        friday: i32::from(record.friday),
        saturday: i32::from(record.saturday),
        sunday: i32::from(record.sunday),
        start_date: record.start_date.clone(),
        end_date: record.end_date.clone(),
    }
}

fn calendar_date_row(record: &CalendarDateRecord) -> CalendarDate {
    CalendarDate {
        service_id: record.service_id.clone(),
        date: record.date.clone(),
        exception_type: record.exception_type,
    }
}

fn trip_row(record: &TripRecord) -> Trip {
    Trip {
        id: record.id.clone(),
        route_id: record.route_id.clone(),
        service_id: record.service_id.clone(),
        headsign: record.headsign.clone(),
        short_name: record.short_name.clone(),
        direction_id: record.direction_id,
        block_id: record.block_id.clone(),
        shape_id: non_empty(&record.shape_id),
        wheelchair_accessible: record.wheelchair_accessible,
        bikes_allowed: record.bikes_allowed,
    }
}

fn stop_time_row(trip_id: &str, record: &StopTimeRecord) -> StopTime {
    StopTime {
        trip_id: trip_id.to_string(),
        arrival_time: record.arrival_time,
        departure_time: record.departure_time,
        stop_id: record.stop_id.clone(),
        stop_sequence: record.stop_sequence,
        stop_headsign: record.stop_headsign.clone(),
        pickup_type: record.pickup_type,
        drop_off_type: record.drop_off_type,
        shape_dist_traveled: record.shape_dist_traveled,
        timepoint: record.timepoint,
    }
}

fn shape_point_row(shape_id: &str, record: &ShapePointRecord) -> ShapePoint {
    ShapePoint {
        shape_id: shape_id.to_string(),
        sequence: record.sequence,
        lat: record.lat,
        lon: record.lon,
        dist_traveled: record.dist_traveled,
    }
}
