//! Column mappings between row types and their tables.

use std::hash::Hash;

use rusqlite::{Row, Statement, params};

use crate::types::*;

/// A row type stored in one domain table.
pub(crate) trait TableRow: Sized {
    const TABLE: Table;
    /// Insert-or-replace keyed on the table's primary key.
    const UPSERT: &'static str;
    /// `SELECT <columns> FROM <table>` in the order [`TableRow::from_row`] reads.
    const SELECT: &'static str;
    const ORDER_BY: &'static str;

    /// Primary key. Rows of one batch sharing a key end up as one stored row.
    type Key<'r>: Eq + Hash
    where
        Self: 'r;

    fn key(&self) -> Self::Key<'_>;

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl TableRow for Agency {
    const TABLE: Table = Table::Agency;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO agencies
        (id, name, url, timezone, lang, phone, fare_url, email)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
    const SELECT: &'static str =
        "SELECT id, name, url, timezone, lang, phone, fare_url, email FROM agencies";
    const ORDER_BY: &'static str = "id";

    type Key<'r> = &'r str;

    fn key(&self) -> Self::Key<'_> {
        &self.id
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.name,
            self.url,
            self.timezone,
            self.lang,
            self.phone,
            self.fare_url,
            self.email,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            timezone: row.get(3)?,
            lang: row.get(4)?,
            phone: row.get(5)?,
            fare_url: row.get(6)?,
            email: row.get(7)?,
        })
    }
}

impl TableRow for Route {
    const TABLE: Table = Table::Route;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO routes
        (id, agency_id, short_name, long_name, description, route_type, url, color,
         text_color, sort_order, continuous_pickup, continuous_drop_off)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";
    const SELECT: &'static str = "SELECT id, agency_id, short_name, long_name, description,
        route_type, url, color, text_color, sort_order, continuous_pickup, continuous_drop_off
        FROM routes";
    const ORDER_BY: &'static str = "id";

    type Key<'r> = &'r str;

    fn key(&self) -> Self::Key<'_> {
        &self.id
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.agency_id,
            self.short_name,
            self.long_name,
            self.description,
            self.route_type,
            self.url,
            self.color,
            self.text_color,
            self.sort_order,
            self.continuous_pickup,
            self.continuous_drop_off,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            agency_id: row.get(1)?,
            short_name: row.get(2)?,
            long_name: row.get(3)?,
            description: row.get(4)?,
            route_type: row.get(5)?,
            url: row.get(6)?,
            color: row.get(7)?,
            text_color: row.get(8)?,
            sort_order: row.get(9)?,
            continuous_pickup: row.get(10)?,
            continuous_drop_off: row.get(11)?,
        })
    }
}

impl TableRow for Stop {
    const TABLE: Table = Table::Stop;
    // Updates in place so the row id, and with it the R*Tree entry, survives
    // a reimport.
    const UPSERT: &'static str = "INSERT INTO stops
        (stop_id, code, name, description, lat, lon, zone_id, url, location_type,
         parent_station, timezone, wheelchair_boarding, platform_code)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(stop_id) DO UPDATE SET
            code = excluded.code,
            name = excluded.name,
            description = excluded.description,
            lat = excluded.lat,
            lon = excluded.lon,
            zone_id = excluded.zone_id,
            url = excluded.url,
            location_type = excluded.location_type,
            parent_station = excluded.parent_station,
            timezone = excluded.timezone,
            wheelchair_boarding = excluded.wheelchair_boarding,
            platform_code = excluded.platform_code";
    const SELECT: &'static str = "SELECT stops.stop_id, stops.code, stops.name,
        stops.description, stops.lat, stops.lon, stops.zone_id, stops.url,
        stops.location_type, stops.parent_station, stops.timezone,
        stops.wheelchair_boarding, stops.platform_code
        FROM stops";
    const ORDER_BY: &'static str = "stop_id";

    type Key<'r> = &'r str;

    fn key(&self) -> Self::Key<'_> {
        &self.id
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.code,
            self.name,
            self.description,
            self.lat,
            self.lon,
            self.zone_id,
            self.url,
            self.location_type,
            self.parent_station,
            self.timezone,
            self.wheelchair_boarding,
            self.platform_code,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            lat: row.get(4)?,
            lon: row.get(5)?,
            zone_id: row.get(6)?,
            url: row.get(7)?,
            location_type: row.get(8)?,
            parent_station: row.get(9)?,
            timezone: row.get(10)?,
            wheelchair_boarding: row.get(11)?,
            platform_code: row.get(12)?,
        })
    }
}

impl TableRow for Calendar {
    const TABLE: Table = Table::Calendar;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO calendars
        (service_id, monday, tuesday, wednesday, thursday, friday, saturday, sunday,
         start_date, end_date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
    const SELECT: &'static str = "SELECT service_id, monday, tuesday, wednesday, thursday,
        friday, saturday, sunday, start_date, end_date FROM calendars";
    const ORDER_BY: &'static str = "service_id";

    type Key<'r> = &'r str;

    fn key(&self) -> Self::Key<'_> {
        &self.service_id
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.service_id,
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
            self.start_date,
            self.end_date,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            service_id: row.get(0)?,
            monday: row.get(1)?,
            tuesday: row.get(2)?,
            wednesday: row.get(3)?,
            thursday: row.get(4)?,
            friday: row.get(5)?,
            saturday: row.get(6)?,
            sunday: row.get(7)?,
            start_date: row.get(8)?,
            end_date: row.get(9)?,
        })
    }
}

impl TableRow for CalendarDate {
    const TABLE: Table = Table::CalendarDate;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO calendar_dates
        (service_id, date, exception_type) VALUES (?1, ?2, ?3)";
    const SELECT: &'static str = "SELECT service_id, date, exception_type FROM calendar_dates";
    const ORDER_BY: &'static str = "service_id, date";

    type Key<'r> = (&'r str, &'r str);

    fn key(&self) -> Self::Key<'_> {
        (&self.service_id, &self.date)
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.service_id, self.date, self.exception_type])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            service_id: row.get(0)?,
            date: row.get(1)?,
            exception_type: row.get(2)?,
        })
    }
}

impl TableRow for Trip {
    const TABLE: Table = Table::Trip;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO trips
        (id, route_id, service_id, headsign, short_name, direction_id, block_id, shape_id,
         wheelchair_accessible, bikes_allowed)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
    const SELECT: &'static str = "SELECT id, route_id, service_id, headsign, short_name,
        direction_id, block_id, shape_id, wheelchair_accessible, bikes_allowed FROM trips";
    const ORDER_BY: &'static str = "id";

    type Key<'r> = &'r str;

    fn key(&self) -> Self::Key<'_> {
        &self.id
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.route_id,
            self.service_id,
            self.headsign,
            self.short_name,
            self.direction_id,
            self.block_id,
            self.shape_id,
            self.wheelchair_accessible,
            self.bikes_allowed,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            route_id: row.get(1)?,
            service_id: row.get(2)?,
            headsign: row.get(3)?,
            short_name: row.get(4)?,
            direction_id: row.get(5)?,
            block_id: row.get(6)?,
            shape_id: row.get(7)?,
            wheelchair_accessible: row.get(8)?,
            bikes_allowed: row.get(9)?,
        })
    }
}

impl TableRow for StopTime {
    const TABLE: Table = Table::StopTime;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO stop_times
        (trip_id, arrival_time, departure_time, stop_id, stop_sequence, stop_headsign,
         pickup_type, drop_off_type, shape_dist_traveled, timepoint)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
    const SELECT: &'static str = "SELECT trip_id, arrival_time, departure_time, stop_id,
        stop_sequence, stop_headsign, pickup_type, drop_off_type, shape_dist_traveled, timepoint
        FROM stop_times";
    const ORDER_BY: &'static str = "trip_id, stop_sequence";

    type Key<'r> = (&'r str, u32);

    fn key(&self) -> Self::Key<'_> {
        (&self.trip_id, self.stop_sequence)
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.trip_id,
            self.arrival_time,
            self.departure_time,
            self.stop_id,
            self.stop_sequence,
            self.stop_headsign,
            self.pickup_type,
            self.drop_off_type,
            self.shape_dist_traveled,
            self.timepoint,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            trip_id: row.get(0)?,
            arrival_time: row.get(1)?,
            departure_time: row.get(2)?,
            stop_id: row.get(3)?,
            stop_sequence: row.get(4)?,
            stop_headsign: row.get(5)?,
            pickup_type: row.get(6)?,
            drop_off_type: row.get(7)?,
            shape_dist_traveled: row.get(8)?,
            timepoint: row.get(9)?,
        })
    }
}

impl TableRow for ShapePoint {
    const TABLE: Table = Table::Shape;
    const UPSERT: &'static str = "INSERT OR REPLACE INTO shape_points
        (shape_id, sequence, lat, lon, dist_traveled) VALUES (?1, ?2, ?3, ?4, ?5)";
    const SELECT: &'static str =
        "SELECT shape_id, sequence, lat, lon, dist_traveled FROM shape_points";
    const ORDER_BY: &'static str = "shape_id, sequence";

    type Key<'r> = (&'r str, u32);

    fn key(&self) -> Self::Key<'_> {
        (&self.shape_id, self.sequence)
    }

    fn upsert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.shape_id,
            self.sequence,
            self.lat,
            self.lon,
            self.dist_traveled,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            shape_id: row.get(0)?,
            sequence: row.get(1)?,
            lat: row.get(2)?,
            lon: row.get(3)?,
            dist_traveled: row.get(4)?,
        })
    }
}
