//! Parsed feed records, as handed from a [`FeedParser`](crate::parser::FeedParser)
//! to the loader.
//!
//! Records stay close to the source tables. Mapping them to stored rows
//! (agency fallback, flag encoding, flattening of nested collections) is the
//! loader's job.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    pub agencies: Vec<AgencyRecord>,
    pub routes: Vec<RouteRecord>,
    pub stops: Vec<StopRecord>,
    pub calendars: Vec<CalendarRecord>,
    pub calendar_dates: Vec<CalendarDateRecord>,
    pub trips: Vec<TripRecord>,
    pub shapes: Vec<ShapeRecord>,
    pub warnings: Vec<ParseWarning>,
}

impl Feed {
    #[must_use]
    pub fn stop_time_count(&self) -> usize {
        self.trips.iter().map(|trip| trip.stop_times.len()).sum()
    }

    #[must_use]
    pub fn shape_point_count(&self) -> usize {
        self.shapes.iter().map(|shape| shape.points.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgencyRecord {
    /// Optional in single-agency feeds.
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub timezone: String,
    pub lang: Option<String>,
    pub phone: Option<String>,
    pub fare_url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRecord {
    pub id: String,
    pub agency_id: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub description: Option<String>,
    pub route_type: i32,
    pub url: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub sort_order: Option<i32>,
    pub continuous_pickup: Option<i32>,
    pub continuous_drop_off: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopRecord {
    pub id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub zone_id: Option<String>,
    pub url: Option<String>,
    pub location_type: Option<i32>,
    pub parent_station: Option<String>,
    pub timezone: Option<String>,
    pub wheelchair_boarding: Option<i32>,
    pub platform_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarRecord {
    pub service_id: String,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarDateRecord {
    pub service_id: String,
    pub date: String,
    pub exception_type: i32,
}

/// A trip together with its stop times, sorted by sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripRecord {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub direction_id: Option<i32>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: Option<i32>,
    pub bikes_allowed: Option<i32>,
    pub stop_times: Vec<StopTimeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopTimeRecord {
    pub arrival_time: Option<u32>,
    pub departure_time: Option<u32>,
    pub stop_id: String,
    pub stop_sequence: u32,
    pub stop_headsign: Option<String>,
    pub pickup_type: Option<i32>,
    pub drop_off_type: Option<i32>,
    pub shape_dist_traveled: Option<f64>,
    pub timepoint: Option<i32>,
}

/// A shape polyline, points sorted by sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeRecord {
    pub id: String,
    pub points: Vec<ShapePointRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePointRecord {
    pub lat: f64,
    pub lon: f64,
    pub sequence: u32,
    pub dist_traveled: Option<f64>,
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub file: &'static str,
    pub message: String,
}

impl ParseWarning {
    pub fn new(file: &'static str, message: impl Into<String>) -> Self {
        Self {
            file,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}
