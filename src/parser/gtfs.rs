use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Cursor;

use gtfs_structures::{
    Agency, Availability, BikesAllowedType, Calendar, CalendarDate, ContinuousPickupDropOff,
    DirectionType, Exception, LocationType, PickupDropOffType, RawGtfs, RawStopTime, RawTrip,
    Route, RouteType, Shape, Stop, TimepointType,
};
use tracing::debug;

use super::{FeedParser, ParseError};
use crate::feed::*;

const AGENCY: &str = "agency.txt";
const ROUTES: &str = "routes.txt";
const STOPS: &str = "stops.txt";
const CALENDAR: &str = "calendar.txt";
const CALENDAR_DATES: &str = "calendar_dates.txt";
const TRIPS: &str = "trips.txt";
const STOP_TIMES: &str = "stop_times.txt";
const SHAPES: &str = "shapes.txt";

/// Reads a GTFS zip archive held in memory with `gtfs_structures`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GtfsZipParser;

impl FeedParser for GtfsZipParser {
    fn parse(&self, bytes: &[u8]) -> Result<Feed, ParseError> {
        let raw = RawGtfs::from_reader(Cursor::new(bytes)).map_err(ParseError::Archive)?;
        let mut warnings = Vec::new();

        let agencies = required(AGENCY, raw.agencies)?;
        let routes = required(ROUTES, raw.routes)?;
        let stops = required(STOPS, raw.stops)?;
        let trips = required(TRIPS, raw.trips)?;
        let stop_times = required(STOP_TIMES, raw.stop_times)?;
        let calendars = optional(CALENDAR, raw.calendar, &mut warnings)?;
        let calendar_dates = optional(CALENDAR_DATES, raw.calendar_dates, &mut warnings)?;
        let shapes = optional(SHAPES, raw.shapes, &mut warnings)?;

        warn_duplicates(ROUTES, routes.iter().map(|r| r.id.as_str()), &mut warnings);
        warn_duplicates(STOPS, stops.iter().map(|s| s.id.as_str()), &mut warnings);
        warn_duplicates(TRIPS, trips.iter().map(|t| t.id.as_str()), &mut warnings);

        let feed = Feed {
            agencies: agencies.into_iter().map(agency_record).collect(),
            routes: routes.into_iter().map(route_record).collect(),
            stops: stop_records(stops, &mut warnings),
            calendars: calendars.into_iter().map(calendar_record).collect(),
            calendar_dates: calendar_dates
                .into_iter()
                .map(calendar_date_record)
                .collect(),
            trips: attach_stop_times(trips, stop_times, &mut warnings),
            shapes: group_shapes(shapes)?,
            warnings,
        };

        debug!(
            agencies = feed.agencies.len(),
            routes = feed.routes.len(),
            stops = feed.stops.len(),
            trips = feed.trips.len(),
            stop_times = feed.stop_time_count(),
            shape_points = feed.shape_point_count(),
            "Parsed GTFS archive"
        );

        Ok(feed)
    }
}

fn required<T>(
    file: &'static str,
    table: Result<Vec<T>, gtfs_structures::Error>,
) -> Result<Vec<T>, ParseError> {
    match table {
        Ok(rows) => Ok(rows),
        Err(gtfs_structures::Error::MissingFile(_)) => Err(ParseError::MissingFile { file }),
        Err(source) => Err(ParseError::Table { file, source }),
    }
}

fn optional<T>(
    file: &'static str,
    table: Option<Result<Vec<T>, gtfs_structures::Error>>,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Vec<T>, ParseError> {
    match table {
        Some(table) => required(file, table),
        None => {
            warnings.push(ParseWarning::new(file, "file not present in archive"));
            Ok(Vec::new())
        }
    }
}

fn warn_duplicates<'a>(
    file: &'static str,
    ids: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<ParseWarning>,
) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        *seen.entry(id).or_default() += 1;
    }
    let mut duplicated: Vec<_> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicated.sort_unstable();
    for (id, n) in duplicated {
        warnings.push(ParseWarning::new(
            file,
            format!("id '{id}' appears {n} times; the last row wins"),
        ));
    }
}

fn stop_records(stops: Vec<Stop>, warnings: &mut Vec<ParseWarning>) -> Vec<StopRecord> {
    let mut records = Vec::with_capacity(stops.len());
    let mut unplaced = 0usize;
    for stop in stops {
        let (Some(lat), Some(lon)) = (stop.latitude, stop.longitude) else {
            unplaced += 1;
            continue;
        };
        records.push(StopRecord {
            lat,
            lon,
            location_type: Some(location_type_code(&stop.location_type)),
            wheelchair_boarding: Some(availability_code(&stop.wheelchair_boarding)),
            code: stop.code.text(),
            name: stop.name.text(),
            description: stop.description.text(),
            zone_id: stop.zone_id.text(),
            url: stop.url.text(),
            parent_station: stop.parent_station.text(),
            timezone: stop.timezone.text(),
            platform_code: stop.platform_code.text(),
            id: stop.id,
        });
    }

    if unplaced > 0 {
        warnings.push(ParseWarning::new(
            STOPS,
            format!("dropped {unplaced} stops without coordinates"),
        ));
    }
    records
}

fn attach_stop_times(
    trips: Vec<RawTrip>,
    stop_times: Vec<RawStopTime>,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<TripRecord> {
    let mut records: Vec<TripRecord> = Vec::with_capacity(trips.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(trips.len());
    for trip in trips {
        match index.entry(trip.id.clone()) {
            Entry::Occupied(slot) => records[*slot.get()] = trip_record(trip),
            Entry::Vacant(slot) => {
                slot.insert(records.len());
                records.push(trip_record(trip));
            }
        }
    }

    let mut orphaned = 0usize;
    for stop_time in stop_times {
        let Some(&position) = index.get(&stop_time.trip_id) else {
            orphaned += 1;
            continue;
        };
        records[position]
            .stop_times
            .push(stop_time_record(stop_time));
    }

    if orphaned > 0 {
        warnings.push(ParseWarning::new(
            STOP_TIMES,
            format!("dropped {orphaned} stop times referencing unknown trips"),
        ));
    }

    for trip in &mut records {
        trip.stop_times.sort_by_key(|st| st.stop_sequence);
    }
    records
}

fn group_shapes(rows: Vec<Shape>) -> Result<Vec<ShapeRecord>, ParseError> {
    let mut shapes: Vec<ShapeRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let sequence = u32::try_from(row.sequence).map_err(|_| ParseError::InvalidValue {
            file: SHAPES,
            field: "shape_pt_sequence",
            value: row.sequence.to_string(),
        })?;
        let position = *index.entry(row.id.clone()).or_insert_with(|| {
            shapes.push(ShapeRecord {
                id: row.id.clone(),
                points: Vec::new(),
            });
            shapes.len() - 1
        });
        shapes[position].points.push(ShapePointRecord {
            lat: row.latitude,
            lon: row.longitude,
            sequence,
            dist_traveled: row.dist_traveled.map(f64::from),
        });
    }
    for shape in &mut shapes {
        shape.points.sort_by_key(|p| p.sequence);
    }
    Ok(shapes)
}

// Record mappings, one per GTFS file.

fn agency_record(agency: Agency) -> AgencyRecord {
    AgencyRecord {
        id: agency.id.text(),
        name: agency.name,
        url: agency.url,
        timezone: agency.timezone,
        lang: agency.lang.text(),
        phone: agency.phone.text(),
        fare_url: agency.fare_url.text(),
        email: agency.email.text(),
    }
}

fn route_record(route: Route) -> RouteRecord {
    RouteRecord {
        route_type: route_type_code(&route.route_type),
        color: Some(hex_color(route.color.r, route.color.g, route.color.b)),
        text_color: Some(hex_color(
            route.text_color.r,
            route.text_color.g,
            route.text_color.b,
        )),
        sort_order: route.order.and_then(|order| i32::try_from(order).ok()),
        continuous_pickup: continuous_code(&route.continuous_pickup),
        continuous_drop_off: continuous_code(&route.continuous_drop_off),
        agency_id: route.agency_id.text(),
        short_name: route.short_name.text(),
        long_name: route.long_name.text(),
        description: route.desc.text(),
        url: route.url.text(),
        id: route.id,
    }
}

fn calendar_record(calendar: Calendar) -> CalendarRecord {
    CalendarRecord {
        service_id: calendar.id,
        monday: calendar.monday,
        tuesday: calendar.tuesday,
        wednesday: calendar.wednesday,
        thursday: calendar.thursday,
        friday: calendar.friday,
        saturday: calendar.saturday,
        sunday: calendar.sunday,
        start_date: calendar.start_date.format("%Y%m%d").to_string(),
        end_date: calendar.end_date.format("%Y%m%d").to_string(),
    }
}

fn calendar_date_record(date: CalendarDate) -> CalendarDateRecord {
    CalendarDateRecord {
        date: date.date.format("%Y%m%d").to_string(),
        exception_type: match date.exception_type {
            Exception::Added => 1,
            Exception::Deleted => 2,
        },
        service_id: date.service_id,
    }
}

fn trip_record(trip: RawTrip) -> TripRecord {
    TripRecord {
        direction_id: trip.direction_id.as_ref().map(|direction| match direction {
            DirectionType::Outbound => 0,
            DirectionType::Inbound => 1,
        }),
        wheelchair_accessible: Some(availability_code(&trip.wheelchair_accessible)),
        bikes_allowed: Some(bikes_code(&trip.bikes_allowed)),
        headsign: trip.trip_headsign.text(),
        short_name: trip.trip_short_name.text(),
        block_id: trip.block_id.text(),
        shape_id: trip.shape_id.text(),
        id: trip.id,
        route_id: trip.route_id,
        service_id: trip.service_id,
        stop_times: Vec::new(),
    }
}

fn stop_time_record(stop_time: RawStopTime) -> StopTimeRecord {
    StopTimeRecord {
        arrival_time: stop_time.arrival_time,
        departure_time: stop_time.departure_time,
        stop_sequence: u32::from(stop_time.stop_sequence),
        pickup_type: Some(pickup_code(&stop_time.pickup_type)),
        drop_off_type: Some(pickup_code(&stop_time.drop_off_type)),
        shape_dist_traveled: stop_time.shape_dist_traveled.map(f64::from),
        timepoint: Some(match stop_time.timepoint {
            TimepointType::Approximate => 0,
            TimepointType::Exact => 1,
        }),
        stop_headsign: stop_time.stop_headsign.text(),
        stop_id: stop_time.stop_id,
    }
}

/// Text fields with empty values read as unset.
trait Text {
    fn text(self) -> Option<String>;
}

impl Text for String {
    fn text(self) -> Option<String> {
        Some(self).filter(|value| !value.is_empty())
    }
}

impl Text for Option<String> {
    fn text(self) -> Option<String> {
        self.filter(|value| !value.is_empty())
    }
}

fn hex_color(r: u8, g: u8, b: u8) -> String {
    format!("{r:02X}{g:02X}{b:02X}")
}

fn route_type_code(route_type: &RouteType) -> i32 {
    match route_type {
        RouteType::Tramway => 0,
        RouteType::Subway => 1,
        RouteType::Rail => 2,
        RouteType::Bus => 3,
        RouteType::Ferry => 4,
        RouteType::CableCar => 5,
        RouteType::Gondola => 6,
        RouteType::Funicular => 7,
        RouteType::Coach => 200,
        RouteType::Air => 1100,
        RouteType::Taxi => 1500,
        RouteType::Other(code) => i32::from(*code),
    }
}

fn location_type_code(location_type: &LocationType) -> i32 {
    match location_type {
        LocationType::StopPoint => 0,
        LocationType::StopArea => 1,
        LocationType::StationEntrance => 2,
        LocationType::GenericNode => 3,
        LocationType::BoardingArea => 4,
        LocationType::Unknown(code) => i32::from(*code),
    }
}

fn availability_code(availability: &Availability) -> i32 {
    match availability {
        Availability::InformationNotAvailable => 0,
        Availability::Available => 1,
        Availability::NotAvailable => 2,
        Availability::Unknown(code) => i32::from(*code),
    }
}

fn bikes_code(bikes: &BikesAllowedType) -> i32 {
    match bikes {
        BikesAllowedType::NoBikeInfo => 0,
        BikesAllowedType::AtLeastOneBike => 1,
        BikesAllowedType::NoBikesAllowed => 2,
        BikesAllowedType::Unknown(code) => i32::from(*code),
    }
}

fn pickup_code(pickup: &PickupDropOffType) -> i32 {
    match pickup {
        PickupDropOffType::Regular => 0,
        PickupDropOffType::NotAvailable => 1,
        PickupDropOffType::ArrangeByPhone => 2,
        PickupDropOffType::CoordinateWithDriver => 3,
        PickupDropOffType::Unknown(code) => i32::from(*code),
    }
}

/// An empty continuous pickup/drop-off field reads as `NotAvailable`, so
/// that variant is kept unset.
fn continuous_code(continuous: &ContinuousPickupDropOff) -> Option<i32> {
    match continuous {
        ContinuousPickupDropOff::Continuous => Some(0),
        ContinuousPickupDropOff::NotAvailable => None,
        ContinuousPickupDropOff::ArrangeByPhone => Some(2),
        ContinuousPickupDropOff::CoordinateWithDriver => Some(3),
        ContinuousPickupDropOff::Unknown(code) => Some(i32::from(*code)),
    }
}
