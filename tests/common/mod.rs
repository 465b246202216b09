//! In-memory GTFS archives for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builds a GTFS zip. Starts from a small two-line feed that every test can
/// tweak file by file.
#[derive(Clone)]
pub struct FeedBuilder {
    files: BTreeMap<String, String>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            "agency.txt".to_string(),
            "agency_id,agency_name,agency_url,agency_timezone,agency_lang\n\
             ZVV,Zurich Transit,https://zvv.example,Europe/Zurich,de\n"
                .to_string(),
        );
        files.insert(
            "routes.txt".to_string(),
            "route_id,agency_id,route_short_name,route_long_name,route_type,continuous_pickup\n\
             R4,,4,Bahnhof - Tiefenbrunnen,0,0\n\
             R31,,31,Hegibachplatz - Schlieren,3,\n"
                .to_string(),
        );
        files.insert(
            "stops.txt".to_string(),
            "stop_id,stop_code,stop_name,stop_lat,stop_lon,location_type,parent_station\n\
             HB,8503000,Zurich HB,47.378177,8.540192,1,\n\
             HB1,,Zurich HB platform 1,47.378300,8.540100,0,HB\n\
             BEL,,Bellevue,47.366870,8.545110,0,\n\
             SCH,,Schlieren,47.397620,8.447730,0,\n"
                .to_string(),
        );
        files.insert(
            "calendar.txt".to_string(),
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WD,1,1,1,1,1,0,0,20240101,20241231\n\
             WE,0,0,0,0,0,1,1,20240101,20241231\n"
                .to_string(),
        );
        files.insert(
            "calendar_dates.txt".to_string(),
            "service_id,date,exception_type\n\
             WD,20241225,2\n\
             WE,20241225,1\n"
                .to_string(),
        );
        files.insert(
            "trips.txt".to_string(),
            "route_id,service_id,trip_id,trip_headsign,direction_id,shape_id\n\
             R4,WD,T4-1,Tiefenbrunnen,0,SH4\n\
             R31,WE,T31-1,Schlieren,1,\n"
                .to_string(),
        );
        files.insert(
            "stop_times.txt".to_string(),
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence,timepoint\n\
             T4-1,08:00:00,08:00:00,HB1,1,1\n\
             T4-1,08:06:00,08:06:30,BEL,2,0\n\
             T31-1,24:50:00,24:50:00,BEL,1,\n\
             T31-1,25:12:00,25:12:00,SCH,2,\n"
                .to_string(),
        );
        files.insert(
            "shapes.txt".to_string(),
            "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled\n\
             SH4,47.378300,8.540100,1,0\n\
             SH4,47.372000,8.543000,2,0.8\n\
             SH4,47.366870,8.545110,3,1.5\n"
                .to_string(),
        );
        Self { files }
    }

    pub fn file(mut self, name: &str, contents: &str) -> Self {
        self.files.insert(name.to_string(), contents.to_string());
        self
    }

    /// Appends `extra` to an existing file.
    pub fn append(mut self, name: &str, extra: &str) -> Self {
        self.files.entry(name.to_string()).or_default().push_str(extra);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.files.remove(name);
        self
    }

    /// Replaces `agency.txt` with `count` agencies `A1..=An`.
    pub fn agencies(self, count: usize) -> Self {
        let mut contents = String::from("agency_id,agency_name,agency_url,agency_timezone\n");
        for i in 1..=count {
            contents.push_str(&format!(
                "A{i},Agency {i},https://a{i}.example,Europe/Zurich\n"
            ));
        }
        self.file("agency.txt", &contents)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in &self.files {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}
