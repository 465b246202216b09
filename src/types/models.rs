use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub url: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub route_type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    /// `Some(0)` (continuous stopping) is distinct from `None` (not in feed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_pickup: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_drop_off: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheelchair_boarding: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_code: Option<String>,
}

/// Weekly service pattern. Weekday flags are stored as 0/1 and dates stay
/// as `YYYYMMDD` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub service_id: String,
    pub monday: i32,
    pub tuesday: i32,
    pub wednesday: i32,
    pub thursday: i32,
    pub friday: i32,
    pub saturday: i32,
    pub sunday: i32,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub service_id: String,
    pub date: String,
    /// 1 = service added, 2 = service removed.
    pub exception_type: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheelchair_accessible: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bikes_allowed: Option<i32>,
}

/// Times are seconds past service-day midnight and may exceed 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    pub stop_id: String,
    pub stop_sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_headsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_off_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_dist_traveled: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timepoint: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePoint {
    pub shape_id: String,
    pub sequence: u32,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist_traveled: Option<f64>,
}

/// Descriptor of the last successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMetadata {
    pub fingerprint: String,
    pub import_time: DateTime<Utc>,
    pub source: String,
}

/// R*Tree entry mirroring one stop row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialEntry {
    pub stop_row_id: i64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

impl FromStr for BoundingBox {
    type Err = String;

    /// Parses `min_lat,min_lon,max_lat,max_lon`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid coordinate in '{s}': {e}"))?;

        let [min_lat, min_lon, max_lat, max_lon] = parts[..] else {
            return Err(format!(
                "expected min_lat,min_lon,max_lat,max_lon but got {} values",
                parts.len()
            ));
        };

        if min_lat > max_lat || min_lon > max_lon {
            return Err(format!("bounding box '{s}' has min greater than max"));
        }

        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_parses_four_values() {
        let bbox: BoundingBox = "47.5, 8.4,47.6,8.6".parse().unwrap();
        assert_eq!(bbox.min_lat, 47.5);
        assert_eq!(bbox.max_lon, 8.6);
        assert!(bbox.contains(47.55, 8.5));
        assert!(!bbox.contains(47.7, 8.5));
    }

    #[test]
    fn test_bbox_rejects_wrong_arity() {
        let err = "1,2,3".parse::<BoundingBox>().unwrap_err();
        assert!(err.contains("3 values"));
    }

    #[test]
    fn test_bbox_rejects_inverted_box() {
        assert!("2,2,1,3".parse::<BoundingBox>().is_err());
        assert!("x,2,1,3".parse::<BoundingBox>().is_err());
    }
}
