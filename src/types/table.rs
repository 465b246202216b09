use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Domain tables, declared in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Agency,
    Route,
    Stop,
    Calendar,
    CalendarDate,
    Trip,
    StopTime,
    Shape,
}

impl Table {
    /// Dependency order used by the loader. Clearing walks it in reverse.
    pub const LOAD_ORDER: [Table; 8] = [
        Table::Agency,
        Table::Route,
        Table::Stop,
        Table::Calendar,
        Table::CalendarDate,
        Table::Trip,
        Table::StopTime,
        Table::Shape,
    ];

    /// Name of the backing SQLite table.
    pub const fn sql_name(self) -> &'static str {
        match self {
            Table::Agency => "agencies",
            Table::Route => "routes",
            Table::Stop => "stops",
            Table::Calendar => "calendars",
            Table::CalendarDate => "calendar_dates",
            Table::Trip => "trips",
            Table::StopTime => "stop_times",
            Table::Shape => "shape_points",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Agency => "agency",
            Table::Route => "route",
            Table::Stop => "stop",
            Table::Calendar => "calendar",
            Table::CalendarDate => "calendar_date",
            Table::Trip => "trip",
            Table::StopTime => "stop_time",
            Table::Shape => "shape",
        };
        f.write_str(name)
    }
}

/// Row counts keyed by table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableCounts(BTreeMap<Table, usize>);

impl TableCounts {
    pub fn insert(&mut self, table: Table, count: usize) {
        self.0.insert(table, count);
    }

    #[must_use]
    pub fn get(&self, table: Table) -> usize {
        self.0.get(&table).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Table, usize)> + '_ {
        self.0.iter().map(|(table, count)| (*table, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_order_starts_with_agency_and_ends_with_shape() {
        assert_eq!(Table::LOAD_ORDER.first(), Some(&Table::Agency));
        assert_eq!(Table::LOAD_ORDER.last(), Some(&Table::Shape));
        let mut sorted = Table::LOAD_ORDER;
        sorted.sort();
        assert_eq!(sorted, Table::LOAD_ORDER);
    }

    #[test]
    fn test_counts_default_to_zero() {
        let mut counts = TableCounts::default();
        counts.insert(Table::Stop, 3);
        counts.insert(Table::Trip, 2);
        assert_eq!(counts.get(Table::Stop), 3);
        assert_eq!(counts.get(Table::Shape), 0);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_counts_serialize_as_map() {
        let mut counts = TableCounts::default();
        counts.insert(Table::StopTime, 7);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"stop_time":7}"#);
    }
}
