mod metadata;
pub(crate) mod rows;
pub mod schema;
mod spatial;
mod sqlite;

pub use sqlite::{PooledConnection, SqliteStore};

use crate::error::Result;
use crate::types::*;

/// Store defines the read and maintenance surface of the feed database.
///
/// Feed rows are written only by the [`Loader`](crate::import::Loader).
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Import metadata
    fn get_import_metadata(&self) -> Result<Option<ImportMetadata>>;
    fn set_import_metadata(&self, metadata: &ImportMetadata) -> Result<()>;

    /// Empties every domain table. Import metadata is left untouched.
    fn clear_all_data(&self) -> Result<()>;

    // Counts
    fn count_rows(&self, table: Table) -> Result<usize>;
    fn table_counts(&self) -> Result<TableCounts>;

    // Table listings
    fn list_agencies(&self) -> Result<Vec<Agency>>;
    fn list_routes(&self) -> Result<Vec<Route>>;
    fn list_stops(&self) -> Result<Vec<Stop>>;
    fn get_stop(&self, stop_id: &str) -> Result<Option<Stop>>;
    fn list_calendars(&self) -> Result<Vec<Calendar>>;
    fn list_calendar_dates(&self) -> Result<Vec<CalendarDate>>;
    fn list_trips(&self) -> Result<Vec<Trip>>;
    fn list_stop_times(&self) -> Result<Vec<StopTime>>;
    fn list_stop_times_for_trip(&self, trip_id: &str) -> Result<Vec<StopTime>>;
    fn list_shape_points(&self, shape_id: &str) -> Result<Vec<ShapePoint>>;

    // Spatial index
    fn find_stops_in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<Stop>>;
    fn list_spatial_entries(&self) -> Result<Vec<SpatialEntry>>;
}
