use crate::store::Store;
use crate::types::BoundingBox;

use super::{StoreArgs, init_store};

pub fn run_stops(bbox: BoundingBox, json: bool, args: StoreArgs) -> anyhow::Result<()> {
    let (store, _) = init_store(&args)?;
    let stops = store.find_stops_in_bbox(&bbox)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stops)?);
        return Ok(());
    }

    if stops.is_empty() {
        println!("No stops in bounding box");
        return Ok(());
    }

    for stop in &stops {
        println!(
            "{}\t{:.6}\t{:.6}\t{}",
            stop.id,
            stop.lat,
            stop.lon,
            stop.name.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
