use serde::Serialize;

use crate::store::Store;
use crate::types::{ImportMetadata, Table, TableCounts};

use super::{StoreArgs, init_store};

#[derive(Serialize)]
struct StoreInfo {
    database: String,
    last_import: Option<ImportMetadata>,
    counts: TableCounts,
    spatial_entries: usize,
}

pub fn run_info(json: bool, args: StoreArgs) -> anyhow::Result<()> {
    let (store, config) = init_store(&args)?;

    let info = StoreInfo {
        database: config.database.path.display().to_string(),
        last_import: store.get_import_metadata()?,
        counts: store.table_counts()?,
        spatial_entries: store.list_spatial_entries()?.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("Feedvault Status");
    println!("{}", "─".repeat(16));
    println!("Database:      {}", info.database);
    match &info.last_import {
        Some(metadata) => {
            println!("Last import:   {}", metadata.import_time.to_rfc3339());
            println!("Source:        {}", metadata.source);
            println!("Fingerprint:   {}", metadata.fingerprint);
        }
        None => println!("Last import:   never"),
    }
    println!();
    for table in Table::LOAD_ORDER {
        println!("{:<15}{}", table.to_string(), info.counts.get(table));
    }
    println!("{:<15}{}", "spatial index", info.spatial_entries);
    println!();

    Ok(())
}
