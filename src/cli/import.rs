use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::import::{ImportOptions, ImportOutcome, ImportReport, Importer};
use crate::types::Table;

use super::{StoreArgs, init_store};

pub fn run_import(
    file: PathBuf,
    source: Option<String>,
    timeout_secs: Option<u64>,
    json: bool,
    args: StoreArgs,
) -> anyhow::Result<()> {
    let (store, config) = init_store(&args)?;

    let mut options = ImportOptions::from(&config.import);
    if let Some(secs) = timeout_secs {
        options.timeout = Some(Duration::from_secs(secs));
    }
    let importer = Importer::new(&store).with_options(options);

    let report = match source {
        Some(source) => {
            let bytes = std::fs::read(&file).map_err(|e| Error::ReadFeed {
                path: file.clone(),
                source: e,
            })?;
            importer.import_from_bytes(&bytes, &source)?
        }
        None => importer.import_from_file(&file)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ImportReport) {
    match report.outcome {
        ImportOutcome::Skipped => {
            println!("Feed unchanged ({}), import skipped", report.fingerprint);
            return;
        }
        ImportOutcome::Imported => {
            println!(
                "Imported feed {} in {} ms",
                report.fingerprint,
                report.elapsed.as_millis()
            );
        }
    }

    println!();
    for table in Table::LOAD_ORDER {
        println!("  {:<15}{}", table.to_string(), report.counts.get(table));
    }
    println!();

    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}
