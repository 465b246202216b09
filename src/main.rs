use clap::Parser;
use tracing_subscriber::EnvFilter;

use feedvault::cli::{Commands, run_clear, run_import, run_info, run_init, run_stops};

#[derive(Parser)]
#[command(name = "feedvault")]
#[command(about = "Import GTFS feeds into a spatially indexed SQLite store", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("feedvault=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { store } => run_init(store)?,
        Commands::Import {
            file,
            source,
            timeout_secs,
            json,
            store,
        } => run_import(file, source, timeout_secs, json, store)?,
        Commands::Clear { store } => run_clear(store)?,
        Commands::Info { json, store } => run_info(json, store)?,
        Commands::Stops { bbox, json, store } => run_stops(bbox, json, store)?,
    }

    Ok(())
}
