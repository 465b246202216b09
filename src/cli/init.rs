use crate::store::{SqliteStore, Store};

use super::{StoreArgs, load_config};

pub fn run_init(args: StoreArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = SqliteStore::open(&config)?;
    store.initialize()?;

    println!("Database ready at {}", config.database.path.display());
    Ok(())
}
