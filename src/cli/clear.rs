use crate::store::Store;

use super::{StoreArgs, init_store};

pub fn run_clear(args: StoreArgs) -> anyhow::Result<()> {
    let (store, _) = init_store(&args)?;
    store.clear_all_data()?;

    println!("Cleared all feed data. The last import record was kept.");
    Ok(())
}
