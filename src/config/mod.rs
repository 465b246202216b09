mod store;

pub use store::{DB_FILE_NAME, DatabaseConfig, ImportConfig, PoolConfig, StoreConfig};
