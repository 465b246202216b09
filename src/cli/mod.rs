mod clear;
mod commands;
mod import;
mod info;
mod init;
mod stops;

pub use clear::run_clear;
pub use commands::{Commands, StoreArgs};
pub use import::run_import;
pub use info::run_info;
pub use init::run_init;
pub use stops::run_stops;

use crate::config::{DB_FILE_NAME, StoreConfig};
use crate::store::{SqliteStore, Store};

/// Resolves the store configuration from `--config` and `--data-dir`.
pub fn load_config(args: &StoreArgs) -> anyhow::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    if let Some(data_dir) = &args.data_dir {
        config.database.path = data_dir.join(DB_FILE_NAME);
    }
    Ok(config)
}

/// Open an initialized store, checking the database exists
pub fn init_store(args: &StoreArgs) -> anyhow::Result<(SqliteStore, StoreConfig)> {
    let config = load_config(args)?;
    let db_path = &config.database.path;

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'feedvault init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&config)?;
    store.initialize()?;
    Ok((store, config))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_data_dir_overrides_config_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("feedvault.toml");
        std::fs::write(
            &config_path,
            "[database]\npath = \"/elsewhere/feeds.db\"\n[pool]\nmax_connections = 2\n",
        )
        .unwrap();

        let from_file = load_config(&StoreArgs {
            data_dir: None,
            config: Some(config_path.clone()),
        })
        .unwrap();
        assert_eq!(from_file.database.path, PathBuf::from("/elsewhere/feeds.db"));

        let overridden = load_config(&StoreArgs {
            data_dir: Some(temp.path().to_path_buf()),
            config: Some(config_path),
        })
        .unwrap();
        assert_eq!(overridden.database.path, temp.path().join(DB_FILE_NAME));
        assert_eq!(overridden.pool.max_connections, 2);
    }

    #[test]
    fn test_init_store_requires_existing_database() {
        let temp = TempDir::new().unwrap();
        let args = StoreArgs {
            data_dir: Some(temp.path().to_path_buf()),
            config: None,
        };
        let err = init_store(&args).err().unwrap();
        assert!(err.to_string().contains("feedvault init"));
    }
}
