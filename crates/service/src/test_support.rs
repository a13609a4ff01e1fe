#![cfg(test)]
use configs::DatabaseConfig;
use models::password::{PasswordAlgorithm, PasswordHasher};
use uuid::Uuid;

use crate::storage::{DbStorage, Storage};

/// Config for a fresh SQLite file under the temp dir.
pub fn sqlite_config() -> DatabaseConfig {
    let path = std::env::temp_dir().join(format!("hbnb_{}.db", Uuid::new_v4()));
    DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        // one connection keeps SQLite writers from contending
        max_connections: 1,
        min_connections: 1,
        acquire_timeout_secs: 10,
        ..DatabaseConfig::default()
    }
}

/// Database engine on its own SQLite file, schema applied.
pub async fn db_storage() -> Result<DbStorage, anyhow::Error> {
    let storage = DbStorage::connect(&sqlite_config(), PasswordHasher::new(PasswordAlgorithm::Sha256), false).await?;
    storage.reload().await?;
    Ok(storage)
}
