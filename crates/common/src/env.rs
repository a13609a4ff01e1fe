//! Environment/runtime helpers
//!
//! Filesystem preparation for stores that persist next to the process.

use std::path::Path;

use tracing::debug;

/// Create the parent directory of `path` if it has one and it is missing.
pub async fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            if tokio::fs::metadata(parent).await.is_err() {
                debug!(dir = %parent.display(), "creating data directory");
            }
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
            Ok(())
        }
        _ => Ok(()),
    }
}
