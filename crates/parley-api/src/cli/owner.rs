//! Owner identity for CLI commands.
//!
//! Without `--owner` / `PARLEY_OWNER` the CLI acts as a per-install owner
//! whose id is generated on first use and kept in `{data_dir}/owner_id`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

const OWNER_FILE: &str = "owner_id";

/// The explicit owner if given, else the per-install owner.
pub async fn resolve_owner(explicit: Option<Uuid>, data_dir: &Path) -> Result<Uuid> {
    match explicit {
        Some(owner) => Ok(owner),
        None => local_owner(data_dir).await,
    }
}

async fn local_owner(data_dir: &Path) -> Result<Uuid> {
    let path = data_dir.join(OWNER_FILE);

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => content
            .trim()
            .parse()
            .with_context(|| format!("{} does not contain a valid owner id", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let owner = Uuid::now_v7();
            tokio::fs::write(&path, owner.to_string())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(owner_id = %owner, "Generated local owner id");
            Ok(owner)
        }
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}
