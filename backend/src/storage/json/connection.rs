use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_DATA_FILE: &str = "data/predictions.json";
pub const VOLATILE_DATA_FILE: &str = "/tmp/predictions.json";

/// JsonConnection owns the location of the fallback document.
///
/// Nothing is created on construction; the containing directory is created
/// on demand before the first write.
#[derive(Debug, Clone)]
pub struct JsonConnection {
    data_file: PathBuf,
}

impl JsonConnection {
    pub fn new<P: AsRef<Path>>(data_file: P) -> Self {
        Self {
            data_file: data_file.as_ref().to_path_buf(),
        }
    }

    /// Pick the default location: a durable path under the working
    /// directory, or a volatile one on hosts with a read-only filesystem.
    pub fn default_location(volatile: bool) -> PathBuf {
        if volatile {
            PathBuf::from(VOLATILE_DATA_FILE)
        } else {
            PathBuf::from(DEFAULT_DATA_FILE)
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Fresh temporary sibling for one atomic replacement. Every call gets a
    /// distinct name so concurrent writers never share a temp file.
    pub fn temp_file(&self) -> PathBuf {
        self.data_file
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()))
    }

    /// Create the directory that holds the document if it is missing
    pub async fn ensure_data_directory(&self) -> Result<()> {
        let Some(parent) = self.data_file.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        if tokio::fs::metadata(parent).await.is_err() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
            info!("Created data directory: {}", parent.display());
        }

        Ok(())
    }
}
