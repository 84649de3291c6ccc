use crate::Config;
use crate::naming::{NameSource, SystemNames};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub names: Arc<dyn NameSource>,
    pub upload_dir: PathBuf,
    pub max_file_size: u64,
    pub max_files: usize,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_names(config, Arc::new(SystemNames))
    }

    /// Build state with a custom clock/random source for generated names
    pub fn with_names(config: &Config, names: Arc<dyn NameSource>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.upload_dir).map_err(|error| {
            anyhow::anyhow!(
                "Failed to create upload dir {}: {error}",
                config.upload_dir.display()
            )
        })?;
        // stored paths are reported to clients, keep them absolute
        let upload_dir = std::fs::canonicalize(&config.upload_dir)?;
        info!(upload_dir = %upload_dir.display(), "Upload directory ready");

        Ok(Self {
            names,
            upload_dir,
            max_file_size: config.max_file_size,
            max_files: config.max_files,
            max_body_size: config.max_body_size(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.as_path()
    }
}
