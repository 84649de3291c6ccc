use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Framing overhead allowed on top of the file payloads (part headers, boundaries, text fields).
const MULTIPART_SLACK: u64 = 1024 * 1024;

/// Main configuration structure that can be loaded from CLI, environment, or config file
///
/// Example configuration file content
/// # Media Intake Configuration
///
/// port = 3000
/// upload_dir = "./uploads"
///
/// # Limits
/// max_file_size = 314572800  # 300 MiB per file
/// max_files = 2
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[serde(default)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory uploaded files are written to
    #[arg(short, long, env = "UPLOAD_DIR", default_value = "uploads")]
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Per-file size cap in bytes
    #[arg(long, default_value_t = 300 * 1024 * 1024)]
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Maximum number of file parts in one request
    #[arg(long, default_value_t = 2)]
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Configuration file path
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            upload_dir: default_upload_dir(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            config: None,
        }
    }
}

impl Config {
    /// Load configuration from CLI args and environment, optionally merging with a config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Config::parse();

        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(config_path)?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with file config, CLI and environment take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        // If CLI value is default, use file value
        if self.port == default_port() {
            self.port = file_config.port;
        }
        if self.upload_dir == default_upload_dir() {
            self.upload_dir = file_config.upload_dir;
        }
        if self.max_file_size == default_max_file_size() {
            self.max_file_size = file_config.max_file_size;
        }
        if self.max_files == default_max_files() {
            self.max_files = file_config.max_files;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upload_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Upload directory cannot be empty"));
        }
        if self.max_file_size == 0 {
            return Err(anyhow::anyhow!("max_file_size must be greater than 0"));
        }
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("max_files must be at least 1"));
        }

        Ok(())
    }

    /// Upper bound for a whole request body
    pub fn max_body_size(&self) -> usize {
        let payload = self.max_file_size.saturating_mul(self.max_files as u64);
        usize::try_from(payload.saturating_add(MULTIPART_SLACK)).unwrap_or(usize::MAX)
    }
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    300 * 1024 * 1024
}

fn default_max_files() -> usize {
    2
}
