use config::{Config, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::Result;

/// Name of the output directory created under the scan root. Never a candidate.
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Name of the staging directory inside the archive root.
pub const STAGING_DIR_NAME: &str = ".tmp";

pub const DEFAULT_DAYS: u64 = 30;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Settings read from `dclean.toml` (or the file given with `--config`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub days: u64,
    pub dependency_cache_names: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            dependency_cache_names: vec!["node_modules".to_string()],
        }
    }
}

pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig> {
    let source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("dclean").required(false),
    };
    let builder = Config::builder().add_source(source).build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

/// Everything one archive run needs, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub root: PathBuf,
    pub days: u64,
    pub use_zip: bool,
    pub remove_dependency_caches: bool,
    pub archive_all: bool,
    pub dependency_cache_names: Vec<String>,
}

impl ArchiveOptions {
    pub fn new(root: impl Into<PathBuf>, app_config: &AppConfig) -> Self {
        Self {
            root: root.into(),
            days: app_config.days,
            use_zip: true,
            remove_dependency_caches: false,
            archive_all: false,
            dependency_cache_names: app_config.dependency_cache_names.clone(),
        }
    }

    pub fn archive_root(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR_NAME)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.archive_root().join(STAGING_DIR_NAME)
    }

    /// Directories whose newest entry is strictly older than this are stale.
    pub fn cutoff(&self, now: SystemTime) -> SystemTime {
        let window = Duration::from_secs(self.days.saturating_mul(SECS_PER_DAY));
        now.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH)
    }
}
