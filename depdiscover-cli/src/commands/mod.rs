//! Command handlers -- one module per subcommand

pub mod config;
pub mod elf;
pub mod scan;

use std::path::{Path, PathBuf};

use depdiscover_core::config::{DEFAULT_CONFIG_PATH, DepdiscoverConfig};
use depdiscover_core::error::DepdiscoverError;

/// Where the configuration came from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// `--config` was given explicitly.
    pub explicit: bool,
}

impl ConfigSource {
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) => Self {
                path: path.to_path_buf(),
                explicit: true,
            },
            None => Self {
                path: PathBuf::from(DEFAULT_CONFIG_PATH),
                explicit: false,
            },
        }
    }

    /// Load the configuration.
    ///
    /// A missing file at the default path yields defaults; a missing explicit path is an error.
    pub async fn load(&self) -> Result<DepdiscoverConfig, DepdiscoverError> {
        if self.explicit {
            DepdiscoverConfig::load(&self.path).await
        } else {
            DepdiscoverConfig::load_or_default(&self.path).await
        }
    }

    pub fn display(&self) -> String {
        self.path.display().to_string()
    }
}
