use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;
use types::PartPlanError;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/partplan/config.toml";
pub(crate) const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Disks description file. Relative paths are relative to the
    /// configuration file they are set in.
    pub(crate) disks: Option<PathBuf>,
}

impl Config {
    fn from_file(path: &Path) -> Result<Option<Self>, PartPlanError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No configuration file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Loading configuration file {}", path.display());

        let mut config: Self = toml::from_str(&content)?;
        if let (Some(disks), Some(dir)) = (&config.disks, path.parent()) {
            if disks.is_relative() {
                config.disks = Some(dir.join(disks));
            }
        }

        Ok(Some(config))
    }

    /// Loads the configuration files in order, later files overriding the
    /// keys set by earlier ones.
    pub(crate) fn from_paths(paths: &[PathBuf]) -> Result<Self, PartPlanError> {
        let mut config = Self::default();

        for path in paths {
            let Some(file_config) = Self::from_file(path)? else {
                continue;
            };

            if file_config.disks.is_some() {
                config.disks = file_config.disks;
            }
        }

        Ok(config)
    }

    pub(crate) fn load() -> Result<Self, PartPlanError> {
        let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];

        if let Some(path) = xdg::BaseDirectories::with_prefix(env!("CARGO_PKG_NAME"))
            .map_err(io::Error::from)?
            .find_config_file(CONFIG_FILE_NAME)
        {
            paths.push(path);
        }

        Self::from_paths(&paths)
    }
}
