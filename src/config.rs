//! Settings file discovery and merging.
//!
//! Sources in priority order:
//! 1. CLI arguments and their environment variables
//! 2. Config file (searched in standard locations)
//! 3. Built-in defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Args;
use crate::logging::parse_level;
use crate::source::Location;
use crate::units::Units;

pub const APP_NAME: &str = "wx";
pub const CONFIG_FILE: &str = "wx.toml";
pub const CONFIG_ENV: &str = "WX_CONFIG";

pub const DEFAULT_ZIP_CODE: &str = "10001";
pub const DEFAULT_COUNTRY_CODE: &str = "us";
pub const DEFAULT_LOG_FILE: &str = "wx.log";

/// Describes where a configuration was loaded from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Explicit path provided via CLI or env var
    Explicit(PathBuf),
    /// Found in current working directory
    CurrentDir(PathBuf),
    /// Found in XDG config home (~/.config/wx/)
    XdgConfig(PathBuf),
    /// Found in system config (/etc/wx/)
    System(PathBuf),
    /// No config file found, using defaults
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ConfigSource::Explicit(p)
            | ConfigSource::CurrentDir(p)
            | ConfigSource::XdgConfig(p)
            | ConfigSource::System(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(p) => write!(f, "{}", p.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Config files tried in order: `$WX_CONFIG`, `./wx.toml`, the XDG config
/// home, `/etc/wx`.
fn candidates() -> Vec<ConfigSource> {
    let mut paths = Vec::with_capacity(4);
    if let Some(path) = env::var_os(CONFIG_ENV) {
        paths.push(ConfigSource::Explicit(PathBuf::from(path)));
    }
    paths.push(ConfigSource::CurrentDir(PathBuf::from(CONFIG_FILE)));

    let config_home = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
    if let Some(dir) = config_home {
        paths.push(ConfigSource::XdgConfig(dir.join(APP_NAME).join(CONFIG_FILE)));
    }

    paths.push(ConfigSource::System(
        Path::new("/etc").join(APP_NAME).join(CONFIG_FILE),
    ));
    paths
}

/// First existing config file, or [`ConfigSource::Defaults`].
pub fn find_config_file() -> ConfigSource {
    candidates()
        .into_iter()
        .find(|source| source.path().is_some_and(|p| p.exists()))
        .unwrap_or(ConfigSource::Defaults)
}

/// Load and parse a TOML configuration file, or the defaults when there is none.
pub fn load_config<T: DeserializeOwned + Default>(source: &ConfigSource) -> Result<T, ConfigError> {
    let Some(path) = source.path() else {
        return Ok(T::default());
    };
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })
}

/// Contents of `wx.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub zip_code: Option<String>,
    pub country_code: Option<String>,
    pub units: Option<Units>,
    pub level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Effective settings after merging CLI, config file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub location: Location,
    pub units: Units,
    pub level: LevelFilter,
    pub log_file: PathBuf,
    pub offline_files: Option<(PathBuf, PathBuf)>,
    pub print: bool,
}

impl Settings {
    pub fn merge(args: Args, file: FileConfig) -> Self {
        let level = args.level.or(file.level);
        let offline_files = match (args.current_file, args.forecast_file) {
            (Some(current), Some(forecast)) => Some((current, forecast)),
            _ => None,
        };
        Self {
            api_key: args.api_key.or(file.api_key),
            location: Location::new(
                args.zip_code
                    .or(file.zip_code)
                    .unwrap_or_else(|| DEFAULT_ZIP_CODE.to_string()),
                args.country
                    .or(file.country_code)
                    .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string()),
            ),
            units: args.units.or(file.units).unwrap_or_default(),
            level: parse_level(level.as_deref()),
            log_file: args
                .log_file
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            offline_files,
            print: args.print,
        }
    }

    /// Reads the config file the arguments point at (or the first one found)
    /// and merges it underneath the arguments.
    pub fn load(args: Args) -> Result<(Self, ConfigSource), ConfigError> {
        let source = match args.config {
            Some(ref path) => ConfigSource::Explicit(path.clone()),
            None => find_config_file(),
        };
        let file: FileConfig = load_config(&source)?;
        Ok((Self::merge(args, file), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_source_display() {
        let source = ConfigSource::CurrentDir(PathBuf::from("test.toml"));
        assert_eq!(format!("{}", source), "test.toml");

        let source = ConfigSource::Defaults;
        assert_eq!(format!("{}", source), "(defaults)");
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::merge(Args::default(), FileConfig::default());
        assert_eq!(settings.location, Location::new("10001", "us"));
        assert_eq!(settings.units, Units::Imperial);
        assert_eq!(settings.log_file, PathBuf::from("wx.log"));
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.offline_files, None);
    }

    #[test]
    fn test_args_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key = \"from-file\"\nzip_code = \"94103\"\ncountry_code = \"us\"\nunits = \"metric\""
        )
        .unwrap();

        let args = Args {
            zip_code: Some("60601".to_string()),
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        let (settings, source) = Settings::load(args).unwrap();

        assert_eq!(source, ConfigSource::Explicit(file.path().to_path_buf()));
        assert_eq!(settings.api_key.as_deref(), Some("from-file"));
        assert_eq!(settings.location.zip_code, "60601");
        assert_eq!(settings.units, Units::Metric);
    }

    #[test]
    fn test_search_order() {
        let paths = candidates();
        let local = paths
            .iter()
            .position(|s| *s == ConfigSource::CurrentDir(PathBuf::from("wx.toml")))
            .unwrap();
        if let Some(xdg) = paths.iter().position(|s| matches!(s, ConfigSource::XdgConfig(_))) {
            assert!(xdg > local);
            assert!(paths[xdg].path().unwrap().ends_with("wx/wx.toml"));
        }
        assert_eq!(
            paths.last(),
            Some(&ConfigSource::System(PathBuf::from("/etc/wx/wx.toml")))
        );
    }

    #[test]
    fn test_bad_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "zipcode = 10001").unwrap();

        let source = ConfigSource::Explicit(file.path().to_path_buf());
        let result: Result<FileConfig, _> = load_config(&source);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
