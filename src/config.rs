//! Dispatch configuration.
//!
//! Loaded from `~/.dispatch/config.toml` when it exists. Every key is
//! optional, and a missing file means defaults:
//!
//! ```toml
//! data-file = "/srv/bodega/despachos_data.json"
//! id-prefix = "INT"
//! ```
//!
//! The data file is resolved through a chain:
//!
//! 1. `--data <path>`: explicit per-command override
//! 2. `DISPATCH_DATA` env var
//! 3. `data-file` in the config file
//! 4. `despachos_data.json` in the current directory

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::storage::Store;

/// Environment variable naming the data file.
pub const DATA_ENV: &str = "DISPATCH_DATA";

/// Data file used when nothing else names one.
pub const DEFAULT_DATA_FILE: &str = "despachos_data.json";

/// Dispatch configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Where dispatches are stored.
    pub data_file: Option<PathBuf>,

    /// Prefix for auto-generated dispatch IDs.
    pub id_prefix: Option<String>,
}

impl Config {
    /// Load config from `~/.dispatch/config.toml`.
    ///
    /// Returns defaults when the file (or the home directory) is missing,
    /// and an error when the file exists but is invalid.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };
        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;

        if let Some(prefix) = &config.id_prefix
            && prefix.trim().is_empty()
        {
            return Err("id-prefix is empty".to_string());
        }

        Ok(config)
    }

    /// The config file path: `~/.dispatch/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".dispatch").join("config.toml"))
    }

    /// Resolve the data file, given the `--data` flag if one was passed.
    pub fn data_file(&self, explicit: Option<&Path>) -> PathBuf {
        resolve_data_file(explicit, env::var_os(DATA_ENV), self.data_file.as_deref())
    }

    /// The prefix for auto-generated IDs.
    pub fn id_prefix(&self) -> &str {
        self.id_prefix
            .as_deref()
            .map_or(Store::DEFAULT_PREFIX, str::trim)
    }
}

fn resolve_data_file(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    configured: Option<&Path>,
) -> PathBuf {
    // 1. Explicit --data flag.
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    // 2. DISPATCH_DATA environment variable.
    if let Some(path) = from_env
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }

    // 3. Config file, then 4. the default.
    configured.map_or_else(|| PathBuf::from(DEFAULT_DATA_FILE), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            "data-file = \"/srv/bodega/data.json\"\nid-prefix = \"BOD\"\n",
        )
        .unwrap();

        assert_eq!(
            config.data_file.as_deref(),
            Some(Path::new("/srv/bodega/data.json"))
        );
        assert_eq!(config.id_prefix(), "BOD");
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert!(config.data_file.is_none());
        assert_eq!(config.id_prefix(), "INT");
    }

    #[test]
    fn prefix_is_trimmed() {
        let config = Config::parse("id-prefix = \" BOD \"").unwrap();
        assert_eq!(config.id_prefix(), "BOD");
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = Config::parse("id-prefix = \"  \"").unwrap_err();
        assert!(err.contains("id-prefix"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("data_file = \"x.json\"").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert!(config.data_file.is_none());
        assert!(config.id_prefix.is_none());
    }

    #[test]
    fn invalid_file_names_its_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "id-prefix = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();

        assert!(err.contains("config.toml"));
    }

    #[test]
    fn explicit_wins() {
        let path = resolve_data_file(
            Some(Path::new("flag.json")),
            Some("env.json".into()),
            Some(Path::new("config.json")),
        );
        assert_eq!(path, PathBuf::from("flag.json"));
    }

    #[test]
    fn env_beats_config() {
        let path = resolve_data_file(None, Some("env.json".into()), Some(Path::new("config.json")));
        assert_eq!(path, PathBuf::from("env.json"));
    }

    #[test]
    fn empty_env_is_ignored() {
        let path = resolve_data_file(None, Some(OsString::new()), Some(Path::new("config.json")));
        assert_eq!(path, PathBuf::from("config.json"));
    }

    #[test]
    fn falls_back_to_default_file() {
        assert_eq!(
            resolve_data_file(None, None, None),
            PathBuf::from(DEFAULT_DATA_FILE)
        );
    }
}
