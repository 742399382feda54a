//! Settings for `rpcman`.
//!
//! Read from an optional TOML file (`rpcman.toml` in the working directory,
//! or the file given with `--config`):
//!
//! ```toml
//! [rpc]
//! broker = "http://localhost:8000"
//! timeout = 10
//!
//! [catalog]
//! path = "rpcman.json"
//!
//! [display]
//! max_length = 50000
//! ```
//!
//! Each value resolves as: command-line flag, then environment
//! (`RPCMAN_BROKER`, `RPCMAN_TIMEOUT`, `RPCMAN_CATALOG`), then the file, then
//! the built-in default.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use rpcman_dispatch::{DEFAULT_BROKER, DEFAULT_TIMEOUT_SECS};
use rpcman_format::MAX_DISPLAY_LENGTH;

pub const DEFAULT_CONFIG_FILE: &str = "rpcman.toml";
pub const DEFAULT_CATALOG_FILE: &str = "rpcman.json";

pub const ENV_BROKER: &str = "RPCMAN_BROKER";
pub const ENV_TIMEOUT: &str = "RPCMAN_TIMEOUT";
pub const ENV_CATALOG: &str = "RPCMAN_CATALOG";

// ── File format ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub rpc: RpcSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub display: DisplaySection,
}

/// `[rpc]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcSection {
    pub broker: Option<String>,
    pub timeout: Option<u64>,
}

/// `[catalog]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    pub path: Option<PathBuf>,
}

/// `[display]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplaySection {
    pub max_length: Option<usize>,
}

/// Read a config file. `explicit` paths must exist; the default
/// `rpcman.toml` is optional.
pub fn read_config(path: &Path, explicit: bool) -> Result<FileConfig, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    };
    parse_config(&content)
        .map_err(|e| format!("invalid config file '{}': {}", path.display(), e))
}

pub fn parse_config(content: &str) -> Result<FileConfig, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub broker: Option<String>,
    pub timeout: Option<u64>,
    pub catalog: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub broker: String,
    pub timeout_secs: u64,
    pub catalog: PathBuf,
    pub max_length: usize,
}

impl Settings {
    /// Resolve settings, reading environment variables through `env`.
    pub fn resolve(
        flags: &Overrides,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, String> {
        let env_timeout = match env(ENV_TIMEOUT) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT, raw)
            })?),
            None => None,
        };

        let broker = flags
            .broker
            .clone()
            .or_else(|| env(ENV_BROKER))
            .or_else(|| file.rpc.broker.clone())
            .unwrap_or_else(|| DEFAULT_BROKER.to_string());
        let timeout_secs = flags
            .timeout
            .or(env_timeout)
            .or(file.rpc.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let catalog = flags
            .catalog
            .clone()
            .or_else(|| env(ENV_CATALOG).map(PathBuf::from))
            .or_else(|| file.catalog.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE));
        let max_length = file.display.max_length.unwrap_or(MAX_DISPLAY_LENGTH);

        Ok(Settings {
            broker,
            timeout_secs,
            catalog,
            max_length,
        })
    }

    /// Resolve against the process environment.
    pub fn load(config: Option<&Path>, flags: &Overrides) -> Result<Settings, String> {
        let file = match config {
            Some(path) => read_config(path, true)?,
            None => read_config(Path::new(DEFAULT_CONFIG_FILE), false)?,
        };
        Self::resolve(flags, &file, |key| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::resolve(&Overrides::default(), &FileConfig::default(), no_env)
            .unwrap();
        assert_eq!(settings.broker, DEFAULT_BROKER);
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.catalog, PathBuf::from("rpcman.json"));
        assert_eq!(settings.max_length, 50000);
    }

    #[test]
    fn parse_full_file() {
        let file = parse_config(
            r#"
[rpc]
broker = "http://gateway:9000"
timeout = 30

[catalog]
path = "requests.json"

[display]
max_length = 100
"#,
        )
        .unwrap();
        let settings = Settings::resolve(&Overrides::default(), &file, no_env).unwrap();
        assert_eq!(settings.broker, "http://gateway:9000");
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.catalog, PathBuf::from("requests.json"));
        assert_eq!(settings.max_length, 100);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[rpc]\nbrokr = \"x\"\n").is_err());
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = parse_config("[rpc]\nbroker = \"file://b\"\ntimeout = 3\n").unwrap();
        let env: HashMap<&str, &str> =
            [(ENV_BROKER, "env://b"), (ENV_TIMEOUT, "7")].into_iter().collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let settings = Settings::resolve(&Overrides::default(), &file, lookup).unwrap();
        assert_eq!(settings.broker, "env://b");
        assert_eq!(settings.timeout_secs, 7);

        let flags = Overrides {
            broker: Some("flag://b".to_string()),
            timeout: Some(9),
            catalog: None,
        };
        let settings = Settings::resolve(&flags, &file, lookup).unwrap();
        assert_eq!(settings.broker, "flag://b");
        assert_eq!(settings.timeout_secs, 9);
    }

    #[test]
    fn bad_env_timeout_is_an_error() {
        let err = Settings::resolve(&Overrides::default(), &FileConfig::default(), |key| {
            (key == ENV_TIMEOUT).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.contains(ENV_TIMEOUT));
    }

    #[test]
    fn missing_default_file_is_fine_but_explicit_is_not() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(read_config(&path, false).is_ok());
        assert!(read_config(&path, true).is_err());
    }
}
