//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatter/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! Config is read before the file logger exists (the logger's own level and
//! path live here), so loading and resolution record [`Notice`]s instead of
//! logging. `main` replays them once the logger is up.

use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatterConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// What happened while loading, for the log
    #[serde(skip)]
    pub notices: Vec<Notice>,
}

/// A log line held back until the logger is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_SOCKET_PATH: &str = "/socket.io/";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;
pub const DEFAULT_LOG_FILE: &str = "chatter.log";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub server_url: String,
    pub socket_path: String,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    /// Loading and resolution notices, oldest first
    pub notices: Vec<Notice>,
}

/// Values that arrive from the command line. `None` = flag not given.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub path: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatter/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatter").join("config.toml"))
}

/// Load config from `~/.chatter/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ChatterConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ChatterConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            let mut config = ChatterConfig::default();
            config.notices.push(Notice::new(
                Level::Warn,
                "Could not determine home directory, using default config",
            ));
            return Ok(config);
        }
    };
    load_config_from(&path)
}

/// Same as [`load_config`], for an explicit path.
pub fn load_config_from(path: &Path) -> Result<ChatterConfig, ConfigError> {
    if !path.exists() {
        let mut config = ChatterConfig::default();
        config.notices.push(Notice::new(
            Level::Info,
            format!("No config file found, generating default at {}", path.display()),
        ));
        if let Err(e) = generate_default_config(path) {
            config
                .notices
                .push(Notice::new(Level::Warn, format!("Failed to write default config: {e}")));
        }
        return Ok(config);
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ChatterConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    let loaded = format!("Config: {:?}", config);
    config.notices.push(Notice::new(
        Level::Info,
        format!("Loaded config from {}", path.display()),
    ));
    config.notices.push(Notice::new(Level::Debug, loaded));
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# Chatter Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# url = "http://localhost:5000"     # Or set CHATTER_SOCKET_URL; a path selects the namespace
# path = "/socket.io/"              # Or set CHATTER_SOCKET_PATH

# [logging]
# level = "debug"                   # "off", "error", "warn", "info", "debug", "trace"
# file = "chatter.log"
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG_CONTENT)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ChatterConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Resolution with an injectable environment lookup.
fn resolve_with_env(
    config: &ChatterConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let mut notices = config.notices.clone();

    // Server URL: CLI → env → config → default
    let server_url = cli
        .url
        .clone()
        .or_else(|| env("CHATTER_SOCKET_URL"))
        .or_else(|| config.server.url.clone())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    // Engine.IO mount path: CLI → env → config → default
    let socket_path = cli
        .path
        .clone()
        .or_else(|| env("CHATTER_SOCKET_PATH"))
        .or_else(|| config.server.path.clone())
        .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string());

    // Log level: env → config → default; unparseable values fall back
    let log_level = env("CHATTER_LOG_LEVEL")
        .or_else(|| config.logging.level.clone())
        .and_then(|raw| match LevelFilter::from_str(raw.trim()) {
            Ok(level) => Some(level),
            Err(_) => {
                notices.push(Notice::new(
                    Level::Warn,
                    format!("Unknown log level '{raw}', using {DEFAULT_LOG_LEVEL}"),
                ));
                None
            }
        })
        .unwrap_or(DEFAULT_LOG_LEVEL);

    let log_file = PathBuf::from(
        config
            .logging
            .file
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
    );

    ResolvedConfig {
        server_url,
        socket_path,
        log_level,
        log_file,
        notices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = ChatterConfig::default();
        assert!(config.server.url.is_none());
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&ChatterConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.server_url, DEFAULT_SERVER_URL);
        assert_eq!(resolved.socket_path, DEFAULT_SOCKET_PATH);
        assert_eq!(resolved.log_level, LevelFilter::Debug);
        assert_eq!(resolved.log_file, PathBuf::from("chatter.log"));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = ChatterConfig {
            server: ServerConfig {
                url: Some("http://chat.local:3001".to_string()),
                path: Some("/rt/".to_string()),
            },
            logging: LoggingConfig {
                level: Some("warn".to_string()),
                file: Some("/tmp/chat.log".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.server_url, "http://chat.local:3001");
        assert_eq!(resolved.socket_path, "/rt/");
        assert_eq!(resolved.log_level, LevelFilter::Warn);
        assert_eq!(resolved.log_file, PathBuf::from("/tmp/chat.log"));
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = ChatterConfig {
            server: ServerConfig {
                url: Some("http://from-config:1".to_string()),
                path: None,
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "CHATTER_SOCKET_URL" => Some("http://from-env:2".to_string()),
            "CHATTER_LOG_LEVEL" => Some("info".to_string()),
            _ => None,
        };

        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.server_url, "http://from-env:2");
        assert_eq!(resolved.log_level, LevelFilter::Info);

        let cli = CliOverrides {
            url: Some("http://from-cli:3".to_string()),
            path: Some("/io/".to_string()),
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.server_url, "http://from-cli:3");
        assert_eq!(resolved.socket_path, "/io/");
    }

    #[test]
    fn test_bad_log_level_falls_back() {
        let config = ChatterConfig {
            logging: LoggingConfig {
                level: Some("chatty".to_string()),
                file: None,
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(resolved.notices.len(), 1);
        assert_eq!(resolved.notices[0].level, Level::Warn);
        assert!(resolved.notices[0].message.contains("'chatty'"));
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[server]
url = "https://chat.example.com/lobby"
path = "/socket.io/"

[logging]
level = "trace"
file = "debug.log"
"#;
        let config: ChatterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.server.url.as_deref(),
            Some("https://chat.example.com/lobby")
        );
        assert_eq!(config.server.path.as_deref(), Some("/socket.io/"));
        assert_eq!(config.logging.level.as_deref(), Some("trace"));
        assert_eq!(config.logging.file.as_deref(), Some("debug.log"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[server]
url = "http://10.0.0.5:5000"
"#;
        let config: ChatterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.url.as_deref(), Some("http://10.0.0.5:5000"));
        assert!(config.server.path.is_none());
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_generated_default_is_valid_toml() {
        let config: ChatterConfig = toml::from_str(DEFAULT_CONFIG_CONTENT).unwrap();
        assert!(config.server.url.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("chatter-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[server\nurl = 1").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_generates_default() {
        let dir = std::env::temp_dir().join(format!("chatter-gen-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = load_config_from(&path).unwrap();
        assert!(config.server.url.is_none());
        assert!(path.exists());

        // Held for the logger, and carried through resolution
        assert_eq!(config.notices[0].level, Level::Info);
        assert!(config.notices[0].message.contains("generating default"));
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.notices, config.notices);

        fs::remove_dir_all(&dir).unwrap();
    }
}
