//! Configuration loading and typed config structures for the Voicelog pipeline.
//!
//! The canonical configuration lives in `voicelog-config.yaml` at the
//! project root. Every field has a default, so a missing file or a partial
//! file is valid. Numeric limits are clamped to sane minimums instead of
//! being rejected.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level pipeline configuration.
///
/// Mirrors the structure of `voicelog-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VoicelogConfig {
    /// Log capacity and query display limit.
    #[serde(default)]
    pub log: LogConfig,

    /// Ingestion start-up behaviour.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Entity cache garbage collection.
    #[serde(default)]
    pub gc: GcConfig,

    /// Infrastructure connection settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VoicelogConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for infrastructure:
    /// - `NATS_URL` overrides `infrastructure.nats_url`
    /// - `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`
    /// - `VOICELOG_STORE` overrides `infrastructure.store_backend`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        config.clamp();
        Ok(config)
    }

    fn clamp(&mut self) {
        self.log.max_history_size = self.log.max_history_size.max(1);
        self.log.display_limit = self.log.display_limit.max(1);
        self.gc.interval_secs = self.gc.interval_secs.max(1);
    }
}

/// Log capacity settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Maximum number of retained log events.
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,

    /// Default number of events returned by a query.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_history_size: default_max_history_size(),
            display_limit: default_display_limit(),
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestConfig {
    /// Delay after start-up before ingestion is enabled, in milliseconds.
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
        }
    }
}

/// Garbage collection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GcConfig {
    /// Seconds between GC passes.
    #[serde(default = "default_gc_interval_secs")]
    pub interval_secs: u64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_gc_interval_secs(),
        }
    }
}

/// Which key-value store backs the journal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store. Nothing survives a restart.
    #[default]
    Memory,
    /// `Dragonfly` (Redis-compatible) server.
    Dragonfly,
}

impl core::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "dragonfly" => Ok(Self::Dragonfly),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Infrastructure connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Store backend selection.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// NATS messaging URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Observer HTTP API port.
    #[serde(default = "default_observer_port")]
    pub observer_port: u16,
}

impl InfrastructureConfig {
    /// Override infrastructure settings with environment variables when set.
    ///
    /// An unrecognized `VOICELOG_STORE` value is logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NATS_URL") {
            self.nats_url = val;
        }
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("VOICELOG_STORE") {
            match val.parse() {
                Ok(backend) => self.store_backend = backend,
                Err(e) => tracing::warn!(error = %e, "ignoring VOICELOG_STORE"),
            }
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::default(),
            dragonfly_url: default_dragonfly_url(),
            nats_url: default_nats_url(),
            observer_port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

const fn default_max_history_size() -> usize {
    2048
}

const fn default_display_limit() -> usize {
    128
}

const fn default_warmup_ms() -> u64 {
    3000
}

const fn default_gc_interval_secs() -> u64 {
    7200
}

fn default_dragonfly_url() -> String {
    String::from("redis://localhost:6379")
}

fn default_nats_url() -> String {
    String::from("nats://localhost:4222")
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = VoicelogConfig::default();
        assert_eq!(config.log.max_history_size, 2048);
        assert_eq!(config.log.display_limit, 128);
        assert_eq!(config.ingest.warmup_ms, 3000);
        assert_eq!(config.gc.interval_secs, 7200);
        assert_eq!(config.infrastructure.observer_port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_partial_yaml_keeps_defaults() {
        let yaml = "log:\n  display_limit: 10\ninfrastructure:\n  observer_port: 9090\n";
        let config = VoicelogConfig::parse(yaml).ok().unwrap_or_default();
        assert_eq!(config.log.display_limit, 10);
        assert_eq!(config.log.max_history_size, 2048);
        assert_eq!(config.infrastructure.observer_port, 9090);
        assert_eq!(config.gc.interval_secs, 7200);
    }

    #[test]
    fn zero_limits_are_clamped() {
        let yaml = "log:\n  max_history_size: 0\n  display_limit: 0\ngc:\n  interval_secs: 0\n";
        let config = VoicelogConfig::parse(yaml).ok().unwrap_or_default();
        assert_eq!(config.log.max_history_size, 1);
        assert_eq!(config.log.display_limit, 1);
        assert_eq!(config.gc.interval_secs, 1);
    }

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Dragonfly".parse::<StoreBackend>(), Ok(StoreBackend::Dragonfly));
        assert_eq!(" memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            VoicelogConfig::parse("log: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("voicelog-config.yaml");
        if path.exists() {
            let config = VoicelogConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
