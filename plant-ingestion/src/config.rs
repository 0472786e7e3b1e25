use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::pipeline::ValidationPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub sheet_name: String,
    pub ignore_validation_failure: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("egrid2022_data.xlsx"),
            sheet_name: "PLNT22".to_string(),
            ignore_validation_failure: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://plants.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub batch_size: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    pub sink: SinkConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
}

/// `1`, `true`, `yes` and `on` (any case) are true; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Defaults, then the TOML file at `$PLANTS_CONFIG` if it exists, then
    /// `PLANTS_*` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("PLANTS_CONFIG").unwrap_or_else(|_| "plants-config.toml".to_string());
        let mut cfg = match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents)
                .map_err(|e| anyhow::anyhow!("invalid config file {path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(anyhow::anyhow!("failed to read config file {path}: {e}")),
        };

        cfg.apply_overrides(|key| env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PLANTS_SOURCE_PATH") {
            self.source.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PLANTS_SHEET_NAME") {
            self.source.sheet_name = v;
        }
        if let Some(v) = lookup("PLANTS_IGNORE_VALIDATION") {
            self.source.ignore_validation_failure = parse_flag(&v);
        }
        if let Some(v) = lookup("PLANTS_DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("PLANTS_HTTP_BIND_ADDR") {
            self.http.bind_addr = v;
        }
        if let Some(v) = lookup("PLANTS_METRICS_BIND_ADDR") {
            self.metrics = Some(MetricsConfig { bind_addr: v });
        }
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::from_ignore_flag(self.source.ignore_validation_failure)
    }
}
