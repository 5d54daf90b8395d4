//! Configuration loading for the monitoring event warehouse job.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `DWH_ETL_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix shared by every environment key this job reads.
const ENV_PREFIX: &str = "DWH_ETL_";

/// Application configuration derived from `DWH_ETL_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Finishing/Printing database (monitoring events, machines, machine events).
    #[serde(default)]
    pub fp_database_url: String,
    /// Core database (divisions, buyers).
    #[serde(default)]
    pub core_database_url: String,
    /// Sales database (production orders).
    #[serde(default)]
    pub sales_database_url: String,
    /// Analytical warehouse holding the staging and fact tables.
    #[serde(default)]
    pub dwh_database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Tuning knobs for a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PipelineConfig {
    /// Schema that owns the staging table (`None` loads into the default schema).
    #[serde(default = "default_warehouse_schema")]
    pub warehouse_schema: Option<String>,
    /// Rows per staging insert statement.
    #[serde(default = "default_load_batch_size")]
    pub load_batch_size: usize,
    /// Base records enriched at the same time.
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,
    /// Optional cap on the number of monitoring events extracted per run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_limit: Option<u64>,
}

/// Scheduler-specific configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SchedulerConfig {
    #[serde(default = "default_schedule_interval_seconds")]
    pub interval_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            fp_database_url: String::new(),
            core_database_url: String::new(),
            sales_database_url: String::new(),
            dwh_database_url: String::new(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            pipeline: PipelineConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            warehouse_schema: default_warehouse_schema(),
            load_batch_size: default_load_batch_size(),
            enrich_concurrency: default_enrich_concurrency(),
            extract_limit: None,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_schedule_interval_seconds(),
        }
    }
}

impl PipelineConfig {
    /// Validate pipeline tuning bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_batch_size == 0 || self.load_batch_size > MAX_LOAD_BATCH_SIZE {
            return Err(ConfigError::InvalidLoadBatchSize {
                value: self.load_batch_size,
            });
        }

        if self.enrich_concurrency == 0 || self.enrich_concurrency > 64 {
            return Err(ConfigError::InvalidEnrichConcurrency {
                value: self.enrich_concurrency,
            });
        }

        if self.extract_limit == Some(0) {
            return Err(ConfigError::InvalidExtractLimit);
        }

        Ok(())
    }
}

impl SchedulerConfig {
    /// Validate scheduler configuration bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_seconds < 60 {
            return Err(ConfigError::InvalidScheduleInterval {
                value: self.interval_seconds,
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Returns a redacted JSON representation (connection URLs carry credentials).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        for url in [
            &mut config.fp_database_url,
            &mut config.core_database_url,
            &mut config.sales_database_url,
            &mut config.dwh_database_url,
        ] {
            if !url.is_empty() {
                *url = "[REDACTED]".to_string();
            }
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error if required settings are missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Local and test profiles may run without real sources wired up.
        if !matches!(self.profile.as_str(), "local" | "test") {
            for (key, value) in [
                ("FP_DATABASE_URL", &self.fp_database_url),
                ("CORE_DATABASE_URL", &self.core_database_url),
                ("SALES_DATABASE_URL", &self.sales_database_url),
                ("DWH_DATABASE_URL", &self.dwh_database_url),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingDatabaseUrl { key });
                }
            }
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections {
                value: self.db_max_connections,
            });
        }

        self.pipeline.validate()?;
        self.scheduler.validate()?;

        Ok(())
    }
}

/// Largest staging batch the warehouse insert accepts.
pub const MAX_LOAD_BATCH_SIZE: usize = 1000;

fn default_profile() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_warehouse_schema() -> Option<String> {
    Some("dbo".to_string())
}

fn default_load_batch_size() -> usize {
    MAX_LOAD_BATCH_SIZE
}

fn default_enrich_concurrency() -> usize {
    8
}

fn default_schedule_interval_seconds() -> u64 {
    3600
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("{key} is missing; set DWH_ETL_{key}")]
    MissingDatabaseUrl { key: &'static str },
    #[error("invalid value '{value}' for DWH_ETL_{key}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("database max connections must be positive, got {value}")]
    InvalidMaxConnections { value: u32 },
    #[error("load batch size must be between 1 and 1000, got {value}")]
    InvalidLoadBatchSize { value: usize },
    #[error("enrich concurrency must be between 1 and 64, got {value}")]
    InvalidEnrichConcurrency { value: usize },
    #[error("extract limit must be positive when set")]
    InvalidExtractLimit,
    #[error("schedule interval must be at least 60 seconds, got {value}")]
    InvalidScheduleInterval { value: u64 },
}

/// Loads configuration using layered `.env` files and `DWH_ETL_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads, layers and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let mut take = |key: &str| layered.remove(key).filter(|v| !v.trim().is_empty());

        let profile = take("PROFILE").unwrap_or(profile_hint);
        let log_level = take("LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take("LOG_FORMAT").unwrap_or_else(default_log_format);
        let fp_database_url = take("FP_DATABASE_URL").unwrap_or_default();
        let core_database_url = take("CORE_DATABASE_URL").unwrap_or_default();
        let sales_database_url = take("SALES_DATABASE_URL").unwrap_or_default();
        let dwh_database_url = take("DWH_DATABASE_URL").unwrap_or_default();

        let db_max_connections = parse_or(
            "DB_MAX_CONNECTIONS",
            take("DB_MAX_CONNECTIONS"),
            default_db_max_connections,
        )?;
        let db_acquire_timeout_ms = parse_or(
            "DB_ACQUIRE_TIMEOUT_MS",
            take("DB_ACQUIRE_TIMEOUT_MS"),
            default_db_acquire_timeout_ms,
        )?;

        // An explicit "none" loads into the connection's default schema.
        let warehouse_schema = match take("WAREHOUSE_SCHEMA") {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            Some(value) => Some(value.trim().to_string()),
            None => default_warehouse_schema(),
        };
        let load_batch_size = parse_or(
            "LOAD_BATCH_SIZE",
            take("LOAD_BATCH_SIZE"),
            default_load_batch_size,
        )?;
        let enrich_concurrency = parse_or(
            "ENRICH_CONCURRENCY",
            take("ENRICH_CONCURRENCY"),
            default_enrich_concurrency,
        )?;
        let extract_limit = match take("EXTRACT_LIMIT") {
            Some(value) => Some(parse_or("EXTRACT_LIMIT", Some(value), || 0)?),
            None => None,
        };
        let interval_seconds = parse_or(
            "SCHEDULE_INTERVAL_SECONDS",
            take("SCHEDULE_INTERVAL_SECONDS"),
            default_schedule_interval_seconds,
        )?;

        let config = AppConfig {
            profile,
            log_level,
            log_format,
            fp_database_url,
            core_database_url,
            sales_database_url,
            dwh_database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            pipeline: PipelineConfig {
                warehouse_schema,
                load_batch_size,
                enrich_concurrency,
                extract_limit,
            },
            scheduler: SchedulerConfig { interval_seconds },
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default()),
    }
}
