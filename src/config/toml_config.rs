use crate::aqi::FallbackPolicy;
use crate::config::{
    fallback_policy, feed_endpoint, missing_value_policy, parse_fields, DEFAULT_API_BASE,
    DEFAULT_CHANNEL_ID, DEFAULT_RESULTS, MAX_RESULTS,
};
use crate::domain::model::{DateRange, Field, Location, MissingValuePolicy};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub aqi: AqiConfig,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_channel_id")]
    pub channel_id: u64,
    #[serde(default = "default_results")]
    pub results: u32,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            channel_id: default_channel_id(),
            results: default_results(),
            timeout_seconds: None,
            retry_attempts: None,
            retry_delay_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_channel_id() -> u64 {
    DEFAULT_CHANNEL_ID
}

fn default_results() -> u32 {
    DEFAULT_RESULTS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Field labels as written by users, e.g. "PM2.5" or "humidity".
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AqiConfig {
    pub legacy_zero_fill: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub write_files: Option<bool>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            write_files: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from TOML text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left
    /// as written so the parse or validation error points at them.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|e| panic!("invalid env var pattern: {}", e))
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    fn legacy_zero_fill(&self) -> bool {
        self.aqi.legacy_zero_fill.unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.base_url", &self.source.base_url)?;
        self.api_endpoint()?;
        validation::validate_range("source.results", self.source.results, 1, MAX_RESULTS)?;
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }
        if self.write_files() {
            validation::validate_path("load.output_path", &self.load.output_path)?;
        }
        self.fields()?;
        if let Some(level) = self.log_level() {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }
        let range = self.date_range();
        validation::validate_date_range("filter.start_date", range.start, range.end)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> Result<String> {
        feed_endpoint(&self.source.base_url, self.source.channel_id, self.source.results)
    }

    fn channel_id(&self) -> u64 {
        self.source.channel_id
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn write_files(&self) -> bool {
        self.load.write_files.unwrap_or(true)
    }

    fn date_range(&self) -> DateRange {
        let default = DateRange::last_week(Utc::now().date_naive());
        DateRange::new(
            self.filter.start_date.unwrap_or(default.start),
            self.filter.end_date.unwrap_or(default.end),
        )
    }

    fn fields(&self) -> Result<Vec<Field>> {
        match &self.filter.fields {
            Some(names) => parse_fields("filter.fields", names),
            None => Ok(Field::POLLUTANTS.to_vec()),
        }
    }

    fn location(&self) -> Location {
        self.location.clone()
    }

    fn missing_value_policy(&self) -> MissingValuePolicy {
        missing_value_policy(self.legacy_zero_fill())
    }

    fn fallback_policy(&self) -> FallbackPolicy {
        fallback_policy(self.legacy_zero_fill())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(30))
    }

    fn retry_attempts(&self) -> u32 {
        self.source.retry_attempts.unwrap_or(2)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.source.retry_delay_seconds.unwrap_or(1))
    }
}
