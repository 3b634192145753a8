pub mod cli;
pub mod toml_config;

use crate::aqi::FallbackPolicy;
use crate::domain::model::{Field, MissingValuePolicy};
use crate::utils::error::{EtlError, Result};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.thingspeak.com";
pub const DEFAULT_CHANNEL_ID: u64 = 1596152;
pub const DEFAULT_RESULTS: u32 = 100;
/// Upper bound the channel API accepts for `results`.
pub const MAX_RESULTS: u32 = 8000;

/// `{base}/channels/{id}/feeds.json?results={n}`
pub fn feed_endpoint(api_base: &str, channel_id: u64, results: u32) -> Result<String> {
    let invalid = |reason: String| EtlError::InvalidConfigValueError {
        field: "api_base".to_string(),
        value: api_base.to_string(),
        reason,
    };

    let mut url = Url::parse(api_base).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
    let id = channel_id.to_string();
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be used as a base".to_string()))?
        .pop_if_empty()
        .extend(["channels", id.as_str(), "feeds.json"]);
    url.query_pairs_mut()
        .append_pair("results", &results.to_string());
    Ok(url.to_string())
}

pub(crate) fn missing_value_policy(legacy_zero_fill: bool) -> MissingValuePolicy {
    if legacy_zero_fill {
        MissingValuePolicy::ZeroFill
    } else {
        MissingValuePolicy::Keep
    }
}

pub(crate) fn fallback_policy(legacy_zero_fill: bool) -> FallbackPolicy {
    if legacy_zero_fill {
        FallbackPolicy::LegacyZero
    } else {
        FallbackPolicy::Strict
    }
}

pub(crate) fn parse_fields(field_name: &str, names: &[String]) -> Result<Vec<Field>> {
    names
        .iter()
        .map(|name| {
            name.parse::<Field>()
                .map_err(|reason| EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: name.clone(),
                    reason,
                })
        })
        .collect()
}

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use super::*;
    use crate::domain::model::{DateRange, Location};
    use crate::domain::ports::ConfigProvider;
    use crate::utils::validation::{self, Validate};
    use chrono::{NaiveDate, Utc};
    use clap::Parser;
    use std::time::Duration;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "air-quality-etl")]
    #[command(about = "Fetch air-quality readings from a ThingSpeak channel and report the AQI")]
    pub struct CliConfig {
        #[arg(long, default_value = DEFAULT_API_BASE)]
        pub api_base: String,

        #[arg(long, default_value_t = DEFAULT_CHANNEL_ID)]
        pub channel_id: u64,

        #[arg(long, default_value_t = DEFAULT_RESULTS, help = "Number of feed entries to fetch")]
        pub results: u32,

        #[arg(long, help = "First day to include (YYYY-MM-DD), default a week ago")]
        pub start_date: Option<NaiveDate>,

        #[arg(long, help = "Last day to include (YYYY-MM-DD), default today")]
        pub end_date: Option<NaiveDate>,

        #[arg(long, value_delimiter = ',', default_values_t = Field::POLLUTANTS.to_vec())]
        pub fields: Vec<Field>,

        #[arg(long)]
        pub city: Option<String>,

        #[arg(long)]
        pub state: Option<String>,

        #[arg(long)]
        pub country: Option<String>,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, help = "Print the report without writing CSV/JSON files")]
        pub no_files: bool,

        #[arg(long, help = "Treat missing and out-of-range values as 0 like the legacy dashboard")]
        pub legacy_zero_fill: bool,

        #[arg(long, default_value_t = 30)]
        pub timeout_seconds: u64,

        #[arg(long, default_value_t = 2)]
        pub retry_attempts: u32,

        #[arg(long, default_value_t = 1)]
        pub retry_delay_seconds: u64,

        #[arg(short, long, help = "Load settings from a TOML file instead of flags")]
        pub config: Option<String>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl Default for CliConfig {
        fn default() -> Self {
            Self {
                api_base: DEFAULT_API_BASE.to_string(),
                channel_id: DEFAULT_CHANNEL_ID,
                results: DEFAULT_RESULTS,
                start_date: None,
                end_date: None,
                fields: Field::POLLUTANTS.to_vec(),
                city: None,
                state: None,
                country: None,
                output_path: "./output".to_string(),
                no_files: false,
                legacy_zero_fill: false,
                timeout_seconds: 30,
                retry_attempts: 2,
                retry_delay_seconds: 1,
                config: None,
                verbose: false,
                json_logs: false,
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_url("api_base", &self.api_base)?;
            self.api_endpoint()?;
            validation::validate_range("results", self.results, 1, MAX_RESULTS)?;
            validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
            if !self.no_files {
                validation::validate_path("output_path", &self.output_path)?;
            }
            let range = self.date_range();
            validation::validate_date_range("start_date", range.start, range.end)?;
            Ok(())
        }
    }

    impl ConfigProvider for CliConfig {
        fn api_endpoint(&self) -> Result<String> {
            feed_endpoint(&self.api_base, self.channel_id, self.results)
        }

        fn channel_id(&self) -> u64 {
            self.channel_id
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn write_files(&self) -> bool {
            !self.no_files
        }

        fn date_range(&self) -> DateRange {
            let default = DateRange::last_week(Utc::now().date_naive());
            DateRange::new(
                self.start_date.unwrap_or(default.start),
                self.end_date.unwrap_or(default.end),
            )
        }

        fn fields(&self) -> Result<Vec<Field>> {
            Ok(self.fields.clone())
        }

        fn location(&self) -> Location {
            Location {
                city: self.city.clone(),
                state: self.state.clone(),
                country: self.country.clone(),
            }
        }

        fn missing_value_policy(&self) -> MissingValuePolicy {
            missing_value_policy(self.legacy_zero_fill)
        }

        fn fallback_policy(&self) -> FallbackPolicy {
            fallback_policy(self.legacy_zero_fill)
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(self.timeout_seconds)
        }

        fn retry_attempts(&self) -> u32 {
            self.retry_attempts
        }

        fn retry_delay(&self) -> Duration {
            Duration::from_secs(self.retry_delay_seconds)
        }
    }

}
