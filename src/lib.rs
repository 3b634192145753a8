pub mod aqi;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use aqi::{aggregate, category_for, AqiError, AqiResult, HealthCategory, PollutantType};
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::core::{
    etl::{EtlEngine, EtlOutcome},
    pipeline::AirQualityPipeline,
    report::render_text,
};
pub use utils::error::{EtlError, Result};
