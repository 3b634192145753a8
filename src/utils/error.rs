use crate::aqi::AqiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("AQI computation failed: {0}")]
    Aqi(#[from] AqiError),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Io,
    Computation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatus { .. } => ErrorCategory::Network,
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::Aqi(_) => ErrorCategory::Computation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Network hiccups are worth retrying later.
            EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::HttpStatus { status, .. } if *status >= 500 || *status == 429 => {
                ErrorSeverity::Medium
            }
            EtlError::HttpStatus { .. } => ErrorSeverity::High,
            EtlError::Aqi(_) => ErrorSeverity::High,
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorSeverity::High
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check your network connection and that the channel API is reachable".to_string()
            }
            EtlError::HttpStatus { status: 404, .. } => {
                "Check the channel id; the channel may not exist or may not be public".to_string()
            }
            EtlError::HttpStatus { .. } => "Retry later or raise --timeout-seconds".to_string(),
            EtlError::Aqi(AqiError::NoPollutantData) => {
                "Widen the date range; no readings fell inside it".to_string()
            }
            EtlError::Aqi(AqiError::AllOutOfRange { .. }) => {
                "Inspect the sensor for faults, or pass --legacy-zero-fill to report 0".to_string()
            }
            EtlError::Aqi(_) => "Check the breakpoint tables and the input readings".to_string(),
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again".to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "The report could not be encoded; check the output path and disk space".to_string()
            }
            EtlError::ProcessingError { .. } => {
                "The channel feed had an unexpected shape; check the channel fields".to_string()
            }
            EtlError::IoError(_) => "Check permissions on the output directory".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Failed to fetch data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Could not process the channel data: {}", self),
            ErrorCategory::Io => format!("Could not write the report: {}", self),
            ErrorCategory::Computation => format!("Could not compute the AQI: {}", self),
        }
    }

    /// Process exit code for the CLI. Every error exits non-zero.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
