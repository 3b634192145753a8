use crate::aqi::pollutant::PollutantType;
use thiserror::Error;

/// Failures raised by the AQI engine. All of them are local and deterministic,
/// so retrying a failed call never changes the outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AqiError {
    #[error("Unknown pollutant: {0}")]
    UnknownPollutant(String),

    #[error("No pollutant data supplied")]
    NoPollutantData,

    #[error("All pollutant concentrations are outside the breakpoint tables: {}", format_pollutants(.pollutants))]
    AllOutOfRange { pollutants: Vec<PollutantType> },

    #[error("Invalid AQI value: {0}")]
    InvalidAqi(f64),

    #[error("Invalid breakpoints for {pollutant}: {reason}")]
    InvalidBreakpoints {
        pollutant: PollutantType,
        reason: String,
    },
}

fn format_pollutants(pollutants: &[PollutantType]) -> String {
    pollutants
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AqiError>;
