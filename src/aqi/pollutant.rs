use crate::aqi::error::AqiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pollutants that contribute to the composite index.
///
/// Declaration order is the tie-break priority used when two pollutants share
/// the maximum sub-index: PM2.5 beats PM10 beats Ozone beats CO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PollutantType {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "Ozone")]
    Ozone,
    #[serde(rename = "CO")]
    Co,
}

impl PollutantType {
    /// All pollutants in priority order.
    pub const ALL: [PollutantType; 4] = [
        PollutantType::Pm25,
        PollutantType::Pm10,
        PollutantType::Ozone,
        PollutantType::Co,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PollutantType::Pm25 => "PM2.5",
            PollutantType::Pm10 => "PM10",
            PollutantType::Ozone => "Ozone",
            PollutantType::Co => "CO",
        }
    }
}

impl fmt::Display for PollutantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PollutantType {
    type Err = AqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm2.5" | "pm25" | "pm2_5" => Ok(PollutantType::Pm25),
            "pm10" => Ok(PollutantType::Pm10),
            "ozone" | "o3" => Ok(PollutantType::Ozone),
            "co" => Ok(PollutantType::Co),
            _ => Err(AqiError::UnknownPollutant(s.to_string())),
        }
    }
}

/// A single concentration for one pollutant, either one observation or a
/// window average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pollutant: PollutantType,
    pub concentration: f64,
}

impl PollutantReading {
    pub fn new(pollutant: PollutantType, concentration: f64) -> Self {
        Self {
            pollutant,
            concentration,
        }
    }
}
