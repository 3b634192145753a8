use crate::aqi::error::{AqiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health category bands, inclusive on their upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthCategory {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl HealthCategory {
    pub fn label(&self) -> &'static str {
        match self {
            HealthCategory::Good => "Good",
            HealthCategory::Moderate => "Moderate",
            HealthCategory::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            HealthCategory::Unhealthy => "Unhealthy",
            HealthCategory::VeryUnhealthy => "Very Unhealthy",
            HealthCategory::Hazardous => "Hazardous",
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            HealthCategory::Good => {
                "Air quality is considered satisfactory, and air pollution poses little or no risk."
            }
            HealthCategory::Moderate => {
                "Air quality is acceptable; however, some pollutants may be a concern for sensitive groups."
            }
            HealthCategory::UnhealthySensitive => {
                "Members of sensitive groups may experience health effects; the general public is less likely to be affected."
            }
            HealthCategory::Unhealthy => "Health alert: everyone may experience health effects.",
            HealthCategory::VeryUnhealthy => {
                "Health warning of emergency conditions: everyone may experience more serious health effects."
            }
            HealthCategory::Hazardous => {
                "Hazardous: health alert, everyone may experience serious effects."
            }
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn category_for(aqi: f64) -> Result<HealthCategory> {
    if aqi.is_nan() || aqi < 0.0 {
        return Err(AqiError::InvalidAqi(aqi));
    }

    let category = if aqi <= 50.0 {
        HealthCategory::Good
    } else if aqi <= 100.0 {
        HealthCategory::Moderate
    } else if aqi <= 150.0 {
        HealthCategory::UnhealthySensitive
    } else if aqi <= 200.0 {
        HealthCategory::Unhealthy
    } else if aqi <= 300.0 {
        HealthCategory::VeryUnhealthy
    } else {
        HealthCategory::Hazardous
    };

    Ok(category)
}

/// Category together with its advisory text.
pub fn advisory_for(aqi: f64) -> Result<(HealthCategory, &'static str)> {
    let category = category_for(aqi)?;
    Ok((category, category.advisory()))
}
