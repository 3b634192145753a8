use crate::aqi::breakpoints::{Breakpoint, BreakpointTable};
use crate::aqi::error::Result;
use crate::aqi::pollutant::{PollutantReading, PollutantType};
use serde::{Deserialize, Serialize};

/// Index contribution of a single pollutant.
///
/// `value` is `None` when the concentration fell outside every band. That case
/// is kept apart from a genuine zero so callers can tell clean air from a
/// reading the table cannot describe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubIndex {
    pub pollutant: PollutantType,
    pub value: Option<f64>,
}

impl SubIndex {
    pub fn is_out_of_range(&self) -> bool {
        self.value.is_none()
    }

    /// Value with out-of-range substituted by 0, as the legacy dashboard did.
    pub fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }
}

/// Linear interpolation inside the first band containing `concentration`.
///
/// Returns `None` for negative or NaN input, values above the top band, and
/// values that fall in the gap between two bands.
pub fn compute(concentration: f64, bands: &[Breakpoint]) -> Option<f64> {
    bands.iter().find(|band| band.contains(concentration)).map(|band| {
        (band.index_high - band.index_low) / (band.concentration_high - band.concentration_low)
            * (concentration - band.concentration_low)
            + band.index_low
    })
}

pub fn compute_for(reading: &PollutantReading, table: &BreakpointTable) -> Result<SubIndex> {
    let bands = table.bands_for(reading.pollutant)?;
    Ok(SubIndex {
        pollutant: reading.pollutant,
        value: compute(reading.concentration, bands),
    })
}
