//! Breakpoint bands mapping pollutant concentrations onto index ranges.

use crate::aqi::error::{AqiError, Result};
use crate::aqi::pollutant::PollutantType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One concentration range and the index range it maps onto linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub concentration_low: f64,
    pub concentration_high: f64,
    pub index_low: f64,
    pub index_high: f64,
}

impl Breakpoint {
    pub const fn new(
        concentration_low: f64,
        concentration_high: f64,
        index_low: f64,
        index_high: f64,
    ) -> Self {
        Self {
            concentration_low,
            concentration_high,
            index_low,
            index_high,
        }
    }

    pub fn contains(&self, concentration: f64) -> bool {
        self.concentration_low <= concentration && concentration <= self.concentration_high
    }
}

const fn bp(c_low: f64, c_high: f64, i_low: f64, i_high: f64) -> Breakpoint {
    Breakpoint::new(c_low, c_high, i_low, i_high)
}

/// PM2.5, µg/m³, 24h average.
pub const PM25_BANDS: [Breakpoint; 7] = [
    bp(0.0, 12.0, 0.0, 50.0),
    bp(12.1, 35.4, 51.0, 100.0),
    bp(35.5, 55.4, 101.0, 150.0),
    bp(55.5, 150.4, 151.0, 200.0),
    bp(150.5, 250.4, 201.0, 300.0),
    bp(250.5, 350.4, 301.0, 400.0),
    bp(350.5, 500.4, 401.0, 500.0),
];

/// PM10, µg/m³, 24h average.
pub const PM10_BANDS: [Breakpoint; 7] = [
    bp(0.0, 54.0, 0.0, 50.0),
    bp(55.0, 154.0, 51.0, 100.0),
    bp(155.0, 254.0, 101.0, 150.0),
    bp(255.0, 354.0, 151.0, 200.0),
    bp(355.0, 424.0, 201.0, 300.0),
    bp(425.0, 504.0, 301.0, 400.0),
    bp(505.0, 604.0, 401.0, 500.0),
];

/// Ozone, ppm, 8h average.
pub const OZONE_BANDS: [Breakpoint; 5] = [
    bp(0.0, 0.054, 0.0, 50.0),
    bp(0.055, 0.070, 51.0, 100.0),
    bp(0.071, 0.085, 101.0, 150.0),
    bp(0.086, 0.105, 151.0, 200.0),
    bp(0.106, 0.200, 201.0, 300.0),
];

/// CO, ppm, 8h average.
pub const CO_BANDS: [Breakpoint; 5] = [
    bp(0.0, 4.4, 0.0, 50.0),
    bp(4.5, 9.4, 51.0, 100.0),
    bp(9.5, 12.4, 101.0, 150.0),
    bp(12.5, 15.4, 151.0, 200.0),
    bp(15.5, 30.4, 201.0, 300.0),
];

/// Per-pollutant breakpoint bands, each list ascending and non-overlapping.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    bands: BTreeMap<PollutantType, Vec<Breakpoint>>,
}

impl BreakpointTable {
    /// The EPA-style table used for every computation unless a caller builds
    /// its own.
    pub fn standard() -> Self {
        let mut bands = BTreeMap::new();
        bands.insert(PollutantType::Pm25, PM25_BANDS.to_vec());
        bands.insert(PollutantType::Pm10, PM10_BANDS.to_vec());
        bands.insert(PollutantType::Ozone, OZONE_BANDS.to_vec());
        bands.insert(PollutantType::Co, CO_BANDS.to_vec());
        Self { bands }
    }

    pub fn empty() -> Self {
        Self {
            bands: BTreeMap::new(),
        }
    }

    /// Installs (or replaces) the bands for one pollutant after checking the
    /// table invariants.
    pub fn with_bands(mut self, pollutant: PollutantType, bands: Vec<Breakpoint>) -> Result<Self> {
        validate_bands(pollutant, &bands)?;
        self.bands.insert(pollutant, bands);
        Ok(self)
    }

    pub fn bands_for(&self, pollutant: PollutantType) -> Result<&[Breakpoint]> {
        self.bands
            .get(&pollutant)
            .map(Vec::as_slice)
            .ok_or_else(|| AqiError::UnknownPollutant(pollutant.label().to_string()))
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn validate_bands(pollutant: PollutantType, bands: &[Breakpoint]) -> Result<()> {
    let invalid = |reason: String| AqiError::InvalidBreakpoints { pollutant, reason };

    if bands.is_empty() {
        return Err(invalid("table has no bands".to_string()));
    }

    for (i, band) in bands.iter().enumerate() {
        let values = [
            band.concentration_low,
            band.concentration_high,
            band.index_low,
            band.index_high,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid(format!("band {} has negative or non-finite bounds", i)));
        }
        if band.concentration_low >= band.concentration_high {
            return Err(invalid(format!(
                "band {} concentration range {}..{} is empty",
                i, band.concentration_low, band.concentration_high
            )));
        }
        if band.index_low >= band.index_high {
            return Err(invalid(format!(
                "band {} index range {}..{} is empty",
                i, band.index_low, band.index_high
            )));
        }
    }

    for (i, pair) in bands.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.concentration_low <= prev.concentration_high || next.index_low <= prev.index_high {
            return Err(invalid(format!(
                "band {} overlaps or precedes band {}",
                i + 1,
                i
            )));
        }
    }

    Ok(())
}
