//! Composite AQI from per-pollutant sub-indices.
//!
//! The overall index is the maximum sub-index. Out-of-range pollutants are
//! reported alongside the result instead of being folded in as zero.

use crate::aqi::breakpoints::BreakpointTable;
use crate::aqi::category::{category_for, HealthCategory};
use crate::aqi::error::{AqiError, Result};
use crate::aqi::pollutant::{PollutantReading, PollutantType};
use crate::aqi::sub_index::{compute_for, SubIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when no supplied pollutant has a defined sub-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Fail with `AllOutOfRange`.
    #[default]
    Strict,
    /// Report an AQI of 0, matching the legacy dashboard. Out-of-range
    /// pollutants are still listed on the result.
    LegacyZero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiResult {
    pub value: f64,
    pub dominant_pollutant: PollutantType,
    pub category: HealthCategory,
    /// Sub-index of every supplied pollutant, in priority order.
    pub sub_indices: Vec<SubIndex>,
    pub out_of_range: Vec<PollutantType>,
}

impl AqiResult {
    pub fn advisory(&self) -> &'static str {
        self.category.advisory()
    }

    pub fn has_out_of_range(&self) -> bool {
        !self.out_of_range.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AqiAggregator {
    table: BreakpointTable,
    policy: FallbackPolicy,
}

impl AqiAggregator {
    pub fn new(table: BreakpointTable, policy: FallbackPolicy) -> Self {
        Self { table, policy }
    }

    pub fn with_policy(policy: FallbackPolicy) -> Self {
        Self::new(BreakpointTable::standard(), policy)
    }

    pub fn aggregate(&self, concentrations: &BTreeMap<PollutantType, f64>) -> Result<AqiResult> {
        if concentrations.is_empty() {
            return Err(AqiError::NoPollutantData);
        }

        // BTreeMap iterates in priority order, so the first maximum seen wins ties.
        let sub_indices = concentrations
            .iter()
            .map(|(&pollutant, &concentration)| {
                compute_for(&PollutantReading::new(pollutant, concentration), &self.table)
            })
            .collect::<Result<Vec<_>>>()?;

        let out_of_range: Vec<PollutantType> = sub_indices
            .iter()
            .filter(|s| s.is_out_of_range())
            .map(|s| s.pollutant)
            .collect();

        for pollutant in &out_of_range {
            tracing::warn!(
                "{} concentration {} is outside the breakpoint table",
                pollutant,
                concentrations[pollutant]
            );
        }

        let mut dominant: Option<(PollutantType, f64)> = None;
        for sub_index in &sub_indices {
            if let Some(value) = sub_index.value {
                match dominant {
                    Some((_, best)) if value <= best => {}
                    _ => dominant = Some((sub_index.pollutant, value)),
                }
            }
        }

        let (dominant_pollutant, value) = match (dominant, self.policy) {
            (Some(found), _) => found,
            (None, FallbackPolicy::LegacyZero) => (sub_indices[0].pollutant, 0.0),
            (None, FallbackPolicy::Strict) => {
                return Err(AqiError::AllOutOfRange {
                    pollutants: out_of_range,
                })
            }
        };

        tracing::debug!("AQI {:.2} dominated by {}", value, dominant_pollutant);

        Ok(AqiResult {
            value,
            dominant_pollutant,
            category: category_for(value)?,
            sub_indices,
            out_of_range,
        })
    }

    /// Aggregates a list of readings. A pollutant listed twice keeps its last
    /// concentration.
    pub fn aggregate_readings(&self, readings: &[PollutantReading]) -> Result<AqiResult> {
        let concentrations: BTreeMap<PollutantType, f64> = readings
            .iter()
            .map(|r| (r.pollutant, r.concentration))
            .collect();
        self.aggregate(&concentrations)
    }
}

/// Aggregates against the standard table with the strict policy.
pub fn aggregate(concentrations: &BTreeMap<PollutantType, f64>) -> Result<AqiResult> {
    AqiAggregator::default().aggregate(concentrations)
}
