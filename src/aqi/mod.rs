// AQI engine: pure functions over breakpoint tables. No I/O happens here.

pub mod aggregator;
pub mod breakpoints;
pub mod category;
pub mod error;
pub mod pollutant;
pub mod sub_index;

pub use aggregator::{aggregate, AqiAggregator, AqiResult, FallbackPolicy};
pub use breakpoints::{Breakpoint, BreakpointTable};
pub use category::{advisory_for, category_for, HealthCategory};
pub use error::AqiError;
pub use pollutant::{PollutantReading, PollutantType};
pub use sub_index::{compute, compute_for, SubIndex};
