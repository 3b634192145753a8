use crate::core::Pipeline;
use crate::domain::model::AirQualityReport;
use crate::utils::error::Result;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub report: AirQualityReport,
    /// Directory the report files were written to, if file output is enabled.
    pub output_path: Option<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("Starting air quality ETL process");

        tracing::info!("Extracting channel feed...");
        let entries = self.pipeline.extract().await?;
        tracing::info!("Extracted {} feed entries", entries.len());

        tracing::info!("Computing air quality index...");
        let report = self.pipeline.transform(entries).await?;
        tracing::info!(
            "AQI {:.2} ({}), dominant pollutant {}",
            report.aqi.value,
            report.aqi.category,
            report.aqi.dominant_pollutant
        );

        let output_path = self.pipeline.load(&report).await?;
        if let Some(path) = &output_path {
            tracing::info!("Report files saved to: {}", path);
        }

        Ok(EtlOutcome {
            report,
            output_path,
        })
    }
}
