//! Presentation of a finished report: plain-text tables for the terminal,
//! CSV for the raw readings and a JSON summary.

use crate::aqi::AqiResult;
use crate::domain::model::{AirQualityReport, DateRange, Field, Location, SensorReading};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub channel_id: u64,
    pub date_range: DateRange,
    #[serde(skip_serializing_if = "location_is_empty")]
    pub location: &'a Location,
    pub reading_count: usize,
    pub averages: BTreeMap<Field, f64>,
    pub aqi: &'a AqiResult,
    pub advisory: &'static str,
}

fn location_is_empty(location: &&Location) -> bool {
    location.is_empty()
}

impl<'a> From<&'a AirQualityReport> for ReportSummary<'a> {
    fn from(report: &'a AirQualityReport) -> Self {
        Self {
            channel_id: report.channel_id,
            date_range: report.date_range,
            location: &report.location,
            reading_count: report.readings.len(),
            averages: report.averages.values.clone(),
            aqi: &report.aqi,
            advisory: report.aqi.advisory(),
        }
    }
}

pub fn readings_csv(readings: &[SensorReading]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Timestamp"];
    header.extend(Field::ALL.iter().map(Field::label));
    writer.write_record(&header)?;

    for reading in readings {
        let mut record = vec![reading.timestamp.format(TIMESTAMP_FORMAT).to_string()];
        record.extend(
            Field::ALL
                .iter()
                .map(|&field| reading.get(field).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("failed to flush CSV output: {}", e),
    })
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Renders the terminal report. Raw readings show every field; the averages
/// table shows only the selected fields that had data.
pub fn render_text(report: &AirQualityReport) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &AirQualityReport) -> std::fmt::Result {
    writeln!(out, "Air Quality Monitoring: channel {}", report.channel_id)?;
    if !report.location.is_empty() {
        writeln!(out, "Location: {}", report.location)?;
    }
    writeln!(
        out,
        "Date range: {} to {} ({} readings)",
        report.date_range.start,
        report.date_range.end,
        report.readings.len()
    )?;

    writeln!(out)?;
    writeln!(out, "Raw Pollutant Data")?;
    write!(out, "{:<22}", "Timestamp")?;
    for field in Field::ALL {
        write!(out, "{:>13}", field.label())?;
    }
    writeln!(out)?;
    for reading in &report.readings {
        write!(
            out,
            "{:<22}",
            reading.timestamp.format(TIMESTAMP_FORMAT).to_string()
        )?;
        for field in Field::ALL {
            write!(out, "{:>13}", cell(reading.get(field)))?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    let aqi = &report.aqi;
    writeln!(out, "Calculated AQI: {:.2}", aqi.value)?;
    writeln!(
        out,
        "Category: {} (dominant pollutant: {})",
        aqi.category, aqi.dominant_pollutant
    )?;
    for pollutant in &aqi.out_of_range {
        writeln!(
            out,
            "Warning: {} average is outside the breakpoint table and was not scored",
            pollutant
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Average Pollutant Levels")?;
    writeln!(out, "{:<14}{:>14}", "Pollutant", "Average Value")?;
    for field in &report.fields {
        if let Some(value) = report.averages.get(*field) {
            writeln!(out, "{:<14}{:>14.2}", field.label(), value)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Health Recommendations")?;
    writeln!(out, "- {}", aqi.advisory())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::aggregate;
    use crate::domain::model::FieldAverages;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample_report() -> AirQualityReport {
        let readings = vec![SensorReading {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            pm25: Some(40.0),
            pm10: None,
            ozone: Some(0.05),
            co: Some(2.0),
            humidity: Some(61.0),
            temperature: Some(29.5),
        }];
        let averages = FieldAverages::from_readings(&readings);
        let aqi = aggregate(&averages.pollutant_concentrations()).unwrap();
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        AirQualityReport {
            channel_id: 1596152,
            date_range: DateRange::new(d("2024-04-24"), d("2024-05-01")),
            location: Location {
                city: Some("Pune".to_string()),
                state: Some("Maharashtra".to_string()),
                country: Some("India".to_string()),
            },
            fields: vec![Field::Pm25, Field::Pm10, Field::Humidity],
            readings,
            averages,
            aqi,
        }
    }

    #[test]
    fn test_render_text_sections() {
        let text = render_text(&sample_report());

        assert!(text.contains("Location: Pune, Maharashtra, India"));
        assert!(text.contains("Calculated AQI: 112.08"));
        assert!(text.contains("dominant pollutant: PM2.5"));
        assert!(text.contains("Members of sensitive groups may experience health effects"));
    }

    #[test]
    fn test_averages_table_honours_field_selection() {
        let text = render_text(&sample_report());
        let averages = text
            .split("Average Pollutant Levels")
            .nth(1)
            .unwrap()
            .split("Health Recommendations")
            .next()
            .unwrap();

        assert!(averages.contains("PM2.5"));
        assert!(averages.contains("Humidity"));
        // Selected but no data.
        assert!(!averages.contains("PM10"));
        // Has data but not selected.
        assert!(!averages.contains("Ozone"));
    }

    #[test]
    fn test_readings_csv_leaves_missing_cells_empty() {
        let csv = String::from_utf8(readings_csv(&sample_report().readings).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2024-05-01T10:00:00Z,40,,0.05,2,61,29.5");
    }

    #[test]
    fn test_summary_serializes_aqi() {
        let report = sample_report();
        let json = serde_json::to_value(ReportSummary::from(&report)).unwrap();

        assert_eq!(json["reading_count"], 1);
        assert_eq!(json["aqi"]["category"], "UnhealthySensitive");
        assert_eq!(json["averages"]["PM2.5"], 40.0);
        assert_eq!(json["location"]["city"], "Pune");
        assert_eq!(json["date_range"]["start"], "2024-04-24");
    }
}
