use crate::aqi::{AqiResult, PollutantType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Response body of `GET /channels/{id}/feeds.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFeed {
    #[serde(default)]
    pub channel: Option<serde_json::Value>,
    pub feeds: Vec<FeedEntry>,
}

/// One feed entry as sent by the channel. Every field arrives as an optional
/// string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub created_at: String,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Option<String>,
    #[serde(default)]
    pub field2: Option<String>,
    #[serde(default)]
    pub field3: Option<String>,
    #[serde(default)]
    pub field4: Option<String>,
    #[serde(default)]
    pub field5: Option<String>,
    #[serde(default)]
    pub field6: Option<String>,
}

/// Channel measurements. PM2.5, PM10, Ozone and CO feed the AQI; humidity
/// and temperature are display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    Ozone,
    #[serde(rename = "CO")]
    Co,
    Humidity,
    Temperature,
}

impl Field {
    /// Table column order, matching the raw data CSV.
    pub const ALL: [Field; 6] = [
        Field::Pm25,
        Field::Pm10,
        Field::Ozone,
        Field::Co,
        Field::Humidity,
        Field::Temperature,
    ];

    pub const POLLUTANTS: [Field; 4] = [Field::Pm25, Field::Pm10, Field::Ozone, Field::Co];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Pm25 => "PM2.5",
            Field::Pm10 => "PM10",
            Field::Ozone => "Ozone",
            Field::Co => "CO",
            Field::Humidity => "Humidity",
            Field::Temperature => "Temperature",
        }
    }

    pub fn pollutant(&self) -> Option<PollutantType> {
        match self {
            Field::Pm25 => Some(PollutantType::Pm25),
            Field::Pm10 => Some(PollutantType::Pm10),
            Field::Ozone => Some(PollutantType::Ozone),
            Field::Co => Some(PollutantType::Co),
            Field::Humidity | Field::Temperature => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm2.5" | "pm25" | "pm2_5" => Ok(Field::Pm25),
            "pm10" => Ok(Field::Pm10),
            "ozone" | "o3" => Ok(Field::Ozone),
            "co" => Ok(Field::Co),
            "humidity" => Ok(Field::Humidity),
            "temperature" | "temp" => Ok(Field::Temperature),
            other => Err(format!(
                "unknown field '{}'; expected one of PM2.5, PM10, Ozone, CO, Humidity, Temperature",
                other
            )),
        }
    }
}

/// How empty or unparseable feed values are carried into averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Leave them out of averages.
    #[default]
    Keep,
    /// Count them as 0, like the legacy dashboard.
    ZeroFill,
}

/// A typed feed entry. `None` marks a missing or unparseable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub ozone: Option<f64>,
    pub co: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
}

impl SensorReading {
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Pm25 => self.pm25,
            Field::Pm10 => self.pm10,
            Field::Ozone => self.ozone,
            Field::Co => self.co,
            Field::Humidity => self.humidity,
            Field::Temperature => self.temperature,
        }
    }

    pub fn zero_filled(mut self) -> Self {
        for slot in [
            &mut self.pm25,
            &mut self.pm10,
            &mut self.ozone,
            &mut self.co,
            &mut self.humidity,
            &mut self.temperature,
        ] {
            slot.get_or_insert(0.0);
        }
        self
    }
}

/// Mean of each field over the readings that carried it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldAverages {
    pub values: BTreeMap<Field, f64>,
}

impl FieldAverages {
    pub fn from_readings(readings: &[SensorReading]) -> Self {
        let values = Field::ALL
            .iter()
            .filter_map(|&field| {
                let present: Vec<f64> = readings.iter().filter_map(|r| r.get(field)).collect();
                if present.is_empty() {
                    None
                } else {
                    Some((field, present.iter().sum::<f64>() / present.len() as f64))
                }
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// Averages of the four AQI pollutants only.
    pub fn pollutant_concentrations(&self) -> BTreeMap<PollutantType, f64> {
        Field::POLLUTANTS
            .iter()
            .filter_map(|field| Some((field.pollutant()?, self.get(*field)?)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The week ending today, the dashboard's default window.
    pub fn last_week(today: NaiveDate) -> Self {
        Self {
            start: today - chrono::Duration::days(7),
            end: today,
        }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.country.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |p: &Option<String>| p.clone().unwrap_or_default();
        write!(
            f,
            "{}, {}, {}",
            part(&self.city),
            part(&self.state),
            part(&self.country)
        )
    }
}

/// Output of the transform step; everything the report needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReport {
    pub channel_id: u64,
    pub date_range: DateRange,
    pub location: Location,
    pub fields: Vec<Field>,
    pub readings: Vec<SensorReading>,
    pub averages: FieldAverages,
    pub aqi: AqiResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(pm25: Option<f64>, humidity: Option<f64>) -> SensorReading {
        SensorReading {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            pm25,
            pm10: None,
            ozone: None,
            co: None,
            humidity,
            temperature: None,
        }
    }

    #[test]
    fn test_averages_skip_missing_values() {
        let readings = vec![
            reading(Some(10.0), None),
            reading(None, Some(40.0)),
            reading(Some(20.0), Some(60.0)),
        ];

        let averages = FieldAverages::from_readings(&readings);

        assert_eq!(averages.get(Field::Pm25), Some(15.0));
        assert_eq!(averages.get(Field::Humidity), Some(50.0));
        assert_eq!(averages.get(Field::Co), None);
    }

    #[test]
    fn test_pollutant_concentrations_exclude_humidity_and_temperature() {
        let averages = FieldAverages::from_readings(&[reading(Some(8.0), Some(90.0))]);
        let concentrations = averages.pollutant_concentrations();

        assert_eq!(concentrations.len(), 1);
        assert_eq!(concentrations[&PollutantType::Pm25], 8.0);
    }

    #[test]
    fn test_zero_fill_replaces_only_missing() {
        let filled = reading(Some(3.0), None).zero_filled();
        assert_eq!(filled.pm25, Some(3.0));
        assert_eq!(filled.humidity, Some(0.0));
        assert_eq!(filled.co, Some(0.0));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let range = DateRange::new(d("2024-05-01"), d("2024-05-03"));

        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 59).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 4, 30, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("pm2.5".parse::<Field>().unwrap(), Field::Pm25);
        assert_eq!("Temperature".parse::<Field>().unwrap(), Field::Temperature);
        assert!("pressure".parse::<Field>().is_err());
    }

    #[test]
    fn test_location_display() {
        let location = Location {
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            country: None,
        };
        assert_eq!(location.to_string(), "Pune, Maharashtra, ");
    }
}
