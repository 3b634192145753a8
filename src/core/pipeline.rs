use crate::aqi::AqiAggregator;
use crate::core::report::{readings_csv, ReportSummary};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    AirQualityReport, ChannelFeed, FeedEntry, FieldAverages, MissingValuePolicy, SensorReading,
};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;

pub const READINGS_FILE: &str = "readings.csv";
pub const SUMMARY_FILE: &str = "summary.json";

pub struct AirQualityPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> AirQualityPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    async fn request_feed(&self, endpoint: &str) -> Result<ChannelFeed> {
        let response = self
            .client
            .get(endpoint)
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        tracing::debug!("API response status: {}", response.status());

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::HttpStatus {
                status: status.as_u16(),
                url: endpoint.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| EtlError::ProcessingError {
            message: format!("unexpected feed format: {}", e),
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AirQualityPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<FeedEntry>> {
        let endpoint = self.config.api_endpoint()?;
        let attempts = self.config.retry_attempts() + 1;
        let mut attempt = 1;

        loop {
            tracing::debug!("Making API request to: {} ({}/{})", endpoint, attempt, attempts);
            match self.request_feed(&endpoint).await {
                Ok(feed) => {
                    tracing::debug!("Fetched {} feed entries", feed.feeds.len());
                    return Ok(feed.feeds);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!("Fetch attempt {} failed: {}; retrying", attempt, e);
                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn transform(&self, data: Vec<FeedEntry>) -> Result<AirQualityReport> {
        let fields = self.config.fields()?;
        let date_range = self.config.date_range();
        let policy = self.config.missing_value_policy();
        let total = data.len();

        let readings: Vec<SensorReading> = data
            .iter()
            .filter_map(parse_entry)
            .filter(|r| date_range.contains(&r.timestamp))
            .map(|r| match policy {
                MissingValuePolicy::Keep => r,
                MissingValuePolicy::ZeroFill => r.zero_filled(),
            })
            .collect();

        tracing::info!(
            "{} of {} entries fall within {} to {}",
            readings.len(),
            total,
            date_range.start,
            date_range.end
        );

        let averages = FieldAverages::from_readings(&readings);
        let aggregator = AqiAggregator::with_policy(self.config.fallback_policy());
        let aqi = aggregator.aggregate(&averages.pollutant_concentrations())?;

        Ok(AirQualityReport {
            channel_id: self.config.channel_id(),
            date_range,
            location: self.config.location(),
            fields,
            readings,
            averages,
            aqi,
        })
    }

    async fn load(&self, report: &AirQualityReport) -> Result<Option<String>> {
        if !self.config.write_files() {
            tracing::debug!("File output disabled, skipping load");
            return Ok(None);
        }

        let csv_data = readings_csv(&report.readings)?;
        self.storage.write_file(READINGS_FILE, &csv_data).await?;
        tracing::debug!("Wrote {}", self.storage.location(READINGS_FILE));

        let summary = serde_json::to_vec_pretty(&ReportSummary::from(report))?;
        self.storage.write_file(SUMMARY_FILE, &summary).await?;
        tracing::debug!("Wrote {}", self.storage.location(SUMMARY_FILE));

        Ok(Some(self.config.output_path().to_string()))
    }
}

/// Typed view of a feed entry. Entries with an unreadable timestamp are
/// dropped; unreadable measurements become `None`.
pub fn parse_entry(entry: &FeedEntry) -> Option<SensorReading> {
    let timestamp = match DateTime::parse_from_rfc3339(&entry.created_at) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(
                "Dropping entry {:?} with bad timestamp '{}': {}",
                entry.entry_id,
                entry.created_at,
                e
            );
            return None;
        }
    };

    Some(SensorReading {
        timestamp,
        pm25: parse_value(entry.field1.as_deref()),
        pm10: parse_value(entry.field2.as_deref()),
        ozone: parse_value(entry.field3.as_deref()),
        humidity: parse_value(entry.field4.as_deref()),
        temperature: parse_value(entry.field5.as_deref()),
        co: parse_value(entry.field6.as_deref()),
    })
}

fn parse_value(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::{AqiError, FallbackPolicy, PollutantType};
    use crate::domain::model::{DateRange, Field, Location};
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("memory://{}", path)
        }
    }

    struct MockConfig {
        api_endpoint: String,
        date_range: DateRange,
        legacy: bool,
        write_files: bool,
        retry_attempts: u32,
    }

    impl MockConfig {
        fn new(api_endpoint: String) -> Self {
            let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
            Self {
                api_endpoint,
                date_range: DateRange::new(d("2024-05-01"), d("2024-05-02")),
                legacy: false,
                write_files: true,
                retry_attempts: 0,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> Result<String> {
            Ok(self.api_endpoint.clone())
        }

        fn channel_id(&self) -> u64 {
            1596152
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn write_files(&self) -> bool {
            self.write_files
        }

        fn date_range(&self) -> DateRange {
            self.date_range
        }

        fn fields(&self) -> Result<Vec<Field>> {
            Ok(Field::POLLUTANTS.to_vec())
        }

        fn location(&self) -> Location {
            Location::default()
        }

        fn missing_value_policy(&self) -> MissingValuePolicy {
            if self.legacy {
                MissingValuePolicy::ZeroFill
            } else {
                MissingValuePolicy::Keep
            }
        }

        fn fallback_policy(&self) -> FallbackPolicy {
            if self.legacy {
                FallbackPolicy::LegacyZero
            } else {
                FallbackPolicy::Strict
            }
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(5)
        }

        fn retry_attempts(&self) -> u32 {
            self.retry_attempts
        }

        fn retry_delay(&self) -> Duration {
            Duration::from_millis(10)
        }
    }

    fn entry(created_at: &str, fields: [Option<&str>; 6]) -> FeedEntry {
        let own = |i: usize| fields[i].map(str::to_string);
        FeedEntry {
            created_at: created_at.to_string(),
            entry_id: None,
            field1: own(0),
            field2: own(1),
            field3: own(2),
            field4: own(3),
            field5: own(4),
            field6: own(5),
        }
    }

    #[test]
    fn test_parse_entry_maps_fields() {
        let parsed = parse_entry(&entry(
            "2024-05-01T10:00:00Z",
            [Some("12.5"), Some("40"), Some("0.03"), Some("55"), Some("28.1"), Some("1.2")],
        ))
        .unwrap();

        assert_eq!(parsed.pm25, Some(12.5));
        assert_eq!(parsed.pm10, Some(40.0));
        assert_eq!(parsed.ozone, Some(0.03));
        assert_eq!(parsed.humidity, Some(55.0));
        assert_eq!(parsed.temperature, Some(28.1));
        assert_eq!(parsed.co, Some(1.2));
    }

    #[test]
    fn test_parse_entry_treats_blank_and_garbage_as_missing() {
        let parsed = parse_entry(&entry(
            "2024-05-01T10:00:00Z",
            [Some(""), Some("n/a"), None, Some("NaN"), Some(" 21 "), None],
        ))
        .unwrap();

        assert_eq!(parsed.pm25, None);
        assert_eq!(parsed.pm10, None);
        assert_eq!(parsed.ozone, None);
        assert_eq!(parsed.humidity, None);
        assert_eq!(parsed.temperature, Some(21.0));
    }

    #[test]
    fn test_parse_entry_drops_bad_timestamp() {
        assert!(parse_entry(&entry("yesterday", [Some("1"); 6])).is_none());
    }

    #[tokio::test]
    async fn test_extract_returns_feeds() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/channels/1596152/feeds.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "channel": {"id": 1596152, "name": "AQI"},
                    "feeds": [
                        {"created_at": "2024-05-01T10:00:00Z", "entry_id": 1, "field1": "10"},
                        {"created_at": "2024-05-01T11:00:00Z", "entry_id": 2, "field1": null}
                    ]
                }));
        });

        let config = MockConfig::new(server.url("/channels/1596152/feeds.json"));
        let pipeline = AirQualityPipeline::new(MockStorage::new(), config);

        let feeds = pipeline.extract().await.unwrap();

        api_mock.assert();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].field1.as_deref(), Some("10"));
        assert_eq!(feeds[1].field1, None);
    }

    #[tokio::test]
    async fn test_extract_not_found_is_http_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let mut config = MockConfig::new(server.url("/missing"));
        config.retry_attempts = 3;
        let pipeline = AirQualityPipeline::new(MockStorage::new(), config);

        let err = pipeline.extract().await.unwrap_err();

        // 4xx is not retried.
        api_mock.assert_hits(1);
        assert!(matches!(err, EtlError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_extract_retries_server_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let mut config = MockConfig::new(server.url("/flaky"));
        config.retry_attempts = 2;
        let pipeline = AirQualityPipeline::new(MockStorage::new(), config);

        let err = pipeline.extract().await.unwrap_err();

        api_mock.assert_hits(3);
        assert!(matches!(err, EtlError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_extract_malformed_body_is_processing_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/garbled");
            then.status(200).body("<html>maintenance</html>");
        });

        let config = MockConfig::new(server.url("/garbled"));
        let pipeline = AirQualityPipeline::new(MockStorage::new(), config);

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
    }

    #[tokio::test]
    async fn test_transform_filters_averages_and_aggregates() {
        let data = vec![
            entry(
                "2024-05-01T10:00:00Z",
                [Some("30"), Some("50"), Some("0.04"), Some("60"), Some("25"), Some("1.0")],
            ),
            entry(
                "2024-05-02T10:00:00Z",
                [Some("50"), None, Some("0.06"), Some("70"), Some("27"), Some("3.0")],
            ),
            // Outside the date range.
            entry(
                "2024-05-03T00:00:00Z",
                [Some("400"), Some("500"), Some("0.15"), Some("10"), Some("40"), Some("20")],
            ),
        ];

        let pipeline =
            AirQualityPipeline::new(MockStorage::new(), MockConfig::new("http://unused".to_string()));
        let report = pipeline.transform(data).await.unwrap();

        assert_eq!(report.readings.len(), 2);
        assert_eq!(report.averages.get(Field::Pm25), Some(40.0));
        assert_eq!(report.averages.get(Field::Pm10), Some(50.0));
        assert_eq!(report.averages.get(Field::Humidity), Some(65.0));
        assert_eq!(report.aqi.dominant_pollutant, PollutantType::Pm25);
        assert!((report.aqi.value - 112.080_402).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_transform_with_no_readings_in_range() {
        let data = vec![entry("2023-01-01T00:00:00Z", [Some("10"); 6])];
        let pipeline =
            AirQualityPipeline::new(MockStorage::new(), MockConfig::new("http://unused".to_string()));

        let err = pipeline.transform(data).await.unwrap_err();
        assert!(matches!(err, EtlError::Aqi(AqiError::NoPollutantData)));
    }

    #[tokio::test]
    async fn test_transform_zero_fill_lowers_averages() {
        let data = vec![
            entry("2024-05-01T10:00:00Z", [Some("20"), None, None, None, None, None]),
            entry("2024-05-01T11:00:00Z", [None, None, None, None, None, None]),
        ];

        let strict =
            AirQualityPipeline::new(MockStorage::new(), MockConfig::new("http://unused".to_string()));
        let report = strict.transform(data.clone()).await.unwrap();
        assert_eq!(report.averages.get(Field::Pm25), Some(20.0));
        assert_eq!(report.aqi.sub_indices.len(), 1);

        let mut config = MockConfig::new("http://unused".to_string());
        config.legacy = true;
        let legacy = AirQualityPipeline::new(MockStorage::new(), config);
        let report = legacy.transform(data).await.unwrap();
        assert_eq!(report.averages.get(Field::Pm25), Some(10.0));
        assert_eq!(report.aqi.sub_indices.len(), 4);
    }

    #[tokio::test]
    async fn test_load_writes_csv_and_summary() {
        let data = vec![entry(
            "2024-05-01T10:00:00Z",
            [Some("8"), Some("20"), None, Some("45"), Some("22"), Some("0.5")],
        )];

        let storage = MockStorage::new();
        let pipeline =
            AirQualityPipeline::new(storage.clone(), MockConfig::new("http://unused".to_string()));
        let report = pipeline.transform(data).await.unwrap();

        let output = pipeline.load(&report).await.unwrap();
        assert_eq!(output.as_deref(), Some("test_output"));

        let csv = String::from_utf8(storage.get_file(READINGS_FILE).await.unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Timestamp,PM2.5,PM10,Ozone,CO,Humidity,Temperature")
        );
        assert_eq!(lines.next(), Some("2024-05-01T10:00:00Z,8,20,,0.5,45,22"));

        let summary: serde_json::Value =
            serde_json::from_slice(&storage.read_file(SUMMARY_FILE).await.unwrap()).unwrap();
        assert_eq!(summary["channel_id"], 1596152);
        assert_eq!(summary["aqi"]["dominant_pollutant"], "PM2.5");
        assert_eq!(summary["aqi"]["category"], "Good");
    }

    #[tokio::test]
    async fn test_load_skipped_when_disabled() {
        let data = vec![entry("2024-05-01T10:00:00Z", [Some("8"); 6])];
        let storage = MockStorage::new();
        let mut config = MockConfig::new("http://unused".to_string());
        config.write_files = false;
        let pipeline = AirQualityPipeline::new(storage.clone(), config);

        let report = pipeline.transform(data).await.unwrap();
        assert_eq!(pipeline.load(&report).await.unwrap(), None);
        assert!(storage.get_file(SUMMARY_FILE).await.is_none());
    }
}
