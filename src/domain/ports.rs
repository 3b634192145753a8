use crate::domain::model::{AirQualityReport, DateRange, FeedEntry, Field, Location, MissingValuePolicy};
use crate::aqi::FallbackPolicy;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Where relative paths handed to this storage end up, for reporting.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> Result<String>;
    fn channel_id(&self) -> u64;
    fn output_path(&self) -> &str;
    fn write_files(&self) -> bool;
    fn date_range(&self) -> DateRange;
    fn fields(&self) -> Result<Vec<Field>>;
    fn location(&self) -> Location;
    fn missing_value_policy(&self) -> MissingValuePolicy;
    fn fallback_policy(&self) -> FallbackPolicy;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FeedEntry>>;
    async fn transform(&self, data: Vec<FeedEntry>) -> Result<AirQualityReport>;
    async fn load(&self, report: &AirQualityReport) -> Result<Option<String>>;
}
