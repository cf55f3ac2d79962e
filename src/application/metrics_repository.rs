// Repository trait for rendered metric time series
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::dashboard::Datapoint;

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Render a resolved target and return its datapoints in time order.
    async fn get_datapoints(&self, target: &str) -> Result<Vec<Datapoint>>;
}
