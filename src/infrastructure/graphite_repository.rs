// Graphite repository - rendered metric time series over HTTP
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::application::metrics_repository::MetricsRepository;
use crate::domain::dashboard::Datapoint;

pub struct GraphiteRepository {
    base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RenderSeries {
    #[allow(dead_code)]
    target: String,
    datapoints: Vec<(Option<f64>, i64)>,
}

impl GraphiteRepository {
    pub fn new(base: String) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn render_url(&self, target: &str) -> String {
        format!(
            "{}/render?target={}&format=json",
            self.base,
            urlencoding::encode(target)
        )
    }
}

#[async_trait]
impl MetricsRepository for GraphiteRepository {
    async fn get_datapoints(&self, target: &str) -> Result<Vec<Datapoint>> {
        let url = self.render_url(target);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("failed to render target {target}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("render request {url} failed with status {status}: {body}");
        }

        let series = response
            .json::<Vec<RenderSeries>>()
            .await
            .with_context(|| format!("failed to parse rendered target {target}"))?;

        let Some(first) = series.into_iter().next() else {
            bail!("no series returned for target {target}");
        };
        Ok(first
            .datapoints
            .into_iter()
            .map(|(value, timestamp)| Datapoint { value, timestamp })
            .collect())
    }
}
