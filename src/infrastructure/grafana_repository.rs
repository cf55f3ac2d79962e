// Grafana repository - dashboard layout documents over HTTP
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::{DashboardDocument, DashboardPanel, DashboardRow, MetricTarget};

pub struct GrafanaRepository {
    base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    dashboard: DashboardBody,
}

#[derive(Debug, Deserialize)]
struct DashboardBody {
    #[serde(default)]
    rows: Vec<RowBody>,
}

#[derive(Debug, Deserialize)]
struct RowBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    panels: Vec<PanelBody>,
}

#[derive(Debug, Deserialize)]
struct PanelBody {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    targets: Vec<TargetBody>,
}

#[derive(Debug, Deserialize)]
struct TargetBody {
    #[serde(default, rename = "refId")]
    ref_id: Option<String>,
    #[serde(default)]
    target: String,
}

impl From<DashboardResponse> for DashboardDocument {
    fn from(response: DashboardResponse) -> Self {
        Self {
            rows: response
                .dashboard
                .rows
                .into_iter()
                .map(|row| DashboardRow {
                    title: row.title,
                    panels: row
                        .panels
                        .into_iter()
                        .map(|panel| DashboardPanel {
                            title: panel.title,
                            display_name: panel.display_name,
                            targets: panel
                                .targets
                                .into_iter()
                                .map(|target| MetricTarget {
                                    ref_id: target.ref_id,
                                    target: target.target,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl GrafanaRepository {
    pub fn new(base: String) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DashboardRepository for GrafanaRepository {
    async fn get_dashboard(&self, slug: &str) -> Result<DashboardDocument> {
        let url = format!("{}/dashboards/db/{slug}", self.base);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("failed to fetch dashboard {slug}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("dashboard request {url} failed with status {status}: {body}");
        }

        let data = response
            .json::<DashboardResponse>()
            .await
            .with_context(|| format!("failed to parse dashboard {slug}"))?;
        Ok(data.into())
    }
}
