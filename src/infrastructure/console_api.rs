// Console REST driver - ManagementConsole over the management API
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::application::console::{
    ConsoleView, ImportRequest, ManagementConsole, TaskRef, TaskState,
};
use crate::domain::cluster::{ClusterCandidate, ClusterSummary, HostEntry};

pub struct ApiConsole {
    base: String,
    username: String,
    password: String,
    client: reqwest::Client,
    token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiCluster {
    cluster_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sds_name: Option<String>,
    #[serde(default)]
    is_managed: bool,
    #[serde(default)]
    nodes: Vec<ApiNode>,
}

impl ApiCluster {
    fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.cluster_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiNode {
    hostname: String,
    #[serde(default)]
    release: Option<String>,
}

impl From<ApiNode> for HostEntry {
    fn from(node: ApiNode) -> Self {
        Self {
            hostname: node.hostname,
            release: node.release,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    status: String,
}

fn parse_job_status(status: &str) -> Result<TaskState> {
    match status {
        "new" => Ok(TaskState::New),
        "processing" => Ok(TaskState::InProgress),
        "finished" => Ok(TaskState::Finished),
        "failed" => Ok(TaskState::Failed),
        other => bail!("console reported unknown job status {other:?}"),
    }
}

impl ApiConsole {
    pub fn new(base: String, username: String, password: String) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            username,
            password,
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    fn bearer(&self) -> Result<String> {
        let token = self.token.lock().unwrap().clone();
        match token {
            Some(token) => Ok(format!("Bearer {token}")),
            None => bail!("not logged in to the console"),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer()?)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("failed to send request to {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("console request {url} failed with status {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to parse console response from {url}"))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer()?)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("failed to send request to {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("console request {url} failed with status {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to parse console response from {url}"))
    }

    async fn all_clusters(&self) -> Result<Vec<ApiCluster>> {
        self.get_json("/clusters").await
    }

    async fn cluster_detail(&self, id: &str) -> Result<ApiCluster> {
        self.get_json(&format!("/clusters/{id}")).await
    }
}

#[async_trait]
impl ManagementConsole for ApiConsole {
    async fn login(&self) -> Result<()> {
        let url = format!("{}/login", self.base);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "username": self.username, "password": self.password }))
            .send()
            .await
            .context("failed to send login request")?;

        if !response.status().is_success() {
            let status = response.status();
            bail!("console login failed with status {status}");
        }

        let login = response
            .json::<LoginResponse>()
            .await
            .context("failed to parse login response")?;
        *self.token.lock().unwrap() = Some(login.access_token);
        tracing::info!(username = %self.username, "logged in to the console");
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let url = format!("{}/logout", self.base);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.bearer()?)
            .send()
            .await
            .context("failed to send logout request")?;

        if !response.status().is_success() {
            let status = response.status();
            bail!("console logout failed with status {status}");
        }

        *self.token.lock().unwrap() = None;
        tracing::info!("logged out of the console");
        Ok(())
    }

    async fn current_view(&self) -> Result<ConsoleView> {
        // the web console routes to the landing page exactly when it
        // manages no cluster
        let clusters = self.all_clusters().await?;
        if clusters.iter().any(|cluster| cluster.is_managed) {
            Ok(ConsoleView::ClusterList)
        } else {
            Ok(ConsoleView::EmptyLanding)
        }
    }

    async fn importable_clusters(&self) -> Result<Vec<ClusterCandidate>> {
        let clusters = self.all_clusters().await?;
        Ok(clusters
            .into_iter()
            .filter(|cluster| !cluster.is_managed)
            .map(|cluster| ClusterCandidate::new(cluster.cluster_id))
            .collect())
    }

    async fn activate_candidate(&self, id: &str) -> Result<String> {
        let detail = self.cluster_detail(id).await?;
        Ok(detail.sds_name.unwrap_or_default())
    }

    async fn submit_import(&self, id: &str) -> Result<ImportRequest> {
        let detail = self.cluster_detail(id).await?;
        let cluster_ident = detail.display_name();
        let hosts = detail.nodes.into_iter().map(HostEntry::from).collect();

        let job: ImportJobResponse = self.post_json(&format!("/clusters/{id}/import")).await?;
        Ok(ImportRequest {
            cluster_ident,
            hosts,
            task: TaskRef { id: job.job_id },
        })
    }

    async fn task_status(&self, task: &TaskRef) -> Result<TaskState> {
        let job: JobResponse = self.get_json(&format!("/jobs/{}", task.id)).await?;
        parse_job_status(&job.status)
    }

    async fn clusters(&self) -> Result<Vec<ClusterSummary>> {
        let clusters = self.all_clusters().await?;
        Ok(clusters
            .into_iter()
            .filter(|cluster| cluster.is_managed)
            .map(|cluster| ClusterSummary {
                name: cluster.display_name(),
            })
            .collect())
    }

    async fn cluster_hosts(&self, name: &str) -> Result<Vec<HostEntry>> {
        let nodes: Vec<ApiNode> = self.get_json(&format!("/clusters/{name}/hosts")).await?;
        Ok(nodes.into_iter().map(HostEntry::from).collect())
    }
}
