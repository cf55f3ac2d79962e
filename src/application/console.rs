// Console seam - operations the management console exposes to the flows
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::cluster::{ClusterCandidate, ClusterSummary, HostEntry};

/// Which top-level view the console routes to after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleView {
    /// The welcome page shown while no cluster is imported.
    EmptyLanding,
    /// The populated cluster list.
    ClusterList,
}

/// Handle of an asynchronous backend task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    New,
    InProgress,
    Finished,
    Failed,
}

/// What the import wizard reported at submit time: the identifier the
/// cluster will be listed under, the hosts it will bring along and the
/// backend task carrying out the import.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub cluster_ident: String,
    pub hosts: Vec<HostEntry>,
    pub task: TaskRef,
}

#[async_trait]
pub trait ManagementConsole: Send + Sync {
    /// Authenticate a fresh session.
    async fn login(&self) -> Result<()>;

    /// End the current session.
    async fn logout(&self) -> Result<()>;

    /// The view the console currently routes to.
    async fn current_view(&self) -> Result<ConsoleView>;

    /// Clusters the console offers for import, in wizard order.
    async fn importable_clusters(&self) -> Result<Vec<ClusterCandidate>>;

    /// Select a candidate in the import wizard and return the storage
    /// service string the selection reveals.
    async fn activate_candidate(&self, id: &str) -> Result<String>;

    /// Submit the asynchronous import for an activated candidate.
    async fn submit_import(&self, id: &str) -> Result<ImportRequest>;

    async fn task_status(&self, task: &TaskRef) -> Result<TaskState>;

    /// Imported clusters as the console lists them.
    async fn clusters(&self) -> Result<Vec<ClusterSummary>>;

    /// Hosts the console reports for an imported cluster.
    async fn cluster_hosts(&self, name: &str) -> Result<Vec<HostEntry>>;
}
