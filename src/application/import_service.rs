// Import orchestration - candidate selection and the import state flow
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::application::console::{ConsoleView, ManagementConsole};
use crate::application::wait::{SettleStrategy, wait_for_task};
use crate::domain::check::CheckContext;
use crate::domain::cluster::{ClusterCandidate, ServiceKind, check_host_membership, find_cluster};

/// Progress of one import flow, from submission to verified listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    NoClusterImported,
    ImportInProgress,
    ImportedAwaitingVerification,
    Verified,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub cluster_ident: String,
    pub phase: ImportPhase,
}

pub struct ImportService {
    console: Arc<dyn ManagementConsole>,
    settle: Arc<dyn SettleStrategy>,
    timeout: Duration,
}

impl ImportService {
    pub fn new(
        console: Arc<dyn ManagementConsole>,
        settle: Arc<dyn SettleStrategy>,
        timeout: Duration,
    ) -> Self {
        Self {
            console,
            settle,
            timeout,
        }
    }

    /// Import a cluster regardless of where the console currently stands:
    /// dispatches to the initial or incremental flow on the observed view.
    pub async fn auto_import(
        &self,
        checks: &mut CheckContext,
        filter: Option<ServiceKind>,
    ) -> Result<ImportOutcome> {
        match self.console.current_view().await? {
            ConsoleView::EmptyLanding => self.initial_import(checks, filter).await,
            ConsoleView::ClusterList => self.incremental_import(checks, filter).await,
        }
    }

    /// Import the very first cluster. Requires the console to show the
    /// empty landing page; after the import the cluster must survive a
    /// fresh login and the console must route to the cluster list.
    pub async fn initial_import(
        &self,
        checks: &mut CheckContext,
        filter: Option<ServiceKind>,
    ) -> Result<ImportOutcome> {
        let view = self.console.current_view().await?;
        checks.hard(
            view == ConsoleView::EmptyLanding,
            format!(
                "console should route to the landing page while no cluster is imported (routes to {view:?})"
            ),
        )?;

        let candidate = self.select_candidate(checks, filter).await?;
        let mut outcome = self.import_selected(checks, &candidate, 0).await?;

        self.console.logout().await?;
        self.console.login().await?;
        let view = self.console.current_view().await?;
        checks.hard(
            view == ConsoleView::ClusterList,
            format!(
                "console should route to the cluster list after the initial import (routes to {view:?})"
            ),
        )?;

        let clusters = self.console.clusters().await?;
        let count_ok = checks.soft(
            clusters.len() == 1,
            format!(
                "there should be exactly one cluster after the initial import (found {})",
                clusters.len()
            ),
        );
        let present_ok = checks.soft(
            find_cluster(&clusters, &outcome.cluster_ident).is_some(),
            format!(
                "cluster {} should still be listed after a new login",
                outcome.cluster_ident
            ),
        );
        if !(count_ok && present_ok) {
            outcome.phase = ImportPhase::ImportedAwaitingVerification;
        }
        Ok(outcome)
    }

    /// Import an additional cluster into an already populated console.
    pub async fn incremental_import(
        &self,
        checks: &mut CheckContext,
        filter: Option<ServiceKind>,
    ) -> Result<ImportOutcome> {
        let view = self.console.current_view().await?;
        checks.hard(
            view == ConsoleView::ClusterList,
            format!("console should route to the cluster list (routes to {view:?})"),
        )?;

        let clusters_before = self.console.clusters().await?.len();
        let candidate = self.select_candidate(checks, filter).await?;
        self.import_selected(checks, &candidate, clusters_before).await
    }

    /// Walk the wizard's candidate list and pick the first cluster that
    /// matches the requested service kind. The service type is only
    /// revealed by activating a candidate, so every inspected candidate is
    /// activated in turn; candidates after the match stay untouched. An
    /// empty list or a list with no match fails hard.
    pub async fn select_candidate(
        &self,
        checks: &mut CheckContext,
        filter: Option<ServiceKind>,
    ) -> Result<ClusterCandidate> {
        let candidates = self.console.importable_clusters().await?;
        checks.hard(
            !candidates.is_empty(),
            "there should be some cluster available for import",
        )?;

        for candidate in candidates {
            let service = self.console.activate_candidate(&candidate.id).await?;
            let matched = filter.map_or(true, |kind| kind.matches(&service));
            if matched {
                tracing::info!(candidate = %candidate.id, service = %service, "candidate selected");
                return Ok(ClusterCandidate {
                    storage_service: Some(service),
                    ..candidate
                });
            }
            tracing::debug!(candidate = %candidate.id, service = %service, "candidate skipped");
        }

        let wanted = filter.map_or_else(|| "importable".to_string(), |kind| kind.to_string());
        Err(checks
            .fail_hard(format!("there should be some {wanted} cluster available"))
            .into())
    }

    /// Submit the import for an activated candidate, wait the task out and
    /// verify the resulting cluster list and host membership.
    async fn import_selected(
        &self,
        checks: &mut CheckContext,
        candidate: &ClusterCandidate,
        clusters_before: usize,
    ) -> Result<ImportOutcome> {
        let failures_before = checks.failure_count();
        let mut phase = ImportPhase::NoClusterImported;
        tracing::debug!(candidate = %candidate.id, ?phase, "submitting import");

        let request = self.console.submit_import(&candidate.id).await?;
        phase = ImportPhase::ImportInProgress;
        tracing::info!(
            cluster = %request.cluster_ident,
            task = %request.task.id,
            ?phase,
            "import submitted"
        );

        wait_for_task(self.console.as_ref(), &request.task, self.timeout).await?;
        self.settle.settle().await;
        phase = ImportPhase::ImportedAwaitingVerification;
        tracing::info!(cluster = %request.cluster_ident, ?phase, "import task finished");

        let clusters = self.console.clusters().await?;
        checks.soft(
            clusters.len() == clusters_before + 1,
            format!(
                "there should be one additional cluster in the list (expected {}, found {})",
                clusters_before + 1,
                clusters.len()
            ),
        );

        let listed = find_cluster(&clusters, &request.cluster_ident).cloned();
        checks.soft(
            listed.is_some(),
            format!(
                "the imported cluster {} should be present in the cluster list",
                request.cluster_ident
            ),
        );
        if let Some(cluster) = listed {
            let hosts = self.console.cluster_hosts(&cluster.name).await?;
            check_host_membership(&request.hosts, &hosts, checks);
        }

        if checks.failure_count() == failures_before {
            phase = ImportPhase::Verified;
            tracing::info!(cluster = %request.cluster_ident, ?phase, "import verified");
        }
        Ok(ImportOutcome {
            cluster_ident: request.cluster_ident,
            phase,
        })
    }
}
