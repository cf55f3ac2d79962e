// Dashboard verification - layout structure and hosts-panel cross-checks
use std::sync::Arc;

use anyhow::Result;

use crate::application::dashboard_repository::DashboardRepository;
use crate::application::metrics_repository::MetricsRepository;
use crate::application::storage_repository::StorageRepository;
use crate::domain::check::CheckContext;
use crate::domain::cluster::ConnectionCounts;
use crate::domain::dashboard::{DashboardPanel, LayoutStructure};

pub const CLUSTER_DASHBOARD: &str = "cluster-dashboard";
const HOSTS_PANEL: &str = "Hosts";
// rows[0] is the header; the singlestat panels live in the second row
const AT_A_GLANCE_ROW: usize = 1;

pub struct DashboardService {
    dashboards: Arc<dyn DashboardRepository>,
    metrics: Arc<dyn MetricsRepository>,
    storage: Arc<dyn StorageRepository>,
    cluster_id: String,
    member: String,
}

impl DashboardService {
    pub fn new(
        dashboards: Arc<dyn DashboardRepository>,
        metrics: Arc<dyn MetricsRepository>,
        storage: Arc<dyn StorageRepository>,
        cluster_id: String,
        member: String,
    ) -> Self {
        Self {
            dashboards,
            metrics,
            storage,
            cluster_id,
            member,
        }
    }

    /// Compare the cluster dashboard's row/panel structure against the
    /// agreed reference. Any structural drift fails the check.
    pub async fn verify_layout(&self, checks: &mut CheckContext) -> Result<()> {
        let document = self.dashboards.get_dashboard(CLUSTER_DASHBOARD).await?;
        checks.hard(
            !document.rows.is_empty(),
            format!("{CLUSTER_DASHBOARD} layout should not be empty"),
        )?;

        let reference = LayoutStructure::reference();
        let structure = document.structure();
        tracing::debug!(?structure, "layout structure reported by the dashboard");
        match reference.diff(&structure) {
            None => checks.soft(true, "dashboard layout should match the agreed structure"),
            Some(diff) => checks.soft(
                false,
                format!("dashboard layout should match the agreed structure: {diff}"),
            ),
        };
        Ok(())
    }

    /// Cross-validate the Hosts panel: its total/up/down series must end
    /// on the counts derived from a direct connectivity query against the
    /// cluster, and the dashboard's own counts must be consistent.
    pub async fn verify_hosts_panel(&self, checks: &mut CheckContext) -> Result<()> {
        let document = self.dashboards.get_dashboard(CLUSTER_DASHBOARD).await?;
        checks.hard(
            document.rows.len() == 4,
            format!(
                "{CLUSTER_DASHBOARD} should have four rows (found {})",
                document.rows.len()
            ),
        )?;

        let row = &document.rows[AT_A_GLANCE_ROW];
        let Some(panel) = row.find_panel(HOSTS_PANEL) else {
            return Err(checks
                .fail_hard(format!(
                    "panel {HOSTS_PANEL:?} should be present in the {:?} row",
                    row.title
                ))
                .into());
        };

        let states = self.storage.host_connection_states(&self.member).await?;
        let counts = ConnectionCounts::from_states(&states);
        checks.soft(
            counts.up + counts.down == counts.total,
            format!(
                "up and down hosts should add up to the total ({} + {} vs {})",
                counts.up, counts.down, counts.total
            ),
        );

        let total = self.last_value(panel, "A", 0, "total hosts", checks).await?;
        if let Some(total) = total {
            checks.soft(
                total == counts.total as f64,
                format!(
                    "number of total hosts in the dashboard ({total}) should be {}",
                    counts.total
                ),
            );
        }

        let up = self.last_value(panel, "B", 1, "hosts up", checks).await?;
        if let Some(up) = up {
            checks.soft(
                up == counts.up as f64,
                format!(
                    "number of hosts that are up in the dashboard ({up}) should be {}",
                    counts.up
                ),
            );
        }

        let down = self.last_value(panel, "C", 2, "hosts down", checks).await?;
        if let Some(down) = down {
            checks.soft(
                down == counts.down as f64,
                format!(
                    "number of hosts that are down in the dashboard ({down}) should be {}",
                    counts.down
                ),
            );
        }

        if let (Some(total), Some(up), Some(down)) = (total, up, down) {
            checks.soft(
                up + down == total,
                format!(
                    "dashboard up ({up}) and down ({down}) hosts should add up to its total ({total})"
                ),
            );
        }
        Ok(())
    }

    /// Resolve one of the panel's targets against the cluster identifier
    /// and fetch the last value of the series it points at. A missing
    /// target, an empty series or a gap at the final sample is a soft
    /// failure.
    async fn last_value(
        &self,
        panel: &DashboardPanel,
        ref_id: &str,
        index: usize,
        label: &str,
        checks: &mut CheckContext,
    ) -> Result<Option<f64>> {
        let Some(target) = panel.target(ref_id, index) else {
            checks.soft(
                false,
                format!(
                    "the {HOSTS_PANEL} panel should carry a {label} target (refId {ref_id} or position {index})"
                ),
            );
            return Ok(None);
        };

        let resolved = target.resolve(&self.cluster_id);
        tracing::debug!(target = %resolved, "{label} target");
        let points = self.metrics.get_datapoints(&resolved).await?;
        let Some(last) = points.last().copied() else {
            checks.soft(
                false,
                format!("the {label} series should not be empty ({resolved})"),
            );
            return Ok(None);
        };
        if let Some(time) = last.time() {
            tracing::debug!(target = %resolved, at = %time.to_rfc3339(), "last datapoint");
        }
        if last.value.is_none() {
            checks.soft(
                false,
                format!("the {label} series should end with a value ({resolved})"),
            );
        }
        Ok(last.value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::dashboard::{
        DashboardDocument, DashboardPanel, DashboardRow, Datapoint, MetricTarget,
    };

    struct FakeDashboards {
        document: DashboardDocument,
    }

    #[async_trait]
    impl DashboardRepository for FakeDashboards {
        async fn get_dashboard(&self, _slug: &str) -> anyhow::Result<DashboardDocument> {
            Ok(self.document.clone())
        }
    }

    struct FakeMetrics {
        series: HashMap<String, Vec<Datapoint>>,
    }

    #[async_trait]
    impl MetricsRepository for FakeMetrics {
        async fn get_datapoints(&self, target: &str) -> anyhow::Result<Vec<Datapoint>> {
            Ok(self.series.get(target).cloned().unwrap_or_default())
        }
    }

    struct FakeStorage {
        states: BTreeMap<String, bool>,
    }

    #[async_trait]
    impl StorageRepository for FakeStorage {
        async fn host_connection_states(
            &self,
            _member: &str,
        ) -> anyhow::Result<BTreeMap<String, bool>> {
            Ok(self.states.clone())
        }
    }

    fn named_panel(name: &str) -> DashboardPanel {
        DashboardPanel {
            title: String::new(),
            display_name: Some(name.to_string()),
            targets: Vec::new(),
        }
    }

    fn hosts_panel() -> DashboardPanel {
        let target = |ref_id: &str, suffix: &str| MetricTarget {
            ref_id: Some(ref_id.to_string()),
            target: format!("tendrl.clusters.$cluster_id.nodes_count.{suffix}"),
        };
        DashboardPanel {
            title: String::new(),
            display_name: Some("Hosts".to_string()),
            targets: vec![target("A", "total"), target("B", "up"), target("C", "down")],
        }
    }

    /// A document whose structure matches the reference and whose Hosts
    /// panel carries the three count targets.
    fn reference_document() -> DashboardDocument {
        let reference = LayoutStructure::reference();
        DashboardDocument {
            rows: reference
                .rows
                .iter()
                .map(|row| DashboardRow {
                    title: row.title.clone(),
                    panels: row
                        .panels
                        .iter()
                        .map(|panel| {
                            if panel == "Hosts" {
                                hosts_panel()
                            } else {
                                named_panel(panel)
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn series(values: &[(Option<f64>, i64)]) -> Vec<Datapoint> {
        values
            .iter()
            .map(|(value, timestamp)| Datapoint {
                value: *value,
                timestamp: *timestamp,
            })
            .collect()
    }

    fn metrics(total: Option<f64>, up: Option<f64>, down: Option<f64>) -> FakeMetrics {
        let mut map = HashMap::new();
        map.insert(
            "tendrl.clusters.c1.nodes_count.total".to_string(),
            series(&[(Some(1.0), 100), (total, 160)]),
        );
        map.insert(
            "tendrl.clusters.c1.nodes_count.up".to_string(),
            series(&[(up, 160)]),
        );
        map.insert(
            "tendrl.clusters.c1.nodes_count.down".to_string(),
            series(&[(down, 160)]),
        );
        FakeMetrics { series: map }
    }

    fn states(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
        entries
            .iter()
            .map(|(host, connected)| (host.to_string(), *connected))
            .collect()
    }

    fn service(document: DashboardDocument, metrics: FakeMetrics, states: BTreeMap<String, bool>) -> DashboardService {
        DashboardService::new(
            Arc::new(FakeDashboards { document }),
            Arc::new(metrics),
            Arc::new(FakeStorage { states }),
            "c1".to_string(),
            "a.example.com".to_string(),
        )
    }

    #[tokio::test]
    async fn layout_matching_the_reference_passes() {
        let service = service(reference_document(), metrics(None, None, None), states(&[]));
        let mut checks = CheckContext::new();
        service.verify_layout(&mut checks).await.unwrap();
        assert!(!checks.failed());
    }

    #[tokio::test]
    async fn layout_drift_is_reported_with_the_divergence() {
        let mut document = reference_document();
        document.rows[3].panels.remove(1);

        let service = service(document, metrics(None, None, None), states(&[]));
        let mut checks = CheckContext::new();
        service.verify_layout(&mut checks).await.unwrap();

        assert_eq!(checks.failure_count(), 1);
        assert!(checks.entries()[1].description.contains("Status"));
    }

    #[tokio::test]
    async fn empty_layout_fails_hard() {
        let service = service(
            DashboardDocument::default(),
            metrics(None, None, None),
            states(&[]),
        );
        let mut checks = CheckContext::new();
        let err = service.verify_layout(&mut checks).await.unwrap_err();
        assert!(err.to_string().contains("should not be empty"));
    }

    #[tokio::test]
    async fn hosts_panel_matching_ground_truth_passes() {
        let service = service(
            reference_document(),
            metrics(Some(3.0), Some(2.0), Some(1.0)),
            states(&[
                ("a.example.com", true),
                ("b.example.com", true),
                ("c.example.com", false),
            ]),
        );
        let mut checks = CheckContext::new();
        service.verify_hosts_panel(&mut checks).await.unwrap();
        assert!(!checks.failed());
    }

    #[tokio::test]
    async fn host_count_drift_names_both_values() {
        let service = service(
            reference_document(),
            metrics(Some(3.0), Some(3.0), Some(1.0)),
            states(&[
                ("a.example.com", true),
                ("b.example.com", true),
                ("c.example.com", false),
            ]),
        );
        let mut checks = CheckContext::new();
        service.verify_hosts_panel(&mut checks).await.unwrap();

        let failures: Vec<&str> = checks
            .entries()
            .iter()
            .filter(|e| !e.passed)
            .map(|e| e.description.as_str())
            .collect();
        // the up count is wrong, and 3 up + 1 down no longer matches 3 total
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("(3) should be 2"));
    }

    #[tokio::test]
    async fn gap_at_the_final_sample_is_a_soft_failure() {
        let service = service(
            reference_document(),
            metrics(None, Some(2.0), Some(1.0)),
            states(&[
                ("a.example.com", true),
                ("b.example.com", true),
                ("c.example.com", false),
            ]),
        );
        let mut checks = CheckContext::new();
        service.verify_hosts_panel(&mut checks).await.unwrap();

        assert!(checks.failed());
        let gap = checks
            .entries()
            .iter()
            .find(|e| !e.passed)
            .unwrap();
        assert!(gap.description.contains("should end with a value"));
    }

    #[tokio::test]
    async fn missing_hosts_panel_fails_hard() {
        let mut document = reference_document();
        document.rows[1].panels.retain(|p| p.effective_title() != Some("Hosts"));

        let service = service(document, metrics(None, None, None), states(&[]));
        let mut checks = CheckContext::new();
        let err = service.verify_hosts_panel(&mut checks).await.unwrap_err();
        assert!(err.to_string().contains("Hosts"));
    }

    #[tokio::test]
    async fn wrong_row_count_fails_hard() {
        let mut document = reference_document();
        document.rows.pop();

        let service = service(document, metrics(None, None, None), states(&[]));
        let mut checks = CheckContext::new();
        let err = service.verify_hosts_panel(&mut checks).await.unwrap_err();
        assert!(err.to_string().contains("four rows"));
    }
}
