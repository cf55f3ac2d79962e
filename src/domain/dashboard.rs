// Dashboard domain model - layout structure, panels and metric targets
use chrono::{DateTime, Utc};

/// One row of the layout under comparison: its title and the panel titles
/// in the order the dashboard serves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStructure {
    pub title: String,
    pub panels: Vec<String>,
}

impl RowStructure {
    pub fn new(title: &str, panels: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            panels: panels.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Ordered rows with ordered panel titles. Compared exactly: any added,
/// removed, renamed or reordered row or panel is a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutStructure {
    pub rows: Vec<RowStructure>,
}

impl LayoutStructure {
    /// The agreed cluster-dashboard layout, in the row order the dashboard
    /// API serves: header first, then the at-a-glance, top-consumers and
    /// status rows.
    pub fn reference() -> Self {
        Self {
            rows: vec![
                RowStructure::new("Header", &[]),
                RowStructure::new(
                    "At-a-glance",
                    &[
                        "Health",
                        "Snapshots",
                        "Hosts",
                        "Volumes",
                        "Bricks",
                        "Geo-Replication Session",
                        "Connection",
                        "IOPS",
                        "Capacity Utilization",
                        "Capacity Available",
                        "Weekly Growth Rate",
                        "Weeks Remaining",
                        "Throughput",
                    ],
                ),
                RowStructure::new(
                    "Top Consumers",
                    &[
                        "Top 5 Utilization by Bricks",
                        "Top 5 Utilization by Volume",
                        "CPU Utilization by Host",
                        "Memory Utilization by Host",
                        "Ping Latency",
                    ],
                ),
                RowStructure::new("Status", &["Volume Status", "Host Status", "Brick Status"]),
            ],
        }
    }

    /// `None` when `observed` matches exactly; otherwise a description of
    /// the first point of divergence, naming expected vs. observed.
    pub fn diff(&self, observed: &Self) -> Option<String> {
        if self.rows.len() != observed.rows.len() {
            return Some(format!(
                "expected {} rows, found {}",
                self.rows.len(),
                observed.rows.len()
            ));
        }
        for (index, (expected, found)) in self.rows.iter().zip(&observed.rows).enumerate() {
            if expected.title != found.title {
                return Some(format!(
                    "row {index} should be titled {:?}, found {:?}",
                    expected.title, found.title
                ));
            }
            if expected.panels != found.panels {
                return Some(format!(
                    "row {:?} should contain panels {:?}, found {:?}",
                    expected.title, expected.panels, found.panels
                ));
            }
        }
        None
    }
}

/// A query template identifying one metric time series, parameterized by
/// cluster identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTarget {
    pub ref_id: Option<String>,
    pub target: String,
}

impl MetricTarget {
    pub fn resolve(&self, cluster_id: &str) -> String {
        self.target.replace("$cluster_id", cluster_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPanel {
    pub title: String,
    pub display_name: Option<String>,
    pub targets: Vec<MetricTarget>,
}

impl DashboardPanel {
    /// Panels carry their name either in `title` or, for the singlestat
    /// panels, only in `displayName`.
    pub fn effective_title(&self) -> Option<&str> {
        if !self.title.is_empty() {
            return Some(&self.title);
        }
        self.display_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Look a target up by its `refId`, falling back to the documented
    /// position when the dashboard carries no refIds.
    pub fn target(&self, ref_id: &str, index: usize) -> Option<&MetricTarget> {
        self.targets
            .iter()
            .find(|t| t.ref_id.as_deref() == Some(ref_id))
            .or_else(|| self.targets.get(index))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRow {
    pub title: String,
    pub panels: Vec<DashboardPanel>,
}

impl DashboardRow {
    pub fn find_panel(&self, name: &str) -> Option<&DashboardPanel> {
        self.panels
            .iter()
            .find(|panel| panel.effective_title() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardDocument {
    pub rows: Vec<DashboardRow>,
}

impl DashboardDocument {
    pub fn structure(&self) -> LayoutStructure {
        LayoutStructure {
            rows: self
                .rows
                .iter()
                .map(|row| RowStructure {
                    title: row.title.clone(),
                    panels: row
                        .panels
                        .iter()
                        .filter_map(|panel| panel.effective_title())
                        .map(str::to_string)
                        .collect(),
                })
                .collect(),
        }
    }
}

/// One sample of a rendered time series. The value is absent when the
/// metrics store has a gap at that timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datapoint {
    pub value: Option<f64>,
    pub timestamp: i64,
}

impl Datapoint {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
