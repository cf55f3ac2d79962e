// Cluster domain model - candidates, summaries and host membership
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::check::CheckContext;

/// Storage services the console knows how to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Gluster,
    Ceph,
}

impl ServiceKind {
    fn keyword(self) -> &'static str {
        match self {
            ServiceKind::Gluster => "gluster",
            ServiceKind::Ceph => "ceph",
        }
    }

    /// The wizard reports the service as a free-form release string
    /// ("Red Hat Gluster Storage 3.3"), so matching is a case-insensitive
    /// substring test.
    pub fn matches(self, reported: &str) -> bool {
        reported.to_lowercase().contains(self.keyword())
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Error)]
#[error("unknown cluster type: {0}")]
pub struct UnknownServiceKind(String);

impl FromStr for ServiceKind {
    type Err = UnknownServiceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gluster" => Ok(ServiceKind::Gluster),
            "ceph" => Ok(ServiceKind::Ceph),
            other => Err(UnknownServiceKind(other.to_string())),
        }
    }
}

/// A cluster the console offers for import. The storage service is only
/// known once the candidate has been activated in the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCandidate {
    pub id: String,
    pub storage_service: Option<String>,
}

impl ClusterCandidate {
    pub fn new(id: String) -> Self {
        Self {
            id,
            storage_service: None,
        }
    }
}

/// A cluster as listed by the console after import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub hostname: String,
    pub release: Option<String>,
}

/// Find the imported cluster by case-insensitive substring match of the
/// identifier the wizard reported at submit time.
pub fn find_cluster<'a>(clusters: &'a [ClusterSummary], ident: &str) -> Option<&'a ClusterSummary> {
    let ident = ident.to_lowercase();
    clusters
        .iter()
        .find(|cluster| cluster.name.to_lowercase().contains(&ident))
}

/// Compare the host list the wizard showed at submit time with the host
/// list the console reports for the imported cluster. Hostname sets must
/// match in both directions; releases are cross-checked where both sides
/// report one.
pub fn check_host_membership(
    expected: &[HostEntry],
    observed: &[HostEntry],
    checks: &mut CheckContext,
) {
    let expected_names: BTreeSet<&str> = expected.iter().map(|h| h.hostname.as_str()).collect();
    let observed_names: BTreeSet<&str> = observed.iter().map(|h| h.hostname.as_str()).collect();

    let missing: Vec<&str> = expected_names.difference(&observed_names).copied().collect();
    checks.soft(
        missing.is_empty(),
        format!(
            "every host from the import request should be listed for the cluster (missing: [{}])",
            missing.join(", ")
        ),
    );

    let extra: Vec<&str> = observed_names.difference(&expected_names).copied().collect();
    checks.soft(
        extra.is_empty(),
        format!(
            "the cluster should list no hosts beyond the import request (extra: [{}])",
            extra.join(", ")
        ),
    );

    for host in expected {
        let Some(listed) = observed.iter().find(|h| h.hostname == host.hostname) else {
            continue;
        };
        if let (Some(expected_release), Some(listed_release)) = (&host.release, &listed.release) {
            checks.soft(
                expected_release == listed_release,
                format!(
                    "host {} should report release {expected_release} (reports {listed_release})",
                    host.hostname
                ),
            );
        }
    }
}

/// Host connectivity tallied from the ground-truth cluster query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionCounts {
    pub total: usize,
    pub up: usize,
    pub down: usize,
}

impl ConnectionCounts {
    pub fn from_states(states: &BTreeMap<String, bool>) -> Self {
        let up = states.values().filter(|connected| **connected).count();
        Self {
            total: states.len(),
            up,
            down: states.len() - up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, release: Option<&str>) -> HostEntry {
        HostEntry {
            hostname: name.to_string(),
            release: release.map(str::to_string),
        }
    }

    #[test]
    fn service_kind_matches_release_strings() {
        assert!(ServiceKind::Gluster.matches("Red Hat Gluster Storage 3.3"));
        assert!(ServiceKind::Ceph.matches("CEPH 12.2"));
        assert!(!ServiceKind::Gluster.matches("ceph luminous"));
    }

    #[test]
    fn service_kind_parses_known_types_only() {
        assert_eq!("Gluster".parse::<ServiceKind>().unwrap(), ServiceKind::Gluster);
        assert_eq!("ceph".parse::<ServiceKind>().unwrap(), ServiceKind::Ceph);

        let err = "xfs".parse::<ServiceKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown cluster type: xfs");
    }

    #[test]
    fn find_cluster_matches_substring_case_insensitively() {
        let clusters = vec![
            ClusterSummary {
                name: "Cluster GL1".to_string(),
            },
            ClusterSummary {
                name: "ceph-east".to_string(),
            },
        ];
        assert_eq!(find_cluster(&clusters, "gl1").unwrap().name, "Cluster GL1");
        assert_eq!(find_cluster(&clusters, "CEPH").unwrap().name, "ceph-east");
        assert!(find_cluster(&clusters, "gl2").is_none());
    }

    #[test]
    fn host_membership_is_order_independent() {
        let mut checks = CheckContext::new();
        let expected = vec![host("a.example.com", None), host("b.example.com", None)];
        let observed = vec![host("b.example.com", None), host("a.example.com", None)];
        check_host_membership(&expected, &observed, &mut checks);
        assert!(!checks.failed());
    }

    #[test]
    fn host_membership_reports_missing_and_extra_hosts() {
        let mut checks = CheckContext::new();
        let expected = vec![host("a.example.com", None), host("b.example.com", None)];
        let observed = vec![host("b.example.com", None), host("c.example.com", None)];
        check_host_membership(&expected, &observed, &mut checks);

        assert_eq!(checks.failure_count(), 2);
        let messages: Vec<&str> = checks
            .entries()
            .iter()
            .filter(|e| !e.passed)
            .map(|e| e.description.as_str())
            .collect();
        assert!(messages[0].contains("a.example.com"));
        assert!(messages[1].contains("c.example.com"));
    }

    #[test]
    fn host_membership_cross_checks_releases() {
        let mut checks = CheckContext::new();
        let expected = vec![host("a.example.com", Some("3.3"))];
        let observed = vec![host("a.example.com", Some("3.2"))];
        check_host_membership(&expected, &observed, &mut checks);

        assert_eq!(checks.failure_count(), 1);
        assert!(
            checks.entries()[2].description.contains("3.3"),
            "release mismatch should name both versions"
        );
    }

    #[test]
    fn connection_counts_add_up() {
        let mut states = BTreeMap::new();
        states.insert("a.example.com".to_string(), true);
        states.insert("b.example.com".to_string(), false);
        states.insert("c.example.com".to_string(), true);

        let counts = ConnectionCounts::from_states(&states);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.up, 2);
        assert_eq!(counts.down, 1);
        assert_eq!(counts.up + counts.down, counts.total);
    }
}
