// Gluster CLI probe - ground-truth host connectivity over ssh
use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;

use crate::application::storage_repository::StorageRepository;

#[derive(Default)]
pub struct GlusterCli;

impl GlusterCli {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageRepository for GlusterCli {
    async fn host_connection_states(&self, member: &str) -> Result<BTreeMap<String, bool>> {
        tracing::debug!(%member, "running 'gluster pool list' over ssh");
        let output = Command::new("ssh")
            .args([member, "gluster", "pool", "list"])
            .output()
            .await
            .with_context(|| format!("failed to run gluster pool list on {member}"))?;

        if !output.status.success() {
            bail!(
                "gluster pool list on {member} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let states = parse_pool_list(&String::from_utf8_lossy(&output.stdout), member);
        if states.is_empty() {
            bail!("gluster pool list on {member} returned no peers");
        }
        Ok(states)
    }
}

/// Parse `gluster pool list` output into hostname -> connected. The local
/// peer reports as `localhost` and is mapped back to the member the
/// command ran on.
fn parse_pool_list(output: &str, member: &str) -> BTreeMap<String, bool> {
    let mut states = BTreeMap::new();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[uuid, hostname, state] = fields.as_slice() else {
            continue;
        };
        if uuid == "UUID" {
            continue;
        }
        let hostname = if hostname == "localhost" {
            member
        } else {
            hostname
        };
        states.insert(hostname.to_string(), state == "Connected");
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_LIST: &str = "\
UUID\t\t\t\t\tHostname \tState
9c9bd3cc-1f4e-4b2a-8a6e-0f8d6f2a1b11\tb.example.com\tConnected
4d1f0c2a-77e5-49d9-9f0a-bd1e9a3c2d22\tc.example.com\tDisconnected
1a2b3c4d-5e6f-4a5b-8c7d-9e0f1a2b3c33\tlocalhost \tConnected
";

    #[test]
    fn pool_list_parses_states_and_maps_localhost() {
        let states = parse_pool_list(POOL_LIST, "a.example.com");

        assert_eq!(states.len(), 3);
        assert!(states["a.example.com"]);
        assert!(states["b.example.com"]);
        assert!(!states["c.example.com"]);
    }

    #[test]
    fn pool_list_ignores_the_header_and_blank_lines() {
        let states = parse_pool_list("UUID\tHostname\tState\n\n", "a.example.com");
        assert!(states.is_empty());
    }
}
