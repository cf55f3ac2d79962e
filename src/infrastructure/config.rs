use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CheckupConfig {
    pub console: ConsoleSettings,
    pub cluster: ClusterSettings,
    pub grafana: GrafanaSettings,
    pub graphite: GraphiteSettings,
    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleSettings {
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClusterSettings {
    /// A member host used for direct ground-truth queries.
    pub member: String,
    /// Short name assigned at import time, when there is one.
    #[serde(default)]
    pub short_name: Option<String>,
    pub integration_id: String,
    /// Restrict import flows to one storage service ("gluster" or "ceph").
    #[serde(default)]
    pub cluster_type: Option<String>,
}

impl ClusterSettings {
    /// The identifier metric targets are resolved with: the short name
    /// when one is assigned, the integration id otherwise.
    pub fn identifier(&self) -> &str {
        match &self.short_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.integration_id,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GrafanaSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphiteSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            settle_secs: default_settle_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_settle_secs() -> u64 {
    90
}

pub fn load_checkup_config() -> anyhow::Result<CheckupConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/checkup"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
