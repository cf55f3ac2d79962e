// Main entry point - Dependency injection and flow selection
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use std::time::Duration;

use crate::application::console::ManagementConsole;
use crate::application::dashboard_service::DashboardService;
use crate::application::import_service::ImportService;
use crate::application::wait::FixedDelay;
use crate::domain::check::CheckContext;
use crate::domain::cluster::ServiceKind;
use crate::infrastructure::config::load_checkup_config;
use crate::infrastructure::console_api::ApiConsole;
use crate::infrastructure::gluster_repository::GlusterCli;
use crate::infrastructure::grafana_repository::GrafanaRepository;
use crate::infrastructure::graphite_repository::GraphiteRepository;
use crate::presentation::report;

const FLOWS: &str = "initial-import | incremental-import | auto-import | layout | hosts-panel | all";

fn selected_flows(name: &str) -> anyhow::Result<Vec<&'static str>> {
    match name {
        "initial-import" => Ok(vec!["initial-import"]),
        "incremental-import" => Ok(vec!["incremental-import"]),
        "auto-import" => Ok(vec!["auto-import"]),
        "layout" => Ok(vec!["layout"]),
        "hosts-panel" => Ok(vec!["hosts-panel"]),
        "all" => Ok(vec!["auto-import", "layout", "hosts-panel"]),
        other => anyhow::bail!("unknown flow {other:?}; expected one of: {FLOWS}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let flow = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());
    let flows = selected_flows(&flow)?;

    // Load configuration
    let config = load_checkup_config()?;
    let filter = match &config.cluster.cluster_type {
        Some(kind) => Some(kind.parse::<ServiceKind>()?),
        None => None,
    };

    // Create repositories (infrastructure layer)
    let console: Arc<dyn ManagementConsole> = Arc::new(ApiConsole::new(
        config.console.url.clone(),
        config.console.username.clone(),
        config.console.password.clone(),
    ));
    let dashboards = Arc::new(GrafanaRepository::new(config.grafana.url.clone()));
    let metrics = Arc::new(GraphiteRepository::new(config.graphite.url.clone()));
    let storage = Arc::new(GlusterCli::new());

    // Create services (application layer)
    let settle = Arc::new(FixedDelay::new(Duration::from_secs(config.import.settle_secs)));
    let import_service = ImportService::new(
        console.clone(),
        settle,
        Duration::from_secs(config.import.timeout_secs),
    );
    let dashboard_service = DashboardService::new(
        dashboards,
        metrics,
        storage,
        config.cluster.identifier().to_string(),
        config.cluster.member.clone(),
    );

    console.login().await?;

    // Each flow is its own test: a hard failure in one aborts that flow
    // only, and the run keeps going with the next one.
    let mut checks = CheckContext::new();
    let mut flow_aborted = false;
    for name in flows {
        tracing::info!(flow = name, "running flow");
        let result = match name {
            "initial-import" => import_service
                .initial_import(&mut checks, filter)
                .await
                .map(|_| ()),
            "incremental-import" => import_service
                .incremental_import(&mut checks, filter)
                .await
                .map(|_| ()),
            "auto-import" => import_service
                .auto_import(&mut checks, filter)
                .await
                .map(|_| ()),
            "layout" => dashboard_service.verify_layout(&mut checks).await,
            "hosts-panel" => dashboard_service.verify_hosts_panel(&mut checks).await,
            _ => unreachable!("selected_flows only yields known names"),
        };
        if let Err(err) = result {
            tracing::error!(flow = name, "flow aborted: {err:#}");
            flow_aborted = true;
        }
    }

    print!("{}", report::render(&checks));
    if checks.failed() || flow_aborted {
        std::process::exit(1);
    }
    Ok(())
}
