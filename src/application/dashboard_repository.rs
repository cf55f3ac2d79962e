// Repository trait for dashboard layout documents
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::dashboard::DashboardDocument;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Fetch a dashboard document by slug.
    async fn get_dashboard(&self, slug: &str) -> Result<DashboardDocument>;
}
