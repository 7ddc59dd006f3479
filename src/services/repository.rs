use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{Client, NewClient, NewVisit, Organization, Reservation, Service, Visit};

#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Organization>>;

    async fn find_service(
        &self,
        organization_id: &str,
        service_id: &str,
    ) -> anyhow::Result<Option<Service>>;
}

#[async_trait]
pub trait ClientRegistry: Send + Sync {
    async fn find_by_phone(
        &self,
        organization_id: &str,
        phone: &str,
    ) -> anyhow::Result<Option<Client>>;

    async fn create(&self, organization_id: &str, client: NewClient) -> anyhow::Result<Client>;
}

#[async_trait]
pub trait VisitLedger: Send + Sync {
    /// Scheduled or completed visits intersecting `[start, end)`.
    async fn find_overlapping(
        &self,
        organization_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Vec<Visit>>;

    async fn create(&self, visit: NewVisit) -> anyhow::Result<Visit>;

    /// Re-checks for overlap and inserts as one atomic step.
    async fn create_if_free(&self, visit: NewVisit) -> anyhow::Result<Reservation>;
}
