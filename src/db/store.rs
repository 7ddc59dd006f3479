use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Client, NewClient, NewVisit, Organization, Reservation, Service, Visit};
use crate::services::repository::{ClientRegistry, OrganizationDirectory, VisitLedger};

/// SQLite-backed implementation of the directory, registry and ledger,
/// sharing the application's connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        f(&mut *conn)
    }
}

#[async_trait]
impl OrganizationDirectory for SqliteStore {
    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Organization>> {
        self.with_conn(|conn| queries::get_organization_by_slug(conn, slug))
    }

    async fn find_service(
        &self,
        organization_id: &str,
        service_id: &str,
    ) -> anyhow::Result<Option<Service>> {
        self.with_conn(|conn| queries::get_service(conn, organization_id, service_id))
    }
}

#[async_trait]
impl ClientRegistry for SqliteStore {
    async fn find_by_phone(
        &self,
        organization_id: &str,
        phone: &str,
    ) -> anyhow::Result<Option<Client>> {
        self.with_conn(|conn| queries::find_client_by_phone(conn, organization_id, phone))
    }

    async fn create(&self, organization_id: &str, client: NewClient) -> anyhow::Result<Client> {
        self.with_conn(|conn| queries::create_client(conn, organization_id, &client))
    }
}

#[async_trait]
impl VisitLedger for SqliteStore {
    async fn find_overlapping(
        &self,
        organization_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Vec<Visit>> {
        self.with_conn(|conn| queries::find_overlapping_visits(conn, organization_id, &start, &end))
    }

    async fn create(&self, visit: NewVisit) -> anyhow::Result<Visit> {
        self.with_conn(|conn| queries::create_visit(conn, &visit))
    }

    async fn create_if_free(&self, visit: NewVisit) -> anyhow::Result<Reservation> {
        self.with_conn(|conn| queries::create_visit_if_free(conn, &visit))
    }
}
