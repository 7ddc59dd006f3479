use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::SqliteStore;
use crate::services::booking::BookingEngine;
use crate::services::clock::Clock;
use crate::services::notify::{NotificationQueue, Notifier};

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub engine: BookingEngine,
}

impl AppState {
    /// Wires the SQLite store into the booking engine and starts the
    /// notification worker. Must be called inside a Tokio runtime.
    pub fn new(
        conn: Connection,
        config: AppConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let db = Arc::new(Mutex::new(conn));
        let store = Arc::new(SqliteStore::new(db.clone()));
        let (notifications, _worker) = NotificationQueue::spawn(
            notifier,
            config.retry_policy(),
            config.notify_queue_capacity,
        );

        let engine = BookingEngine::new(
            store.clone(),
            store.clone(),
            store,
            notifications,
            clock,
            config.slot_step_minutes,
        );

        Arc::new(Self { db, config, engine })
    }
}

impl AppState {
    pub fn conn(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }
}
