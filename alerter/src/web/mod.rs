// File: alerter/src/web/mod.rs
pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::registry::NodeRegistry;
use crate::state::SystemState;
use crate::store::Store;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub alerter_name: Arc<str>,
    pub registry: Arc<NodeRegistry>,
    pub systems: Arc<Vec<Arc<RwLock<SystemState>>>>,
    /// Alive reminder mute commands need it
    pub store: Option<Arc<Store>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        alerter_name: &str,
        registry: Arc<NodeRegistry>,
        systems: Vec<Arc<RwLock<SystemState>>>,
        store: Option<Arc<Store>>,
    ) -> Self {
        Self {
            alerter_name: Arc::from(alerter_name),
            registry,
            systems: Arc::new(systems),
            store,
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub alerter_name: String,
    pub nodes_total: usize,
    pub nodes_down: usize,
    pub systems_total: usize,
    pub uptime_seconds: i64,
}
