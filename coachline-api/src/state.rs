use std::sync::Arc;

use coachline_catalog::{CatalogRules, CatalogService};
use coachline_core::master_password::MasterPasswordGate;
use coachline_core::{DocumentStore, Documents};
use coachline_order::BookingEngine;
use coachline_shared::BookingEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub engine: BookingEngine,
    pub gate: MasterPasswordGate,
    pub sse_tx: broadcast::Sender<BookingEvent>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, auth: AuthConfig, rules: CatalogRules) -> Self {
        let docs = Documents::new(store);
        let gate = MasterPasswordGate::new(docs.clone());
        let catalog = CatalogService::new(docs.clone(), gate.clone(), rules);
        let engine = BookingEngine::new(docs, catalog.clone(), gate.clone());
        let (sse_tx, _) = broadcast::channel(100);

        Self { catalog, engine, gate, sse_tx, auth }
    }

    /// Fire-and-forget; no subscribers is not an error.
    pub fn publish(&self, event: BookingEvent) {
        tracing::debug!("Publishing {} for travel {}", event.name(), event.travel_id());
        let _ = self.sse_tx.send(event);
    }
}
