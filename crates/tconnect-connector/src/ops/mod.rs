//! Health HTTP endpoints.
//!
//! - `/health`      : liveness, independent of the sync loop
//! - `/health/data` : aggregator snapshot plus static connector settings
//!
//! Neither handler can fail; both always answer 200.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tconnect_core::MetricsSnapshot;

use crate::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub connector_name: String,
    pub status: &'static str,
    pub metrics: MetricsSnapshot,
    /// Not tracked; always empty.
    pub recent_entries: Vec<Value>,
    pub configuration: HealthConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfiguration {
    pub sync_interval_minutes: u32,
    pub connect_source: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn health_data(State(state): State<AppState>) -> Json<HealthData> {
    Json(health_data_for(&state))
}

pub fn health_data_for(state: &AppState) -> HealthData {
    let connector = &state.cfg().connector;
    HealthData {
        connector_name: connector.name.clone(),
        status: "running",
        metrics: state.metrics().snapshot(),
        recent_entries: Vec::new(),
        configuration: HealthConfiguration {
            sync_interval_minutes: connector.sync_interval_minutes,
            connect_source: connector.connect_source.clone(),
        },
    }
}
