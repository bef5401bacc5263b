use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;

use reelhound_core::{GuardedProvider, ProviderDescriptor, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Searched in parallel, in merge order.
    pub fan_out: Vec<ProviderDescriptor>,
    /// Probed one at a time, in this order.
    pub fallback: Vec<ProviderDescriptor>,
}

/// GET /api/v1/providers
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    let describe = |providers: &[GuardedProvider]| -> Vec<ProviderDescriptor> {
        providers.iter().map(|p| p.descriptor().clone()).collect()
    };
    let engine = state.engine();

    Json(ProvidersResponse {
        fan_out: describe(engine.fan_out_providers()),
        fallback: describe(engine.fallback_providers()),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
