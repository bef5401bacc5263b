//! Search API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use reelhound_core::{ProviderReport, Query, RunToken, Title};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Session to store the results in; a new one is created when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub query: String,
    /// Skip the master title lookup and search with this name instead.
    #[serde(default)]
    pub master_title: Option<String>,
    #[serde(default)]
    pub master_year: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub session_id: String,
    pub run: RunToken,
    pub query: Query,
    /// "found" or "no_results"
    pub status: &'static str,
    pub titles: Vec<Title>,
    pub providers: Vec<ProviderReport>,
    /// False when a newer search in the same session replaced this one.
    pub committed: bool,
    pub duration_ms: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Run an aggregation and make its titles the session's working set.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let start = Instant::now();
    let session_id = body
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let run = {
        let mut sessions = state.sessions().write().await;
        sessions.entry(session_id.clone()).or_default().begin()
    };

    let query = Query::new(body.query).with_master(body.master_title, body.master_year);
    let result = state.engine().aggregate_run(query, run).await;

    // The session may have started another run while this one was in flight.
    let committed = {
        let mut sessions = state.sessions().write().await;
        sessions
            .get_mut(&session_id)
            .map(|session| session.commit(&result))
            .unwrap_or(false)
    };
    if !committed {
        debug!(session = %session_id, run = %run, "Discarded results of a superseded run");
    }

    let status = if result.outcome.is_found() {
        "found"
    } else {
        "no_results"
    };

    Json(SearchResponse {
        session_id,
        run: result.run,
        query: result.query,
        status,
        titles: result.outcome.into_titles(),
        providers: result.providers,
        committed,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
