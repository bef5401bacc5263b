//! Session working set handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use reelhound_core::{Query, ResolveOutcome, Title};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TitlesResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    pub titles: Vec<Title>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub outcome: ResolveOutcome,
    pub title: Title,
    /// Fallback providers consulted, in probe order.
    pub probed: Vec<String>,
    /// False when a newer search replaced the working set meanwhile.
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message }))
}

/// GET /api/v1/sessions/{id}/titles
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<TitlesResponse>, impl IntoResponse> {
    let sessions = state.sessions().read().await;
    let Some(session) = sessions.get(&session_id) else {
        return Err(not_found(format!("Session not found: {}", session_id)));
    };

    Ok(Json(TitlesResponse {
        query: session.query().cloned(),
        titles: session.titles().to_vec(),
        updated_at: session.updated_at(),
        session_id,
    }))
}

/// POST /api/v1/sessions/{id}/titles/{index}/resolve
///
/// Run the fallback cascade for one title of the working set and write the
/// enriched title back, provided no other search has committed since.
pub async fn resolve_title(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(String, usize)>,
) -> Result<Json<ResolveResponse>, impl IntoResponse> {
    let (run, title) = {
        let sessions = state.sessions().read().await;
        let Some(session) = sessions.get(&session_id) else {
            return Err(not_found(format!("Session not found: {}", session_id)));
        };
        match (session.committed_run(), session.title(index)) {
            (Some(run), Some(title)) => (run, title.clone()),
            _ => {
                return Err(not_found(format!(
                    "No title at index {} in session {}",
                    index, session_id
                )))
            }
        }
    };

    let resolution = state.engine().resolve_links(title).await;

    let updated = match resolution.outcome {
        ResolveOutcome::Resolved { .. } => {
            let mut sessions = state.sessions().write().await;
            sessions
                .get_mut(&session_id)
                .map(|session| session.update_title(&run, resolution.title.clone()))
                .unwrap_or(false)
        }
        ResolveOutcome::AlreadyResolved | ResolveOutcome::Exhausted => false,
    };

    Ok(Json(ResolveResponse {
        outcome: resolution.outcome,
        title: resolution.title,
        probed: resolution.probed,
        updated,
    }))
}
