use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::agent::{AgentProfile, LoginRequest};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/login", post(login))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AgentProfile>, AppError> {
    let agent = state
        .find_agent_by_username(&payload.username)
        .ok_or(AppError::Unauthorized)?;

    if !agent.verify_password(&payload.password) {
        warn!(username = %payload.username, "login rejected");
        return Err(AppError::Unauthorized);
    }

    info!(agent_id = %agent.id, "agent logged in");
    Ok(Json(agent.profile(Uuid::new_v4().to_string())))
}
