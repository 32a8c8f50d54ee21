use crate::error::Result;
use crate::model::StatsResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

pub async fn ping_handler(State(state): State<AppState>) -> StatusCode {
    if state.service().ping(&state.request_cancellation()).await {
        StatusCode::OK
    } else {
        warn!("storage ping failed");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.service().stats(&state.request_cancellation()).await?;
    Ok(Json(stats.into()))
}
