use super::helper;
use crate::errors::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use diesel::RunQueryDsl;
use tracing::instrument;

/// Reports whether the server can reach its database.
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Result<ApiResponse<String>, AppError> {
    helper::run_query(&state.pool, |conn| {
        diesel::sql_query("SELECT 1").execute(conn)
    })
    .await?;
    Ok(ApiResponse::ok("ok".to_string()))
}
