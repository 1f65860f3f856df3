use crate::auth::AuthKeys;
use crate::engine::judge::Judge;
use crate::engine::progression::AwardPolicy;
use axum::extract::FromRef;
use deadpool_diesel::postgres::Pool;
use std::sync::Arc;
use std::time::Duration;

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub judge: Arc<dyn Judge>,
    /// Bound on a single judge run, polling included.
    pub judge_deadline: Duration,
    pub auth: AuthKeys,
    pub award_policy: AwardPolicy,
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
