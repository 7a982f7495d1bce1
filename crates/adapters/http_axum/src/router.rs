//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use reefhub_app::ports::EntityStore;
use reefhub_domain::macros::Macro;
use reefhub_domain::timer::Job;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api`. Includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<MS, JS>(state: AppState<MS, JS>) -> Router
where
    MS: EntityStore<Macro> + 'static,
    JS: EntityStore<Job> + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing::{Harness, send};

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let h = Harness::new().await;
        let resp = send(&h.app(), "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_route() {
        let h = Harness::new().await;
        let resp = send(&h.app(), "GET", "/api/nothing-here", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
