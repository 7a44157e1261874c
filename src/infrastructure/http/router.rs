use crate::infrastructure::http::controllers::{assignments, health};
use crate::infrastructure::http::middleware::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        // Static segment wins over the :id capture
        .route(
            "/api/assignments/current",
            get(assignments::list_current_assignments),
        )
        .route(
            "/api/assignments/:id",
            get(assignments::get_assignment)
                .put(assignments::update_assignment)
                .patch(assignments::update_assignment)
                .delete(assignments::delete_assignment),
        )
        .route(
            "/api/assignments/:id/complete",
            post(assignments::complete_assignment),
        );

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
