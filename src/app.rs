use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::{health, search};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .merge(search::router())
        .nest("/health", health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
