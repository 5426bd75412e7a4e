use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    handler::{auth::auth_handler, jobs::jobs_handler, users::users_handler},
    utils::upload::UPLOADS_ROUTE,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let users_routes = auth_handler().merge(users_handler(app_state.env.max_upload_bytes));

    let api_route = Router::new()
        .nest("/users", users_routes)
        .nest("/jobs", jobs_handler())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(app_state.clone())),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&app_state.env.upload_dir))
}
