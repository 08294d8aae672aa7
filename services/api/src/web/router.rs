//! services/api/src/web/router.rs
//!
//! Assembles the HTTP router: protected routes behind the auth middleware, the
//! public assignment listing, CORS, request tracing and the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    assignments::{
        create_assignment_handler, list_assignments_handler, list_my_assignments_handler,
        progress_handler, submit_answer_handler,
    },
    messages::{
        delete_message_handler, edit_message_handler, list_received_handler,
        list_recipients_handler, list_sent_handler, mark_read_handler, send_message_handler,
    },
    middleware::require_auth,
    rest::ApiDoc,
    state::AppState,
};

pub fn build_router(app_state: Arc<AppState>, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Protected routes first; `route_layer` only wraps routes registered before it.
    let api_router = Router::new()
        .route("/api/messages", post(send_message_handler))
        .route("/api/messages/received", get(list_received_handler))
        .route("/api/messages/sent", get(list_sent_handler))
        .route("/api/messages/recipients", get(list_recipients_handler))
        .route(
            "/api/messages/{id}",
            put(edit_message_handler).delete(delete_message_handler),
        )
        .route("/api/messages/{id}/read", put(mark_read_handler))
        .route("/api/tareas", post(create_assignment_handler))
        .route("/api/tareas/mine", get(list_my_assignments_handler))
        .route("/api/tareas/{id}/answers", post(submit_answer_handler))
        .route("/api/tareas/{id}/progress", get(progress_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        // Public routes (no auth required)
        .route("/api/tareas", get(list_assignments_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
