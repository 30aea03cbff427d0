use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware, AppState};

/// Multipart framing on top of the largest accepted evidence file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = usize::try_from(app_state.config.max_evidence_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/simple", get(handlers::health_check_simple));

    let protected_routes = Router::new()
        // Victims
        .route(
            "/api/victims",
            get(handlers::victim_handlers::list_victims)
                .post(handlers::victim_handlers::create_victim),
        )
        .route(
            "/api/victims/:id",
            get(handlers::victim_handlers::get_victim)
                .patch(handlers::victim_handlers::update_victim)
                .delete(handlers::victim_handlers::delete_victim),
        )
        // Cases
        .route(
            "/api/cases",
            get(handlers::case_handlers::list_cases).post(handlers::case_handlers::create_case),
        )
        .route(
            "/api/cases/:id",
            get(handlers::case_handlers::get_case)
                .patch(handlers::case_handlers::update_case)
                .delete(handlers::case_handlers::delete_case),
        )
        .route("/api/cases/:id/report", get(handlers::case_handlers::get_case_report))
        // Evidence
        .route(
            "/api/cases/:id/evidence",
            post(handlers::evidence_handlers::upload_evidence)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/evidence", get(handlers::evidence_handlers::list_evidence))
        .route(
            "/api/evidence/:id",
            get(handlers::evidence_handlers::get_evidence)
                .patch(handlers::evidence_handlers::update_evidence)
                .delete(handlers::evidence_handlers::delete_evidence),
        )
        .route(
            "/api/evidence/:id/download",
            get(handlers::evidence_handlers::download_evidence),
        )
        .route(
            "/api/evidence/:id/verify",
            post(handlers::evidence_handlers::verify_evidence),
        )
        // Forensic actions
        .route(
            "/api/actions",
            get(handlers::action_handlers::list_actions)
                .post(handlers::action_handlers::create_action),
        )
        // Analytics
        .route(
            "/api/analytics/dashboard",
            get(handlers::analytics_handlers::get_dashboard),
        )
        // Admin
        .route("/api/admin/users", get(handlers::admin_handlers::list_users))
        .route(
            "/api/admin/users/:id/role",
            put(handlers::admin_handlers::set_user_role),
        )
        .route(
            "/api/admin/users/:id/role/retry",
            post(handlers::admin_handlers::retry_user_role),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth::auth_middleware,
        ));

    let cors_layer = middleware::create_cors_layer(
        &app_state.config.cors_allow_origins,
        &app_state.config.api_key_header,
    );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::request_logging_middleware,
        ))
        .layer(middleware::create_logging_layer())
        .layer(cors_layer)
}
