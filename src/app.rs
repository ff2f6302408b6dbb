use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::session_middleware;
use crate::state::AppState;

/// Full application router with session resolution, CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .merge(auth_routes())
        .merge(user_routes())
        .merge(author_routes())
        .merge(work_routes())
        .merge(user_work_routes())
        .merge(openlibrary_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
                .layer(from_fn_with_state(state.clone(), session_middleware)),
        )
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
}

fn user_routes() -> Router<AppState> {
    use handlers::user;

    Router::new()
        .route("/api/user/profile", get(user::profile))
        .route("/api/user/account", axum::routing::delete(user::delete_account))
        .route("/api/user/authors", get(user::list_authors).post(user::attach_author))
        .route("/api/user/authors/:author_id", axum::routing::delete(user::detach_author))
}

fn author_routes() -> Router<AppState> {
    use handlers::authors;

    Router::new()
        .route("/api/authors", post(authors::create_author))
        .route(
            "/api/authors/:author_id",
            get(authors::get_author).delete(authors::delete_author),
        )
        .route("/api/authors/:author_id/works", get(authors::list_author_works))
}

fn work_routes() -> Router<AppState> {
    use handlers::works;

    Router::new()
        .route("/api/works", post(works::create_work))
        .route("/api/works/:work_id", get(works::get_work))
        .route(
            "/api/works/:work_id/editions",
            get(works::list_editions).post(works::create_edition),
        )
        .route("/api/works/:work_id/primary-edition", patch(works::set_primary_edition))
}

fn user_work_routes() -> Router<AppState> {
    use handlers::user_works;

    Router::new()
        .route("/api/user/works", get(user_works::list_user_works))
        .route(
            "/api/user/works/bulk",
            post(user_works::bulk_add_works).patch(user_works::bulk_update_works),
        )
        .route(
            "/api/user/works/:work_id",
            patch(user_works::update_user_work).delete(user_works::delete_user_work),
        )
}

fn openlibrary_routes() -> Router<AppState> {
    use handlers::openlibrary;

    Router::new()
        .route("/api/openlibrary/authors/search", get(openlibrary::search_authors))
        .route("/api/openlibrary/import/author", post(openlibrary::import_author))
        .route("/api/openlibrary/import/work", post(openlibrary::import_work))
        .route("/api/openlibrary/import/edition", post(openlibrary::import_edition))
}

// Session cookies need credentialed CORS, which rules out wildcard origins
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
