//! Route configuration.

use crate::auth::require_api_token;
use crate::handlers::{api, feeds, pages};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Multipart framing on top of the raw file.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Management API, mounted under `/api` and guarded by the bearer token.
fn api_routes(state: &AppState) -> Router<AppState> {
    let upload_limit = usize::try_from(state.media_policy.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    Router::new()
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route(
            "/posts/{id}",
            get(api::get_post)
                .put(api::update_post)
                .delete(api::delete_post),
        )
        .route("/posts/{id}/thread", get(api::get_thread))
        .route("/search", get(api::search))
        .route(
            "/upload",
            post(api::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/media", get(api::list_media))
        .route("/media/{id}", delete(api::delete_media))
        .route(
            "/collections",
            get(api::list_collections).post(api::create_collection),
        )
        .route(
            "/collections/{id}",
            get(api::get_collection)
                .put(api::update_collection)
                .delete(api::delete_collection),
        )
        .route("/collections/{id}/posts", get(api::collection_posts))
        .route(
            "/collections/{id}/posts/{post_id}",
            post(api::add_collection_post).delete(api::remove_collection_post),
        )
        .route(
            "/redirects",
            get(api::list_redirects).post(api::create_redirect),
        )
        .route("/redirects/{id}", delete(api::delete_redirect))
        .route("/settings", get(api::list_settings))
        .route(
            "/settings/{key}",
            put(api::put_setting).delete(api::delete_setting),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_token,
        ))
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(pages::timeline))
        .route("/p/{sqid}", get(pages::post_by_sqid))
        .route("/c/{slug}", get(pages::collection))
        .route("/search", get(pages::search))
        .route("/feed", get(feeds::rss))
        .route("/rss.xml", get(feeds::rss))
        .route("/sitemap.xml", get(feeds::sitemap))
        .route("/robots.txt", get(feeds::robots))
        .route("/health", get(feeds::health))
        .nest("/api", api_routes(&state));

    if let Some(root) = &state.media_root {
        router = router.nest_service(&state.media_url_prefix, ServeDir::new(root));
    }

    router
        .fallback(pages::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
