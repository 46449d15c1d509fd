//! Machine-readable documents: RSS, sitemap, robots.txt and health.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use services::feeds;

const FEED_ITEMS: u32 = 20;
const SITEMAP_ENTRIES: u32 = 100;

pub async fn rss(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let site = state.settings_service().site().await?;
    let posts = state.post_service().latest_public(FEED_ITEMS).await?;
    let xml = feeds::rss(&site, &state.ids, &posts)?;
    Ok(([(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")], xml))
}

pub async fn sitemap(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let site = state.settings_service().site().await?;
    let posts = state.post_service().sitemap_entries(SITEMAP_ENTRIES).await?;
    let xml = feeds::sitemap(&site, &state.ids, &posts)?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

pub async fn robots(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let site = state.settings_service().site().await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        feeds::robots(&site),
    ))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Unauthenticated; fails when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.health.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
