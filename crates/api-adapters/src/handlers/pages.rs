//! Public HTML pages and the path fallback.

use crate::i18n::{negotiate, RenderContext};
use crate::state::AppState;
use crate::views::{
    render, CollectionPage, ErrorPage, HitView, PostPage, PostView, SearchPage, TimelinePage,
};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use domains::{DomainError, Post, PostFilter, PostId, Result, SearchOptions, Visibility};
use serde::Deserialize;

/// Visibilities a collection page shows.
const COLLECTION_VISIBILITY: [Visibility; 3] =
    [Visibility::Featured, Visibility::Quiet, Visibility::Unlisted];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    pub cursor: Option<PostId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

/// Builds the per-request render context. Settings failures fall back to the
/// configured site so error pages still render.
pub async fn render_context(state: &AppState, headers: &HeaderMap) -> RenderContext {
    let site = match state.settings_service().site().await {
        Ok(site) => site,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to configured site settings");
            (*state.site).clone()
        }
    };
    let accept = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let locale = negotiate(accept, &site.language);
    RenderContext::new(locale, site)
}

/// Turns a page result into a response, rendering 404 and 500 pages.
fn respond(ctx: RenderContext, result: Result<String>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(DomainError::NotFound(..)) => not_found(ctx),
        Err(e) => {
            tracing::error!(error = %e, "page failed to render");
            let body = render(&ErrorPage::internal(ctx)).unwrap_or_default();
            (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
        }
    }
}

fn not_found(ctx: RenderContext) -> Response {
    let body = render(&ErrorPage::not_found(ctx)).unwrap_or_default();
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

fn next_url(base: &str, cursor: Option<PostId>) -> String {
    cursor
        .map(|c| format!("{base}?cursor={c}"))
        .unwrap_or_default()
}

pub async fn timeline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Response {
    let ctx = render_context(&state, &headers).await;
    let result = timeline_html(&state, &ctx, params.cursor).await;
    respond(ctx, result)
}

async fn timeline_html(state: &AppState, ctx: &RenderContext, cursor: Option<PostId>) -> Result<String> {
    let filter = PostFilter {
        visibility: Some(Visibility::LISTED.to_vec()),
        exclude_replies: true,
        ..Default::default()
    };
    let page = state.post_service().list(&filter, cursor, None).await?;
    render(&TimelinePage {
        ctx: ctx.clone(),
        posts: PostView::build_all(&page.items, &state.ids)?,
        next_url: next_url("/", page.next_cursor),
    })
}

pub async fn post_by_sqid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sqid): Path<String>,
) -> Response {
    let ctx = render_context(&state, &headers).await;
    let result = match state.ids.decode(&sqid) {
        Some(id) => thread_html(&state, &ctx, id).await,
        None => Err(DomainError::not_found("post", &sqid)),
    };
    respond(ctx, result)
}

/// The thread containing `id`, or not-found for drafts.
async fn thread_html(state: &AppState, ctx: &RenderContext, id: PostId) -> Result<String> {
    let mut thread = state.post_service().thread(id).await?;
    if !thread.root.visibility.is_reachable() {
        return Err(DomainError::not_found("post", id));
    }
    // A reply whose own visibility was changed to draft stays hidden.
    thread.replies.retain(|p: &Post| p.visibility.is_reachable());
    if !thread.replies.iter().any(|p| p.id == id) && thread.root.id != id {
        return Err(DomainError::not_found("post", id));
    }
    render(&PostPage::new(ctx.clone(), &thread.root, &thread.replies, &state.ids)?)
}

pub async fn collection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    let ctx = render_context(&state, &headers).await;
    let result = collection_html(&state, &ctx, &slug, params.cursor).await;
    respond(ctx, result)
}

async fn collection_html(
    state: &AppState,
    ctx: &RenderContext,
    slug: &str,
    cursor: Option<PostId>,
) -> Result<String> {
    let service = state.collection_service();
    let collection = service.get_by_slug(slug).await?;
    let filter = PostFilter {
        visibility: Some(COLLECTION_VISIBILITY.to_vec()),
        ..Default::default()
    };
    let page = service.posts(collection.id, filter, cursor, None).await?;
    render(&CollectionPage {
        ctx: ctx.clone(),
        title: collection.title,
        description: collection.description.unwrap_or_default(),
        posts: PostView::build_all(&page.items, &state.ids)?,
        next_url: next_url(&format!("/c/{}", collection.slug), page.next_cursor),
    })
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> Response {
    let ctx = render_context(&state, &headers).await;
    let result = search_html(&state, &ctx, params.q).await;
    respond(ctx, result)
}

async fn search_html(state: &AppState, ctx: &RenderContext, query: String) -> Result<String> {
    let hits = state
        .search_service()
        .search(&query, SearchOptions::default())
        .await?;
    let hits = hits
        .iter()
        .map(|hit| HitView::build(hit, &state.ids))
        .collect::<Result<Vec<_>>>()?;
    render(&SearchPage {
        ctx: ctx.clone(),
        searched: !query.trim().is_empty(),
        query,
        hits,
    })
}

/// Anything no route claimed: a post at a custom path, then a redirect,
/// then 404.
pub async fn fallback(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = render_context(&state, &headers).await;
    if method != Method::GET && method != Method::HEAD {
        return not_found(ctx);
    }

    let path = uri.path();
    match state.post_service().get_by_path(path).await {
        Ok(Some(post)) if post.visibility.is_reachable() => {
            let result = thread_html(&state, &ctx, post.id).await;
            return respond(ctx, result);
        }
        Ok(_) => {}
        Err(e) => return respond(ctx, Err(e)),
    }

    match state.redirect_service().resolve(path).await {
        Ok(Some(redirect)) => {
            let status = StatusCode::from_u16(redirect.redirect_type.status())
                .unwrap_or(StatusCode::MOVED_PERMANENTLY);
            tracing::debug!(from = %redirect.from_path, to = %redirect.to_path, %status, "redirecting");
            (status, [(header::LOCATION, redirect.to_path)]).into_response()
        }
        Ok(None) => not_found(ctx),
        Err(e) => respond(ctx, Err(e)),
    }
}
