//! Management API handlers (JSON, behind the bearer-token middleware).

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use domains::{
    Collection, CollectionId, CollectionInput, CreatePost, DomainError, Media, MediaId, Page, Post,
    PostFilter, PostId, PostType, Redirect, RedirectId, SearchHit, SearchOptions, Setting, Thread,
    UpdatePost, Visibility,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use services::{RedirectInput, Upload};

/// A post plus its public addresses.
#[derive(Debug, Serialize)]
pub struct PostBody {
    #[serde(flatten)]
    pub post: Post,
    pub sqid: String,
    pub url: String,
}

impl PostBody {
    fn build(state: &AppState, post: Post) -> ApiResult<Self> {
        Ok(Self {
            sqid: state.ids.encode(post.id)?,
            url: state.ids.post_path(&post)?,
            post,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MediaBody {
    #[serde(flatten)]
    pub media: Media,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListPostsParams {
    pub cursor: Option<PostId>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    /// Comma-separated allow-list, e.g. `featured,quiet`
    pub visibility: Option<String>,
    pub thread_id: Option<PostId>,
    pub collection_id: Option<CollectionId>,
    pub exclude_replies: bool,
    pub include_deleted: bool,
}

fn parse_visibility(raw: &str) -> Result<Vec<Visibility>, DomainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .collect()
}

// -- posts --

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> ApiResult<Json<Page<Post>>> {
    let filter = PostFilter {
        post_type: params.post_type,
        visibility: params.visibility.as_deref().map(parse_visibility).transpose()?,
        exclude_replies: params.exclude_replies,
        thread_id: params.thread_id,
        collection_id: params.collection_id,
        include_deleted: params.include_deleted,
    };
    let page = state
        .post_service()
        .list(&filter, params.cursor, params.limit)
        .await?;
    Ok(Json(page))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePost>,
) -> ApiResult<(StatusCode, Json<PostBody>)> {
    let post = state.post_service().create(input).await?;
    Ok((StatusCode::CREATED, Json(PostBody::build(&state, post)?)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> ApiResult<Json<PostBody>> {
    let post = state.post_service().get(id).await?;
    Ok(Json(PostBody::build(&state, post)?))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Json(input): Json<UpdatePost>,
) -> ApiResult<Json<PostBody>> {
    let post = state.post_service().update(id, input).await?;
    Ok(Json(PostBody::build(&state, post)?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Value>> {
    let deleted = state.post_service().delete(id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Thread>> {
    Ok(Json(state.post_service().thread(id).await?))
}

// -- search --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub visibility: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let defaults = SearchOptions::default();
    let opts = SearchOptions {
        limit: params.limit.unwrap_or(defaults.limit),
        offset: params.offset.unwrap_or(defaults.offset),
        visibility: match params.visibility.as_deref() {
            Some(raw) => parse_visibility(raw)?,
            None => defaults.visibility,
        },
    };
    Ok(Json(state.search_service().search(&params.q, opts).await?))
}

// -- media --

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MediaBody>)> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut alt = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some((file_name, content_type, data));
            }
            Some("alt") => alt = Some(field.text().await?),
            _ => {}
        }
    }

    let (original_name, content_type, data) =
        file.ok_or_else(|| ApiError::BadRequest("multipart field 'file' is required".into()))?;

    let service = state.media_service();
    let media = service
        .upload(Upload {
            original_name,
            content_type,
            data,
            alt,
        })
        .await?;
    let url = service.url(&media);
    Ok((StatusCode::CREATED, Json(MediaBody { media, url })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MediaParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<MediaParams>,
) -> ApiResult<Json<Vec<MediaBody>>> {
    let service = state.media_service();
    let items = service
        .list(params.limit.unwrap_or(50), params.offset.unwrap_or(0))
        .await?
        .into_iter()
        .map(|media| MediaBody {
            url: service.url(&media),
            media,
        })
        .collect();
    Ok(Json(items))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<MediaId>,
) -> ApiResult<StatusCode> {
    state.media_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- collections --

pub async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<Vec<Collection>>> {
    Ok(Json(state.collection_service().list().await?))
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(input): Json<CollectionInput>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let collection = state.collection_service().create(input).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> ApiResult<Json<Collection>> {
    Ok(Json(state.collection_service().get(id).await?))
}

pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Json(input): Json<CollectionInput>,
) -> ApiResult<Json<Collection>> {
    Ok(Json(state.collection_service().update(id, input).await?))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> ApiResult<StatusCode> {
    state.collection_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CursorParams {
    pub cursor: Option<PostId>,
    pub limit: Option<u32>,
}

pub async fn collection_posts(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Query(params): Query<CursorParams>,
) -> ApiResult<Json<Page<Post>>> {
    let page = state
        .collection_service()
        .posts(id, PostFilter::default(), params.cursor, params.limit)
        .await?;
    Ok(Json(page))
}

pub async fn add_collection_post(
    State(state): State<AppState>,
    Path((id, post_id)): Path<(CollectionId, PostId)>,
) -> ApiResult<StatusCode> {
    state.collection_service().add_post(id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_collection_post(
    State(state): State<AppState>,
    Path((id, post_id)): Path<(CollectionId, PostId)>,
) -> ApiResult<StatusCode> {
    state.collection_service().remove_post(id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- redirects --

pub async fn list_redirects(State(state): State<AppState>) -> ApiResult<Json<Vec<Redirect>>> {
    Ok(Json(state.redirect_service().list().await?))
}

pub async fn create_redirect(
    State(state): State<AppState>,
    Json(input): Json<RedirectInput>,
) -> ApiResult<(StatusCode, Json<Redirect>)> {
    let redirect = state.redirect_service().create(input).await?;
    Ok((StatusCode::CREATED, Json(redirect)))
}

pub async fn delete_redirect(
    State(state): State<AppState>,
    Path(id): Path<RedirectId>,
) -> ApiResult<StatusCode> {
    state.redirect_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- settings --

#[derive(Debug, Deserialize)]
pub struct SettingValue {
    pub value: String,
}

pub async fn list_settings(State(state): State<AppState>) -> ApiResult<Json<Vec<Setting>>> {
    Ok(Json(state.settings_service().all().await?))
}

pub async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<SettingValue>,
) -> ApiResult<Json<Setting>> {
    Ok(Json(state.settings_service().set(&key, &body.value).await?))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    state.settings_service().delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_lists_parse() {
        assert_eq!(
            parse_visibility("featured, quiet").unwrap(),
            vec![Visibility::Featured, Visibility::Quiet]
        );
        assert!(parse_visibility("featured,hidden").is_err());
        assert!(parse_visibility("").unwrap().is_empty());
    }
}
