//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the binary.

use crate::error::Result;
use crate::models::{
    Collection, CollectionId, Media, MediaId, NewCollection, NewMedia, NewPost, NewRedirect, Post,
    PostFilter, PostId, PageQuery, Redirect, RedirectId, SearchHit, SearchOptions, Setting,
    Visibility,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Persistence contract for posts and threads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Inserts a resolved post and returns the stored row.
    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    /// Fetches a post by id, soft-deleted rows included.
    async fn get_post(&self, id: PostId) -> Result<Option<Post>>;

    /// Fetches a live post by its custom path.
    async fn get_post_by_path(&self, path: &str) -> Result<Option<Post>>;

    /// Writes every mutable column of `post` back to its row.
    async fn update_post(&self, post: &Post) -> Result<()>;

    /// Sets `visibility` on every row whose `thread_id` is `root_id`.
    /// Returns the number of rows touched.
    async fn cascade_visibility(
        &self,
        root_id: PostId,
        visibility: Visibility,
        at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Soft-deletes a single row.
    async fn soft_delete_post(&self, id: PostId, at: DateTime<Utc>) -> Result<u64>;

    /// Soft-deletes a root and every row of its thread in one statement.
    async fn soft_delete_thread(&self, root_id: PostId, at: DateTime<Utc>) -> Result<u64>;

    /// Lists posts matching `filter` ordered by `published_at DESC, id DESC`,
    /// fetching at most `page.limit` rows below `page.cursor`.
    async fn list_posts(&self, filter: &PostFilter, page: PageQuery) -> Result<Vec<Post>>;

    /// Live replies of a thread, oldest first.
    async fn thread_replies(&self, root_id: PostId) -> Result<Vec<Post>>;

    /// Runs an already-built full-text match expression.
    async fn search_posts(&self, match_expr: &str, opts: &SearchOptions) -> Result<Vec<SearchHit>>;
}

/// Persistence contract for collections and their membership.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CollectionRepo: Send + Sync {
    async fn insert_collection(&self, collection: NewCollection) -> Result<Collection>;
    async fn get_collection(&self, id: CollectionId) -> Result<Option<Collection>>;
    async fn get_collection_by_slug(&self, slug: &str) -> Result<Option<Collection>>;
    async fn list_collections(&self) -> Result<Vec<Collection>>;
    async fn update_collection(&self, collection: &Collection) -> Result<()>;
    /// Deletes the collection and its memberships; returns false when absent.
    async fn delete_collection(&self, id: CollectionId) -> Result<bool>;
    /// Idempotent: adding an existing member keeps its original `added_at`.
    async fn add_post(&self, id: CollectionId, post_id: PostId, at: DateTime<Utc>) -> Result<()>;
    async fn remove_post(&self, id: CollectionId, post_id: PostId) -> Result<bool>;
}

/// Persistence contract for media records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaRepo: Send + Sync {
    async fn insert_media(&self, media: NewMedia) -> Result<Media>;
    async fn get_media(&self, id: MediaId) -> Result<Option<Media>>;
    /// Newest first.
    async fn list_media(&self, limit: u32, offset: u32) -> Result<Vec<Media>>;
    async fn delete_media(&self, id: MediaId) -> Result<bool>;
}

/// Persistence contract for path redirects.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RedirectRepo: Send + Sync {
    /// Removes any redirect from the same path, then inserts this one.
    async fn replace_redirect(&self, redirect: NewRedirect) -> Result<Redirect>;
    async fn find_redirect(&self, from_path: &str) -> Result<Option<Redirect>>;
    async fn list_redirects(&self) -> Result<Vec<Redirect>>;
    async fn delete_redirect(&self, id: RedirectId) -> Result<bool>;
}

/// Key-value site settings with upsert semantics.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<Setting>>;
    async fn upsert_setting(&self, key: &str, value: &str, at: DateTime<Utc>) -> Result<Setting>;
    async fn delete_setting(&self, key: &str) -> Result<bool>;
    async fn all_settings(&self) -> Result<Vec<Setting>>;
}

/// Object storage contract for media bytes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores `data` under `key`, overwriting any previous object.
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;
    /// Removes the object; missing objects are not an error.
    async fn delete_object(&self, key: &str) -> Result<()>;
    /// Returns the public URL of the object.
    fn public_url(&self, key: &str) -> String;
}

/// Credentials check for the management API.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies a bearer token presented by an API client.
    async fn verify_api_token(&self, token: &str) -> bool;
}

/// Liveness probe of a backing store.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<()>;
}
