//! # PostService
//!
//! Post lifecycle and thread rules:
//! - a reply joins its parent's thread (`thread_id` always names the root)
//!   and takes the root's visibility, whatever the caller asked for
//! - changing a root's visibility cascades to every post of the thread
//! - deleting a root soft-deletes the whole thread, deleting a reply only
//!   the reply
//!
//! The root update and the cascade are two separate statements with no
//! transaction around them; an interruption in between leaves the replies
//! with the old visibility.

use crate::markdown;
use crate::paths::{normalize_post_path, source_domain};
use chrono::Utc;
use domains::{
    CreatePost, DomainError, NewPost, Page, PageQuery, Post, PostFilter, PostId, PostRepo,
    PostType, Result, Thread, UpdatePost, Visibility,
};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Visibility given to new roots when the caller does not pick one.
pub const DEFAULT_VISIBILITY: Visibility = Visibility::Quiet;

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Trims a text field; blank means absent.
fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Markdown keeps its inner whitespace, only blank content is dropped.
fn clean_content(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Type-specific requirements on a post's fields.
fn validate(
    post_type: PostType,
    title: Option<&str>,
    content: Option<&str>,
    source_url: Option<&str>,
    path: Option<&str>,
) -> Result<()> {
    match post_type {
        PostType::Article if title.is_none() => {
            Err(DomainError::validation("articles require a title"))
        }
        PostType::Link if source_url.is_none() => {
            Err(DomainError::validation("links require a source_url"))
        }
        PostType::Page if path.is_none() => Err(DomainError::validation("pages require a path")),
        PostType::Note | PostType::Quote if content.is_none() => Err(DomainError::validation(
            format!("{post_type} posts require content"),
        )),
        _ => {
            if let Some(url) = source_url {
                if source_domain(url).is_none() {
                    return Err(DomainError::validation(format!(
                        "source_url '{url}' must be an http(s) URL"
                    )));
                }
            }
            Ok(())
        }
    }
}

pub struct PostService {
    posts: Arc<dyn PostRepo>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepo>) -> Self {
        Self { posts }
    }

    /// Loads a post, soft-deleted or not.
    async fn require(&self, id: PostId) -> Result<Post> {
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn require_live(&self, id: PostId) -> Result<Post> {
        match self.posts.get_post(id).await? {
            Some(post) if !post.is_deleted() => Ok(post),
            _ => Err(DomainError::not_found("post", id)),
        }
    }

    async fn ensure_path_free(&self, path: &str, owner: Option<PostId>) -> Result<()> {
        match self.posts.get_post_by_path(path).await? {
            Some(existing) if Some(existing.id) != owner => Err(DomainError::Conflict(format!(
                "path '{path}' is already used by post {}",
                existing.id
            ))),
            _ => Ok(()),
        }
    }

    /// Creates a root post or, with `reply_to_id`, a reply.
    ///
    /// Reply linkage reads the parent's stored row without checking
    /// `deleted_at`, so replying to a soft-deleted post still resolves its
    /// thread and visibility.
    pub async fn create(&self, input: CreatePost) -> Result<Post> {
        let now = Utc::now();
        let post_type = input.post_type.unwrap_or(PostType::Note);
        let mut visibility = input.visibility.unwrap_or(DEFAULT_VISIBILITY);

        let thread_id = match input.reply_to_id {
            Some(parent_id) => {
                let parent = self.require(parent_id).await?;
                let thread_id = parent.thread_id.unwrap_or(parent.id);
                let root = if parent.is_root() {
                    parent
                } else {
                    self.require(thread_id).await?
                };
                if input.visibility.is_some_and(|v| v != root.visibility) {
                    tracing::debug!(
                        parent_id,
                        root_id = root.id,
                        "ignoring requested visibility on reply, inheriting from root"
                    );
                }
                visibility = root.visibility;
                Some(thread_id)
            }
            None => None,
        };

        let title = clean(input.title);
        let content = clean_content(input.content);
        let source_url = clean(input.source_url);
        let path = match input.path {
            Some(raw) => normalize_post_path(&raw)?,
            None => None,
        };
        validate(
            post_type,
            title.as_deref(),
            content.as_deref(),
            source_url.as_deref(),
            path.as_deref(),
        )?;
        if let Some(path) = &path {
            self.ensure_path_free(path, None).await?;
        }

        let domain = clean(input.source_domain)
            .or_else(|| source_url.as_deref().and_then(source_domain));

        let new_post = NewPost {
            post_type,
            visibility,
            title,
            path,
            content_html: content.as_deref().map(markdown::render),
            content,
            source_url,
            source_name: clean(input.source_name),
            source_domain: domain,
            reply_to_id: input.reply_to_id,
            thread_id,
            published_at: input.published_at.unwrap_or(now),
            created_at: now,
        };

        let post = self.posts.insert_post(new_post).await?;
        tracing::info!(
            post_id = post.id,
            thread_id = ?post.thread_id,
            visibility = %post.visibility,
            post_type = %post.post_type,
            "post created"
        );
        Ok(post)
    }

    /// Applies a partial update. A visibility given for a thread root is
    /// pushed down to every reply; on a reply it stays local.
    pub async fn update(&self, id: PostId, input: UpdatePost) -> Result<Post> {
        let now = Utc::now();
        let mut post = self.require_live(id).await?;

        if let Some(post_type) = input.post_type {
            post.post_type = post_type;
        }
        if let Some(visibility) = input.visibility {
            post.visibility = visibility;
        }
        if let Some(title) = input.title {
            post.title = clean(Some(title));
        }
        if let Some(content) = input.content {
            post.content = clean_content(Some(content));
            post.content_html = post.content.as_deref().map(markdown::render);
        }
        if let Some(raw) = input.path {
            post.path = normalize_post_path(&raw)?;
            if let Some(path) = &post.path {
                self.ensure_path_free(path, Some(post.id)).await?;
            }
        }
        if let Some(url) = input.source_url {
            post.source_url = clean(Some(url));
            if input.source_domain.is_none() {
                post.source_domain = post.source_url.as_deref().and_then(source_domain);
            }
        }
        if let Some(name) = input.source_name {
            post.source_name = clean(Some(name));
        }
        if let Some(domain) = input.source_domain {
            post.source_domain = clean(Some(domain));
        }
        if let Some(published_at) = input.published_at {
            post.published_at = published_at;
        }

        validate(
            post.post_type,
            post.title.as_deref(),
            post.content.as_deref(),
            post.source_url.as_deref(),
            post.path.as_deref(),
        )?;

        post.updated_at = now;
        self.posts.update_post(&post).await?;

        match input.visibility {
            Some(visibility) if post.is_root() => {
                let touched = self
                    .posts
                    .cascade_visibility(post.id, visibility, now)
                    .await?;
                tracing::info!(
                    post_id = post.id,
                    visibility = %visibility,
                    replies = touched,
                    "thread visibility cascaded"
                );
            }
            Some(visibility) => {
                tracing::debug!(
                    post_id = post.id,
                    thread_id = ?post.thread_id,
                    visibility = %visibility,
                    "reply visibility changed without cascade"
                );
            }
            None => {}
        }

        Ok(post)
    }

    /// Soft-deletes a post; for a root the whole thread goes with it.
    /// Returns the number of rows marked deleted.
    pub async fn delete(&self, id: PostId) -> Result<u64> {
        let post = self.require_live(id).await?;
        let now = Utc::now();

        let deleted = if post.is_root() {
            self.posts.soft_delete_thread(post.id, now).await?
        } else {
            self.posts.soft_delete_post(post.id, now).await?
        };
        tracing::info!(post_id = id, root = post.is_root(), deleted, "post deleted");
        Ok(deleted)
    }

    pub async fn get(&self, id: PostId) -> Result<Post> {
        self.require_live(id).await
    }

    /// Live post at a custom path.
    pub async fn get_by_path(&self, raw_path: &str) -> Result<Option<Post>> {
        match normalize_post_path(raw_path) {
            Ok(Some(path)) => self.posts.get_post_by_path(&path).await,
            _ => Ok(None),
        }
    }

    /// The thread containing `id`: its root plus the root's live replies.
    pub async fn thread(&self, id: PostId) -> Result<Thread> {
        let post = self.require_live(id).await?;
        let root = if post.is_root() {
            post
        } else {
            self.require_live(post.root_id()).await?
        };
        let replies = self.posts.thread_replies(root.id).await?;
        Ok(Thread { root, replies })
    }

    /// One page of posts, newest first. Fetches `limit + 1` rows so that
    /// `has_more` needs no separate count.
    pub async fn list(
        &self,
        filter: &PostFilter,
        cursor: Option<PostId>,
        limit: Option<u32>,
    ) -> Result<Page<Post>> {
        let limit = clamp_limit(limit);
        let mut rows = self
            .posts
            .list_posts(
                filter,
                PageQuery {
                    cursor,
                    limit: limit + 1,
                },
            )
            .await?;

        let has_more = rows.len() > limit as usize;
        rows.truncate(limit as usize);
        let next_cursor = if has_more {
            rows.last().map(|p| p.id)
        } else {
            None
        };

        Ok(Page {
            items: rows,
            has_more,
            next_cursor,
        })
    }

    /// Latest listed roots, for feeds and the sitemap.
    pub async fn latest_public(&self, limit: u32) -> Result<Vec<Post>> {
        let filter = PostFilter {
            visibility: Some(Visibility::LISTED.to_vec()),
            exclude_replies: true,
            ..Default::default()
        };
        Ok(self.list(&filter, None, Some(limit)).await?.items)
    }

    /// Listed roots plus every reachable page, newest first.
    pub async fn sitemap_entries(&self, limit: u32) -> Result<Vec<Post>> {
        let mut entries = self.latest_public(limit).await?;
        let pages = PostFilter {
            post_type: Some(PostType::Page),
            visibility: Some(vec![Visibility::Featured, Visibility::Quiet, Visibility::Unlisted]),
            exclude_replies: true,
            ..Default::default()
        };
        for page in self.list(&pages, None, Some(limit)).await?.items {
            if !entries.iter().any(|p| p.id == page.id) {
                entries.push(page);
            }
        }
        entries.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}

/// Builds the stored row a repository would return for `new_post`.
#[cfg(test)]
pub(crate) fn stored(id: PostId, new_post: NewPost) -> Post {
    Post {
        id,
        post_type: new_post.post_type,
        visibility: new_post.visibility,
        title: new_post.title,
        path: new_post.path,
        content: new_post.content,
        content_html: new_post.content_html,
        source_url: new_post.source_url,
        source_name: new_post.source_name,
        source_domain: new_post.source_domain,
        reply_to_id: new_post.reply_to_id,
        thread_id: new_post.thread_id,
        published_at: new_post.published_at,
        created_at: new_post.created_at,
        updated_at: new_post.created_at,
        deleted_at: None,
    }
}

#[cfg(test)]
pub(crate) fn sample_post(id: PostId, thread_id: Option<PostId>, visibility: Visibility) -> Post {
    let at = chrono::DateTime::from_timestamp(1_700_000_000 + id, 0).unwrap_or_default();
    Post {
        id,
        post_type: PostType::Note,
        visibility,
        title: None,
        path: None,
        content: Some(format!("post {id}")),
        content_html: Some(format!("<p>post {id}</p>\n")),
        source_url: None,
        source_name: None,
        source_domain: None,
        reply_to_id: thread_id,
        thread_id,
        published_at: at,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}
