//! # Domain Models
//!
//! These structs represent the core entities of Jant.
//! Ids are SQLite rowids; public URLs encode them as sqids.

use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type PostId = i64;
pub type CollectionId = i64;
pub type MediaId = i64;
pub type RedirectId = i64;

/// The kind of a post; drives validation and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Note,
    Article,
    Link,
    Quote,
    Image,
    Page,
}

impl PostType {
    pub const ALL: [PostType; 6] = [
        PostType::Note,
        PostType::Article,
        PostType::Link,
        PostType::Quote,
        PostType::Image,
        PostType::Page,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Note => "note",
            PostType::Article => "article",
            PostType::Link => "link",
            PostType::Quote => "quote",
            PostType::Image => "image",
            PostType::Page => "page",
        }
    }
}

impl FromStr for PostType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown post type '{s}'")))
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who gets to see a post.
///
/// `featured` and `quiet` posts are listed publicly (featured ones are
/// highlighted), `unlisted` posts are reachable by URL only and `draft`
/// posts are never served publicly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Featured,
    Quiet,
    Unlisted,
    Draft,
}

impl Visibility {
    pub const ALL: [Visibility; 4] = [
        Visibility::Featured,
        Visibility::Quiet,
        Visibility::Unlisted,
        Visibility::Draft,
    ];

    /// Visibilities that appear in public listings, feeds and search.
    pub const LISTED: [Visibility; 2] = [Visibility::Featured, Visibility::Quiet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Featured => "featured",
            Visibility::Quiet => "quiet",
            Visibility::Unlisted => "unlisted",
            Visibility::Draft => "draft",
        }
    }

    pub fn is_listed(&self) -> bool {
        Self::LISTED.contains(self)
    }

    /// Whether a post with this visibility may be served by URL.
    pub fn is_reachable(&self) -> bool {
        *self != Visibility::Draft
    }
}

impl FromStr for Visibility {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Visibility::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown visibility '{s}'")))
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fundamental unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub visibility: Visibility,
    pub title: Option<String>,
    /// Custom slug, served at `/{path}`
    pub path: Option<String>,
    /// Markdown source
    pub content: Option<String>,
    /// Rendered cache of `content`
    pub content_html: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub source_domain: Option<String>,
    pub reply_to_id: Option<PostId>,
    /// Root of the thread; `None` for roots themselves
    pub thread_id: Option<PostId>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_root(&self) -> bool {
        self.thread_id.is_none()
    }

    /// Id of the thread root this post belongs to.
    pub fn root_id(&self) -> PostId {
        self.thread_id.unwrap_or(self.id)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Caller input for creating a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePost {
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub visibility: Option<Visibility>,
    pub title: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub source_domain: Option<String>,
    pub reply_to_id: Option<PostId>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Caller input for updating a post. Absent fields are left untouched;
/// an empty string clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePost {
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub visibility: Option<Visibility>,
    pub title: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub source_domain: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A fully resolved post row, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub post_type: PostType,
    pub visibility: Visibility,
    pub title: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub content_html: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub source_domain: Option<String>,
    pub reply_to_id: Option<PostId>,
    pub thread_id: Option<PostId>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Filters for post listings. The default lists live posts of every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFilter {
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    /// Allow-list; `None` means any visibility
    pub visibility: Option<Vec<Visibility>>,
    pub exclude_replies: bool,
    pub thread_id: Option<PostId>,
    pub collection_id: Option<CollectionId>,
    pub include_deleted: bool,
}

/// A keyset window over posts ordered by `published_at DESC, id DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Only rows with `id < cursor`
    pub cursor: Option<PostId>,
    /// Number of rows to fetch
    pub limit: u32,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Option<PostId>,
}

/// A thread root and its live replies, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thread {
    pub root: Post,
    pub replies: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: u32,
    pub offset: u32,
    pub visibility: Vec<Visibility>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            visibility: Visibility::LISTED.to_vec(),
        }
    }
}

/// A post matched by full-text search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub post: Post,
    /// Highlighted excerpt produced by the search index
    pub snippet: String,
    /// Engine rank; lower is better
    pub rank: f64,
}

/// A curated, ordered group of posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCollection {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An uploaded file, stored in object storage under `r2_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub r2_key: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub alt: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMedia {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub r2_key: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub alt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// HTTP status used when answering a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RedirectType {
    Permanent,
    Temporary,
}

impl RedirectType {
    pub fn status(&self) -> u16 {
        match self {
            RedirectType::Permanent => 301,
            RedirectType::Temporary => 302,
        }
    }
}

impl TryFrom<u16> for RedirectType {
    type Error = DomainError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            301 => Ok(RedirectType::Permanent),
            302 => Ok(RedirectType::Temporary),
            other => Err(DomainError::validation(format!(
                "redirect type must be 301 or 302, got {other}"
            ))),
        }
    }
}

impl From<RedirectType> for u16 {
    fn from(t: RedirectType) -> u16 {
        t.status()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub id: RedirectId,
    pub from_path: String,
    pub to_path: String,
    #[serde(rename = "type")]
    pub redirect_type: RedirectType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRedirect {
    pub from_path: String,
    pub to_path: String,
    pub redirect_type: RedirectType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
