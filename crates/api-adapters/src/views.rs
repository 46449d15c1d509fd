//! HTML views for the public site.
//!
//! View models hold plain strings (empty means absent) so the templates stay
//! free of `Option` plumbing.

use crate::i18n::RenderContext;
use askama::Template;
use domains::{DomainError, Post, Result, SearchHit, Visibility};
use services::feeds::display_title;
use services::IdCodec;

/// A post as the templates see it.
#[derive(Debug, Clone)]
pub struct PostView {
    pub url: String,
    pub title: String,
    /// Rendered markdown; trusted author content
    pub html: String,
    pub kind: &'static str,
    pub featured: bool,
    pub published: String,
    pub published_iso: String,
    pub source_url: String,
    pub source_label: String,
}

impl PostView {
    pub fn build(post: &Post, ids: &IdCodec) -> Result<Self> {
        let source_label = post
            .source_name
            .clone()
            .or_else(|| post.source_domain.clone())
            .or_else(|| post.source_url.clone())
            .unwrap_or_default();
        Ok(Self {
            url: ids.post_path(post)?,
            title: post.title.clone().unwrap_or_default(),
            html: post.content_html.clone().unwrap_or_default(),
            kind: post.post_type.as_str(),
            featured: post.visibility == Visibility::Featured,
            published: post.published_at.format("%Y-%m-%d").to_string(),
            published_iso: post.published_at.to_rfc3339(),
            source_url: post.source_url.clone().unwrap_or_default(),
            source_label,
        })
    }

    pub fn build_all(posts: &[Post], ids: &IdCodec) -> Result<Vec<Self>> {
        posts.iter().map(|p| Self::build(p, ids)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct HitView {
    pub url: String,
    pub title: String,
    /// Escaped excerpt with `<mark>` highlights restored
    pub snippet: String,
}

impl HitView {
    pub fn build(hit: &SearchHit, ids: &IdCodec) -> Result<Self> {
        Ok(Self {
            url: ids.post_path(&hit.post)?,
            title: hit.post.title.clone().unwrap_or_default(),
            snippet: highlight(&hit.snippet),
        })
    }
}

/// Escapes an index snippet while keeping its highlight markers.
pub fn highlight(snippet: &str) -> String {
    html_escape::encode_text(snippet)
        .replace("&lt;mark&gt;", "<mark>")
        .replace("&lt;/mark&gt;", "</mark>")
}

#[derive(Template)]
#[template(path = "timeline.html")]
pub struct TimelinePage {
    pub ctx: RenderContext,
    pub posts: Vec<PostView>,
    pub next_url: String,
}

/// A thread: the root first, then its replies.
#[derive(Template)]
#[template(path = "post.html")]
pub struct PostPage {
    pub ctx: RenderContext,
    pub title: String,
    pub thread: Vec<PostView>,
}

impl PostPage {
    pub fn new(ctx: RenderContext, root: &Post, replies: &[Post], ids: &IdCodec) -> Result<Self> {
        let mut thread = Vec::with_capacity(replies.len() + 1);
        thread.push(PostView::build(root, ids)?);
        thread.extend(PostView::build_all(replies, ids)?);
        Ok(Self {
            ctx,
            title: display_title(root),
            thread,
        })
    }
}

#[derive(Template)]
#[template(path = "collection.html")]
pub struct CollectionPage {
    pub ctx: RenderContext,
    pub title: String,
    pub description: String,
    pub posts: Vec<PostView>,
    pub next_url: String,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchPage {
    pub ctx: RenderContext,
    pub query: String,
    pub searched: bool,
    pub hits: Vec<HitView>,
}

/// Not-found and generic failure pages; `heading` and `body` are i18n keys.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub ctx: RenderContext,
    pub heading: &'static str,
    pub body: &'static str,
}

impl ErrorPage {
    pub fn not_found(ctx: RenderContext) -> Self {
        Self {
            ctx,
            heading: "not_found",
            body: "not_found_body",
        }
    }

    pub fn internal(ctx: RenderContext) -> Self {
        Self {
            ctx,
            heading: "error",
            body: "error_body",
        }
    }
}

/// Renders a template, mapping engine failures to internal errors.
pub fn render<T: Template>(page: &T) -> Result<String> {
    page.render().map_err(DomainError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use chrono::DateTime;
    use domains::PostType;
    use services::SiteInfo;

    fn ctx() -> RenderContext {
        RenderContext::new(
            Locale::En,
            SiteInfo {
                name: "My <Site>".into(),
                description: String::new(),
                language: "en".into(),
                base_url: "http://localhost".into(),
            },
        )
    }

    fn post(id: i64) -> Post {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        Post {
            id,
            post_type: PostType::Article,
            visibility: Visibility::Featured,
            title: Some("Hello & welcome".into()),
            path: Some("hello".into()),
            content: Some("**hi**".into()),
            content_html: Some("<p><strong>hi</strong></p>".into()),
            source_url: None,
            source_name: None,
            source_domain: None,
            reply_to_id: None,
            thread_id: None,
            published_at: at,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn snippet_highlights_survive_escaping() {
        assert_eq!(
            highlight("<mark>rust</mark> <script>"),
            "<mark>rust</mark> &lt;script&gt;"
        );
        assert_eq!(highlight("fish & <mark>chips</mark>"), "fish &amp; <mark>chips</mark>");
    }

    #[test]
    fn post_page_renders_content_and_escapes_titles() {
        let ids = IdCodec::new(5).unwrap();
        let page = PostPage::new(ctx(), &post(1), &[], &ids).unwrap();
        let html = render(&page).unwrap();
        assert!(html.contains("<p><strong>hi</strong></p>"));
        // askama escapes `&` numerically
        assert!(html.contains("Hello &#38; welcome"));
        assert!(!html.contains("Hello & welcome"));
        assert!(html.contains("My &#60;Site&#62;"));
        assert!(!html.contains("My <Site>"));
        assert!(html.contains("href=\"/hello\""));
        assert!(html.contains("lang=\"en\""));
    }

    #[test]
    fn error_page_is_localized() {
        let mut c = ctx();
        c.locale = Locale::ZhHant;
        let html = render(&ErrorPage::not_found(c)).unwrap();
        assert!(html.contains("找不到"));
    }
}
