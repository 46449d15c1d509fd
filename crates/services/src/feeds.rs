//! RSS, sitemap and robots.txt documents.

use crate::ids::IdCodec;
use crate::markdown;
use crate::settings::SiteInfo;
use domains::{Post, Result};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

const TITLE_EXCERPT_CHARS: usize = 80;

/// Title shown for a post in feeds: its title, else an excerpt of its content.
pub fn display_title(post: &Post) -> String {
    post.title.clone().unwrap_or_else(|| {
        post.content
            .as_deref()
            .map(|c| markdown::excerpt(c, TITLE_EXCERPT_CHARS))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| post.post_type.to_string())
    })
}

fn rss_item(site: &SiteInfo, ids: &IdCodec, post: &Post) -> Result<String> {
    let link = format!("{}{}", site.base_url, ids.post_path(post)?);
    let description = post
        .content_html
        .as_deref()
        .map(|html| format!("<description>{}</description>\n", text(html)))
        .unwrap_or_default();
    let comments = post
        .source_url
        .as_deref()
        .map(|source| format!("<comments>{}</comments>\n", text(source)))
        .unwrap_or_default();
    Ok(format!(
        "<item>\n\
         <title>{title}</title>\n\
         <link>{link}</link>\n\
         <guid isPermaLink=\"true\">{link}</guid>\n\
         <pubDate>{date}</pubDate>\n\
         {description}{comments}</item>\n",
        title = text(&display_title(post)),
        link = text(&link),
        date = post.published_at.to_rfc2822(),
    ))
}

/// RSS 2.0 channel over `posts`, newest first as given.
pub fn rss(site: &SiteInfo, ids: &IdCodec, posts: &[Post]) -> Result<String> {
    let items = posts
        .iter()
        .map(|post| rss_item(site, ids, post))
        .collect::<Result<String>>()?;
    let last_build = posts
        .first()
        .map(|latest| {
            format!(
                "<lastBuildDate>{}</lastBuildDate>\n",
                latest.published_at.to_rfc2822()
            )
        })
        .unwrap_or_default();

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n\
         <channel>\n\
         <title>{name}</title>\n\
         <link>{base}/</link>\n\
         <description>{description}</description>\n\
         <language>{language}</language>\n\
         <atom:link href=\"{base_attr}/feed\" rel=\"self\" type=\"application/rss+xml\"/>\n\
         {last_build}{items}</channel>\n\
         </rss>",
        name = text(&site.name),
        base = text(&site.base_url),
        description = text(&site.description),
        language = text(&site.language),
        base_attr = attr(&site.base_url),
    ))
}

/// Sitemap of the home page plus every given post.
pub fn sitemap(site: &SiteInfo, ids: &IdCodec, posts: &[Post]) -> Result<String> {
    let urls = posts
        .iter()
        .map(|post| -> Result<String> {
            let loc = format!("{}{}", site.base_url, ids.post_path(post)?);
            Ok(format!(
                "<url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
                text(&loc),
                post.updated_at.format("%Y-%m-%d")
            ))
        })
        .collect::<Result<String>>()?;

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
         <url><loc>{}/</loc></url>\n\
         {urls}</urlset>",
        text(&site.base_url),
    ))
}

pub fn robots(site: &SiteInfo) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {}/sitemap.xml\n",
        site.base_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::sample_post;
    use domains::Visibility;

    fn site() -> SiteInfo {
        SiteInfo {
            name: "Notes & Links".into(),
            description: "A blog".into(),
            language: "en".into(),
            base_url: "https://example.com".into(),
        }
    }

    #[test]
    fn rss_escapes_and_links_posts() {
        let ids = IdCodec::new(5).unwrap();
        let mut post = sample_post(3, None, Visibility::Featured);
        post.path = Some("hello".into());
        post.content_html = Some("<p>a & b</p>".into());

        let xml = rss(&site(), &ids, &[post]).unwrap();
        assert!(xml.contains("<title>Notes &amp; Links</title>"));
        assert!(xml.contains("<link>https://example.com/hello</link>"));
        assert!(xml.contains("&lt;p&gt;a &amp; b&lt;/p&gt;"));
        assert!(xml.contains(r#"<atom:link href="https://example.com/feed""#));
        assert!(xml.trim_end().ends_with("</channel>\n</rss>"));
    }

    #[test]
    fn empty_feed_is_still_a_channel() {
        let ids = IdCodec::new(5).unwrap();
        let xml = rss(&site(), &ids, &[]).unwrap();
        assert!(xml.contains("<channel>"));
        assert!(!xml.contains("<item>"));
        assert!(!xml.contains("lastBuildDate"));
    }

    #[test]
    fn sitemap_uses_sqid_urls_without_path() {
        let ids = IdCodec::new(5).unwrap();
        let post = sample_post(8, None, Visibility::Quiet);
        let sqid = ids.encode(8).unwrap();

        let xml = sitemap(&site(), &ids, &[post]).unwrap();
        assert!(xml.contains(&format!("https://example.com/p/{sqid}")));
    }

    #[test]
    fn robots_points_at_sitemap() {
        assert!(robots(&site()).contains("Sitemap: https://example.com/sitemap.xml"));
    }

    #[test]
    fn untitled_posts_use_content_excerpt() {
        let post = sample_post(1, None, Visibility::Quiet);
        assert_eq!(display_title(&post), "post 1");
    }
}
