//! The central domain types and interface definitions for Jant.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use std::str::FromStr;

    #[test]
    fn reply_reports_its_root() {
        let now = chrono::Utc::now();
        let post = Post {
            id: 7,
            post_type: PostType::Note,
            visibility: Visibility::Quiet,
            title: None,
            path: None,
            content: Some("Hello Rust!".to_string()),
            content_html: None,
            source_url: None,
            source_name: None,
            source_domain: None,
            reply_to_id: Some(5),
            thread_id: Some(3),
            published_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(!post.is_root());
        assert_eq!(post.root_id(), 3);
    }

    #[test]
    fn enums_parse_their_wire_names() {
        assert_eq!(PostType::from_str("article").unwrap(), PostType::Article);
        assert_eq!(Visibility::from_str("unlisted").unwrap(), Visibility::Unlisted);
        assert!(Visibility::from_str("public").is_err());
        assert!(Visibility::Quiet.is_listed());
        assert!(!Visibility::Unlisted.is_listed());
        assert!(!Visibility::Draft.is_reachable());
    }

    #[test]
    fn redirect_type_serializes_as_status_code() {
        let json = serde_json::to_string(&RedirectType::Temporary).unwrap();
        assert_eq!(json, "302");
        let parsed: RedirectType = serde_json::from_str("301").unwrap();
        assert_eq!(parsed, RedirectType::Permanent);
        assert!(serde_json::from_str::<RedirectType>("307").is_err());
    }
}
