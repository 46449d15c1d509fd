//! Application services for Jant.
//!
//! Each service is a thin, request-scoped object over the repository ports
//! in `domains`; construct one per request and drop it afterwards.

pub mod collections;
pub mod feeds;
pub mod ids;
pub mod markdown;
pub mod media;
pub mod paths;
pub mod posts;
pub mod redirects;
pub mod search;
pub mod settings;

pub use collections::CollectionService;
pub use ids::IdCodec;
pub use media::{MediaPolicy, MediaService, Upload};
pub use posts::PostService;
pub use redirects::{RedirectInput, RedirectService};
pub use search::SearchService;
pub use settings::{SettingsService, SiteInfo};
