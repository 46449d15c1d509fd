//! # api-adapters
//!
//! The HTTP layer of Jant: public HTML pages and feeds, plus the JSON
//! management API under `/api`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod routes;
pub mod state;
pub mod views;

pub use error::{ApiError, ApiResult};
pub use i18n::{Locale, RenderContext};
pub use routes::create_router;
pub use state::AppState;
