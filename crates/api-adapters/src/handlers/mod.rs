//! Request handlers, grouped by surface.

pub mod api;
pub mod feeds;
pub mod pages;
