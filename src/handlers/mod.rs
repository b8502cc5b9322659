//! HTTP request handlers.

pub mod comments;
pub mod http;
pub mod posts;
pub mod profiles;
pub mod upload;

pub use http::{health, AppState, UploadSettings};
