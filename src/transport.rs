//! HTTP transports: the completion endpoint and shared credential lookup.

pub mod credentials;
pub mod http;

pub use crate::error::TransportError;
pub use http::HttpCompletionService;
