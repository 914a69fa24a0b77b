//! Status Cat Cache Library
//!
//! Read-through disk cache in front of an HTTP status cat image source.

pub mod error;
pub mod server;
pub mod types;
pub mod upstream;

pub use error::{CacheError, Result, StartupError, UpstreamError};
pub use server::{create_router, start_server, ServerState, SharedState};
pub use types::CacheConfig;
pub use upstream::{CatFetcher, Upstream};
