//! taskpress API client
//!
//! Registry tokens and config lookups for local builds.

pub mod client;
pub mod error;
pub mod retry;

pub use client::{ApiClient, DEFAULT_HOST};
pub use error::{ApiError, ApiResult};
pub use retry::RetryConfig;
