//! Connection to the core: socket setup with bounded retry, and the
//! request/response client for the API channel.

pub mod client;
pub mod error;
pub mod manager;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use manager::{Connection, RetryPolicy};
