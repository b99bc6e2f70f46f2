//! BeDrive API client

pub mod client;
pub mod errors;
pub mod types;

pub use client::{ApiClient, HttpApiClient, DEFAULT_BASE_URL};
pub use errors::ApiError;
pub use types::{Credentials, ItemRecord, UserRecord};
