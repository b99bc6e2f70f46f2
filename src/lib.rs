//! BeDrive client core
//!
//! Repository and cache layer for the BeDrive remote file-storage service:
//! an authenticated HTTP client, a per-folder listing cache with change
//! notification, and a content blob cache, coordinated by a repository that
//! mirrors every server mutation into local state before returning.

pub mod api;
pub mod cache;
pub mod model;
pub mod repo;

pub use api::{
    ApiClient, ApiError, Credentials, HttpApiClient, ItemRecord, UserRecord, DEFAULT_BASE_URL,
};
pub use cache::{BlobCache, FolderCache, Listing};
pub use model::{FileItem, Folder, ImageFile, TextFile, User};
pub use repo::{Repository, RepositoryError};
