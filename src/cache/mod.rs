//! Local caching layer
//!
//! In-memory mirrors of remote state: one listing cache per folder and a
//! shared blob cache for downloaded content. All state is lost on exit.

pub mod blob;
pub mod folder;

pub use blob::BlobCache;
pub use folder::{FolderCache, Listing};
