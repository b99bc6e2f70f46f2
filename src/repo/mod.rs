//! Repository coordination layer

pub mod repository;

pub use repository::{Repository, RepositoryError};
