//! File-system item and session models

pub mod item;
pub mod user;

pub use item::{FileItem, Folder, ImageFile, TextFile};
pub use user::User;
