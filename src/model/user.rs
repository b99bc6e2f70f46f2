//! Session user

use crate::api::{Credentials, UserRecord};
use crate::model::{FileItem, Folder};

/// The authenticated account, as loaded from `/me`.
/// Credentials are held for the session and injected into the repository;
/// there is no ambient global auth state.
#[derive(Debug, Clone)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub credentials: Credentials,
    /// The account's root folder; the only folder without a parent
    pub root_folder: Folder,
}

impl User {
    /// Build a session user from a `/me` response.
    /// Returns `None` when the root item is not a folder.
    pub fn from_record(record: UserRecord, credentials: Credentials) -> Option<Self> {
        let root_folder = match FileItem::classify(record.root_item)? {
            FileItem::Folder(folder) => folder,
            _ => return None,
        };
        Some(Self {
            first_name: record.first_name,
            last_name: record.last_name,
            credentials,
            root_folder,
        })
    }
}
