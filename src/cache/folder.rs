//! Folder listing cache
//!
//! One cache per folder, holding the entries currently believed to exist in
//! it. Every mutation publishes exactly one post-mutation snapshot to
//! subscribers; each subscriber observes the stream independently.

use tokio::sync::watch;
use tracing::debug;

use crate::model::{FileItem, Folder};

/// A revision-stamped snapshot of a folder's entries
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Monotonic mutation counter; used to reject stale full replaces
    pub revision: u64,
    /// Entries currently believed to exist in the folder
    pub items: Vec<FileItem>,
}

/// In-memory mirror of one folder's current listing.
///
/// The folder binding is immutable for the cache's lifetime. Mutations go
/// through the owning repository; the watch channel serializes them and
/// fans snapshots out to any number of subscribers.
pub struct FolderCache {
    folder: Folder,
    listing: watch::Sender<Listing>,
}

impl FolderCache {
    /// Create an empty cache bound to `folder`
    pub fn new(folder: Folder) -> Self {
        let (listing, _) = watch::channel(Listing::default());
        Self { folder, listing }
    }

    /// The folder this cache mirrors
    pub fn folder(&self) -> &Folder {
        &self.folder
    }

    /// Snapshot of the current entries
    pub fn current_items(&self) -> Vec<FileItem> {
        self.listing.borrow().items.clone()
    }

    /// Revision of the current listing
    pub fn revision(&self) -> u64 {
        self.listing.borrow().revision
    }

    /// Observe the entry set. The receiver sees the current snapshot
    /// immediately and a new one after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Listing> {
        self.listing.subscribe()
    }

    /// Append an entry and notify subscribers
    pub fn add(&self, item: FileItem) {
        self.listing.send_modify(|listing| {
            listing.revision += 1;
            listing.items.push(item);
        });
        debug!(folder = %self.folder.id, "Added entry to folder cache");
    }

    /// Remove every entry matching the item's id; a no-op when none match
    pub fn delete(&self, item: &FileItem) {
        let id = item.id().to_string();
        self.listing.send_modify(|listing| {
            listing.revision += 1;
            listing.items.retain(|entry| entry.id() != id);
        });
        debug!(folder = %self.folder.id, item = %id, "Removed entry from folder cache");
    }

    /// Replace the entry set with a fresh server listing
    pub fn set(&self, items: Vec<FileItem>) {
        let count = items.len();
        self.listing.send_modify(|listing| {
            listing.revision += 1;
            listing.items = items;
        });
        debug!(folder = %self.folder.id, count = count, "Replaced folder cache entries");
    }

    /// Replace the entry set only if no mutation landed since `observed`
    /// was read. Returns false when the replace was discarded as stale.
    pub fn set_if_unchanged(&self, observed: u64, items: Vec<FileItem>) -> bool {
        self.listing.send_if_modified(|listing| {
            if listing.revision != observed {
                return false;
            }
            listing.revision += 1;
            listing.items = items;
            true
        })
    }
}
