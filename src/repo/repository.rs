//! File repository
//!
//! The single coordinator between the remote API and the local caches.
//! Every server mutation flows through here and is mirrored into the
//! affected folder and blob caches before the call returns. Reads prefer
//! the blob cache; folder listings always re-fetch and treat the folder
//! cache as a live mirror.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Credentials};
use crate::cache::{BlobCache, FolderCache};
use crate::model::{FileItem, Folder, User};

/// Errors surfaced by repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("File item does not have valid data.")]
    InvalidFileItem,

    #[error("File store is missing for file.")]
    MissingFileCache,

    #[error("An unknown error occurred.")]
    Unknown,
}

/// Coordinates remote calls with the local folder and blob caches.
///
/// Owns the folder-id to [`FolderCache`] map and the [`BlobCache`]. Folder
/// caches are handed out by reference and mutated only through this type;
/// the map lock is never held across a network call, so operations on
/// different folders proceed in parallel.
pub struct Repository<C: ApiClient> {
    api: C,
    user: User,
    folder_caches: Mutex<HashMap<String, Arc<FolderCache>>>,
    blobs: BlobCache,
}

impl<C: ApiClient> Repository<C> {
    /// Create a repository for an already-loaded session user
    pub fn new(api: C, user: User) -> Self {
        Self {
            api,
            user,
            folder_caches: Mutex::new(HashMap::new()),
            blobs: BlobCache::new(),
        }
    }

    /// Fetch the authenticated account from the server and start a session.
    /// Fails with [`RepositoryError::InvalidFileItem`] when the account's
    /// root item is not a folder.
    pub async fn sign_in(api: C, credentials: Credentials) -> Result<Self, RepositoryError> {
        let record = api.current_user().await?;
        let user =
            User::from_record(record, credentials).ok_or(RepositoryError::InvalidFileItem)?;
        info!(user = %user.credentials.username, "Signed in");
        Ok(Self::new(api, user))
    }

    /// The session user
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The account's root folder
    pub fn root_folder(&self) -> &Folder {
        &self.user.root_folder
    }

    /// The content blob cache
    pub fn blobs(&self) -> &BlobCache {
        &self.blobs
    }

    /// The cache for a folder, created empty on first access.
    /// At most one cache instance ever exists per folder id.
    pub async fn file_cache(&self, folder: &Folder) -> Arc<FolderCache> {
        let mut caches = self.folder_caches.lock().await;
        caches
            .entry(folder.id.clone())
            .or_insert_with(|| Arc::new(FolderCache::new(folder.clone())))
            .clone()
    }

    /// Re-list a folder from the server and mirror the result locally.
    ///
    /// On failure the cache is left untouched. A listing that loses a race
    /// against a point mutation on the same folder is discarded; the cache
    /// keeps the newer state either way.
    pub async fn fetch_files(&self, folder: &Folder) -> Result<Arc<FolderCache>, RepositoryError> {
        let cache = self.file_cache(folder).await;
        let observed = cache.revision();

        let records = self.api.list_folder(&folder.id).await?;
        let items: Vec<FileItem> = records.into_iter().filter_map(FileItem::classify).collect();

        debug!(folder = %folder.id, count = items.len(), "Fetched folder listing");
        if !cache.set_if_unchanged(observed, items) {
            warn!(folder = %folder.id, "Discarded listing that lost a race against a mutation");
        }
        Ok(cache)
    }

    /// Create a folder on the server and add it to the parent's cache
    pub async fn create_folder(
        &self,
        name: &str,
        parent: &Folder,
    ) -> Result<Folder, RepositoryError> {
        let record = self.api.create_folder(&parent.id, name).await?;
        let new_folder = Folder {
            id: record.id,
            name: record.name,
            modified: record.modification_date,
            parent_id: record.parent_id,
        };

        let cache = self.file_cache(parent).await;
        cache.add(FileItem::Folder(new_folder.clone()));
        info!(folder = %new_folder.id, parent = %parent.id, "Created folder");
        Ok(new_folder)
    }

    /// Upload a file and add it to the parent's cache.
    /// Fails with [`RepositoryError::InvalidFileItem`] when the server
    /// response cannot be classified as a data item; the parent cache is
    /// untouched in that case.
    pub async fn create_data_item(
        &self,
        parent: &Folder,
        name: &str,
        data: Vec<u8>,
    ) -> Result<FileItem, RepositoryError> {
        let record = self.api.create_item(&parent.id, name, data).await?;
        let item = FileItem::classify(record)
            .filter(|item| !item.is_folder())
            .ok_or(RepositoryError::InvalidFileItem)?;

        let cache = self.file_cache(parent).await;
        cache.add(item.clone());
        info!(item = %item.id(), parent = %parent.id, "Created data item");
        Ok(item)
    }

    /// Bytes for a data item, served from the blob cache when possible.
    /// A cached blob is never re-validated against the server; it is served
    /// until explicitly removed.
    pub async fn download_data(&self, item: &FileItem) -> Result<Arc<Vec<u8>>, RepositoryError> {
        if item.is_folder() {
            return Err(RepositoryError::InvalidFileItem);
        }
        if let Some(data) = self.blobs.load(item.id()) {
            return Ok(data);
        }

        let data = Arc::new(self.api.download_item(item.id()).await?);
        self.blobs.store(item.id(), Arc::clone(&data));
        Ok(data)
    }

    /// Delete an item on the server, then drop it from its parent's cache
    /// and from the blob cache.
    ///
    /// Strictly fail-closed: no local state changes unless the remote
    /// delete succeeded. The root folder has no parent and cannot be
    /// deleted through this path.
    pub async fn delete_item(&self, item: &FileItem) -> Result<(), RepositoryError> {
        let parent_id = item.parent_id().ok_or(RepositoryError::InvalidFileItem)?;

        let cache = {
            let caches = self.folder_caches.lock().await;
            caches.get(parent_id).cloned()
        }
        .ok_or(RepositoryError::MissingFileCache)?;

        self.api.delete_item(item.id()).await?;

        cache.delete(item);
        self.blobs.remove(item.id());
        info!(item = %item.id(), parent = %parent_id, "Deleted item");
        Ok(())
    }

    /// End the session, dropping all cached content
    pub fn end_session(&self) {
        self.blobs.clear_all();
        info!("Session ended, blob cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ItemRecord, UserRecord};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scripted [`ApiClient`]: returns canned results and counts calls
    #[derive(Default)]
    struct MockApi {
        list_result: Vec<ItemRecord>,
        item_result: Option<ItemRecord>,
        download_result: Vec<u8>,
        fail: AtomicBool,
        download_calls: AtomicUsize,
        delete_calls: AtomicUsize,
    }

    impl MockApi {
        fn check(&self) -> Result<(), ApiError> {
            if self.fail.load(Ordering::Relaxed) {
                Err(ApiError::Unexpected(500))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ApiClient for MockApi {
        async fn current_user(&self) -> Result<UserRecord, ApiError> {
            self.check()?;
            Ok(UserRecord {
                first_name: "Beyonce".to_string(),
                last_name: "Knowles".to_string(),
                root_item: folder_record("root", None),
            })
        }

        async fn list_folder(&self, _id: &str) -> Result<Vec<ItemRecord>, ApiError> {
            self.check()?;
            Ok(self.list_result.clone())
        }

        async fn create_folder(&self, _parent: &str, _name: &str) -> Result<ItemRecord, ApiError> {
            self.check()?;
            Ok(self.item_result.clone().expect("no scripted item"))
        }

        async fn create_item(
            &self,
            _parent: &str,
            _name: &str,
            _data: Vec<u8>,
        ) -> Result<ItemRecord, ApiError> {
            self.check()?;
            Ok(self.item_result.clone().expect("no scripted item"))
        }

        async fn delete_item(&self, _id: &str) -> Result<(), ApiError> {
            self.check()?;
            self.delete_calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn download_item(&self, _id: &str) -> Result<Vec<u8>, ApiError> {
            self.check()?;
            self.download_calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.download_result.clone())
        }
    }

    fn folder_record(id: &str, parent_id: Option<&str>) -> ItemRecord {
        ItemRecord {
            id: id.to_string(),
            parent_id: parent_id.map(String::from),
            name: format!("Folder {id}"),
            is_dir: true,
            modification_date: Utc::now(),
            size: None,
            content_type: None,
        }
    }

    fn image_record(id: &str, parent_id: &str) -> ItemRecord {
        ItemRecord {
            id: id.to_string(),
            parent_id: Some(parent_id.to_string()),
            name: format!("Image {id}"),
            is_dir: false,
            modification_date: Utc::now(),
            size: Some(1024),
            content_type: Some("image/jpeg".to_string()),
        }
    }

    fn text_record(id: &str, parent_id: &str) -> ItemRecord {
        ItemRecord {
            id: id.to_string(),
            parent_id: Some(parent_id.to_string()),
            name: format!("Text {id}"),
            is_dir: false,
            modification_date: Utc::now(),
            size: Some(2048),
            content_type: Some("text/plain".to_string()),
        }
    }

    fn test_folder(id: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: format!("Folder {id}"),
            modified: Utc::now(),
            parent_id: None,
        }
    }

    fn test_user() -> User {
        User {
            first_name: "Beyonce".to_string(),
            last_name: "Knowles".to_string(),
            credentials: Credentials::new("bey", "yonce"),
            root_folder: test_folder("root"),
        }
    }

    fn repository(api: MockApi) -> Repository<Arc<MockApi>> {
        Repository::new(Arc::new(api), test_user())
    }

    #[tokio::test]
    async fn test_sign_in_builds_session_user() {
        let repo = Repository::sign_in(Arc::new(MockApi::default()), Credentials::new("bey", "yonce"))
            .await
            .unwrap();
        assert_eq!(repo.user().first_name, "Beyonce");
        assert_eq!(repo.root_folder().id, "root");
    }

    #[tokio::test]
    async fn test_fetch_files_mirrors_listing() {
        let api = MockApi {
            list_result: vec![image_record("i1", "f1"), text_record("t1", "f1")],
            ..Default::default()
        };
        let repo = repository(api);
        let folder = test_folder("f1");

        let cache = repo.fetch_files(&folder).await.unwrap();
        let items = cache.current_items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|i| i.id() == "i1"));
        assert!(items.iter().any(|i| i.id() == "t1"));

        // The same cache instance is visible through file_cache
        let same = repo.file_cache(&folder).await;
        assert!(Arc::ptr_eq(&cache, &same));
    }

    #[tokio::test]
    async fn test_fetch_files_filters_unclassifiable_records() {
        // One valid folder record, one file record missing its size
        let mut malformed = image_record("bad", "f1");
        malformed.size = None;
        let api = MockApi {
            list_result: vec![folder_record("a", Some("f1")), malformed],
            ..Default::default()
        };
        let repo = repository(api);

        let cache = repo.fetch_files(&test_folder("f1")).await.unwrap();
        let items = cache.current_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "a");
    }

    #[tokio::test]
    async fn test_fetch_files_failure_leaves_cache_untouched() {
        let api = MockApi {
            list_result: vec![image_record("i1", "f1")],
            ..Default::default()
        };
        let api = Arc::new(api);
        let repo = Repository::new(api.clone(), test_user());
        let folder = test_folder("f1");

        repo.fetch_files(&folder).await.unwrap();
        assert_eq!(repo.file_cache(&folder).await.current_items().len(), 1);

        api.fail.store(true, Ordering::Relaxed);
        let result = repo.fetch_files(&folder).await;
        assert!(matches!(result, Err(RepositoryError::Api(_))));
        assert_eq!(repo.file_cache(&folder).await.current_items().len(), 1);
    }

    #[tokio::test]
    async fn test_file_cache_is_one_instance_per_folder() {
        let repo = repository(MockApi::default());
        let folder = test_folder("f1");

        let first = repo.file_cache(&folder).await;
        let second = repo.file_cache(&folder).await;
        assert!(Arc::ptr_eq(&first, &second));

        let other = repo.file_cache(&test_folder("f2")).await;
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn test_create_folder_adds_to_parent_cache() {
        let api = MockApi {
            item_result: Some(folder_record("new", Some("f1"))),
            ..Default::default()
        };
        let repo = repository(api);
        let parent = test_folder("f1");

        let created = repo.create_folder("Folder new", &parent).await.unwrap();
        assert_eq!(created.id, "new");
        assert_eq!(created.parent_id, Some("f1".to_string()));

        let items = repo.file_cache(&parent).await.current_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "new");
    }

    #[tokio::test]
    async fn test_create_folder_failure_leaves_parent_cache_untouched() {
        let api = MockApi::default();
        api.fail.store(true, Ordering::Relaxed);
        let repo = repository(api);
        let parent = test_folder("f1");

        let result = repo.create_folder("New Folder", &parent).await;
        assert!(matches!(result, Err(RepositoryError::Api(_))));
        assert!(repo.file_cache(&parent).await.current_items().is_empty());
    }

    #[tokio::test]
    async fn test_create_data_item_adds_to_parent_cache() {
        let api = MockApi {
            item_result: Some(image_record("i1", "f1")),
            ..Default::default()
        };
        let repo = repository(api);
        let parent = test_folder("f1");

        let item = repo
            .create_data_item(&parent, "Image i1", b"bytes".to_vec())
            .await
            .unwrap();
        assert!(matches!(item, FileItem::Image(_)));

        let items = repo.file_cache(&parent).await.current_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "i1");
    }

    #[tokio::test]
    async fn test_create_data_item_rejects_directory_response() {
        // Server reports the uploaded item as a directory
        let api = MockApi {
            item_result: Some(folder_record("weird", Some("f1"))),
            ..Default::default()
        };
        let repo = repository(api);
        let parent = test_folder("f1");

        let result = repo
            .create_data_item(&parent, "weird", b"bytes".to_vec())
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidFileItem)));
        assert!(repo.file_cache(&parent).await.current_items().is_empty());
    }

    #[tokio::test]
    async fn test_create_data_item_rejects_unclassifiable_response() {
        let mut record = image_record("i1", "f1");
        record.content_type = Some("application/pdf".to_string());
        let api = MockApi {
            item_result: Some(record),
            ..Default::default()
        };
        let repo = repository(api);

        let result = repo
            .create_data_item(&test_folder("f1"), "doc.pdf", b"bytes".to_vec())
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidFileItem)));
    }

    #[tokio::test]
    async fn test_download_data_served_from_cache_on_second_call() {
        let api = Arc::new(MockApi {
            download_result: b"content".to_vec(),
            ..Default::default()
        });
        let repo = Repository::new(api.clone(), test_user());
        let item = FileItem::classify(image_record("i1", "f1")).unwrap();

        let first = repo.download_data(&item).await.unwrap();
        assert_eq!(first.as_slice(), b"content");

        // Even if the network now fails, the cached blob is served
        api.fail.store(true, Ordering::Relaxed);
        let second = repo.download_data(&item).await.unwrap();
        assert_eq!(second.as_slice(), b"content");
        assert_eq!(api.download_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_download_data_rejects_folder() {
        let repo = repository(MockApi::default());
        let folder_item = FileItem::Folder(test_folder("f1"));
        let result = repo.download_data(&folder_item).await;
        assert!(matches!(result, Err(RepositoryError::InvalidFileItem)));
    }

    #[tokio::test]
    async fn test_delete_item_removes_entry_and_blob() {
        let api = Arc::new(MockApi {
            list_result: vec![image_record("i1", "f1")],
            download_result: b"content".to_vec(),
            ..Default::default()
        });
        let repo = Repository::new(api.clone(), test_user());
        let parent = test_folder("f1");

        let cache = repo.fetch_files(&parent).await.unwrap();
        let item = cache.current_items()[0].clone();
        repo.download_data(&item).await.unwrap();
        assert!(repo.blobs().load("i1").is_some());

        repo.delete_item(&item).await.unwrap();
        assert!(cache.current_items().is_empty());
        assert!(repo.blobs().load("i1").is_none());
        assert_eq!(api.delete_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_delete_item_without_parent_fails() {
        let repo = repository(MockApi::default());
        let rootish = FileItem::Folder(test_folder("root"));

        let result = repo.delete_item(&rootish).await;
        assert!(matches!(result, Err(RepositoryError::InvalidFileItem)));
    }

    #[tokio::test]
    async fn test_delete_item_without_parent_cache_fails() {
        let repo = repository(MockApi::default());
        let item = FileItem::classify(image_record("i1", "never-fetched")).unwrap();

        let result = repo.delete_item(&item).await;
        assert!(matches!(result, Err(RepositoryError::MissingFileCache)));
    }

    #[tokio::test]
    async fn test_delete_item_is_fail_closed() {
        let api = Arc::new(MockApi {
            list_result: vec![image_record("i1", "f1")],
            download_result: b"content".to_vec(),
            ..Default::default()
        });
        let repo = Repository::new(api.clone(), test_user());
        let parent = test_folder("f1");

        let cache = repo.fetch_files(&parent).await.unwrap();
        let item = cache.current_items()[0].clone();
        repo.download_data(&item).await.unwrap();

        api.fail.store(true, Ordering::Relaxed);
        let result = repo.delete_item(&item).await;
        assert!(matches!(result, Err(RepositoryError::Api(_))));

        // Remote delete failed, so nothing was dropped locally
        assert_eq!(cache.current_items().len(), 1);
        assert!(repo.blobs().load("i1").is_some());
    }

    #[tokio::test]
    async fn test_end_session_clears_blobs() {
        let api = MockApi {
            download_result: b"content".to_vec(),
            ..Default::default()
        };
        let repo = repository(api);
        let item = FileItem::classify(image_record("i1", "f1")).unwrap();

        repo.download_data(&item).await.unwrap();
        assert!(repo.blobs().load("i1").is_some());

        repo.end_session();
        assert!(repo.blobs().load("i1").is_none());
    }
}
