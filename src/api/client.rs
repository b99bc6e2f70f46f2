//! BeDrive API client
//!
//! Authenticated access to the BeDrive file-storage service: account lookup,
//! folder listing, item creation and deletion, and content download.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::errors::ApiError;
use super::types::{Credentials, ItemRecord, UserRecord};

/// Default BeDrive server
pub const DEFAULT_BASE_URL: &str = "http://163.172.147.216:8080";

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status codes the server uses for successful calls
const SUCCESS_CODES: [u16; 3] = [200, 201, 204];

/// Remote operations the repository depends on.
///
/// Implemented over HTTP by [`HttpApiClient`]; test code substitutes a
/// scripted implementation.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetch the authenticated account (`GET /me`)
    async fn current_user(&self) -> Result<UserRecord, ApiError>;

    /// List a folder's entries (`GET /items/{id}`)
    async fn list_folder(&self, id: &str) -> Result<Vec<ItemRecord>, ApiError>;

    /// Create a folder under a parent (`POST /items/{id}` with a JSON name)
    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<ItemRecord, ApiError>;

    /// Upload a file under a parent (`POST /items/{id}` with binary body)
    async fn create_item(
        &self,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<ItemRecord, ApiError>;

    /// Delete an item (`DELETE /items/{id}`)
    async fn delete_item(&self, id: &str) -> Result<(), ApiError>;

    /// Download an item's content (`GET /items/{id}/data`)
    async fn download_item(&self, id: &str) -> Result<Vec<u8>, ApiError>;
}

#[async_trait]
impl<T: ApiClient> ApiClient for Arc<T> {
    async fn current_user(&self) -> Result<UserRecord, ApiError> {
        (**self).current_user().await
    }

    async fn list_folder(&self, id: &str) -> Result<Vec<ItemRecord>, ApiError> {
        (**self).list_folder(id).await
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<ItemRecord, ApiError> {
        (**self).create_folder(parent_id, name).await
    }

    async fn create_item(
        &self,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<ItemRecord, ApiError> {
        (**self).create_item(parent_id, name, data).await
    }

    async fn delete_item(&self, id: &str) -> Result<(), ApiError> {
        (**self).delete_item(id).await
    }

    async fn download_item(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        (**self).download_item(id).await
    }
}

/// HTTP implementation of [`ApiClient`] speaking to a BeDrive server
#[derive(Clone)]
pub struct HttpApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Server base URL, without a trailing slash
    base_url: String,
    /// Credentials attached to every request
    credentials: Credentials,
}

impl HttpApiClient {
    /// Create a client against the default BeDrive server
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, credentials)
    }

    /// Create a client against a specific server
    pub fn with_base_url(base_url: &str, credentials: Credentials) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|_| ApiError::InvalidUrl)?;

        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", self.credentials.basic_auth())
    }

    /// Send a request and check the status against the server's success codes
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;

        let status = response.status().as_u16();
        if !SUCCESS_CODES.contains(&status) {
            return Err(ApiError::from_status(status));
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        Ok(response.json().await?)
    }
}

/// `Content-Disposition` value carrying the uploaded item's name (RFC 5987)
fn content_disposition(name: &str) -> String {
    format!("attachment;filename*=utf-8''{}", urlencoding::encode(name))
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn current_user(&self) -> Result<UserRecord, ApiError> {
        debug!("Fetching current user");
        let response = self.execute(self.request(Method::GET, "/me")).await?;
        Self::decode(response).await
    }

    async fn list_folder(&self, id: &str) -> Result<Vec<ItemRecord>, ApiError> {
        debug!(folder = id, "Listing folder");
        let response = self
            .execute(self.request(Method::GET, &format!("/items/{id}")))
            .await?;
        let records: Vec<ItemRecord> = Self::decode(response).await?;
        debug!(folder = id, count = records.len(), "Listed folder");
        Ok(records)
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<ItemRecord, ApiError> {
        info!(parent = parent_id, name = name, "Creating folder");
        let builder = self
            .request(Method::POST, &format!("/items/{parent_id}"))
            .json(&serde_json::json!({ "name": name }));
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    async fn create_item(
        &self,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<ItemRecord, ApiError> {
        info!(
            parent = parent_id,
            name = name,
            size = data.len(),
            "Uploading item"
        );
        let builder = self
            .request(Method::POST, &format!("/items/{parent_id}"))
            .header("Content-Type", "application/octet-stream")
            .header("Content-Disposition", content_disposition(name))
            .body(data);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    async fn delete_item(&self, id: &str) -> Result<(), ApiError> {
        info!(item = id, "Deleting item");
        self.execute(self.request(Method::DELETE, &format!("/items/{id}")))
            .await?;
        Ok(())
    }

    async fn download_item(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        debug!(item = id, "Downloading item content");
        let response = self
            .execute(self.request(Method::GET, &format!("/items/{id}/data")))
            .await?;
        let bytes = response.bytes().await?;
        info!(item = id, size = bytes.len(), "Downloaded item content");
        Ok(bytes.to_vec())
    }
}
