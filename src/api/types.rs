//! BeDrive API wire types
//!
//! JSON shapes returned by the BeDrive server, plus the credentials attached
//! to every request.

use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse an ISO-8601 timestamp.
/// The server emits dates both with and without fractional seconds, and
/// older entries may omit the zone offset entirely.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value)
        .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {value}")))
}

/// A file-system entry as returned by the BeDrive API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Globally unique, stable item id
    pub id: String,
    /// Parent folder id (absent only for the account root)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Display name
    pub name: String,
    /// Directory marker; size and content type are ignored when set
    pub is_dir: bool,
    /// Last modification time
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub modification_date: DateTime<Utc>,
    /// Byte size (absent for folders)
    #[serde(default)]
    pub size: Option<u64>,
    /// MIME "type/subtype" string (absent for folders)
    #[serde(default)]
    pub content_type: Option<String>,
}

/// The authenticated account as returned by `/me`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    /// The account's root folder entry
    pub root_item: ItemRecord,
}

/// Basic-auth credentials sent with every request.
/// The server has no token exchange; these stay in memory for the session.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value: `Basic base64(username:password)`
    pub fn basic_auth(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}
