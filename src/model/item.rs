//! File-system item model
//!
//! The classified view of server records: folders, image files, and text
//! files, sharing a common identity header. Classification is a pure
//! function from a wire record to one of these variants.

use chrono::{DateTime, Utc};

use crate::api::ItemRecord;

/// A directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub modified: DateTime<Utc>,
    /// Absent only for the account root
    pub parent_id: Option<String>,
}

/// An image file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub id: String,
    pub name: String,
    pub modified: DateTime<Utc>,
    pub parent_id: Option<String>,
    pub size: u64,
    /// Content subtype ("jpeg", "png"); used for icon selection only
    pub subtype: String,
}

/// A text file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub id: String,
    pub name: String,
    pub modified: DateTime<Utc>,
    pub parent_id: Option<String>,
    pub size: u64,
    /// Content subtype ("plain", "markdown"); used for icon selection only
    pub subtype: String,
}

/// A classified file-system entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileItem {
    Folder(Folder),
    Image(ImageFile),
    Text(TextFile),
}

impl FileItem {
    /// Classify a server record.
    ///
    /// Directory records map to folders unconditionally, ignoring size and
    /// content type. Anything else must carry both a size and an `image/*`
    /// or `text/*` content type; records that do not are dropped from
    /// listings rather than surfaced as errors.
    pub fn classify(record: ItemRecord) -> Option<FileItem> {
        if record.is_dir {
            return Some(FileItem::Folder(Folder {
                id: record.id,
                name: record.name,
                modified: record.modification_date,
                parent_id: record.parent_id,
            }));
        }

        let size = record.size?;
        let content_type = record.content_type?;
        let (primary, subtype) = split_content_type(&content_type)?;

        match primary {
            "image" => Some(FileItem::Image(ImageFile {
                id: record.id,
                name: record.name,
                modified: record.modification_date,
                parent_id: record.parent_id,
                size,
                subtype: subtype.to_string(),
            })),
            "text" => Some(FileItem::Text(TextFile {
                id: record.id,
                name: record.name,
                modified: record.modification_date,
                parent_id: record.parent_id,
                size,
                subtype: subtype.to_string(),
            })),
            _ => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            FileItem::Folder(folder) => &folder.id,
            FileItem::Image(file) => &file.id,
            FileItem::Text(file) => &file.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileItem::Folder(folder) => &folder.name,
            FileItem::Image(file) => &file.name,
            FileItem::Text(file) => &file.name,
        }
    }

    pub fn modified(&self) -> DateTime<Utc> {
        match self {
            FileItem::Folder(folder) => folder.modified,
            FileItem::Image(file) => file.modified,
            FileItem::Text(file) => file.modified,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            FileItem::Folder(folder) => folder.parent_id.as_deref(),
            FileItem::Image(file) => file.parent_id.as_deref(),
            FileItem::Text(file) => file.parent_id.as_deref(),
        }
    }

    /// Byte size for data items; folders have none
    pub fn size(&self) -> Option<u64> {
        match self {
            FileItem::Folder(_) => None,
            FileItem::Image(file) => Some(file.size),
            FileItem::Text(file) => Some(file.size),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FileItem::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            FileItem::Folder(folder) => Some(folder),
            _ => None,
        }
    }
}

/// Split a MIME `type/subtype` string; anything else is malformed
fn split_content_type(value: &str) -> Option<(&str, &str)> {
    let (primary, subtype) = value.split_once('/')?;
    if primary.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }
    Some((primary, subtype))
}
