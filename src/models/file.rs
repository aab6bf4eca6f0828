//! Represents one stored file as the API reports it.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single uploaded file, annotated with the folder/name view derived
/// from its key.
///
/// The store owns `size`, `lastModified`, and `contentType`; this system
/// only owns the key convention. `contentType` is known at upload time but
/// not reported by paged listings, and `url` is present only when the
/// caller asked for per-item URLs (or right after a write).
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Full object key, `uploads/<folder>/<filename>`.
    pub key: String,

    /// Logical folder, derived from the key (`root` when absent).
    pub folder: String,

    /// Display filename, the key remainder after the folder segment.
    pub name: String,

    /// Size in bytes as reported by the store.
    pub size: i64,

    /// Last-modified timestamp as reported by the store. Unknown right
    /// after an upload, so it is omitted rather than serialized as null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// MIME type, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Read URL (signed, or public depending on the configured posture).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Result of a rename or move. Relocation re-derives folder and name from
/// the destination key; size and timestamp stay with the store.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RelocatedFile {
    pub key: String,
    pub folder: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One page of files plus the raw store cursor for the next page.
///
/// The cursor here is the store's own token; the HTTP layer wraps it in
/// base64 before handing it to clients.
#[derive(Clone, Debug)]
pub struct ListPage {
    pub files: Vec<FileSummary>,
    pub next_cursor: Option<String>,
}
