//! Key codec for the `uploads/<folder>/<filename>` object-key convention.
//!
//! Every component that touches keys goes through this module: it is the
//! single place that knows how folders and display names map onto the flat
//! key space of the backing store. Folders are not real objects, only the
//! first path segment after the fixed `uploads/` root.

use thiserror::Error;

/// Fixed root under which every object key lives.
pub const KEY_PREFIX: &str = "uploads/";

/// Folder reported for keys that carry no folder segment.
pub const ROOT_FOLDER: &str = "root";

/// A key split back into its human-facing parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub folder: String,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("key `{0}` does not match the `uploads/<folder>/<filename>` layout")]
pub struct InvalidKey(pub String);

/// Normalize a raw folder name into the restricted key charset.
///
/// Trims whitespace, falls back to `root` for empty input, replaces every
/// character outside `[A-Za-z0-9_-]` with `_`, and lowercases the result.
/// Idempotent: normalizing an already-normalized folder is a no-op.
pub fn normalize_folder(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ROOT_FOLDER.to_string();
    }
    trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitize a file base name (the stem, without extension).
///
/// Whitespace runs collapse to a single `_`, everything outside
/// `[A-Za-z0-9_-]` becomes `_`, and the result is lowercased. An input that
/// sanitizes to nothing falls back to `file` so a key always has a name.
pub fn sanitize_base_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c.to_ascii_lowercase());
            in_whitespace = false;
        } else {
            out.push('_');
            in_whitespace = false;
        }
    }
    if out.is_empty() {
        return "file".to_string();
    }
    out
}

/// Split `name.ext` into `(stem, extension)`, extension including the dot.
///
/// A leading dot does not count as an extension separator, so dotfiles keep
/// their whole name as the stem.
pub fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
        _ => (file_name, ""),
    }
}

/// Lowercase an extension and strip anything outside `[a-z0-9]`.
///
/// Returns the empty string when nothing usable remains, otherwise the
/// cleaned extension with its leading dot.
pub fn sanitize_extension(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        String::new()
    } else {
        format!(".{}", cleaned)
    }
}

/// Build a full key from an already-normalized folder and pre-sanitized
/// base name. The codec does not re-sanitize its inputs.
pub fn build_key(folder: &str, base: &str, ext: &str) -> String {
    format!("{KEY_PREFIX}{folder}/{base}{ext}")
}

/// Parse a key back into `(folder, name)`.
///
/// Strips the fixed `uploads/` root and splits on the first `/`. A remainder
/// without a `/` belongs to the `root` folder. Keys outside the root, or
/// with nothing after it, are invalid.
pub fn parse_key(key: &str) -> Result<ParsedKey, InvalidKey> {
    let remainder = key
        .strip_prefix(KEY_PREFIX)
        .ok_or_else(|| InvalidKey(key.to_string()))?;
    if remainder.is_empty() {
        return Err(InvalidKey(key.to_string()));
    }
    match remainder.split_once('/') {
        Some((folder, name)) if !folder.is_empty() && !name.is_empty() => Ok(ParsedKey {
            folder: folder.to_string(),
            name: name.to_string(),
        }),
        Some(_) => Err(InvalidKey(key.to_string())),
        None => Ok(ParsedKey {
            folder: ROOT_FOLDER.to_string(),
            name: remainder.to_string(),
        }),
    }
}
