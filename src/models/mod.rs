//! Data models for the file-manager API.
//!
//! There is deliberately no folder entity here: folders are nothing but a
//! naming convention on keys, so the only model is the per-file summary
//! the endpoints serialize as JSON.

pub mod file;
