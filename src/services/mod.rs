//! Service layer: the drive core and its listing cache.

pub mod drive_service;
pub mod listing_cache;
