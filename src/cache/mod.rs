//! Cache module for storing API responses to disk
//!
//! This module provides a TTL-based cache store that persists API responses to
//! the filesystem, plus the catalogue of resource kinds the application caches.
//! Expired entries are evicted lazily on read and never handed to callers, so
//! every hit is guaranteed fresh for its kind's TTL.

mod kinds;
mod store;

pub use kinds::ResourceKind;
pub use store::CacheStore;
