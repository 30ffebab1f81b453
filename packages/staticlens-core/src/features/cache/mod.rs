//! Incremental analysis cache.

pub mod incremental;

pub use incremental::{
    CacheData, CachedDeclaration, CachedReference, FileState, IncrementalCache, CACHE_VERSION,
};
