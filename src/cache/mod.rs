//! Response caching: one JSON record per `(query, context)` key plus administration.

pub mod manager;
pub mod response_cache;

pub use manager::{format_timestamp, CacheListing, CacheManager, CacheStats, EntryInfo, ListedEntry};
pub use response_cache::{CacheRecord, ResponseCache};
