pub mod cache;
pub mod sarc;

pub use cache::{ArchiveCache, CacheEntry, CacheKey};
pub use sarc::Archive;
