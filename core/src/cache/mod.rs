//! Two-tier audio cache.
//!
//! - `DiskCache`: flat directory of `<hex-key>.mp3` files, survives restarts
//! - `MemoryCache`: process-lifetime map, never evicted
//!
//! The resolver and janitor see the disk tier through `CacheStore`. Both
//! tiers are addressed by the same `CacheKey`, derived from
//! (voice, speed, text). Only the disk tier is swept by the janitor.

pub mod disk;
pub mod key;
pub mod memory;
pub mod store;

pub use disk::{CacheEntry, DiskCache, AUDIO_EXTENSION};
pub use key::{derive, format_speed, CacheKey, KEY_HEX_LEN};
pub use memory::MemoryCache;
pub use store::CacheStore;
