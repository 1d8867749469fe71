//! Cache Engine: loading caches keyed by arbitrary hashable keys.
//!
//! ## Key Components
//!
//! - [`Cache`] / [`CacheLoader`]: the contracts. Values enter a cache only
//!   through its loader.
//! - [`BoundedCache`]: size bound plus idle TTL, expire-first eviction with an
//!   LRU fallback. See [`bounded`] for the locking layout.
//! - [`PassthroughCache`]: always loads, never stores.
//! - [`CacheEntry`]: key, value and last-use timestamp of one stored slot.
//! - [`Clock`]: injectable time source ([`SystemClock`], [`ManualClock`]).
//!
//! ## Example Usage
//!
//! ```
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use probekit::cache::{BoundedCache, Cache, ManualClock};
//!
//! let clock = ManualClock::new();
//! let cache = BoundedCache::with_clock(
//!     |sql: &String| Ok::<_, Infallible>(sql.len()),
//!     Some(100),
//!     Some(Duration::from_secs(60)),
//!     clock.clone(),
//! );
//! assert_eq!(cache.get(&"select 1".to_string()), Ok(8));
//! clock.advance(Duration::from_secs(61));
//! assert_eq!(cache.get(&"select 1".to_string()), Ok(8)); // reloaded
//! ```

pub mod bounded;
pub mod clock;
pub mod entry;
pub mod passthrough;
pub mod traits;

pub use bounded::BoundedCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use passthrough::PassthroughCache;
pub use traits::{Cache, CacheLoader};
