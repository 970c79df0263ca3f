//! A fixed-capacity concurrent hash map with one reader/writer lock per
//! bucket.
//!
//! ```
//! use bucketmap::BucketMap;
//!
//! let map = BucketMap::with_capacity(16)?;
//! map.put("answer", 42)?;
//! assert_eq!(map.get("answer")?, Some(42));
//! assert_eq!(map.remove("answer")?, Some(42));
//! assert!(map.is_empty()?);
//! # Ok::<(), bucketmap::Error>(())
//! ```

mod error;
pub mod map;

pub use error::{Error, Result};
pub use map::{BucketMap, Entry, ValueRef, DEFAULT_CAPACITY};
