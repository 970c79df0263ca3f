//! The fixed-capacity concurrent bucket map.

mod bucket_map;
mod entry;

pub use bucket_map::{BucketMap, ValueRef, DEFAULT_CAPACITY};
pub use entry::Entry;
