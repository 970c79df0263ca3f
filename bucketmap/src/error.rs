use thiserror::Error;

/// Errors returned by [`BucketMap`](crate::BucketMap) operations.
///
/// A missing key is never an error; lookups report absence with `None`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A map was requested with zero buckets.
    #[error("bucket map capacity must be positive")]
    ZeroCapacity,

    /// The lock guarding a bucket could not be acquired because another thread
    /// panicked while holding it for writing.
    #[error("lock for bucket {bucket} is poisoned")]
    Poisoned { bucket: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
