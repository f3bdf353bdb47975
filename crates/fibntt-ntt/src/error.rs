//! Error type for the transform engine and doubling driver.

/// Failures that abort a computation. No partial value is ever returned
/// alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NttError {
    /// A digit or transform buffer could not be allocated.
    #[error("failed to allocate {0} elements")]
    Allocation(usize),

    /// The computation was abandoned through its cancel signal.
    #[error("computation cancelled")]
    Cancelled,

    /// A worker task panicked; its siblings were cancelled and joined.
    #[error("transform task failed: {0}")]
    TaskFailed(String),

    /// The index is beyond what the field and root tables can support.
    #[error("index {0} exceeds the supported maximum {1}")]
    IndexOutOfRange(u64, u64),
}
