use thiserror::Error;

/// Failure of a backing store (session, office configuration, profiles).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt stored data in {location}: {message}")]
    Corrupt { location: String, message: String },
    #[error("{0}")]
    Other(String),
}

/// Hard stops of document generation. None of these consume a sequence number.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("profile {index} does not exist ({available} profiles registered)")]
    ProfileResolution { index: usize, available: usize },
    #[error("no receipt was aggregated; add receipt URLs and request the authorization first")]
    EmptyAggregation,
    #[error("office configuration unavailable: {0}")]
    Store(#[from] StoreError),
}
