use thiserror::Error;

/// Errors raised by the cache layer
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache engine failed (I/O, connection, ...)
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The cache engine rejected our credentials
    #[error("cache access unauthorized: {0}")]
    Unauthorized(String),

    /// A stored record could not be decoded
    #[error("failed to decode cache entry '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded for storage
    #[error("failed to encode cache entry '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => CacheError::Unauthorized(e.to_string()),
            _ => CacheError::Backend(e.to_string()),
        }
    }
}
