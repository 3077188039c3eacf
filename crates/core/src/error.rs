//! Unified error types for qhn.
//!
//! Only `SourceUnavailable` reaches a caller of the request path; the other
//! variants are logged and absorbed where they occur.

use rmcp::model::{ErrorCode, ErrorData as McpError};

use crate::item::ItemId;

/// Unified error types for the qhn service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a fetch width of zero).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The ranked id list could not be retrieved.
    #[error("SOURCE_UNAVAILABLE: {0}")]
    SourceUnavailable(String),

    /// A single item could not be retrieved.
    #[error("ITEM_UNAVAILABLE: item {id}: {reason}")]
    ItemUnavailable { id: ItemId, reason: String },

    /// The cache snapshot could not be written to disk.
    #[error("CACHE_PERSIST_FAILED: {0}")]
    CachePersist(String),

    /// The cache snapshot could not be read or decoded.
    #[error("CACHE_LOAD_FAILED: {0}")]
    CacheLoad(String),

    /// Nothing is cached under the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::SourceUnavailable(msg) => (-32000, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::CachePersist(msg) | Error::CacheLoad(msg) => (-32002, msg.clone()),
            Error::ItemUnavailable { .. } => (-32003, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
