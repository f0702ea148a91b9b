//! Error types for store operations.

use thiserror::Error;

/// Structural misuse of the store.
///
/// Problems local to a single read (a suspicious selector, a missing path)
/// are not errors: they degrade to `None` and a developer warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("tried creating computed value called \"{label}\" but one already exists")]
    DuplicateComputed { label: String },

    #[error("set_partial_state called with selector for computed state \"{label}\" and value {value}")]
    ComputedWrite { label: String, value: String },

    #[error("set_partial_state must address a non-root location")]
    RootSelector,

    #[error("no computed value called \"{label}\"")]
    UnknownComputed { label: String },
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error returned by an event listener. Logged and isolated by the store.
pub type ListenerError = Box<dyn std::error::Error>;
