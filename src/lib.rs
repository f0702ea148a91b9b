//! # Selectree
//!
//! A selector-addressed state store for single-threaded applications.
//!
//! Selectree keeps one state tree and offers two ways of working with it:
//!
//! ## Paths (Low-level access)
//!
//! Read and write any location of the tree by selector:
//! - `get_partial_state` / `set_partial_state` - Path reads and writes
//! - `subscribe_to_state` - Listen to a set of selectors, notified once per tick
//! - `add_computed` - Named read-only values derived from other selectors
//!
//! ## Sections (High-level state management)
//!
//! Named slices of state changed only through intents:
//! - `Section` - A top-level slice with its initial value and intents
//! - `Intent` - A named reducer run by `dispatch`
//! - `Transformer` - A memoized view over several sections or paths
//!
//! Notifications are never delivered inline with a mutation. The embedding
//! event loop drives them with [`Store::tick`] or [`Store::run_until_idle`].

pub mod config;
pub mod error;
pub mod intent;
pub mod middleware;
pub mod runtime;
pub mod selector;
pub mod store;
pub mod subscription;
pub mod value;

// Re-export main types for convenience
pub use config::StoreConfig;
pub use error::{ListenerError, Result, StoreError};
pub use intent::{Intent, Section};
pub use middleware::Middleware;
pub use selector::{Selector, SelectorProblem, COMPUTED_KEY};
pub use store::{
    EventContext, EventListener, StateListener, Store, StoreBuilder, Subscription, TransformCallback,
    TransformContext, Transformer,
};
pub use value::{shallow_eq, shallow_eq_all, strict_eq, Value};
