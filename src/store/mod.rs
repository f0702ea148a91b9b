//! The store engine.
//!
//! A [`Store`] owns one state tree and everything that reacts to it:
//!
//! - path reads and writes, run through the [`Middleware`](crate::Middleware) chain
//! - event listeners and section intents, driven by [`Store::dispatch`]
//! - state subscriptions, [`Transformer`]s and computed values, all of which
//!   sit in one prefix-tree index and are notified once per tick

mod builder;
mod computed;
mod events;
mod notify;
mod store;
mod transformer;

pub use builder::StoreBuilder;
pub use events::{EventContext, EventListener};
pub use notify::{StateListener, Subscription};
pub use store::Store;
pub use transformer::{TransformCallback, TransformContext, Transformer};
