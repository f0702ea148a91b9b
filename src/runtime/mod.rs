//! Cooperative scheduling support.
//!
//! The store never runs notification work inline with a mutation. Work is
//! queued on a [`TickQueue`] and runs when the embedder drives the next tick.

mod ids;
mod ticks;

pub use ids::IdGenerator;
pub use ticks::{Task, TickQueue};
