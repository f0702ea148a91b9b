//! Intents and the sections they mutate.
//!
//! A [`Section`] is a named slice of state together with the [`Intent`]s that
//! are allowed to change it. Dispatching an intent name runs every matching
//! intent of every section, in registration order.

mod intent;
mod section;

pub use intent::Intent;
pub use section::Section;
