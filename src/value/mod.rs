//! Dynamic state values.
//!
//! The store holds a single tree of [`Value`]s. Compound values are shared
//! behind `Rc`, so cloning a value hands out a cheap snapshot and "is this the
//! same reference" stays observable, which is what the shallow comparison in
//! [`shallow_eq`] relies on.

mod shallow;
mod value;

pub use shallow::{shallow_eq, shallow_eq_all, strict_eq};
pub use value::Value;
