//! Selector paths into the state tree.

mod selector;

pub use selector::{Selector, SelectorProblem, COMPUTED_KEY};
