//! Store middleware.
//!
//! Middleware is the store's one extension point. Each hook receives the
//! arguments of the operation and returns the (possibly rewritten) arguments
//! for the next middleware. Hooks run in registration order and default to
//! passing their input through untouched.

use crate::selector::Selector;
use crate::store::Store;
use crate::value::Value;

/// A set of hooks around store operations.
///
/// # Examples
///
/// ```
/// use selectree::{Middleware, Selector, Store, Value};
/// use std::rc::Rc;
///
/// /// Reads of `["alias"]` are served from `["real"]`.
/// struct Alias;
///
/// impl Middleware for Alias {
///     fn parse_selector(&self, selector: Selector) -> Selector {
///         if selector.keys() == ["alias"] {
///             Selector::from(["real"])
///         } else {
///             selector
///         }
///     }
/// }
///
/// let store = Store::builder()
///     .state(Value::map([("real", 1)]))
///     .middleware(Rc::new(Alias))
///     .build();
/// assert_eq!(store.get_partial_state(["alias"]), Some(Value::from(1)));
/// ```
pub trait Middleware {
    /// Called once, after the store has been fully constructed.
    fn on_construct(&self, _store: &Store) {}

    /// Rewrite the root value handed out by `get_state`.
    fn get_state(&self, state: Value) -> Value {
        state
    }

    /// Rewrite the root value before `set_state` stores it.
    fn set_state(&self, state: Value) -> Value {
        state
    }

    /// Rewrite the target and value of a `set_partial_state` call.
    fn set_partial_state(&self, selector: Selector, value: Value) -> (Selector, Value) {
        (selector, value)
    }

    /// Rewrite the selector of a `get_partial_state` call.
    fn parse_selector(&self, selector: Selector) -> Selector {
        selector
    }

    /// Post-process the result of a `get_partial_state` call.
    fn partial_state_return(&self, value: Option<Value>) -> Option<Value> {
        value
    }

    /// Rewrite an event name and payload before dispatch.
    fn dispatch(&self, event: String, payload: Value) -> (String, Value) {
        (event, payload)
    }

    /// Rewrite the selectors of a `subscribe_to_state` call.
    fn subscribe_to_state(&self, selectors: Vec<Selector>) -> Vec<Selector> {
        selectors
    }
}
