use super::Store;
use crate::config::StoreConfig;
use crate::intent::Section;
use crate::middleware::Middleware;
use crate::value::Value;
use std::rc::Rc;

/// Builder for a [`Store`] with sections, middleware or a custom config.
///
/// ```
/// use selectree::{Intent, Section, Store, StoreConfig, Value};
///
/// let counter = Section::new(0).with_intent(Intent::new("INCREMENT", |n, _, _| {
///     Some(Value::from(n.as_i64()? + 1))
/// }));
/// let store = Store::builder()
///     .section("counter", counter)
///     .config(StoreConfig::production())
///     .build();
///
/// store.dispatch("INCREMENT", Value::Null);
/// assert_eq!(store.get_partial_state(["counter"]), Some(Value::from(1)));
/// ```
#[derive(Default)]
pub struct StoreBuilder {
    state: Option<Value>,
    sections: Vec<(String, Section)>,
    middleware: Vec<Rc<dyn Middleware>>,
    config: Option<StoreConfig>,
}

impl StoreBuilder {
    /// Initial root value. Defaults to an empty map.
    pub fn state(mut self, state: impl Into<Value>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Add a section, stored under the top-level key `name`.
    pub fn section(mut self, name: impl Into<String>, section: Section) -> Self {
        self.sections.push((name.into(), section));
        self
    }

    /// Append a middleware. Hooks run in the order they were added.
    pub fn middleware(mut self, middleware: Rc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Defaults to [`StoreConfig::from_env`].
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Store {
        let config = self.config.unwrap_or_else(StoreConfig::from_env);
        let store = Store::from_parts(config, self.middleware);

        store.set_state(self.state.unwrap_or_else(Value::empty_map));
        for (name, section) in self.sections {
            store.add_section(name, section);
        }
        for middleware in &store.inner.middleware {
            middleware.on_construct(&store);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn sections_are_stored_beside_the_initial_state() {
        let store = Store::builder()
            .state(json!({"other": true}))
            .section("items", Section::new(json!([1])))
            .build();

        assert_eq!(
            store.get_state(),
            Value::from(json!({"other": true, "items": [1]}))
        );
        assert_eq!(store.section_names(), vec!["items"]);
    }

    #[test]
    fn calls_on_construct_once_the_store_is_built() {
        struct Probe(Rc<Cell<Option<bool>>>);

        impl Middleware for Probe {
            fn on_construct(&self, store: &Store) {
                let has_section = store.get_partial_state(["s"]).is_some();
                self.0.set(Some(has_section));
            }
        }

        let seen = Rc::new(Cell::new(None));
        Store::builder()
            .section("s", Section::new(1))
            .middleware(Rc::new(Probe(seen.clone())))
            .build();

        assert_eq!(seen.get(), Some(true));
    }

    #[test]
    fn uses_the_given_config() {
        let store = Store::builder().config(StoreConfig::production()).build();
        assert!(!store.config().dev_warnings);
    }
}
