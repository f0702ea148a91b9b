use super::notify::{isolate, Subscriber, SubscriberId, SubscriberKind};
use super::store::IntentProxy;
use super::Store;
use crate::selector::Selector;
use crate::value::{shallow_eq, shallow_eq_all, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

type TransformFn = dyn Fn(&[Value], &TransformContext<'_>) -> Value;

/// Callback of a transformer subscription, called with each new output.
pub type TransformCallback = Rc<dyn Fn(&Value)>;

struct TransformerDef {
    selectors: Vec<Selector>,
    transform: Box<TransformFn>,
}

/// A derivation over one or more selectors.
///
/// A transformer is only a description; [`Store::subscribe_transformer`]
/// creates the live, memoized instance. Clones are the same transformer.
///
/// # Examples
///
/// ```
/// use selectree::{Store, Transformer, Value};
/// use std::rc::Rc;
///
/// let store = Store::new(Value::map([("a", 1), ("b", 2)]));
/// let sum = Transformer::new([["a"], ["b"]], |inputs, _| {
///     Value::from(inputs.iter().filter_map(Value::as_i64).sum::<i64>())
/// });
///
/// assert_eq!(store.subscribe_transformer(&sum, Rc::new(|_: &Value| {})), Value::from(3));
/// ```
#[derive(Clone)]
pub struct Transformer {
    inner: Rc<TransformerDef>,
}

impl Transformer {
    pub fn new<I, S, F>(selectors: I, transform: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
        F: Fn(&[Value], &TransformContext<'_>) -> Value + 'static,
    {
        Self {
            inner: Rc::new(TransformerDef {
                selectors: selectors.into_iter().map(Into::into).collect(),
                transform: Box::new(transform),
            }),
        }
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.inner.selectors
    }

    pub fn ptr_eq(&self, other: &Transformer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("selectors", &self.inner.selectors)
            .finish_non_exhaustive()
    }
}

/// Helpers available to a transform function while it runs.
pub struct TransformContext<'a> {
    store: &'a Store,
    created: RefCell<Vec<String>>,
}

impl<'a> TransformContext<'a> {
    fn new(store: &'a Store) -> Self {
        Self {
            store,
            created: RefCell::default(),
        }
    }

    /// Bind `intent` and `payload` to a fresh alias.
    ///
    /// Dispatching the alias (with any payload) dispatches `intent` with
    /// `payload`. Aliases live until the transformer runs again or its
    /// last callback unsubscribes.
    pub fn create_intent(&self, intent: impl Into<String>, payload: impl Into<Value>) -> String {
        let alias = format!("intent-proxy-{}", self.store.inner.ids.next_id());
        let proxy = IntentProxy {
            intent: intent.into(),
            payload: payload.into(),
        };
        trace!(%alias, intent = %proxy.intent, "intent alias created");
        self.store.inner.proxies.borrow_mut().insert(alias.clone(), proxy);
        self.created.borrow_mut().push(alias.clone());
        alias
    }

    pub fn get_partial_state(&self, selector: impl Into<Selector>) -> Option<Value> {
        self.store.get_partial_state(selector)
    }

    fn into_created(self) -> Vec<String> {
        self.created.into_inner()
    }
}

/// Live pairing of a transformer with its last inputs and output.
pub(super) struct TransformerInstance {
    transformer: Transformer,
    inputs: Vec<Value>,
    output: Value,
    callbacks: Vec<TransformCallback>,
    proxies: Vec<String>,
}

impl Store {
    /// Register `callback` for changes in `transformer`'s output and return
    /// the current output.
    ///
    /// The first subscription creates the instance and runs the transform;
    /// later ones reuse it. Callbacks run on the tick after a relevant change,
    /// and only if the output changed by shallow comparison.
    pub fn subscribe_transformer(&self, transformer: &Transformer, callback: TransformCallback) -> Value {
        if let Some(id) = self.find_transformer(transformer) {
            let mut instances = self.inner.transformers.borrow_mut();
            if let Some(instance) = instances.get_mut(&id) {
                instance.callbacks.push(callback);
                return instance.output.clone();
            }
        }

        let selectors = transformer.selectors().to_vec();
        for selector in &selectors {
            self.check_selector(selector, "subscribe_transformer");
        }
        let inputs = self.read_values(&selectors);
        let (output, proxies) = self.run_transform(transformer, &inputs);

        let id = self.next_subscriber_id();
        self.inner.transformers.borrow_mut().insert(
            id,
            TransformerInstance {
                transformer: transformer.clone(),
                inputs,
                output: output.clone(),
                callbacks: vec![callback],
                proxies,
            },
        );
        let depth = self.dependency_depth(&selectors);
        self.insert_subscriber(
            id,
            Subscriber {
                depth,
                selectors,
                kind: SubscriberKind::Transformer,
            },
        );
        debug!(id = id.0, "transformer instance created");
        output
    }

    /// Remove `callback`. The last callback out tears the instance down,
    /// along with the intent aliases it created.
    pub fn unsubscribe_transformer(&self, transformer: &Transformer, callback: &TransformCallback) -> bool {
        let Some(id) = self.find_transformer(transformer) else {
            return false;
        };

        let torn_down = {
            let mut instances = self.inner.transformers.borrow_mut();
            let Some(instance) = instances.get_mut(&id) else {
                return false;
            };
            let Some(idx) = instance.callbacks.iter().position(|c| Rc::ptr_eq(c, callback)) else {
                return false;
            };
            instance.callbacks.remove(idx);
            if instance.callbacks.is_empty() {
                instances.remove(&id)
            } else {
                None
            }
        };

        if let Some(instance) = torn_down {
            self.drop_proxies(&instance.proxies);
            self.remove_subscriber(id);
            debug!(id = id.0, "transformer instance removed");
        }
        true
    }

    fn find_transformer(&self, transformer: &Transformer) -> Option<SubscriberId> {
        self.inner
            .transformers
            .borrow()
            .iter()
            .find(|(_, instance)| instance.transformer.ptr_eq(transformer))
            .map(|(id, _)| *id)
    }

    fn run_transform(&self, transformer: &Transformer, inputs: &[Value]) -> (Value, Vec<String>) {
        let ctx = TransformContext::new(self);
        let output = (transformer.inner.transform)(inputs, &ctx);
        (output, ctx.into_created())
    }

    fn drop_proxies(&self, aliases: &[String]) {
        let mut proxies = self.inner.proxies.borrow_mut();
        for alias in aliases {
            proxies.remove(alias);
        }
    }

    /// Recompute the instance behind `id` and call its callbacks if the
    /// output changed.
    pub(super) fn refresh_transformer(&self, id: SubscriberId) {
        let (transformer, old_inputs) = {
            let instances = self.inner.transformers.borrow();
            let Some(instance) = instances.get(&id) else {
                return;
            };
            (instance.transformer.clone(), instance.inputs.clone())
        };

        let inputs = self.read_values(transformer.selectors());
        if shallow_eq_all(&inputs, &old_inputs) {
            trace!(id = id.0, "transformer inputs unchanged");
            return;
        }

        let stale = self
            .inner
            .transformers
            .borrow_mut()
            .get_mut(&id)
            .map(|instance| std::mem::take(&mut instance.proxies))
            .unwrap_or_default();
        self.drop_proxies(&stale);

        let (output, proxies) = self.run_transform(&transformer, &inputs);

        let updated = {
            let mut instances = self.inner.transformers.borrow_mut();
            match instances.get_mut(&id) {
                // unsubscribed from inside its own transform
                None => Err(proxies),
                Some(instance) => {
                    instance.inputs = inputs;
                    instance.proxies = proxies;
                    if shallow_eq(&instance.output, &output) {
                        trace!(id = id.0, "transformer output unchanged");
                        return;
                    }
                    instance.output = output.clone();
                    Ok(instance.callbacks.clone())
                }
            }
        };
        let callbacks = match updated {
            Ok(callbacks) => callbacks,
            Err(orphaned) => {
                self.drop_proxies(&orphaned);
                return;
            }
        };

        trace!(id = id.0, callbacks = callbacks.len(), "transformer output changed");
        for callback in callbacks {
            isolate("transformer callback", || callback(&output));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Intent, Section};
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    fn counting() -> (Rc<Cell<usize>>, TransformCallback) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        (calls, Rc::new(move |_: &Value| counter.set(counter.get() + 1)))
    }

    fn pair() -> Transformer {
        Transformer::new([["a"], ["b"]], |inputs, _| Value::from(inputs.to_vec()))
    }

    #[test]
    fn returns_the_current_output_to_every_subscriber() {
        let store = Store::new(Value::from(json!({"a": 1, "b": 2})));
        let transformer = pair();
        let (_, first) = counting();
        let (_, second) = counting();

        let expected = Value::from(json!([1, 2]));
        assert_eq!(store.subscribe_transformer(&transformer, first), expected);
        store.set_partial_state(["a"], 5).unwrap();
        store.run_until_idle();
        assert_eq!(
            store.subscribe_transformer(&transformer, second),
            Value::from(json!([5, 2]))
        );
    }

    #[test]
    fn runs_the_transform_once_per_instance() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let transformer = Transformer::new([["a"]], move |inputs, _| {
            counter.set(counter.get() + 1);
            inputs[0].clone()
        });
        let store = Store::default();
        let (_, a) = counting();
        let (_, b) = counting();

        store.subscribe_transformer(&transformer, a);
        store.subscribe_transformer(&transformer, b);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn notifies_once_per_tick() {
        let store = Store::default();
        let transformer = pair();
        let (calls, callback) = counting();
        store.subscribe_transformer(&transformer, callback);

        store.set_partial_state(["a"], 1).unwrap();
        store.set_partial_state(["b"], 2).unwrap();
        assert_eq!(calls.get(), 0);
        store.run_until_idle();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn skips_callbacks_when_the_output_is_unchanged() {
        let store = Store::new(Value::from(json!({"n": 1})));
        let parity = Transformer::new([["n"]], |inputs, _| {
            Value::from(inputs[0].as_i64().unwrap_or_default() % 2 == 0)
        });
        let (calls, callback) = counting();
        store.subscribe_transformer(&parity, callback);

        store.set_partial_state(["n"], 3).unwrap();
        store.run_until_idle();
        assert_eq!(calls.get(), 0);

        store.set_partial_state(["n"], 4).unwrap();
        store.run_until_idle();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn skips_the_transform_when_inputs_are_unchanged() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let transformer = Transformer::new([["a"]], move |inputs, _| {
            counter.set(counter.get() + 1);
            inputs[0].clone()
        });
        let store = Store::new(Value::from(json!({"a": 1, "b": 1})));
        let (_, callback) = counting();
        store.subscribe_transformer(&transformer, callback);

        // root write with the same scalar at ["a"]
        store.set_state(json!({"a": 1, "b": 2}));
        store.run_until_idle();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn unsubscribing_the_last_callback_tears_down_the_instance() {
        let store = Store::default();
        let transformer = pair();
        let (calls, callback) = counting();
        store.subscribe_transformer(&transformer, callback.clone());

        store.set_partial_state(["a"], 1).unwrap();
        assert!(store.unsubscribe_transformer(&transformer, &callback));
        assert!(!store.unsubscribe_transformer(&transformer, &callback));
        store.run_until_idle();

        assert_eq!(calls.get(), 0);
        assert!(store.inner.transformers.borrow().is_empty());
        assert!(store.inner.tree.borrow().is_empty());
    }

    #[test]
    fn a_panicking_callback_does_not_stop_the_others() {
        let store = Store::default();
        let transformer = pair();
        store.subscribe_transformer(&transformer, Rc::new(|_: &Value| panic!("callback failure")));
        let (calls, callback) = counting();
        store.subscribe_transformer(&transformer, callback);

        store.set_partial_state(["a"], 1).unwrap();
        store.run_until_idle();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn intent_aliases_dispatch_the_bound_intent() {
        let store = Store::builder()
            .section(
                "selected",
                Section::new(Value::Null).with_intent(Intent::new("SELECT", |_, payload, _| {
                    Some(payload.clone())
                })),
            )
            .section("names", Section::new(json!(["ada", "grace"])))
            .build();
        let handlers = Transformer::new([["names"]], |inputs, ctx| {
            Value::list(
                inputs[0]
                    .as_list()
                    .unwrap_or_default()
                    .iter()
                    .map(|name| ctx.create_intent("SELECT", name.clone())),
            )
        });

        let output = store.subscribe_transformer(&handlers, Rc::new(|_: &Value| {}));
        let alias = output.get_path(&["1"]).and_then(Value::as_str).unwrap().to_owned();

        store.dispatch(alias, Value::Null);
        assert_eq!(store.get_partial_state(["selected"]), Some(Value::from("grace")));
    }

    #[test]
    fn aliases_are_replaced_on_rerun_and_dropped_on_teardown() {
        let store = Store::new(Value::from(json!({"n": 0})));
        let transformer = Transformer::new([["n"]], |inputs, ctx| {
            Value::from(ctx.create_intent("BUMP", inputs[0].clone()))
        });
        let (_, callback) = counting();

        let first = store.subscribe_transformer(&transformer, callback.clone());
        assert_eq!(store.inner.proxies.borrow().len(), 1);

        store.set_partial_state(["n"], 1).unwrap();
        store.run_until_idle();
        let proxies = store.inner.proxies.borrow().keys().cloned().collect::<Vec<_>>();
        assert_eq!(proxies.len(), 1);
        assert_ne!(Some(proxies[0].as_str()), first.as_str());

        store.unsubscribe_transformer(&transformer, &callback);
        assert!(store.inner.proxies.borrow().is_empty());
    }

    #[test]
    fn context_reads_state() {
        let store = Store::new(Value::from(json!({"a": 1, "factor": 10})));
        let seen = Rc::new(RefCell::new(None));
        let log = seen.clone();
        let transformer = Transformer::new([["a"]], move |inputs, ctx| {
            let factor = ctx.get_partial_state(["factor"]).and_then(|f| f.as_i64());
            *log.borrow_mut() = factor;
            Value::from(inputs[0].as_i64().unwrap_or_default() * factor.unwrap_or(1))
        });

        assert_eq!(store.subscribe_transformer(&transformer, Rc::new(|_: &Value| {})), Value::from(10));
        assert_eq!(*seen.borrow(), Some(10));
    }
}
