use super::notify::{Subscriber, SubscriberId, SubscriberKind};
use super::Store;
use crate::error::{Result, StoreError};
use crate::selector::Selector;
use crate::value::{shallow_eq, shallow_eq_all, Value};
use std::rc::Rc;
use tracing::{debug, trace};

type ComputeFn = dyn Fn(&[Value]) -> Value;

/// A named value derived from other selectors, kept outside the tree.
pub(super) struct ComputedEntry {
    pub(super) value: Value,
    /// One more than the deepest computed value it reads.
    pub(super) depth: usize,
    compute: Rc<ComputeFn>,
    selectors: Vec<Selector>,
    inputs: Vec<Value>,
    updater: SubscriberId,
}

impl Store {
    /// Register a computed value under `label`, computed now from
    /// `selectors` and kept up to date as they change.
    ///
    /// Returns the selector to read it with. The value cannot be written
    /// through [`set_partial_state`](Self::set_partial_state).
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateComputed`] if `label` is already registered.
    ///
    /// # Examples
    ///
    /// ```
    /// use selectree::{Store, Value};
    ///
    /// let store = Store::new(Value::map([("price", 4), ("quantity", 3)]));
    /// let total = store
    ///     .add_computed("total", [["price"], ["quantity"]], |inputs| {
    ///         Value::from(inputs.iter().filter_map(Value::as_i64).product::<i64>())
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(store.get_partial_state(total.clone()), Some(Value::from(12)));
    /// assert!(store.set_partial_state(total, 0).is_err());
    /// ```
    pub fn add_computed<I, S, F>(&self, label: impl Into<String>, selectors: I, compute: F) -> Result<Selector>
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
        F: Fn(&[Value]) -> Value + 'static,
    {
        let label = label.into();
        if self.inner.computed.borrow().contains_key(&label) {
            return Err(StoreError::DuplicateComputed { label });
        }

        let selectors: Vec<Selector> = selectors.into_iter().map(Into::into).collect();
        for selector in &selectors {
            self.check_selector(selector, "add_computed");
        }

        let depends_on = self.dependency_depth(&selectors);
        let inputs = self.read_values(&selectors);
        let value = compute(&inputs);
        let updater = self.next_subscriber_id();

        self.inner.computed.borrow_mut().insert(
            label.clone(),
            ComputedEntry {
                value,
                depth: depends_on + 1,
                compute: Rc::new(compute),
                selectors: selectors.clone(),
                inputs,
                updater,
            },
        );
        self.insert_subscriber(
            updater,
            Subscriber {
                depth: depends_on,
                selectors,
                kind: SubscriberKind::Computed(label.clone()),
            },
        );

        debug!(%label, depth = depends_on + 1, "computed value added");
        let selector = Selector::computed(label);
        self.notify_under(&selector);
        Ok(selector)
    }

    /// Unregister the computed value `label`.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownComputed`] if no such value exists.
    pub fn remove_computed(&self, label: &str) -> Result<()> {
        let Some(entry) = self.inner.computed.borrow_mut().remove(label) else {
            return Err(StoreError::UnknownComputed {
                label: label.to_owned(),
            });
        };
        self.remove_subscriber(entry.updater);

        debug!(%label, "computed value removed");
        self.notify_under(&Selector::computed(label));
        Ok(())
    }

    /// Labels of every computed value.
    pub fn computed_labels(&self) -> Vec<String> {
        self.inner.computed.borrow().keys().cloned().collect()
    }

    /// Recompute `label` if its inputs changed, publishing a changed value.
    pub(super) fn refresh_computed(&self, label: &str) {
        let (compute, selectors, old_inputs) = {
            let computed = self.inner.computed.borrow();
            let Some(entry) = computed.get(label) else {
                return;
            };
            (entry.compute.clone(), entry.selectors.clone(), entry.inputs.clone())
        };

        let inputs = self.read_values(&selectors);
        if shallow_eq_all(&inputs, &old_inputs) {
            return;
        }
        let value = compute(&inputs);

        {
            let mut computed = self.inner.computed.borrow_mut();
            let Some(entry) = computed.get_mut(label) else {
                return;
            };
            entry.inputs = inputs;
            if shallow_eq(&entry.value, &value) {
                return;
            }
            entry.value = value;
        }

        trace!(%label, "computed value changed");
        self.notify_under(&Selector::computed(label));
    }
}
