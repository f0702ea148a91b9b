use super::store::Inner;
use super::Store;
use crate::selector::Selector;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use tracing::{error, trace};

/// Callback of a state subscription: one value per subscribed selector.
pub type StateListener = Rc<dyn Fn(&[Value])>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(super) struct SubscriberId(pub(super) u64);

pub(super) enum SubscriberKind {
    State(StateListener),
    Transformer,
    Computed(String),
}

/// Registry entry for anything that sits in the subscription tree.
pub(super) struct Subscriber {
    /// Computed-dependency depth; lower depths are invoked first.
    pub(super) depth: usize,
    pub(super) selectors: Vec<Selector>,
    pub(super) kind: SubscriberKind,
}

/// Handle returned by [`Store::subscribe_to_state`].
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Subscription::unsubscribe).
pub struct Subscription {
    store: Weak<Inner>,
    id: SubscriberId,
}

impl Subscription {
    /// Remove the listener. A flush already scheduled will skip it.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            Store { inner }.remove_subscriber(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id.0).finish()
    }
}

impl Store {
    /// Call `listener` with the current value of every selector whenever
    /// state at, above or below any of them changes.
    ///
    /// Calls are deferred: all changes made before the next tick produce a
    /// single call. Absent paths are passed as `Value::Null`.
    pub fn subscribe_to_state<I, S, F>(&self, selectors: I, listener: F) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
        F: Fn(&[Value]) + 'static,
    {
        let selectors = selectors.into_iter().map(Into::into).collect();
        let selectors = self.through(selectors, |m, s| m.subscribe_to_state(s));
        for (index, selector) in selectors.iter().enumerate() {
            self.check_selector(
                selector,
                &format!("subscribe_to_state, selector at index {index}"),
            );
        }

        let depth = self.dependency_depth(&selectors);
        let id = self.add_subscriber(Subscriber {
            depth,
            selectors,
            kind: SubscriberKind::State(Rc::new(listener)),
        });

        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub(super) fn next_subscriber_id(&self) -> SubscriberId {
        SubscriberId(self.inner.ids.next_id())
    }

    /// Register `subscriber` in the registry and at each of its selectors.
    pub(super) fn add_subscriber(&self, subscriber: Subscriber) -> SubscriberId {
        let id = self.next_subscriber_id();
        self.insert_subscriber(id, subscriber);
        id
    }

    pub(super) fn insert_subscriber(&self, id: SubscriberId, subscriber: Subscriber) {
        {
            let mut tree = self.inner.tree.borrow_mut();
            for selector in &subscriber.selectors {
                tree.subscribe(selector.keys(), id);
            }
        }
        trace!(id = id.0, depth = subscriber.depth, "subscriber added");
        self.inner.subscribers.borrow_mut().insert(id, subscriber);
    }

    pub(super) fn remove_subscriber(&self, id: SubscriberId) -> bool {
        let Some(subscriber) = self.inner.subscribers.borrow_mut().remove(&id) else {
            return false;
        };
        {
            let mut tree = self.inner.tree.borrow_mut();
            for selector in &subscriber.selectors {
                tree.unsubscribe(selector.keys(), &id);
            }
        }
        self.inner.pending.borrow_mut().retain(|p| *p != id);
        self.inner.in_flight.borrow_mut().retain(|p| *p != id);
        trace!(id = id.0, "subscriber removed");
        true
    }

    /// Queue every subscriber interested in a change at `selector`.
    ///
    /// The first subscriber queued into an empty buffer schedules a flush for
    /// the next tick. A subscriber already waiting, either for the next flush
    /// or further down the running one, is not queued twice. During a flush,
    /// a subscriber deeper than the one running joins the running flush at
    /// its depth, so values derived from computed state are current before
    /// anything reading them runs.
    pub(super) fn notify_under(&self, selector: &Selector) {
        let found = self.inner.tree.borrow().collect(selector.keys());
        if found.is_empty() {
            return;
        }

        let running = self.inner.flush_depth.get();
        let schedule = {
            let subscribers = self.inner.subscribers.borrow();
            let depth_of = |id: &SubscriberId| subscribers.get(id).map_or(0, |s| s.depth);
            let mut pending = self.inner.pending.borrow_mut();
            let mut in_flight = self.inner.in_flight.borrow_mut();
            let was_empty = pending.is_empty();
            for id in found {
                if pending.contains(&id) || in_flight.contains(&id) {
                    continue;
                }
                let depth = depth_of(&id);
                match running {
                    Some(current) if depth > current => {
                        let at = in_flight
                            .iter()
                            .position(|queued| depth_of(queued) > depth)
                            .unwrap_or(in_flight.len());
                        in_flight.insert(at, id);
                    }
                    _ => pending.push(id),
                }
            }
            was_empty && !pending.is_empty()
        };

        if schedule {
            trace!(%selector, "flush scheduled");
            let store = Rc::downgrade(&self.inner);
            self.inner.ticks.schedule(move || {
                if let Some(inner) = store.upgrade() {
                    Store { inner }.flush();
                }
            });
        }
    }

    /// Invoke the pending batch, shallowest dependency depth first.
    fn flush(&self) {
        let mut batch = std::mem::take(&mut *self.inner.pending.borrow_mut());
        {
            let subscribers = self.inner.subscribers.borrow();
            batch.sort_by_key(|id| subscribers.get(id).map_or(0, |s| s.depth));
        }
        trace!(subscribers = batch.len(), "flushing");
        *self.inner.in_flight.borrow_mut() = batch.into();

        loop {
            let next = self.inner.in_flight.borrow_mut().pop_front();
            let Some(id) = next else { break };
            let depth = self.inner.subscribers.borrow().get(&id).map(|s| s.depth);
            if let Some(depth) = depth {
                self.inner.flush_depth.set(Some(depth));
            }
            isolate("subscriber", || self.invoke(id));
        }
        self.inner.flush_depth.set(None);
    }

    fn invoke(&self, id: SubscriberId) {
        enum Action {
            State(StateListener, Vec<Selector>),
            Transformer,
            Computed(String),
        }

        let action = {
            let subscribers = self.inner.subscribers.borrow();
            // unsubscribed after being queued
            let Some(subscriber) = subscribers.get(&id) else {
                return;
            };
            match &subscriber.kind {
                SubscriberKind::State(listener) => {
                    Action::State(listener.clone(), subscriber.selectors.clone())
                }
                SubscriberKind::Transformer => Action::Transformer,
                SubscriberKind::Computed(label) => Action::Computed(label.clone()),
            }
        };

        match action {
            Action::State(listener, selectors) => {
                let values = self.read_values(&selectors);
                listener(&values);
            }
            Action::Transformer => self.refresh_transformer(id),
            Action::Computed(label) => self.refresh_computed(&label),
        }
    }

    /// Highest depth among the computed values `selectors` read, or 0.
    pub(super) fn dependency_depth(&self, selectors: &[Selector]) -> usize {
        let computed = self.inner.computed.borrow();
        selectors
            .iter()
            .filter_map(Selector::computed_label)
            .filter_map(|label| computed.get(label))
            .map(|entry| entry.depth)
            .max()
            .unwrap_or(0)
    }
}

/// Run a callback, logging instead of propagating a panic.
pub(super) fn isolate(what: &str, f: impl FnOnce()) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(what, "callback panicked: {}", panic_message(panic.as_ref()));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
