use super::notify::isolate;
use super::store::Inner;
use super::Store;
use crate::error::{ListenerError, Result};
use crate::intent::{Intent, Section};
use crate::selector::Selector;
use crate::value::{strict_eq, Value};
use std::rc::Rc;
use tracing::{debug, error, trace, warn};

/// Listener registered with [`Store::on`]. Identity is the `Rc` allocation.
pub type EventListener = Rc<dyn Fn(&Value, &EventContext) -> std::result::Result<(), ListenerError>>;

/// Capabilities handed to intent mutators and event listeners.
#[derive(Clone)]
pub struct EventContext {
    store: Store,
}

impl EventContext {
    pub(crate) fn new(store: &Store) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// Dispatch another event. While a dispatch is running this is queued
    /// and runs once the current one has finished.
    pub fn dispatch(&self, event: impl Into<String>, payload: impl Into<Value>) {
        self.store.dispatch(event, payload);
    }

    pub fn get_state(&self) -> Value {
        self.store.get_state()
    }

    pub fn set_state(&self, state: impl Into<Value>) {
        self.store.set_state(state);
    }

    pub fn get_partial_state(&self, selector: impl Into<Selector>) -> Option<Value> {
        self.store.get_partial_state(selector)
    }

    pub fn set_partial_state(&self, selector: impl Into<Selector>, value: impl Into<Value>) -> Result<()> {
        self.store.set_partial_state(selector, value)
    }
}

/// Clears the dispatching flag even if a mutator panics.
struct DispatchGuard<'a> {
    inner: &'a Inner,
}

impl<'a> DispatchGuard<'a> {
    fn enter(inner: &'a Inner) -> Self {
        inner.dispatching.set(true);
        Self { inner }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.inner.dispatch_queue.borrow_mut().clear();
        }
        self.inner.dispatching.set(false);
    }
}

impl Store {
    /// Register `listener` for `event`.
    pub fn on(&self, event: impl Into<String>, listener: EventListener) {
        self.inner
            .listeners
            .borrow_mut()
            .entry(event.into())
            .or_default()
            .push(listener);
    }

    /// Remove `listener` from `event`. Unknown events and listeners are ignored.
    pub fn off(&self, event: &str, listener: &EventListener) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let Some(registered) = listeners.get_mut(event) else {
            return false;
        };
        match registered.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(idx) => {
                registered.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Dispatch `event` with `payload`.
    ///
    /// Intent aliases created by transformers are resolved first. Then every
    /// section with intents named `event` is updated, and the event's
    /// listeners run. A dispatch issued while another one is running (for
    /// example from inside a mutator) is queued and runs after it, in order.
    ///
    /// Mutators that panic propagate; listeners that fail or panic are logged
    /// and do not prevent the remaining listeners from running.
    pub fn dispatch(&self, event: impl Into<String>, payload: impl Into<Value>) {
        let (event, payload) = self.through((event.into(), payload.into()), |m, (e, p)| {
            m.dispatch(e, p)
        });
        self.inner
            .dispatch_queue
            .borrow_mut()
            .push_back((event, payload));

        if self.inner.dispatching.get() {
            trace!("dispatch queued behind the running one");
            return;
        }

        let _guard = DispatchGuard::enter(&self.inner);
        loop {
            let next = self.inner.dispatch_queue.borrow_mut().pop_front();
            let Some((event, payload)) = next else { break };
            self.run_dispatch(event, payload);
        }
    }

    fn run_dispatch(&self, event: String, payload: Value) {
        let proxy = self.inner.proxies.borrow().get(&event).cloned();
        let (event, payload) = match proxy {
            Some(proxy) => {
                trace!(alias = %event, intent = %proxy.intent, "intent alias resolved");
                (proxy.intent, proxy.payload)
            }
            None => (event, payload),
        };

        let ctx = EventContext::new(self);
        let affected = self.update_sections(&event, &payload, &ctx);
        debug!(%event, affected = affected.len(), "dispatched");

        let listeners = self.inner.listeners.borrow().get(&event).cloned();
        for listener in listeners.into_iter().flatten() {
            isolate("event listener", || {
                if let Err(err) = listener(&payload, &ctx) {
                    error!(%event, error = %err, "event listener failed");
                }
            });
        }
    }

    /// Run the intent on every section that handles it. Returns the names of
    /// the affected sections, each of which is queued for notification.
    fn update_sections(&self, intent: &str, payload: &Value, ctx: &EventContext) -> Vec<String> {
        let sections: Vec<(String, Section)> = self
            .inner
            .sections
            .borrow()
            .iter()
            .filter(|(_, section)| section.handles(intent))
            .cloned()
            .collect();

        let mut affected = Vec::with_capacity(sections.len());
        for (name, section) in sections {
            let selector = Selector::new([name.as_str()]);
            let current = self.inner.state.borrow().get(&name).cloned().unwrap_or_default();
            let Some(next) = section.apply(&current, intent, payload, ctx) else {
                continue;
            };

            if !strict_eq(&current, &next) {
                self.inner.state.borrow_mut().set_path(selector.keys(), next);
            }
            trace!(section = %name, "section updated");
            self.notify_under(&selector);
            affected.push(name);
        }
        affected
    }

    /// Register a section. Its initial value is stored under `[name]`.
    /// An existing section of the same name is replaced.
    pub fn add_section(&self, name: impl Into<String>, section: Section) {
        let name = name.into();
        let initial = section.initial_value().clone();
        {
            let mut sections = self.inner.sections.borrow_mut();
            match sections.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => {
                    warn!(section = %name, "replacing existing section");
                    slot.1 = section;
                }
                None => sections.push((name.clone(), section)),
            }
        }

        let selector = Selector::new([name.as_str()]);
        self.inner.state.borrow_mut().set_path(selector.keys(), initial);
        debug!(section = %name, "section added");
        self.notify_under(&selector);
    }

    /// Unregister a section and drop its value from the tree.
    pub fn remove_section(&self, name: &str) -> bool {
        let removed = {
            let mut sections = self.inner.sections.borrow_mut();
            let before = sections.len();
            sections.retain(|(n, _)| n != name);
            sections.len() != before
        };
        if !removed {
            return false;
        }

        self.inner.state.borrow_mut().remove_key(name);
        debug!(section = %name, "section removed");
        self.notify_under(&Selector::new([name]));
        true
    }

    /// Names of the registered sections, in registration order.
    pub fn section_names(&self) -> Vec<String> {
        self.inner
            .sections
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Add an intent to a registered section.
    pub fn add_intent(&self, section: &str, intent: Intent) -> bool {
        let mut sections = self.inner.sections.borrow_mut();
        match sections.iter_mut().find(|(n, _)| n == section) {
            Some((_, s)) => {
                s.add_intent(intent);
                true
            }
            None => false,
        }
    }

    /// Remove one registration of an intent from a registered section.
    pub fn remove_intent(&self, section: &str, intent: &Intent) -> bool {
        let mut sections = self.inner.sections.borrow_mut();
        sections
            .iter_mut()
            .find(|(n, _)| n == section)
            .is_some_and(|(_, s)| s.remove_intent(intent))
    }
}
