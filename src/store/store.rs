use super::computed::ComputedEntry;
use super::events::EventListener;
use super::notify::{Subscriber, SubscriberId};
use super::transformer::TransformerInstance;
use super::StoreBuilder;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::intent::Section;
use crate::middleware::Middleware;
use crate::runtime::{IdGenerator, TickQueue};
use crate::selector::Selector;
use crate::subscription::SubscriptionTree;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use tracing::{trace, warn};

/// Target and fixed payload behind an intent alias.
#[derive(Clone, Debug)]
pub(super) struct IntentProxy {
    pub(super) intent: String,
    pub(super) payload: Value,
}

pub(super) struct Inner {
    pub(super) config: StoreConfig,
    pub(super) middleware: Vec<Rc<dyn Middleware>>,
    pub(super) state: RefCell<Value>,
    pub(super) computed: RefCell<BTreeMap<String, ComputedEntry>>,
    pub(super) sections: RefCell<Vec<(String, Section)>>,
    pub(super) listeners: RefCell<HashMap<String, Vec<EventListener>>>,
    pub(super) tree: RefCell<SubscriptionTree<SubscriberId>>,
    pub(super) subscribers: RefCell<HashMap<SubscriberId, Subscriber>>,
    /// Subscribers waiting for the next flush.
    pub(super) pending: RefCell<Vec<SubscriberId>>,
    /// Subscribers of the running flush not yet invoked.
    pub(super) in_flight: RefCell<VecDeque<SubscriberId>>,
    /// Depth of the subscriber the running flush is invoking.
    pub(super) flush_depth: Cell<Option<usize>>,
    pub(super) transformers: RefCell<HashMap<SubscriberId, TransformerInstance>>,
    pub(super) proxies: RefCell<HashMap<String, IntentProxy>>,
    pub(super) dispatch_queue: RefCell<VecDeque<(String, Value)>>,
    pub(super) dispatching: Cell<bool>,
    pub(super) ids: IdGenerator,
    pub(super) ticks: TickQueue,
}

/// A selector-addressed state container.
///
/// `Store` is a cheap handle: clones share the same state. Everything runs
/// on the calling thread; notifications are deferred to the next tick, which
/// the embedder drives with [`tick`](Store::tick) or
/// [`run_until_idle`](Store::run_until_idle).
///
/// # Examples
///
/// ```
/// use selectree::{Store, Value};
/// use std::{cell::RefCell, rc::Rc};
///
/// let store = Store::new(Value::map([("count", 0)]));
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let log = seen.clone();
/// let _sub = store.subscribe_to_state([["count"]], move |values| {
///     log.borrow_mut().push(values[0].clone());
/// });
///
/// store.set_partial_state(["count"], 1).unwrap();
/// store.set_partial_state(["count"], 2).unwrap();
/// assert!(seen.borrow().is_empty());
///
/// store.run_until_idle();
/// assert_eq!(*seen.borrow(), vec![Value::from(2)]);
/// ```
#[derive(Clone)]
pub struct Store {
    pub(super) inner: Rc<Inner>,
}

impl Store {
    /// Create a store holding `initial` as its root value.
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::builder().state(initial).build()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    pub(super) fn from_parts(config: StoreConfig, middleware: Vec<Rc<dyn Middleware>>) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                middleware,
                state: RefCell::new(Value::empty_map()),
                computed: RefCell::default(),
                sections: RefCell::default(),
                listeners: RefCell::default(),
                tree: RefCell::default(),
                subscribers: RefCell::default(),
                pending: RefCell::default(),
                in_flight: RefCell::default(),
                flush_depth: Cell::new(None),
                transformers: RefCell::default(),
                proxies: RefCell::default(),
                dispatch_queue: RefCell::default(),
                dispatching: Cell::new(false),
                ids: IdGenerator::new(),
                ticks: TickQueue::new(),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Thread `value` through every middleware's `hook`, in order.
    pub(super) fn through<T>(&self, value: T, hook: impl Fn(&dyn Middleware, T) -> T) -> T {
        self.inner
            .middleware
            .iter()
            .fold(value, |value, middleware| hook(middleware.as_ref(), value))
    }

    pub(super) fn check_selector(&self, selector: &Selector, operation: &str) {
        if !self.inner.config.dev_warnings {
            return;
        }
        for problem in selector.problems() {
            warn!(%selector, operation, "invalid selector: {problem}");
        }
    }

    /// Snapshot of the whole tree, after `get_state` middleware.
    pub fn get_state(&self) -> Value {
        let state = self.inner.state.borrow().clone();
        self.through(state, |m, s| m.get_state(s))
    }

    /// Value at `selector`, or `None` if any key along the way is absent.
    ///
    /// A stored `Value::Null` comes back as `Some(Value::Null)`. Selectors
    /// starting with [`COMPUTED_KEY`](crate::COMPUTED_KEY) read the computed
    /// table instead of the tree; the sentinel alone reads the whole table as
    /// a map of labels to values.
    pub fn get_partial_state(&self, selector: impl Into<Selector>) -> Option<Value> {
        let selector = self.through(selector.into(), |m, s| m.parse_selector(s));
        self.check_selector(&selector, "get_partial_state");

        let found = self.access(&selector);
        self.through(found, |m, v| m.partial_state_return(v))
    }

    fn access(&self, selector: &Selector) -> Option<Value> {
        if !selector.is_computed() {
            return self.get_state().get_path(selector.keys()).cloned();
        }

        let computed = self.inner.computed.borrow();
        match selector.computed_label() {
            Some(label) => computed.get(label)?.value.get_path(&selector.keys()[2..]).cloned(),
            None => Some(Value::map(
                computed
                    .iter()
                    .map(|(label, entry)| (label.clone(), entry.value.clone())),
            )),
        }
    }

    /// Read every selector; absent paths read as `Value::Null`.
    pub(super) fn read_values(&self, selectors: &[Selector]) -> Vec<Value> {
        selectors
            .iter()
            .map(|s| self.get_partial_state(s).unwrap_or_default())
            .collect()
    }

    /// Replace the whole tree. Every subscriber is notified.
    pub fn set_state(&self, state: impl Into<Value>) {
        let state = self.through(state.into(), |m, s| m.set_state(s));
        *self.inner.state.borrow_mut() = state;
        trace!("state replaced");
        self.notify_under(&Selector::root());
    }

    /// Assign `value` at `selector`, creating missing intermediate maps.
    ///
    /// Fails for the root selector (use [`set_state`](Self::set_state)) and for
    /// computed selectors, which are read-only.
    pub fn set_partial_state(&self, selector: impl Into<Selector>, value: impl Into<Value>) -> Result<()> {
        let (selector, value) = self.through((selector.into(), value.into()), |m, (s, v)| {
            m.set_partial_state(s, v)
        });
        self.check_selector(&selector, "set_partial_state");

        if selector.is_root() {
            return Err(StoreError::RootSelector);
        }
        if selector.is_computed() {
            return Err(StoreError::ComputedWrite {
                label: selector.computed_label().unwrap_or_default().to_owned(),
                value: format!("{value:?}"),
            });
        }

        let written = self.inner.state.borrow_mut().set_path(selector.keys(), value);
        if !written {
            if self.inner.config.dev_warnings {
                warn!(%selector, "write dropped: list index out of range");
            }
            return Ok(());
        }

        trace!(%selector, "partial state set");
        self.notify_under(&selector);
        Ok(())
    }

    /// Run one tick of deferred work. Returns whether anything ran.
    pub fn tick(&self) -> bool {
        self.inner.ticks.run_tick() > 0
    }

    /// Run ticks until no deferred work is left, bounded by
    /// [`StoreConfig::max_ticks`]. Returns the number of ticks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ticks = 0;
        while !self.inner.ticks.is_idle() {
            if ticks >= self.inner.config.max_ticks {
                warn!(ticks, "still busy after max_ticks, giving up");
                break;
            }
            self.inner.ticks.run_tick();
            ticks += 1;
        }
        ticks
    }

    /// Whether a flush is waiting for the next tick.
    pub fn has_pending_work(&self) -> bool {
        !self.inner.ticks.is_idle()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Value::empty_map())
    }
}
