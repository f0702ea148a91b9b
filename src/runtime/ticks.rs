//! Deferred work queue driven one tick at a time.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Single-threaded "run on next tick" queue.
///
/// A tick runs exactly the tasks that were queued before it started. Tasks
/// scheduled while a tick is running wait for the following one, so a task
/// can never starve the queue by rescheduling itself.
///
/// # Examples
///
/// ```
/// use selectree::runtime::TickQueue;
/// use std::{cell::Cell, rc::Rc};
///
/// let queue = TickQueue::new();
/// let ran = Rc::new(Cell::new(false));
/// let flag = ran.clone();
/// queue.schedule(move || flag.set(true));
///
/// assert!(!ran.get());
/// assert_eq!(queue.run_tick(), 1);
/// assert!(ran.get());
/// ```
#[derive(Default)]
pub struct TickQueue {
    queue: RefCell<VecDeque<Task>>,
    ticks: Cell<u64>,
}

impl TickQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` for the next tick.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run one tick. Returns the number of tasks that ran.
    pub fn run_tick(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let ran = batch.len();
        for task in batch {
            task();
        }
        if ran > 0 {
            self.ticks.set(self.ticks.get() + 1);
        }
        ran
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether no task is waiting.
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Number of non-empty ticks run so far.
    pub fn ticks_run(&self) -> u64 {
        self.ticks.get()
    }
}

impl fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickQueue")
            .field("pending", &self.pending())
            .field("ticks", &self.ticks.get())
            .finish()
    }
}
