use crate::store::EventContext;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

type Mutator = dyn Fn(&Value, &Value, &EventContext) -> Option<Value>;

struct IntentInner {
    name: String,
    mutator: Box<Mutator>,
}

/// A named reducer: `(current value, payload, context) -> new value`.
///
/// Returning `None` means "no change": the value the intent was given is
/// kept. Cloning an intent shares it; two clones are the same intent for
/// [`Section::remove_intent`](crate::Section::remove_intent).
#[derive(Clone)]
pub struct Intent {
    inner: Rc<IntentInner>,
}

impl Intent {
    pub fn new<F>(name: impl Into<String>, mutator: F) -> Self
    where
        F: Fn(&Value, &Value, &EventContext) -> Option<Value> + 'static,
    {
        Self {
            inner: Rc::new(IntentInner {
                name: name.into(),
                mutator: Box::new(mutator),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run the mutator.
    pub fn mutate(&self, value: &Value, payload: &Value, ctx: &EventContext) -> Option<Value> {
        (self.inner.mutator)(value, payload, ctx)
    }

    /// Whether both handles refer to the same intent.
    pub fn ptr_eq(&self, other: &Intent) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intent").field("name", &self.inner.name).finish()
    }
}
