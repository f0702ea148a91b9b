use super::Intent;
use crate::store::EventContext;
use crate::value::Value;

/// Blueprint for a named slice of state: its initial value and its intents.
///
/// When added to a store the initial value is stored at the top-level key
/// named after the section, so `["items"]` reads the `items` section.
#[derive(Clone, Debug, Default)]
pub struct Section {
    initial: Value,
    intents: Vec<Intent>,
}

impl Section {
    pub fn new(initial: impl Into<Value>) -> Self {
        Self {
            initial: initial.into(),
            intents: Vec::new(),
        }
    }

    /// Builder-style [`add_intent`](Self::add_intent).
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.add_intent(intent);
        self
    }

    pub fn add_intent(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Remove the earliest registration of `intent`.
    pub fn remove_intent(&mut self, intent: &Intent) -> bool {
        match self.intents.iter().position(|i| i.ptr_eq(intent)) {
            Some(idx) => {
                self.intents.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn initial_value(&self) -> &Value {
        &self.initial
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Whether any intent is registered under `intent_name`.
    pub fn handles(&self, intent_name: &str) -> bool {
        self.intents.iter().any(|i| i.name() == intent_name)
    }

    /// Apply every intent named `intent_name` to `value`, in registration
    /// order, each seeing the previous one's result.
    ///
    /// `None` when the section has no such intent. Mutators that return
    /// `None` leave the running value untouched.
    pub fn apply(
        &self,
        value: &Value,
        intent_name: &str,
        payload: &Value,
        ctx: &EventContext,
    ) -> Option<Value> {
        let mut matching = self
            .intents
            .iter()
            .filter(|i| i.name() == intent_name)
            .peekable();
        matching.peek()?;

        Some(matching.fold(value.clone(), |current, intent| {
            intent.mutate(&current, payload, ctx).unwrap_or(current)
        }))
    }
}
