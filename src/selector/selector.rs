use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Reserved first segment that routes reads to the computed-state table.
pub const COMPUTED_KEY: &str = "__computed__";

/// Ordered sequence of keys addressing a location in the state tree.
///
/// The empty selector addresses the whole tree. Two selectors are related
/// when one is a prefix of the other.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(Vec<String>);

/// Something suspicious about a selector, reported as a developer warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorProblem {
    EmptySegment { index: usize },
    MisplacedComputedKey { index: usize },
}

impl fmt::Display for SelectorProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorProblem::EmptySegment { index } => write!(f, "empty key at index {index}"),
            SelectorProblem::MisplacedComputedKey { index } => {
                write!(f, "reserved key \"{COMPUTED_KEY}\" at index {index}")
            }
        }
    }
}

impl Selector {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path such as `"todos.0.title"`. The empty string is the root.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        Self::new(path.split('.'))
    }

    /// Selector addressing the computed value registered under `label`.
    pub fn computed(label: impl Into<String>) -> Self {
        Self(vec![COMPUTED_KEY.to_owned(), label.into()])
    }

    /// The computed label, if this selector addresses computed state.
    pub fn computed_label(&self) -> Option<&str> {
        match self.0.as_slice() {
            [flag, label, ..] if flag == COMPUTED_KEY => Some(label.as_str()),
            _ => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.0.first().is_some_and(|k| k == COMPUTED_KEY)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Extend with one more key.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    pub fn is_prefix_of(&self, other: &Selector) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Ancestor, descendant or equal.
    pub fn is_related_to(&self, other: &Selector) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    pub fn problems(&self) -> Vec<SelectorProblem> {
        let mut problems = Vec::new();
        for (index, key) in self.0.iter().enumerate() {
            if key.is_empty() {
                problems.push(SelectorProblem::EmptySegment { index });
            }
            if index > 0 && key == COMPUTED_KEY {
                problems.push(SelectorProblem::MisplacedComputedKey { index });
            }
        }
        problems
    }
}

impl Deref for Selector {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<Vec<String>> for Selector {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

impl From<&Selector> for Selector {
    fn from(selector: &Selector) -> Self {
        selector.clone()
    }
}

impl From<&[&str]> for Selector {
    fn from(keys: &[&str]) -> Self {
        Self::new(keys.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Selector {
    fn from(keys: [&str; N]) -> Self {
        Self::new(keys)
    }
}

impl From<&str> for Selector {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Build a [`Selector`] from a list of keys.
///
/// ```
/// use selectree::selector;
///
/// let s = selector!["todos", "0"];
/// assert_eq!(s.keys(), ["todos", "0"]);
/// assert!(selector![].is_root());
/// ```
#[macro_export]
macro_rules! selector {
    () => {
        $crate::Selector::root()
    };
    ($($key:expr),+ $(,)?) => {
        $crate::Selector::new([$(::std::string::ToString::to_string(&$key)),+])
    };
}
