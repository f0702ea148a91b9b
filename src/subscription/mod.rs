//! Prefix-tree index from selector paths to subscribers.

mod tree;

pub use tree::SubscriptionTree;
