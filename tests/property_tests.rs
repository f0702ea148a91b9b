//! # Property-Based Tests
//!
//! Invariants of selector addressing, subscription matching and equality.

use proptest::collection::vec;
use proptest::prelude::*;
use selectree::subscription::SubscriptionTree;
use selectree::{shallow_eq, strict_eq, Selector, Store, StoreConfig, Value};
use std::cell::Cell;
use std::rc::Rc;

fn key() -> impl Strategy<Value = String> {
    "[a-d]{1,2}"
}

fn path() -> impl Strategy<Value = Vec<String>> {
    vec(key(), 1..5)
}

fn quiet_store() -> Store {
    Store::builder().config(StoreConfig::production()).build()
}

proptest! {
    /// A subscriber at a prefix fires for writes below it, and a subscriber
    /// below fires for writes at the prefix.
    #[test]
    fn ancestor_descendant_symmetry(shallow in path(), tail in vec(key(), 0..3)) {
        let mut deep = shallow.clone();
        deep.extend(tail);

        let mut tree = SubscriptionTree::new();
        tree.subscribe(&shallow, 1u32);
        tree.subscribe(&deep, 2u32);

        let at_deep = tree.collect(&deep);
        let at_shallow = tree.collect(&shallow);
        prop_assert!(at_deep.contains(&1) && at_deep.contains(&2));
        prop_assert!(at_shallow.contains(&1) && at_shallow.contains(&2));
    }

    /// Unrelated paths never match.
    #[test]
    fn disjoint_paths_do_not_match(a in path(), b in path()) {
        let related = Selector::from(a.clone()).is_related_to(&Selector::from(b.clone()));

        let mut tree = SubscriptionTree::new();
        tree.subscribe(&a, 1u32);
        prop_assert_eq!(!tree.collect(&b).is_empty(), related);
    }

    /// Collection never reports a subscriber twice.
    #[test]
    fn collect_is_deduplicated(paths in vec(path(), 1..8), probe in path()) {
        let mut tree = SubscriptionTree::new();
        for p in &paths {
            tree.subscribe(p, 7u32);
        }
        prop_assert!(tree.collect(&probe).len() <= 1);
    }

    /// Whatever is written at a path reads back unchanged.
    #[test]
    fn set_then_get_round_trip(p in path(), n in any::<i64>()) {
        let store = quiet_store();
        store.set_partial_state(p.clone(), n).expect("non-root write");
        prop_assert_eq!(store.get_partial_state(p), Some(Value::from(n)));
    }

    /// A write only notifies subscribers whose selector overlaps it.
    #[test]
    fn writes_notify_related_subscribers(watched in path(), written in path()) {
        let store = quiet_store();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _sub = store.subscribe_to_state([watched.clone()], move |_| counter.set(counter.get() + 1));

        store.set_partial_state(written.clone(), 1).expect("non-root write");
        store.run_until_idle();

        let related = Selector::from(watched).is_related_to(&Selector::from(written));
        prop_assert_eq!(calls.get() == 1, related);
    }

    /// Shallow equality of maps holds for equal scalar entries.
    #[test]
    fn shallow_eq_of_scalar_maps(entries in vec((key(), any::<i64>()), 0..6)) {
        let a = Value::map(entries.clone());
        let b = Value::map(entries);
        prop_assert!(shallow_eq(&a, &b));
        prop_assert!(!strict_eq(&a, &b));
    }
}
