use std::collections::BTreeMap;

#[derive(Debug)]
struct Node<S> {
    subscribers: Vec<S>,
    children: BTreeMap<String, Node<S>>,
}

impl<S> Default for Node<S> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            children: BTreeMap::new(),
        }
    }
}

impl<S> Node<S> {
    fn is_empty(&self) -> bool {
        self.subscribers.is_empty() && self.children.is_empty()
    }

    fn count(&self) -> usize {
        1 + self.children.values().map(Node::count).sum::<usize>()
    }
}

/// Maps selector paths to the subscribers registered at them.
///
/// One node per path segment. Collecting for a changed path returns every
/// subscriber whose selector overlaps it: all ancestors of the path (their
/// subtree now contains a change) and everything at or below it (their
/// selector was replaced along with its parent).
#[derive(Debug)]
pub struct SubscriptionTree<S> {
    root: Node<S>,
}

impl<S> Default for SubscriptionTree<S> {
    fn default() -> Self {
        Self {
            root: Node::default(),
        }
    }
}

impl<S: Clone + PartialEq> SubscriptionTree<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` at `selector`, creating nodes along the way.
    pub fn subscribe<K: AsRef<str>>(&mut self, selector: &[K], subscriber: S) {
        let mut node = &mut self.root;
        for key in selector {
            node = node.children.entry(key.as_ref().to_owned()).or_default();
        }
        node.subscribers.push(subscriber);
    }

    /// Remove one registration of `subscriber` at `selector`.
    ///
    /// A path that was never subscribed is a no-op. Branches left without
    /// subscribers are pruned. Returns whether anything was removed.
    pub fn unsubscribe<K: AsRef<str>>(&mut self, selector: &[K], subscriber: &S) -> bool {
        let (removed, _) = Self::remove_from(&mut self.root, selector, subscriber);
        removed
    }

    /// Returns (removed, node is now empty).
    fn remove_from<K: AsRef<str>>(node: &mut Node<S>, selector: &[K], subscriber: &S) -> (bool, bool) {
        let removed = match selector.split_first() {
            None => match node.subscribers.iter().position(|s| s == subscriber) {
                Some(idx) => {
                    node.subscribers.remove(idx);
                    true
                }
                None => false,
            },
            Some((key, rest)) => {
                let key = key.as_ref();
                let Some(child) = node.children.get_mut(key) else {
                    return (false, false);
                };
                let (removed, child_empty) = Self::remove_from(child, rest, subscriber);
                if child_empty {
                    node.children.remove(key);
                }
                removed
            }
        };
        (removed, node.is_empty())
    }

    /// Every subscriber interested in a change at `selector`, deduplicated in
    /// first-seen order.
    ///
    /// Ancestors come first, root downwards. If the walk runs out of nodes
    /// before the end of `selector`, the deepest node reached is the last
    /// contributor; otherwise the node at `selector` and its whole subtree are
    /// added.
    pub fn collect<K: AsRef<str>>(&self, selector: &[K]) -> Vec<S> {
        let mut found = Vec::new();
        let mut node = &self.root;

        for key in selector {
            push_unique(&mut found, &node.subscribers);
            match node.children.get(key.as_ref()) {
                Some(child) => node = child,
                None => return found,
            }
        }

        collect_subtree(node, &mut found);
        found
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        fn count<S>(node: &Node<S>) -> usize {
            node.subscribers.len() + node.children.values().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }
}

fn push_unique<S: Clone + PartialEq>(found: &mut Vec<S>, subscribers: &[S]) {
    for subscriber in subscribers {
        if !found.contains(subscriber) {
            found.push(subscriber.clone());
        }
    }
}

fn collect_subtree<S: Clone + PartialEq>(node: &Node<S>, found: &mut Vec<S>) {
    push_unique(found, &node.subscribers);
    for child in node.children.values() {
        collect_subtree(child, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_top_level_selector() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);
        tree.subscribe(&["bar"], 2);

        assert_eq!(tree.collect(&["foo"]), vec![1]);
    }

    #[test]
    fn collects_nested_selector() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo", "bar"], 1);

        assert_eq!(tree.collect(&["foo", "bar"]), vec![1]);
    }

    #[test]
    fn collects_descendants_of_the_selector() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo", "bar", "baz"], 1);

        assert_eq!(tree.collect(&["foo"]), vec![1]);
        assert_eq!(tree.collect::<&str>(&[]), vec![1]);
    }

    #[test]
    fn collects_ancestors_of_the_selector() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe::<&str>(&[], 0);
        tree.subscribe(&["foo"], 1);
        tree.subscribe(&["foo", "bar"], 2);

        assert_eq!(tree.collect(&["foo", "bar", "baz"]), vec![0, 1, 2]);
        assert_eq!(tree.collect(&["foo", "bar"]), vec![0, 1, 2]);
    }

    #[test]
    fn parent_of_an_existing_terminal_node_is_collected() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["deep"], 1);
        tree.subscribe(&["deep", "nested"], 2);

        assert_eq!(tree.collect(&["deep", "nested"]), vec![1, 2]);
        assert_eq!(tree.collect(&["deep"]), vec![1, 2]);
    }

    #[test]
    fn empty_when_nothing_matches() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);

        assert!(tree.collect(&["bar", "baz"]).is_empty());
        assert!(SubscriptionTree::<u32>::new().collect(&["x"]).is_empty());
    }

    #[test]
    fn does_not_collect_an_unsubscribed_selector() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);
        assert!(tree.unsubscribe(&["foo"], &1));

        assert!(tree.collect(&["foo"]).is_empty());
    }

    #[test]
    fn unsubscribing_unknown_paths_is_a_no_op() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);

        assert!(!tree.unsubscribe(&["foo", "bar"], &1));
        assert!(!tree.unsubscribe(&["foo"], &2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn collects_multiple_subscribers() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);
        tree.subscribe(&["foo"], 2);
        tree.subscribe(&["foo", "bar"], 3);

        assert_eq!(tree.collect(&["foo"]), vec![1, 2, 3]);
    }

    #[test]
    fn collects_a_subscriber_once() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);
        tree.subscribe(&["foo", "bar"], 1);
        tree.subscribe(&["foo", "baz"], 1);

        assert_eq!(tree.collect(&["foo"]), vec![1]);
        assert_eq!(tree.collect(&["foo", "bar"]), vec![1]);
    }

    #[test]
    fn unsubscribe_removes_one_registration() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["foo"], 1);
        tree.subscribe(&["foo"], 1);
        tree.unsubscribe(&["foo"], &1);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.collect(&["foo"]), vec![1]);
    }

    #[test]
    fn empty_branches_are_pruned() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(&["a", "b", "c"], 1);
        tree.subscribe(&["a"], 2);
        assert_eq!(tree.node_count(), 4);

        tree.unsubscribe(&["a", "b", "c"], &1);
        assert_eq!(tree.node_count(), 2);

        tree.unsubscribe(&["a"], &2);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.is_empty());
    }
}
