//! Structural edits on the trie. Everything here works through `Arc::make_mut`: on a freshly
//! cloned handle every node is shared, so the edit clones exactly the root-to-leaf path it
//! touches (a path copy). On a transient's exclusively owned graph the same code mutates in
//! place after the first touch.

use std::sync::Arc;

use crate::Elem;
use super::{capacity_at_height, Node, TrieVector, BRANCH_FACTOR, MASK, SHIFT};

/// Unwrap an Arc, cloning the contents only when they are shared.
pub(crate) fn take_arc<T: Clone>(arc: Arc<T>) -> T {
    Arc::try_unwrap(arc).unwrap_or_else(|a| (*a).clone())
}

/// Resolve a possibly-negative, possibly-oversized range against a length. Negative endpoints
/// count from the end; everything clamps to [0, len].
pub(crate) fn clamp_range(len: usize, start: isize, end: isize) -> (usize, usize) {
    let resolve = |i: isize| -> usize {
        if i < 0 {
            len.saturating_sub(i.unsigned_abs())
        } else {
            (i as usize).min(len)
        }
    };
    (resolve(start), resolve(end))
}

/// Read the element at trie index `index`, descending one radix digit per level.
pub(crate) fn get_in_node<T: Elem>(mut node: &Node<T>, mut level: usize, index: usize) -> Option<&T> {
    while level > 0 {
        let slot = (index >> (level * SHIFT)) & MASK;
        node = node.child_node(slot)?;
        level -= 1;
    }
    node.child_value(index & MASK)
}

/// Overwrite the element at trie index `index`, path-copying shared nodes on the way down.
pub(crate) fn set_in_node<T: Elem>(node: &mut Arc<Node<T>>, level: usize, index: usize, value: T) {
    let n = Arc::make_mut(node);
    if level == 0 {
        n.set_value(index & MASK, value);
        return;
    }
    let slot = (index >> (level * SHIFT)) & MASK;
    let child = n.get_child_mut(slot).expect("trie invariant: no child on an indexed path");
    set_in_node(child, level - 1, index, value);
}

/// Insert a frozen tail leaf at trie index `tail_offset`. When the trie is full at its current
/// height the root is wrapped in a new branch first.
pub(crate) fn push_leaf<T: Elem>(
    root: &mut Option<Arc<Node<T>>>,
    height: &mut usize,
    tail_offset: usize,
    leaf: Arc<Node<T>>,
) {
    if root.is_none() {
        debug_assert_eq!(tail_offset, 0);
        *root = Some(leaf);
        *height = 0;
        return;
    }
    if tail_offset == capacity_at_height(*height) {
        let old = root.take().expect("checked above");
        *root = Some(Arc::new(Node::branch_with_child(old)));
        *height += 1;
    }
    let r = root.as_mut().expect("checked above");
    push_leaf_at(r, *height, tail_offset, leaf);
}

fn push_leaf_at<T: Elem>(node: &mut Arc<Node<T>>, level: usize, index: usize, leaf: Arc<Node<T>>) {
    debug_assert!(level >= 1);
    let leaf_size = leaf.size();
    let n = Arc::make_mut(node);
    let slot = (index >> (level * SHIFT)) & MASK;
    if level == 1 {
        n.set_child(slot, leaf);
        return;
    }
    match n.get_child_mut(slot) {
        Some(child) => {
            push_leaf_at(child, level - 1, index, leaf);
            n.adjust_size(leaf_size as isize);
        }
        None => {
            // First leaf under this slot: build the spine down to it.
            let mut spine = leaf;
            for _ in 1..level {
                spine = Arc::new(Node::branch_with_child(spine));
            }
            n.set_child(slot, spine);
        }
    }
}

/// Remove and return the rightmost leaf of the trie, shrinking the root while it degenerates
/// to a single-child spine.
pub(crate) fn pop_leaf<T: Elem>(
    root: &mut Option<Arc<Node<T>>>,
    height: &mut usize,
) -> Arc<Node<T>> {
    if *height == 0 {
        return root.take().expect("pop_leaf on an empty trie");
    }
    let r = root.as_mut().expect("pop_leaf on an empty trie");
    let leaf = pop_leaf_at(r, *height);
    loop {
        let r = root.as_ref().expect("root vanished during pop");
        debug_assert!(r.size() > 0);
        if *height > 0 && r.live_slots() == 1 {
            let child = r.first_child().clone();
            *root = Some(child);
            *height -= 1;
        } else {
            break;
        }
    }
    leaf
}

fn pop_leaf_at<T: Elem>(node: &mut Arc<Node<T>>, level: usize) -> Arc<Node<T>> {
    let n = Arc::make_mut(node);
    if level == 1 {
        return n.remove_last_child();
    }
    let child = n.last_child_mut();
    let leaf = pop_leaf_at(child, level - 1);
    let child_empty = child.size() == 0;
    n.adjust_size(-(leaf.size() as isize));
    if child_empty {
        n.remove_last_child();
    }
    leaf
}

/// Walk the trie's leaves in index order, skipping the first `skip` and sharing the next
/// `take` of them into `out`. Whole subtrees are pruned from the skip without descending.
pub(crate) fn share_leaf_range<T: Elem>(
    node: &Arc<Node<T>>,
    out: &mut TrieVector<T>,
    skip: &mut usize,
    take: &mut usize,
) {
    if *take == 0 {
        return;
    }
    if node.is_leaf() {
        if *skip > 0 {
            *skip -= 1;
        } else {
            out.push_leaf_arc(node.clone());
            *take -= 1;
        }
        return;
    }
    for child in node.children() {
        if *take == 0 {
            return;
        }
        // Every trie leaf is full, so a subtree always covers size/B whole leaves.
        let leaves_below = child.size() / BRANCH_FACTOR;
        if *skip >= leaves_below {
            *skip -= leaves_below;
        } else {
            share_leaf_range(child, out, skip, take);
        }
    }
}
