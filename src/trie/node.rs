use std::sync::Arc;

use rle::{merge_items, RleRun};
use smallvec::SmallVec;

use crate::Elem;
use super::{capacity_at_height, Chunk, BRANCH_FACTOR, RUN_MAX, SPARSE_MAX};

/// A trie node. Internal nodes hold up to 32 children; leaves hold up to 32 elements.
///
/// Each shape exists in an uncompressed form and in compressed forms chosen by density and
/// repetition heuristics. Compression is an encoding detail: `child_node`, `child_value`,
/// `set_child`, `set_value` and `size` behave identically across forms, and every compressed
/// node reports the same size as its expanded equivalent.
///
/// Because the vector is left-packed, live slots always form a contiguous prefix. The sparse
/// forms still carry explicit slot keys so that lookups and rewrites never need to know that,
/// but `dbg_check` asserts the prefix invariant.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node<T: Elem> {
    Branch(Branch<T>),
    SparseBranch(SparseBranch<T>),
    Leaf(Chunk<T>),
    SparseLeaf(SparseLeaf<T>),
    RunLeaf(RunLeaf<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch<T: Elem> {
    /// Total number of elements reachable beneath this node.
    pub size: usize,
    pub children: SmallVec<Arc<Node<T>>, BRANCH_FACTOR>,
}

/// A branch with few live children, stored as (slot, child) pairs sorted by slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SparseBranch<T: Elem> {
    pub size: usize,
    pub slots: SmallVec<(u8, Arc<Node<T>>), SPARSE_MAX>,
}

/// A leaf with few live values, stored as (slot, value) pairs sorted by slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SparseLeaf<T: Elem> {
    pub slots: SmallVec<(u8, T), SPARSE_MAX>,
}

/// A leaf whose values collapse into a handful of runs of equal elements.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunLeaf<T: Elem> {
    pub len: usize,
    pub runs: SmallVec<RleRun<T>, RUN_MAX>,
}

/// Iterator over the live children of a branch, in slot order.
pub(crate) enum ChildIter<'a, T: Elem> {
    Dense(std::slice::Iter<'a, Arc<Node<T>>>),
    Sparse(std::slice::Iter<'a, (u8, Arc<Node<T>>)>),
}

impl<'a, T: Elem> Iterator for ChildIter<'a, T> {
    type Item = &'a Arc<Node<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ChildIter::Dense(it) => it.next(),
            ChildIter::Sparse(it) => it.next().map(|(_, c)| c),
        }
    }
}

impl<T: Elem> Node<T> {
    /// Build a leaf from a chunk, applying the compression policy: run-compress when the chunk
    /// collapses to at most `RUN_MAX` runs, otherwise store sparse while the live-slot ratio is
    /// under the sparse threshold, otherwise dense.
    pub fn leaf_from_chunk(chunk: Chunk<T>) -> Node<T> {
        debug_assert!(!chunk.is_empty(), "leaves hold at least one element");
        let runs = chunk.count_runs();
        if runs <= RUN_MAX {
            let out: SmallVec<RleRun<T>, RUN_MAX> =
                merge_items(chunk.iter().map(|v| RleRun::single(v.clone()))).collect();
            Node::RunLeaf(RunLeaf { len: chunk.len(), runs: out })
        } else if chunk.len() <= SPARSE_MAX {
            let slots = chunk.iter().cloned().enumerate()
                .map(|(i, v)| (i as u8, v))
                .collect();
            Node::SparseLeaf(SparseLeaf { slots })
        } else {
            Node::Leaf(chunk)
        }
    }

    /// Build a branch from a contiguous run of children, applying the sparse policy.
    pub fn branch_from_children(children: SmallVec<Arc<Node<T>>, BRANCH_FACTOR>) -> Node<T> {
        debug_assert!(!children.is_empty());
        let size = children.iter().map(|c| c.size()).sum();
        if children.len() <= SPARSE_MAX {
            let slots = children.into_iter().enumerate()
                .map(|(i, c)| (i as u8, c))
                .collect();
            Node::SparseBranch(SparseBranch { size, slots })
        } else {
            Node::Branch(Branch { size, children })
        }
    }

    pub fn branch_with_child(child: Arc<Node<T>>) -> Node<T> {
        let mut children: SmallVec<Arc<Node<T>>, BRANCH_FACTOR> = SmallVec::new();
        children.push(child);
        Node::branch_from_children(children)
    }

    pub fn size(&self) -> usize {
        match self {
            Node::Branch(b) => b.size,
            Node::SparseBranch(b) => b.size,
            Node::Leaf(c) => c.len(),
            Node::SparseLeaf(l) => l.slots.len(),
            Node::RunLeaf(l) => l.len,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_) | Node::SparseLeaf(_) | Node::RunLeaf(_))
    }

    /// Number of live child slots of a branch, or live values of a leaf.
    pub fn live_slots(&self) -> usize {
        match self {
            Node::Branch(b) => b.children.len(),
            Node::SparseBranch(b) => b.slots.len(),
            leaf => leaf.size(),
        }
    }

    pub fn child_node(&self, slot: usize) -> Option<&Arc<Node<T>>> {
        match self {
            Node::Branch(b) => b.children.get(slot),
            Node::SparseBranch(b) => b.slots.iter()
                .find(|(k, _)| *k as usize == slot)
                .map(|(_, c)| c),
            _ => panic!("child_node on a leaf"),
        }
    }

    pub fn child_value(&self, slot: usize) -> Option<&T> {
        match self {
            Node::Leaf(c) => c.get(slot),
            Node::SparseLeaf(l) => l.slots.iter()
                .find(|(k, _)| *k as usize == slot)
                .map(|(_, v)| v),
            Node::RunLeaf(l) => {
                let mut base = 0;
                for run in l.runs.iter() {
                    if slot < base + run.len {
                        return Some(&run.val);
                    }
                    base += run.len;
                }
                None
            }
            _ => panic!("child_value on a branch"),
        }
    }

    pub fn children(&self) -> ChildIter<'_, T> {
        match self {
            Node::Branch(b) => ChildIter::Dense(b.children.iter()),
            Node::SparseBranch(b) => ChildIter::Sparse(b.slots.iter()),
            _ => panic!("children on a leaf"),
        }
    }

    /// Child by ordinal position among live children (not by slot key). Used by traversals.
    pub fn child_at_pos(&self, pos: usize) -> Option<&Arc<Node<T>>> {
        match self {
            Node::Branch(b) => b.children.get(pos),
            Node::SparseBranch(b) => b.slots.get(pos).map(|(_, c)| c),
            _ => panic!("child_at_pos on a leaf"),
        }
    }

    pub fn get_child_mut(&mut self, slot: usize) -> Option<&mut Arc<Node<T>>> {
        match self {
            Node::Branch(b) => b.children.get_mut(slot),
            Node::SparseBranch(b) => b.slots.iter_mut()
                .find(|(k, _)| *k as usize == slot)
                .map(|(_, c)| c),
            _ => panic!("get_child_mut on a leaf"),
        }
    }

    /// The node's size changed further down the tree; fold the delta into this branch.
    pub fn adjust_size(&mut self, delta: isize) {
        let size = match self {
            Node::Branch(b) => &mut b.size,
            Node::SparseBranch(b) => &mut b.size,
            _ => panic!("adjust_size on a leaf"),
        };
        *size = size.checked_add_signed(delta).expect("branch size underflow");
    }

    /// Replace or append the child at `slot`, keeping `size` consistent. Appends must be
    /// contiguous: `slot` is either live or the first free slot. A sparse branch pushed past
    /// the density threshold decompresses to the dense form.
    pub fn set_child(&mut self, slot: usize, child: Arc<Node<T>>) {
        match self {
            Node::Branch(b) => {
                if slot < b.children.len() {
                    b.size = b.size - b.children[slot].size() + child.size();
                    b.children[slot] = child;
                } else {
                    assert_eq!(slot, b.children.len(), "non-contiguous child slot");
                    b.size += child.size();
                    b.children.push(child);
                }
            }
            Node::SparseBranch(b) => {
                match b.slots.iter().position(|(k, _)| *k as usize >= slot) {
                    Some(pos) if b.slots[pos].0 as usize == slot => {
                        b.size = b.size - b.slots[pos].1.size() + child.size();
                        b.slots[pos].1 = child;
                        return;
                    }
                    Some(pos) => {
                        b.size += child.size();
                        b.slots.insert(pos, (slot as u8, child));
                    }
                    None => {
                        b.size += child.size();
                        b.slots.push((slot as u8, child));
                    }
                }
                if b.slots.len() > SPARSE_MAX {
                    // Density rose above the sparse threshold: decompress.
                    let size = b.size;
                    let mut children: SmallVec<Arc<Node<T>>, BRANCH_FACTOR> = SmallVec::new();
                    for (k, c) in std::mem::take(&mut b.slots) {
                        assert_eq!(k as usize, children.len(), "non-contiguous sparse branch");
                        children.push(c);
                    }
                    *self = Node::Branch(Branch { size, children });
                }
            }
            _ => panic!("set_child on a leaf"),
        }
    }

    /// Remove and return the last live child, keeping `size` consistent.
    pub fn remove_last_child(&mut self) -> Arc<Node<T>> {
        match self {
            Node::Branch(b) => {
                let child = b.children.pop().expect("remove_last_child on empty branch");
                b.size -= child.size();
                child
            }
            Node::SparseBranch(b) => {
                let (_, child) = b.slots.pop().expect("remove_last_child on empty branch");
                b.size -= child.size();
                child
            }
            _ => panic!("remove_last_child on a leaf"),
        }
    }

    pub fn first_child(&self) -> &Arc<Node<T>> {
        match self {
            Node::Branch(b) => &b.children[0],
            Node::SparseBranch(b) => &b.slots[0].1,
            _ => panic!("first_child on a leaf"),
        }
    }

    pub fn last_child_mut(&mut self) -> &mut Arc<Node<T>> {
        match self {
            Node::Branch(b) => b.children.last_mut().expect("empty branch"),
            Node::SparseBranch(b) => &mut b.slots.last_mut().expect("empty branch").1,
            _ => panic!("last_child_mut on a leaf"),
        }
    }

    /// Overwrite the value at a live leaf slot. Dense leaves write in place; a run leaf whose
    /// run structure the write may break is rebuilt through the leaf construction policy.
    pub fn set_value(&mut self, slot: usize, value: T) {
        match self {
            Node::Leaf(c) => {
                assert!(slot < c.len(), "set_value on a dead slot");
                c.set(slot, value);
            }
            Node::SparseLeaf(l) => {
                let entry = l.slots.iter_mut()
                    .find(|(k, _)| *k as usize == slot)
                    .expect("set_value on a dead slot");
                entry.1 = value;
            }
            Node::RunLeaf(_) => {
                let mut chunk = self.to_chunk();
                assert!(slot < chunk.len(), "set_value on a dead slot");
                chunk.set(slot, value);
                *self = Node::leaf_from_chunk(chunk);
            }
            _ => panic!("set_value on a branch"),
        }
    }

    /// Copy-on-write counterpart of [`Node::set_child`].
    pub fn with_child(&self, slot: usize, child: Arc<Node<T>>) -> Node<T> {
        let mut out = self.clone();
        out.set_child(slot, child);
        out
    }

    /// Copy-on-write counterpart of [`Node::set_value`].
    pub fn with_value(&self, slot: usize, value: T) -> Node<T> {
        let mut out = self.clone();
        out.set_value(slot, value);
        out
    }

    /// Expand a leaf into its dense chunk form.
    pub fn to_chunk(&self) -> Chunk<T> {
        match self {
            Node::Leaf(c) => c.clone(),
            Node::SparseLeaf(l) => l.slots.iter().map(|(_, v)| v.clone()).collect(),
            Node::RunLeaf(l) => {
                let mut chunk = Chunk::new();
                for run in l.runs.iter() {
                    for _ in 0..run.len {
                        chunk.push(run.val.clone());
                    }
                }
                chunk
            }
            _ => panic!("to_chunk on a branch"),
        }
    }

    /// Deep invariant validation. `height` is this node's level (leaves are 0); `expect_full`
    /// requires the subtree to hold exactly its capacity.
    #[allow(unused)]
    pub fn dbg_check(&self, height: usize, expect_full: bool) {
        if expect_full {
            assert_eq!(self.size(), capacity_at_height(height));
        }
        match self {
            Node::Leaf(c) => {
                assert_eq!(height, 0);
                assert!(c.len() >= 1 && c.len() <= BRANCH_FACTOR);
            }
            Node::SparseLeaf(l) => {
                assert_eq!(height, 0);
                assert!(!l.slots.is_empty() && l.slots.len() <= SPARSE_MAX);
                for (i, (k, _)) in l.slots.iter().enumerate() {
                    assert_eq!(*k as usize, i, "sparse leaf slots must be a prefix");
                }
            }
            Node::RunLeaf(l) => {
                assert_eq!(height, 0);
                assert!(!l.runs.is_empty() && l.runs.len() <= RUN_MAX);
                assert_eq!(l.len, l.runs.iter().map(|r| r.len).sum::<usize>());
                assert!(l.len <= BRANCH_FACTOR);
                for r in l.runs.iter() {
                    assert!(r.len >= 1);
                }
                for pair in l.runs.windows(2) {
                    assert!(pair[0].val != pair[1].val, "adjacent runs must differ");
                }
            }
            Node::Branch(_) | Node::SparseBranch(_) => {
                assert!(height >= 1, "branch at leaf level");
                if let Node::SparseBranch(b) = self {
                    assert!(b.slots.len() <= SPARSE_MAX);
                    for (i, (k, _)) in b.slots.iter().enumerate() {
                        assert_eq!(*k as usize, i, "sparse branch slots must be a prefix");
                    }
                }
                let count = self.live_slots();
                assert!(count >= 1);
                let mut total = 0;
                for (i, child) in self.children().enumerate() {
                    // Left packing: every child except the last is a full subtree.
                    let child_full = expect_full || i + 1 < count;
                    child.dbg_check(height - 1, child_full);
                    total += child.size();
                }
                assert_eq!(self.size(), total, "branch size must equal the sum of its children");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_chunk() -> Chunk<u32> {
        (0..32).collect()
    }

    #[test]
    fn leaf_policy_picks_forms() {
        // 32 distinct values: dense.
        assert!(matches!(Node::leaf_from_chunk(dense_chunk()), Node::Leaf(_)));
        // One value repeated: run compressed.
        assert!(matches!(
            Node::leaf_from_chunk(Chunk::from_slice(&[7u32; 32])),
            Node::RunLeaf(_)
        ));
        // Four runs of eight: still run compressed.
        let mut four_runs = Chunk::new();
        for v in 0..4u32 {
            for _ in 0..8 {
                four_runs.push(v);
            }
        }
        assert!(matches!(Node::leaf_from_chunk(four_runs), Node::RunLeaf(_)));
        // Five runs: not run compressed; five distinct values is under the sparse threshold.
        let five: Chunk<u32> = (0..5).collect();
        assert!(matches!(Node::leaf_from_chunk(five), Node::SparseLeaf(_)));
        // Ten distinct values: too dense for sparse.
        let ten: Chunk<u32> = (0..10).collect();
        assert!(matches!(Node::leaf_from_chunk(ten), Node::Leaf(_)));
    }

    #[test]
    fn compression_is_transparent() {
        let chunk = Chunk::from_slice(&[5u32; 32]);
        let dense = Node::Leaf(chunk.clone());
        let compressed = Node::leaf_from_chunk(chunk);
        assert_eq!(dense.size(), compressed.size());
        for i in 0..32 {
            assert_eq!(dense.child_value(i), compressed.child_value(i));
        }
        assert_eq!(dense.child_value(32), None);
        assert_eq!(compressed.to_chunk(), dense.to_chunk());
    }

    #[test]
    fn run_leaf_rewrites_on_write() {
        let mut node = Node::leaf_from_chunk(Chunk::from_slice(&[1u32; 32]));
        assert!(matches!(node, Node::RunLeaf(_)));
        node.set_value(10, 2);
        assert_eq!(node.child_value(9), Some(&1));
        assert_eq!(node.child_value(10), Some(&2));
        assert_eq!(node.child_value(11), Some(&1));
        assert_eq!(node.size(), 32);
        // Three runs: still run compressed after the rewrite.
        assert!(matches!(node, Node::RunLeaf(_)));
        node.dbg_check(0, true);
    }

    #[test]
    fn sparse_branch_decompresses_on_density() {
        let leaf = Arc::new(Node::leaf_from_chunk(dense_chunk()));
        let mut children: SmallVec<Arc<Node<u32>>, BRANCH_FACTOR> = SmallVec::new();
        children.push(leaf.clone());
        let mut branch = Node::branch_from_children(children);
        assert!(matches!(branch, Node::SparseBranch(_)));

        for slot in 1..=SPARSE_MAX {
            branch.set_child(slot, leaf.clone());
        }
        // 10 live slots is past the 30% threshold.
        assert!(matches!(branch, Node::Branch(_)));
        assert_eq!(branch.size(), 32 * (SPARSE_MAX + 1));
        branch.dbg_check(1, false);
    }

    #[test]
    fn with_child_shares_size_accounting() {
        let full = Arc::new(Node::leaf_from_chunk(dense_chunk()));
        let partial = Arc::new(Node::leaf_from_chunk(Chunk::from_slice(&[1u32; 10])));
        let branch = Node::branch_with_child(full.clone());
        let replaced = branch.with_child(0, partial);
        assert_eq!(branch.size(), 32);
        assert_eq!(replaced.size(), 10);
    }

    #[test]
    fn remove_last_child_updates_size() {
        let leaf = Arc::new(Node::leaf_from_chunk(dense_chunk()));
        let mut branch = Node::branch_with_child(leaf.clone());
        branch.set_child(1, leaf.clone());
        assert_eq!(branch.size(), 64);
        let removed = branch.remove_last_child();
        assert_eq!(removed.size(), 32);
        assert_eq!(branch.size(), 32);
        assert_eq!(branch.live_slots(), 1);
    }
}
