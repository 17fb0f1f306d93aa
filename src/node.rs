//! Node storage for the rope: bounded character chunks linked into
//! per-segment chains (or small trees), held in a per-rope arena.
//!
//! Parent links are arena indices rather than pointers, so splicing a node
//! into a new position just rebinds an index and there is nothing to dangle.

use std::ops::{Index, IndexMut};

use str_indices::chars;

use crate::RopeError;

/// Stable handle to a chunk-bearing node inside one rope's arena.
///
/// A `LeafId` is only meaningful for the rope that produced it, and any
/// mutation of that rope (insert, push, clear) may invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafId(pub(crate) u32);

#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Chunk text. At most `max_leaf_size` chars once an operation
    /// completes; may transiently exceed it mid-splice.
    pub(crate) chunk: String,
    /// Cached char count of `chunk`.
    pub(crate) num_chars: usize,
    pub(crate) left: Option<LeafId>,
    pub(crate) right: Option<LeafId>,
    /// Back-reference for climbing. Never owning; segment roots hold `None`.
    pub(crate) top: Option<LeafId>,
    /// Cached `size(left) + num_chars`. Routes index lookups without
    /// rescanning the left subtree.
    pub(crate) weight: usize,
    /// When set, `right` belongs to the *next* segment: size, routing and
    /// rightmost-descent all stop here.
    pub(crate) ending: bool,
}

impl Node {
    pub(crate) fn left_size(&self) -> usize {
        self.weight - self.num_chars
    }

    /// The right child, unless it sits across a segment boundary.
    pub(crate) fn seg_right(&self) -> Option<LeafId> {
        if self.ending {
            None
        } else {
            self.right
        }
    }
}

/// All nodes of one rope. Push-only: nodes are never freed individually,
/// only wholesale by `clear`, so no free list is needed.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
}

impl Index<LeafId> for NodeArena {
    type Output = Node;

    fn index(&self, id: LeafId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

impl IndexMut<LeafId> for NodeArena {
    fn index_mut(&mut self, id: LeafId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}

impl NodeArena {
    pub(crate) fn alloc(&mut self, chunk: String, num_chars: usize) -> LeafId {
        debug_assert_eq!(chars::count(&chunk), num_chars);
        let id = LeafId(self.nodes.len() as u32);
        self.nodes.push(Node {
            weight: num_chars,
            num_chars,
            chunk,
            left: None,
            right: None,
            top: None,
            ending: false,
        });
        id
    }

    pub(crate) fn alloc_empty(&mut self) -> LeafId {
        self.alloc(String::new(), 0)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Chars held by the subtree at `id`, not crossing an ending node.
    pub(crate) fn subtree_size(&self, mut id: LeafId) -> usize {
        let mut total = 0;
        loop {
            let n = &self[id];
            total += n.num_chars;
            if let Some(l) = n.left {
                total += self.subtree_size(l);
            }
            match n.seg_right() {
                Some(r) => id = r,
                None => return total,
            }
        }
    }

    /// Route a segment-local char index down to the owning chunk.
    ///
    /// Returns the leaf and the in-chunk char offset. The caller (the rope)
    /// must never hand over an index past the subtree; if one lands here
    /// anyway, that is an internal fault, reported as `InvariantViolation`
    /// rather than an out-of-range error.
    pub(crate) fn leaf_by_index(
        &self,
        mut id: LeafId,
        mut index: usize,
    ) -> Result<(LeafId, usize), RopeError> {
        loop {
            let n = &self[id];
            if let Some(l) = n.left {
                if index < n.left_size() {
                    id = l;
                    continue;
                }
            }
            let rem = index - n.left_size();
            if rem < n.num_chars {
                return Ok((id, rem));
            }
            match n.seg_right() {
                Some(r) => {
                    id = r;
                    index = rem - n.num_chars;
                }
                None => return Err(RopeError::InvariantViolation),
            }
        }
    }

    pub(crate) fn leftmost(&self, mut id: LeafId) -> LeafId {
        while let Some(l) = self[id].left {
            id = l;
        }
        id
    }

    /// Rightmost leaf of the subtree, stopping at an ending node so the
    /// descent never leaks into the next segment.
    pub(crate) fn rightmost(&self, mut id: LeafId) -> LeafId {
        while let Some(r) = self[id].seg_right() {
            id = r;
        }
        id
    }

    /// Recompute cached weights from `from` up along the `top` chain.
    pub(crate) fn recompute_weights(&mut self, from: LeafId) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            let left_size = match self[id].left {
                Some(l) => self.subtree_size(l),
                None => 0,
            };
            let n = &mut self[id];
            n.weight = left_size + n.num_chars;
            cur = self[id].top;
        }
    }

    /// Structural equality of two subtrees, possibly across arenas: same
    /// weights, same chunk partitioning, same shape. Never crosses an
    /// ending boundary, so segments compare independently.
    pub(crate) fn subtree_eq(&self, mut a: LeafId, other: &NodeArena, mut b: LeafId) -> bool {
        loop {
            let (na, nb) = (&self[a], &other[b]);
            if na.weight != nb.weight || na.chunk != nb.chunk {
                return false;
            }
            match (na.left, nb.left) {
                (Some(x), Some(y)) => {
                    if !self.subtree_eq(x, other, y) {
                        return false;
                    }
                }
                (None, None) => {}
                _ => return false,
            }
            match (na.seg_right(), nb.seg_right()) {
                (Some(x), Some(y)) => {
                    a = x;
                    b = y;
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ab / cd \ ef -- a one-level tree with a chunk in every node.
    fn small_tree() -> (NodeArena, LeafId) {
        let mut arena = NodeArena::default();
        let root = arena.alloc("cd".into(), 2);
        let left = arena.alloc("ab".into(), 2);
        let right = arena.alloc("ef".into(), 2);
        arena[root].left = Some(left);
        arena[root].right = Some(right);
        arena[left].top = Some(root);
        arena[right].top = Some(root);
        arena.recompute_weights(left);
        (arena, root)
    }

    #[test]
    fn routes_through_left_subtree() {
        let (arena, root) = small_tree();
        assert_eq!(arena.subtree_size(root), 6);
        assert_eq!(arena[root].weight, 4);

        let (leaf, off) = arena.leaf_by_index(root, 1).unwrap();
        assert_eq!(arena[leaf].chunk, "ab");
        assert_eq!(off, 1);

        let (leaf, off) = arena.leaf_by_index(root, 2).unwrap();
        assert_eq!(arena[leaf].chunk, "cd");
        assert_eq!(off, 0);

        let (leaf, off) = arena.leaf_by_index(root, 5).unwrap();
        assert_eq!(arena[leaf].chunk, "ef");
        assert_eq!(off, 1);
    }

    #[test]
    fn routing_past_subtree_is_an_invariant_violation() {
        let (arena, root) = small_tree();
        assert_eq!(
            arena.leaf_by_index(root, 6),
            Err(RopeError::InvariantViolation)
        );
    }

    #[test]
    fn extremes() {
        let (arena, root) = small_tree();
        assert_eq!(arena[arena.leftmost(root)].chunk, "ab");
        assert_eq!(arena[arena.rightmost(root)].chunk, "ef");
    }

    #[test]
    fn rightmost_stops_at_ending_node() {
        let mut arena = NodeArena::default();
        let a = arena.alloc("aa".into(), 2);
        let b = arena.alloc("bb".into(), 2);
        arena[a].right = Some(b);
        arena[a].ending = true;
        assert_eq!(arena.rightmost(a), a);
        assert_eq!(arena.subtree_size(a), 2);
    }

    #[test]
    fn structural_equality_is_shape_sensitive() {
        let (a, ra) = small_tree();
        let (b, rb) = small_tree();
        assert!(a.subtree_eq(ra, &b, rb));

        // Same text, different partitioning: a chain abc -> def.
        let mut c = NodeArena::default();
        let head = c.alloc("abc".into(), 3);
        let tail = c.alloc("def".into(), 3);
        c[head].right = Some(tail);
        c[tail].top = Some(head);
        c.recompute_weights(tail);
        assert_eq!(c.subtree_size(head), 6);
        assert!(!a.subtree_eq(ra, &c, head));
    }

    #[test]
    fn ending_tail_compares_equal_to_plain_tail() {
        let mut a = NodeArena::default();
        let ha = a.alloc("xy".into(), 2);
        let mut b = NodeArena::default();
        let hb = b.alloc("xy".into(), 2);
        let next_seg = b.alloc("zz".into(), 2);
        b[hb].right = Some(next_seg);
        b[hb].ending = true;
        assert!(a.subtree_eq(ha, &b, hb));
    }
}
