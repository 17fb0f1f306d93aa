//! The rope engine: an ordered forest of independently bounded segments.
//!
//! Each segment owns a chain of chunk nodes plus a cached char length.
//! A global char index is routed by a linear scan over the segment lengths,
//! then down the owning segment's nodes by cached weights. Inserts splice
//! into the owning chunk, repeatedly cut it back down to the leaf bound,
//! and cut the whole chain when the segment outgrows the root bound. No
//! rebalancing happens: the chain per segment is capped by `max_root_size`,
//! so lookups inside a segment stay bounded.

use std::fmt;

use str_indices::chars;

use crate::node::{LeafId, NodeArena};
use crate::RopeError;

/// Chunk char bound when constructed with [`SegRope::new`].
pub const DEFAULT_MAX_LEAF_SIZE: usize = 128;
/// Segment char bound when constructed with [`SegRope::new`].
pub const DEFAULT_MAX_ROOT_SIZE: usize = 512;

#[derive(Debug, Clone, Copy)]
struct Segment {
    root: LeafId,
    /// Cached char count of the chain rooted here, up to its ending node.
    len: usize,
}

/// A mutable character rope over a forest of bounded segments.
///
/// Indices are char offsets; content is UTF-8. Bounds are fixed at
/// construction. Localized inserts only touch the owning chunk and its
/// chain, never the whole sequence.
///
/// ```
/// use segrope::SegRope;
///
/// let mut r = SegRope::from("Hello, world");
/// r.insert_at(7, "my dear ");
/// assert_eq!(r.to_string(), "Hello, my dear world");
/// ```
#[derive(Clone)]
pub struct SegRope {
    arena: NodeArena,
    segments: Vec<Segment>,
    max_leaf: usize,
    max_root: usize,
}

impl SegRope {
    /// An empty rope with the default bounds.
    pub fn new() -> Self {
        Self::with_bounds(DEFAULT_MAX_LEAF_SIZE, DEFAULT_MAX_ROOT_SIZE)
    }

    /// An empty rope with custom chunk and segment char bounds.
    ///
    /// Panics if either bound is zero.
    pub fn with_bounds(max_leaf_size: usize, max_root_size: usize) -> Self {
        assert!(max_leaf_size >= 1, "max_leaf_size must be at least 1");
        assert!(max_root_size >= 1, "max_root_size must be at least 1");
        let mut arena = NodeArena::default();
        let root = arena.alloc_empty();
        SegRope {
            arena,
            segments: vec![Segment { root, len: 0 }],
            max_leaf: max_leaf_size,
            max_root: max_root_size,
        }
    }

    pub fn max_leaf_size(&self) -> usize {
        self.max_leaf
    }

    pub fn max_root_size(&self) -> usize {
        self.max_root
    }

    /// Total char count: the sum of the cached segment lengths.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.len == 0)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Cached char length of segment `i`, if it exists.
    pub fn segment_len(&self, i: usize) -> Option<usize> {
        self.segments.get(i).map(|s| s.len)
    }

    /// Ordinal of the segment owning char `index`.
    pub fn segment_at(&self, index: usize) -> Result<usize, RopeError> {
        if index >= self.len() {
            return Err(RopeError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.locate(index).0)
    }

    /// The chunk owning char `index`, plus the in-chunk char offset.
    ///
    /// The returned id stays valid until the next mutation of this rope.
    pub fn leaf_at(&self, index: usize) -> Result<(LeafId, usize), RopeError> {
        let len = self.len();
        if index >= len {
            return Err(RopeError::IndexOutOfRange { index, len });
        }
        let (si, local) = self.locate(index);
        self.arena.leaf_by_index(self.segments[si].root, local)
    }

    /// Chunk text of a leaf returned by [`leaf_at`](Self::leaf_at) or the
    /// traversal primitives.
    pub fn chunk_str(&self, leaf: LeafId) -> &str {
        &self.arena[leaf].chunk
    }

    pub fn char_at(&self, index: usize) -> Result<char, RopeError> {
        let (leaf, off) = self.leaf_at(index)?;
        let chunk = &self.arena[leaf].chunk;
        let byte = chars::to_byte_idx(chunk, off);
        chunk[byte..].chars().next().ok_or(RopeError::InvariantViolation)
    }

    /// Overwrite the char at `index` in place, returning the old char.
    ///
    /// The chunk's byte length may change; its char count (and so every
    /// cached weight and segment length) does not.
    pub fn set_char(&mut self, index: usize, ch: char) -> Result<char, RopeError> {
        let (leaf, off) = self.leaf_at(index)?;
        let n = &mut self.arena[leaf];
        let byte = chars::to_byte_idx(&n.chunk, off);
        let old = match n.chunk[byte..].chars().next() {
            Some(c) => c,
            None => return Err(RopeError::InvariantViolation),
        };
        let mut buf = [0u8; 4];
        n.chunk
            .replace_range(byte..byte + old.len_utf8(), ch.encode_utf8(&mut buf));
        Ok(old)
    }

    /// Append `s`, slicing it into chunks of at most `max_leaf_size` chars.
    ///
    /// The first piece fills an empty leading chunk when the tail segment is
    /// fresh; a piece that would push the tail segment past `max_root_size`
    /// opens a new segment instead. Amortized O(len / max_leaf_size).
    pub fn push_str(&mut self, s: &str) {
        let mut rest = s;
        while !rest.is_empty() {
            let cut = chars::to_byte_idx(rest, self.max_leaf);
            let (piece, rem) = rest.split_at(cut);
            self.push_piece(piece);
            rest = rem;
        }
    }

    fn push_piece(&mut self, piece: &str) {
        let piece_chars = chars::count(piece);
        debug_assert!(piece_chars >= 1 && piece_chars <= self.max_leaf);

        let tail = &self.segments[self.segments.len() - 1];
        if tail.len > 0 && tail.len + piece_chars > self.max_root {
            let root = self.arena.alloc_empty();
            self.segments.push(Segment { root, len: 0 });
        }

        let si = self.segments.len() - 1;
        let seg = self.segments[si];
        let mut tail_leaf = self.arena.rightmost(seg.root);
        if self.arena[tail_leaf].num_chars == 0 {
            // Fresh segment: move the piece straight into the empty root
            // chunk rather than chaining a node after an empty leaf.
            let n = &mut self.arena[tail_leaf];
            n.chunk.push_str(piece);
            n.num_chars = piece_chars;
        } else {
            debug_assert!(self.arena[tail_leaf].right.is_none());
            let id = self.arena.alloc(piece.to_owned(), piece_chars);
            self.arena[id].top = Some(tail_leaf);
            self.arena[tail_leaf].right = Some(id);
            tail_leaf = id;
        }
        self.arena.recompute_weights(tail_leaf);
        self.segments[si].len += piece_chars;
    }

    /// Splice `s` in before char `index`; `index >= len()` appends.
    ///
    /// Bounds never fail here (out-of-range is the append fast path), and
    /// the structure is only reshaped after the target chunk is resolved,
    /// so no call leaves it half-spliced.
    pub fn insert_at(&mut self, index: usize, s: &str) {
        if s.is_empty() {
            return;
        }
        if index >= self.len() {
            return self.push_str(s);
        }

        let (si, local) = self.locate(index);
        let (mut leaf, off) = self
            .arena
            .leaf_by_index(self.segments[si].root, local)
            .expect("segment routing failed for an in-range index");

        let ins_chars = chars::count(s);
        {
            let n = &mut self.arena[leaf];
            let byte = chars::to_byte_idx(&n.chunk, off);
            n.chunk.insert_str(byte, s);
            n.num_chars += ins_chars;
        }
        self.segments[si].len += ins_chars;

        // Cut the inflated chunk back down to the leaf bound. The suffix is
        // always non-empty, so exact fills never leave an empty leaf behind.
        while self.arena[leaf].num_chars > self.max_leaf {
            let (suffix, suffix_chars) = {
                let n = &mut self.arena[leaf];
                let byte = chars::to_byte_idx(&n.chunk, self.max_leaf);
                let moved = n.num_chars - self.max_leaf;
                n.num_chars = self.max_leaf;
                (n.chunk.split_off(byte), moved)
            };
            let new_leaf = self.arena.alloc(suffix, suffix_chars);
            self.link_after(leaf, new_leaf);
            leaf = new_leaf;
        }
        self.arena.recompute_weights(leaf);

        self.cut_overflow(si);
    }

    /// Chain `new_leaf` in right after `leaf`, rebinding `top` links. An
    /// ending flag on `leaf` moves to `new_leaf`, which then carries the
    /// link into the next segment.
    fn link_after(&mut self, leaf: LeafId, new_leaf: LeafId) {
        let old_right = self.arena[leaf].right;
        let old_ending = self.arena[leaf].ending;
        {
            let n = &mut self.arena[new_leaf];
            n.right = old_right;
            n.ending = old_ending;
            n.top = Some(leaf);
        }
        {
            let n = &mut self.arena[leaf];
            n.right = Some(new_leaf);
            n.ending = false;
        }
        if !old_ending {
            if let Some(r) = old_right {
                self.arena[r].top = Some(new_leaf);
            }
        }
    }

    /// Cut segment `si` at chunk boundaries until it fits `max_root_size`,
    /// promoting each remainder into a new segment immediately after it.
    /// The cut leaf is flagged ending and keeps its right link, so forward
    /// traversal crosses the new boundary in O(1); the promoted root's
    /// `top` is severed so climbing never escapes its segment.
    fn cut_overflow(&mut self, mut si: usize) {
        while self.segments[si].len > self.max_root {
            let root = self.segments[si].root;
            let mut cur = root;
            let mut acc = self.arena[cur].weight;
            while let Some(next) = self.arena[cur].seg_right() {
                if acc + self.arena[next].weight > self.max_root {
                    break;
                }
                acc += self.arena[next].weight;
                cur = next;
            }
            let head = match self.arena[cur].seg_right() {
                Some(h) => h,
                // A lone chunk over the bound (max_leaf > max_root): nothing
                // left to cut at a chunk boundary.
                None => return,
            };
            self.arena[cur].ending = true;
            self.arena[head].top = None;
            let tail_len = self.segments[si].len - acc;
            self.segments[si].len = acc;
            self.segments.insert(si + 1, Segment {
                root: head,
                len: tail_len,
            });
            si += 1;
        }
    }

    /// Leaf holding the chunk after `leaf`'s, crossing chunk and segment
    /// boundaries; `None` past the end of the rope. Amortized O(1) on a
    /// linear scan, O(depth) at subtree and segment boundaries.
    pub fn next_leaf(&self, leaf: LeafId) -> Option<LeafId> {
        if let Some(r) = self.arena[leaf].right {
            return Some(self.arena.leftmost(r));
        }
        let mut cur = leaf;
        while let Some(p) = self.arena[cur].top {
            if self.arena[p].right == Some(cur) {
                cur = p;
            } else {
                // Climbed out of a left subtree: the parent's own chunk sits
                // between its subtrees in logical order, exactly as routing
                // counts it, so the parent is the successor.
                return Some(p);
            }
        }
        // Chain exhausted: fall through to the adjacent segment.
        let si = self.segment_of_root(cur)?;
        let next = self.segments.get(si + 1)?;
        Some(self.arena.leftmost(next.root))
    }

    /// Mirror of [`next_leaf`](Self::next_leaf); `None` before the start.
    pub fn prev_leaf(&self, leaf: LeafId) -> Option<LeafId> {
        if let Some(l) = self.arena[leaf].left {
            return Some(self.arena.rightmost(l));
        }
        let mut cur = leaf;
        while let Some(t) = self.arena[cur].top {
            if self.arena[t].right == Some(cur) {
                return Some(t);
            }
            cur = t;
        }
        let si = self.segment_of_root(cur)?;
        if si == 0 {
            return None;
        }
        Some(self.arena.rightmost(self.segments[si - 1].root))
    }

    /// Release every node and reset to the single-empty-segment state.
    pub fn clear(&mut self) {
        self.arena.clear();
        let root = self.arena.alloc_empty();
        self.segments.clear();
        self.segments.push(Segment { root, len: 0 });
    }

    pub(crate) fn first_leaf_id(&self) -> LeafId {
        self.arena.leftmost(self.segments[0].root)
    }

    pub(crate) fn last_leaf_id(&self) -> LeafId {
        self.arena.rightmost(self.segments[self.segments.len() - 1].root)
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        let mut offset = 0;
        for (i, seg) in self.segments.iter().enumerate() {
            if index < offset + seg.len {
                return (i, index - offset);
            }
            offset += seg.len;
        }
        unreachable!("locate({}) past the end of the rope (len {})", index, self.len());
    }

    fn segment_of_root(&self, root: LeafId) -> Option<usize> {
        self.segments.iter().position(|s| s.root == root)
    }

    /// Validate every structural invariant, panicking on the first failure.
    pub fn check(&self) {
        assert!(!self.segments.is_empty());
        let mut total = 0;
        for (i, seg) in self.segments.iter().enumerate() {
            assert!(
                self.arena[seg.root].top.is_none(),
                "segment {} root has a parent link",
                i
            );
            assert_eq!(
                seg.len,
                self.arena.subtree_size(seg.root),
                "segment {} cached length out of sync",
                i
            );
            if self.max_leaf <= self.max_root {
                assert!(seg.len <= self.max_root, "segment {} over the root bound", i);
            }
            self.check_node(seg.root, i);
            total += seg.len;
        }
        assert_eq!(self.len(), total);
    }

    fn check_node(&self, id: LeafId, seg: usize) {
        let n = &self.arena[id];
        assert_eq!(n.num_chars, chars::count(&n.chunk), "stale chunk char count");
        assert!(n.num_chars <= self.max_leaf, "chunk over the leaf bound");
        assert!(
            n.num_chars > 0 || self.segments[seg].len == 0,
            "empty chunk in a non-empty segment"
        );
        let left_size = n.left.map_or(0, |l| self.arena.subtree_size(l));
        assert_eq!(n.weight, left_size + n.num_chars, "stale weight");
        if let Some(l) = n.left {
            assert_eq!(self.arena[l].top, Some(id), "left child top link broken");
            self.check_node(l, seg);
        }
        if let Some(r) = n.right {
            if n.ending {
                assert_eq!(
                    self.segment_of_root(r),
                    Some(seg + 1),
                    "ending node must link the next segment's root"
                );
            } else {
                assert_eq!(self.arena[r].top, Some(id), "right child top link broken");
                self.check_node(r, seg);
            }
        } else {
            assert!(!n.ending, "ending node without a right link");
        }
    }
}

impl Default for SegRope {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SegRope {
    /// Structural equality: equal total size and pairwise structurally
    /// equal segments. Chunking-sensitive on purpose: two ropes holding the
    /// same text but partitioned differently compare unequal.
    fn eq(&self, other: &SegRope) -> bool {
        self.len() == other.len()
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| {
                    a.len == b.len && self.arena.subtree_eq(a.root, &other.arena, b.root)
                })
    }
}
impl Eq for SegRope {}

impl fmt::Display for SegRope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SegRope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segs: Vec<Vec<&str>> = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            let last = self.arena.rightmost(seg.root);
            let mut chunks = Vec::new();
            let mut cur = Some(self.arena.leftmost(seg.root));
            while let Some(id) = cur {
                chunks.push(self.arena[id].chunk.as_str());
                if id == last {
                    break;
                }
                cur = self.next_leaf(id);
            }
            segs.push(chunks);
        }
        f.debug_struct("SegRope")
            .field("len", &self.len())
            .field("segments", &segs)
            .finish()
    }
}

impl<'a> From<&'a str> for SegRope {
    fn from(s: &str) -> Self {
        let mut r = SegRope::new();
        r.push_str(s);
        r
    }
}

impl From<String> for SegRope {
    fn from(s: String) -> Self {
        SegRope::from(s.as_str())
    }
}

impl<'a> Extend<&'a str> for SegRope {
    fn extend<T: IntoIterator<Item = &'a str>>(&mut self, iter: T) {
        iter.into_iter().for_each(|s| self.push_str(s));
    }
}
