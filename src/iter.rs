//! Cursors over the rope, built purely on the leaf traversal primitives.
//! No per-step index math: each step is a `next_leaf`/`prev_leaf` call or
//! a move inside the current chunk.

use crate::node::LeafId;
use crate::SegRope;

/// An iterator over the rope's chunks in logical order.
///
/// Empty chunks (the root of an empty rope) are skipped.
pub struct Chunks<'a> {
    rope: &'a SegRope,
    next: Option<LeafId>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(id) = self.next {
            self.next = self.rope.next_leaf(id);
            let s = self.rope.chunk_str(id);
            if !s.is_empty() {
                return Some(s);
            }
        }
        None
    }
}

/// A forward char cursor.
pub struct Chars<'a> {
    chunks: Chunks<'a>,
    cur: std::str::Chars<'a>,
}

impl<'a> Iterator for Chars<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.cur.next() {
                return Some(c);
            }
            self.cur = self.chunks.next()?.chars();
        }
    }
}

/// A backward char cursor, yielding chars from the end towards the start.
pub struct CharsRev<'a> {
    rope: &'a SegRope,
    leaf: Option<LeafId>,
    cur: std::iter::Rev<std::str::Chars<'a>>,
}

impl<'a> Iterator for CharsRev<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.cur.next() {
                return Some(c);
            }
            let id = self.leaf?;
            match self.rope.prev_leaf(id) {
                Some(p) => {
                    self.leaf = Some(p);
                    self.cur = self.rope.chunk_str(p).chars().rev();
                }
                None => {
                    self.leaf = None;
                    return None;
                }
            }
        }
    }
}

impl SegRope {
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            rope: self,
            next: Some(self.first_leaf_id()),
        }
    }

    pub fn chars(&self) -> Chars<'_> {
        Chars {
            chunks: self.chunks(),
            cur: "".chars(),
        }
    }

    pub fn chars_rev(&self) -> CharsRev<'_> {
        let last = self.last_leaf_id();
        CharsRev {
            rope: self,
            leaf: Some(last),
            cur: self.chunk_str(last).chars().rev(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::SegRope;

    #[test]
    fn forward_and_backward_cursors_agree() {
        let mut r = SegRope::with_bounds(2, 5);
        r.push_str("0123456789");

        let fwd: String = r.chars().collect();
        assert_eq!(fwd, "0123456789");

        let mut back: Vec<char> = r.chars_rev().collect();
        back.reverse();
        assert_eq!(back.into_iter().collect::<String>(), "0123456789");
    }

    #[test]
    fn cursors_over_an_empty_rope_yield_nothing() {
        let r = SegRope::new();
        assert_eq!(r.chunks().count(), 0);
        assert_eq!(r.chars().count(), 0);
        assert_eq!(r.chars_rev().count(), 0);
    }

    #[test]
    fn chunk_cursor_matches_partitioning() {
        let mut r = SegRope::with_bounds(3, 9);
        r.push_str("abcdefgh");
        let chunks: Vec<&str> = r.chunks().collect();
        assert_eq!(chunks, ["abc", "def", "gh"]);
    }
}
