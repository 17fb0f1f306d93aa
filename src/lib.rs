//! A mutable character rope built on a forest of bounded segments.
//!
//! The sequence is partitioned into an ordered list of segments, each a
//! chain of chunk nodes capped at `max_root_size` chars, with every chunk
//! capped at `max_leaf_size` chars. Small edits at arbitrary offsets touch
//! only the owning chunk and its chain; a global index is routed to its
//! chunk through cached segment lengths and node weights, never by
//! scanning the text.
//!
//! ```
//! use segrope::SegRope;
//!
//! let mut r = SegRope::new();
//! r.push_str("Hello, world");
//! r.insert_at(7, "my dear ");
//! assert_eq!(r.to_string(), "Hello, my dear world");
//! assert_eq!(r.char_at(7), Ok('m'));
//! ```
//!
//! All offsets are char offsets. The rope is a plain single-threaded value
//! type: no locking, no structural sharing; `clone()` deep-copies. Leaf ids
//! and cursors are invalidated by any mutation.

use std::error::Error;
use std::fmt;

mod iter;
mod node;
mod segrope;

pub use iter::{Chars, CharsRev, Chunks};
pub use node::LeafId;
pub use segrope::{SegRope, DEFAULT_MAX_LEAF_SIZE, DEFAULT_MAX_ROOT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RopeError {
    /// An indexed accessor was called with `index >= len()`. Nothing was
    /// mutated.
    IndexOutOfRange { index: usize, len: usize },
    /// Node-level routing was handed an index its chain cannot cover. Not
    /// reachable through the public API; kept distinguishable from an
    /// out-of-range index for invariant testing.
    InvariantViolation,
}

impl fmt::Display for RopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RopeError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for rope of length {}", index, len)
            }
            RopeError::InvariantViolation => {
                write!(f, "internal routing invariant violated")
            }
        }
    }
}

impl Error for RopeError {}
