//! The weighted matcher tree.
//!
//! Rules are stored as a tree of [`SequenceMatcher`] nodes below a
//! [`MatcherTree`] root. Resolving a unit walks the tree with the current
//! descriptor stack: each node tests the part of the stack its parent left
//! over, adds its own weight to the running total, and stamps its actions
//! with that total. The result is a [`MatchedActions`] set from which the
//! session picks, per stage, the action with the strictly highest weight.
//!
//! | kind     | matches                                  | children see        |
//! |----------|------------------------------------------|---------------------|
//! | `Any`    | every stack (optional token filter)      | the unit being built|
//! | `Last`   | exactly one remaining unit               | the same unit       |
//! | `Strict` | a contiguous prefix                      | what follows it     |
//! | `Weak`   | a subsequence, leftmost match per pattern| what follows it     |

mod matched;
mod pattern;
mod sequence;
mod tree;

pub use matched::MatchedActions;
pub use pattern::{CustomPattern, UnitPattern};
pub use sequence::{ActionRegistry, MatcherKind, SequenceMatcher};
pub use tree::MatcherTree;

/// Matching weight. Higher wins; sums along a matched path.
pub type Weight = i32;
