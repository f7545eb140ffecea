//! Default weights and limits.

use crate::matcher::Weight;

/// Default weight of an `Any` matcher: below every more specific rule.
pub const ANY_WEIGHT: Weight = -10;

/// Default weight of a `Last` matcher.
pub const LAST_WEIGHT: Weight = 0;

/// Default weight of a `Weak` matcher.
pub const WEAK_WEIGHT: Weight = 10;

/// Default weight of a `Strict` matcher: an exact chain beats a partial one.
pub const STRICT_WEIGHT: Weight = 20;

/// Default limit on the descriptor stack depth of a single resolution.
pub const DEFAULT_MAX_DEPTH: usize = 128;
