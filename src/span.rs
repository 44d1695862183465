//! Entity spans and the token claim mask.

use serde::{Deserialize, Serialize};

/// A contiguous token range carrying one entity type.
///
/// Indices address a token sequence, not character offsets: `start` is the
/// first token of the entity and `end` is exclusive. Invariant:
/// `start < end <= tokens.len()` for the sequence the span was aligned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpan {
    /// First token index.
    pub start: usize,
    /// One past the last token index.
    pub end: usize,
    /// Entity type name, e.g. `"protein"` or `"BUYING_COMPANY"`.
    pub entity_type: String,
}

impl EntitySpan {
    /// Create a new span.
    #[must_use]
    pub fn new(start: usize, end: usize, entity_type: impl Into<String>) -> Self {
        Self {
            start,
            end,
            entity_type: entity_type.into(),
        }
    }

    /// Number of tokens covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when the span covers no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check whether two spans share at least one token position.
    #[must_use]
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }
}

/// Set of token positions already claimed by an aligned entity.
///
/// The extraction loop claims the positions of every span it emits so that a
/// repeated surface form later in the same sentence aligns to its next
/// occurrence. This replaces overwriting tokens with a placeholder in the
/// caller's array: the token sequence stays intact and the mask carries the
/// consumed state instead.
#[derive(Debug, Clone, Default)]
pub struct TokenMask {
    claimed: Vec<bool>,
}

impl TokenMask {
    /// Create a mask for a token sequence of the given length, all free.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            claimed: vec![false; len],
        }
    }

    /// Number of maskable positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// True when the mask covers no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Whether the position is still available for alignment.
    ///
    /// Out-of-range positions count as claimed.
    #[must_use]
    pub fn is_free(&self, pos: usize) -> bool {
        self.claimed.get(pos).copied() == Some(false)
    }

    /// Claim every position of a span's `[start, end)` range.
    pub fn claim(&mut self, start: usize, end: usize) {
        for pos in start..end.min(self.claimed.len()) {
            self.claimed[pos] = true;
        }
    }

    /// Count of claimed positions.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.claimed.iter().filter(|c| **c).count()
    }
}
