//! Longest-prefix alignment of entity words onto a token sequence.
//!
//! LLMs routinely paraphrase span boundaries: the tagged text may carry an
//! extra boundary word or drop one relative to the sentence it was asked to
//! tag. Requiring an exact full-length match would discard those entities, so
//! alignment anchors on the longest matching prefix of the entity words
//! instead and reports the earliest position where it occurs.

use crate::TokenMask;

/// Locate the best contiguous token run for a word-tokenized entity.
///
/// For increasing candidate lengths `k` from 1 up to the full entity length,
/// the token sequence is scanned (case-insensitively) for a contiguous,
/// unclaimed run equal to the first `k` entity words. The longest `k` with a
/// match anywhere wins, and the earliest start achieving it is returned as an
/// inclusive `(start, end)` index pair.
///
/// Returns `None` when even the first word matches nowhere; the caller drops
/// the entity rather than failing the extraction.
///
/// Cost is O(sentence length × entity length), fine for the tens-of-token
/// sentences this crate is built for.
///
/// # Example
///
/// ```rust
/// use tagalign::{align_entity, TokenMask};
///
/// let tokens = ["the", "RAG-1", "gene", "product"];
/// let mask = TokenMask::new(tokens.len());
///
/// // Model appended a word the sentence does not contain; the matched
/// // prefix "rag-1 gene" still anchors the span.
/// let words = ["rag-1", "gene", "expression"];
/// assert_eq!(align_entity(&words, &tokens, &mask), Some((1, 2)));
/// ```
#[must_use]
pub fn align_entity<S: AsRef<str>>(
    entity_words: &[&str],
    tokens: &[S],
    mask: &TokenMask,
) -> Option<(usize, usize)> {
    if entity_words.is_empty() || tokens.is_empty() {
        return None;
    }

    let lowered_tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();
    let lowered_words: Vec<String> = entity_words.iter().map(|w| w.to_lowercase()).collect();

    let mut best: Option<(usize, usize)> = None; // (start, matched length)
    for k in 1..=lowered_words.len().min(lowered_tokens.len()) {
        // A k-word match contains a (k-1)-word match, so the first failing
        // length ends the search.
        match find_run(&lowered_words[..k], &lowered_tokens, mask) {
            Some(start) => best = Some((start, k)),
            None => break,
        }
    }

    best.map(|(start, k)| (start, start + k - 1))
}

/// Earliest start of a contiguous, fully unclaimed run equal to `words`.
fn find_run(words: &[String], tokens: &[String], mask: &TokenMask) -> Option<usize> {
    'scan: for start in 0..=tokens.len() - words.len() {
        for (offset, word) in words.iter().enumerate() {
            let pos = start + offset;
            if !mask.is_free(pos) || tokens[pos] != *word {
                continue 'scan;
            }
        }
        return Some(start);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_mask(tokens: &[&str]) -> TokenMask {
        TokenMask::new(tokens.len())
    }

    #[test]
    fn test_exact_single_word() {
        let tokens = ["The", "p53", "gene"];
        assert_eq!(
            align_entity(&["p53"], &tokens, &free_mask(&tokens)),
            Some((1, 1))
        );
    }

    #[test]
    fn test_exact_multi_word() {
        let tokens = ["the", "RAG-1", "gene", "is", "active"];
        assert_eq!(
            align_entity(&["RAG-1", "gene"], &tokens, &free_mask(&tokens)),
            Some((1, 2))
        );
    }

    #[test]
    fn test_case_insensitive() {
        let tokens = ["IL-2", "Receptor"];
        assert_eq!(
            align_entity(&["il-2", "receptor"], &tokens, &free_mask(&tokens)),
            Some((0, 1))
        );
    }

    #[test]
    fn test_longest_prefix_wins_over_earlier_shorter() {
        // "T" alone occurs at index 0, but "T cell" matches at 2-3; the
        // longer anchored prefix takes priority.
        let tokens = ["T", "and", "T", "cell", "lines"];
        assert_eq!(
            align_entity(&["T", "cell"], &tokens, &free_mask(&tokens)),
            Some((2, 3))
        );
    }

    #[test]
    fn test_partial_prefix_fallback() {
        // Third entity word never occurs; the two-word prefix still anchors.
        let tokens = ["the", "NF-kB", "site", "upstream"];
        assert_eq!(
            align_entity(&["NF-kB", "site", "elements"], &tokens, &free_mask(&tokens)),
            Some((1, 2))
        );
    }

    #[test]
    fn test_unlocatable_returns_none() {
        let tokens = ["no", "match", "here"];
        assert_eq!(align_entity(&["absent"], &tokens, &free_mask(&tokens)), None);
    }

    #[test]
    fn test_earliest_start_for_longest_match() {
        let tokens = ["a", "b", "a", "b"];
        assert_eq!(
            align_entity(&["a", "b"], &tokens, &free_mask(&tokens)),
            Some((0, 1))
        );
    }

    #[test]
    fn test_claimed_positions_are_skipped() {
        let tokens = ["A", "B", "A"];
        let mut mask = TokenMask::new(tokens.len());
        mask.claim(0, 1);
        assert_eq!(align_entity(&["A"], &tokens, &mask), Some((2, 2)));
    }

    #[test]
    fn test_run_must_be_fully_unclaimed() {
        let tokens = ["New", "York", "New", "York", "City"];
        let mut mask = TokenMask::new(tokens.len());
        mask.claim(1, 2);
        // The run at 0 is broken by the claim at 1; the run at 2 is intact.
        assert_eq!(align_entity(&["new", "york"], &tokens, &mask), Some((2, 3)));
    }

    #[test]
    fn test_empty_inputs() {
        let tokens = ["a"];
        assert_eq!(align_entity(&[], &tokens, &free_mask(&tokens)), None);
        let no_tokens: [&str; 0] = [];
        assert_eq!(align_entity(&["a"], &no_tokens, &TokenMask::new(0)), None);
    }

    #[test]
    fn test_entity_longer_than_sentence() {
        let tokens = ["short"];
        assert_eq!(
            align_entity(&["short", "but", "longer"], &tokens, &free_mask(&tokens)),
            Some((0, 0))
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn result_is_in_bounds(
            tokens in proptest::collection::vec("[a-c]{1,3}", 1..12),
            words in proptest::collection::vec("[a-c]{1,3}", 1..5),
        ) {
            let word_refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let mask = TokenMask::new(tokens.len());
            if let Some((start, end)) = align_entity(&word_refs, &tokens, &mask) {
                prop_assert!(start <= end);
                prop_assert!(end < tokens.len());
                // The first matched token really equals the first entity word.
                prop_assert_eq!(tokens[start].to_lowercase(), words[0].to_lowercase());
            }
        }

        #[test]
        fn first_word_present_implies_some(
            tokens in proptest::collection::vec("[a-c]{1,3}", 1..12),
            pick in 0usize..12,
        ) {
            let pick = pick % tokens.len();
            let word = tokens[pick].clone();
            let mask = TokenMask::new(tokens.len());
            prop_assert!(align_entity(&[word.as_str()], &tokens, &mask).is_some());
        }
    }
}
