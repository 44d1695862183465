//! Tag extraction: from raw LLM output to token-aligned entity spans.
//!
//! Model completions are expected to loosely follow the convention
//! `... <output>tagged text</output> ...` where the tagged text marks
//! entities with bare XML-like tags such as `<protein>p53</protein>`.
//! Nothing about that output is trusted: tags go unclosed, nest inside each
//! other, or wrap text the sentence never contained. Extraction degrades to
//! "no entities found" instead of erroring, since one malformed completion
//! must not abort an evaluation run.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::align::align_entity;
use crate::{EntitySpan, TokenMask};

/// Name of the tag wrapping the model's final answer.
pub const OUTPUT_TAG: &str = "output";

/// Extract the content of the first `<tag>...</tag>` pair in `text`.
///
/// Returns the substring strictly between the first `<tag>` and the first
/// `</tag>` appearing after it. Returns `""` when the open tag is absent or
/// no close tag follows it (malformed output, recovered locally). Tags are
/// bare names; attributes are not supported.
///
/// This is the single point of truth for tag parsing: every other routine in
/// the crate routes through it or through the equivalent regex scan.
///
/// # Example
///
/// ```rust
/// use tagalign::extract_tag;
///
/// assert_eq!(extract_tag("a <answer>b</answer> c", "answer"), "b");
/// assert_eq!(extract_tag("no tags here", "answer"), "");
/// assert_eq!(extract_tag("<answer>never closed", "answer"), "");
/// ```
#[must_use]
pub fn extract_tag<'a>(text: &'a str, tag: &str) -> &'a str {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let Some(open_at) = text.find(&open) else {
        return "";
    };
    let content_start = open_at + open.len();
    match text[content_start..].find(&close) {
        Some(rel) => &text[content_start..content_start + rel],
        None => "",
    }
}

/// Convert raw model output into entity spans aligned to `tokens`.
///
/// Returns the de-tagged output text (for display and re-prompting) together
/// with the spans recovered from it, in extraction order.
///
/// Entity types are processed in the order given; that order decides which
/// tag is peeled first when the model nests tags. Each occurrence of a
/// type's tag is stripped of any other recognized tags nested inside it,
/// whitespace-tokenized, and aligned against `tokens` with
/// [`align_entity`](crate::align_entity). Positions covered by an emitted
/// span are claimed in a [`TokenMask`] so a repeated surface form aligns to
/// its next occurrence; the caller's token slice is never modified.
///
/// Unlocatable entities are dropped with a warning. A missing
/// `<output>` block falls back to treating the whole input as tagged text.
///
/// # Example
///
/// ```rust
/// use tagalign::extract_spans;
///
/// let tokens = ["The", "p53", "gene", "is", "active", "."];
/// let raw = "<output>The <protein>p53</protein> gene is active.</output>";
/// let (text, spans) = extract_spans(raw, &["protein"], &tokens);
///
/// assert_eq!(text, "The p53 gene is active.");
/// assert_eq!(spans.len(), 1);
/// assert_eq!((spans[0].start, spans[0].end), (1, 2));
/// ```
pub fn extract_spans<S, T>(
    raw_output: &str,
    entity_types: &[T],
    tokens: &[S],
) -> (String, Vec<EntitySpan>)
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let tagged = output_block(raw_output);
    log::debug!("extracting spans from tagged text: {tagged}");

    let mut mask = TokenMask::new(tokens.len());
    let mut spans = Vec::new();

    for entity_type in entity_types {
        let entity_type = entity_type.as_ref();
        let pattern = tag_pattern(entity_type);

        for capture in pattern.captures_iter(&tagged) {
            let content = strip_recognized_tags(&capture[1], entity_types, Some(entity_type));
            let words: Vec<&str> = content.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            match align_entity(&words, tokens, &mask) {
                Some((start, end)) => {
                    mask.claim(start, end + 1);
                    spans.push(EntitySpan::new(start, end + 1, entity_type));
                }
                None => {
                    log::warn!(
                        "dropping unlocatable {entity_type} entity '{}'",
                        content.trim()
                    );
                }
            }
        }
    }

    let de_tagged = strip_recognized_tags(&tagged, entity_types, None);
    (de_tagged, spans)
}

/// Pull the `<output>` block out of a completion, or fall back to the whole
/// input when the model skipped the wrapper. Literal `\n` escape artifacts
/// are removed and the result trimmed.
fn output_block(raw_output: &str) -> String {
    static ESCAPE_ARTIFACTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[nrt]").unwrap());

    // An empty block from a present wrapper means the model answered with
    // no entities; only a completion with no wrapper at all falls back to
    // the whole input.
    let block = extract_tag(raw_output, OUTPUT_TAG);
    let tagged = if block.is_empty() && !raw_output.contains(&format!("<{OUTPUT_TAG}>")) {
        raw_output
    } else {
        block
    };
    ESCAPE_ARTIFACTS.replace_all(tagged, "").trim().to_string()
}

/// Non-greedy matcher for one entity type's tag pair, first-close-after-open.
fn tag_pattern(entity_type: &str) -> Regex {
    let escaped = regex::escape(entity_type);
    // Escaping makes the tag name a literal, so the pattern always compiles.
    Regex::new(&format!("(?s)<{escaped}>(.*?)</{escaped}>")).unwrap()
}

/// Remove recognized tag markers from `text`, keeping their content.
///
/// With `keep` set, that type's markers are left alone so the caller can
/// align the outer tag's word content without disturbing its own markup.
fn strip_recognized_tags<T: AsRef<str>>(text: &str, entity_types: &[T], keep: Option<&str>) -> String {
    let mut cleaned = text.to_string();
    for entity_type in entity_types {
        let entity_type = entity_type.as_ref();
        if keep == Some(entity_type) {
            continue;
        }
        cleaned = cleaned.replace(&format!("<{entity_type}>"), "");
        cleaned = cleaned.replace(&format!("</{entity_type}>"), "");
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENIA_TYPES: [&str; 5] = ["protein", "DNA", "RNA", "cell_type", "cell_line"];

    #[test]
    fn test_extract_tag_basic() {
        assert_eq!(extract_tag("<output>hello</output>", "output"), "hello");
    }

    #[test]
    fn test_extract_tag_takes_first_occurrence() {
        assert_eq!(
            extract_tag("<x>first</x> <x>second</x>", "x"),
            "first"
        );
    }

    #[test]
    fn test_extract_tag_close_must_follow_open() {
        // A close tag before the open tag does not count.
        assert_eq!(extract_tag("</x> then <x>tail", "x"), "");
    }

    #[test]
    fn test_extract_tag_missing_is_empty_not_panic() {
        assert_eq!(extract_tag("plain text", "output"), "");
        assert_eq!(extract_tag("", "output"), "");
        assert_eq!(extract_tag("<output>unclosed", "output"), "");
    }

    #[test]
    fn test_simple_extraction() {
        let tokens = ["The", "p53", "gene", "is", "active", "."];
        let raw = "<output>The <protein>p53</protein> gene is active.</output>";

        let (text, spans) = extract_spans(raw, &["protein"], &tokens);

        assert_eq!(text, "The p53 gene is active.");
        assert_eq!(spans, vec![EntitySpan::new(1, 2, "protein")]);
    }

    #[test]
    fn test_multi_word_entity() {
        let tokens = ["the", "RAG-1", "gene", "product"];
        let raw = "<output>the <DNA>RAG-1 gene</DNA> product</output>";

        let (_, spans) = extract_spans(raw, &GENIA_TYPES, &tokens);

        assert_eq!(spans, vec![EntitySpan::new(1, 3, "DNA")]);
    }

    #[test]
    fn test_repeated_mention_disambiguation() {
        let tokens = ["A", "B", "A"];
        let raw = "<output><protein>A</protein> B <protein>A</protein></output>";

        let (_, spans) = extract_spans(raw, &["protein"], &tokens);

        assert_eq!(
            spans,
            vec![
                EntitySpan::new(0, 1, "protein"),
                EntitySpan::new(2, 3, "protein"),
            ]
        );
    }

    #[test]
    fn test_nested_other_type_tag_is_stripped() {
        let tokens = ["the", "IL-2", "receptor", "alpha", "chain"];
        let raw =
            "<output>the <protein>IL-2 receptor <DNA>alpha</DNA> chain</protein></output>";

        let (_, spans) = extract_spans(raw, &GENIA_TYPES, &tokens);

        // The protein tag is processed first and claims all five tokens with
        // the DNA markup removed from its content; the inner DNA occurrence
        // then has nowhere left to align and is dropped.
        assert_eq!(spans, vec![EntitySpan::new(1, 5, "protein")]);
    }

    #[test]
    fn test_processing_order_controls_nesting() {
        let tokens = ["the", "IL-2", "receptor", "alpha", "chain"];
        let raw =
            "<output>the <protein>IL-2 receptor <DNA>alpha</DNA> chain</protein></output>";

        // DNA first: the inner tag is peeled before the outer content is
        // considered, claiming "alpha" for DNA. The outer protein content
        // then only anchors the prefix before the claimed position.
        let (_, spans) = extract_spans(raw, &["DNA", "protein"], &tokens);

        assert_eq!(spans[0], EntitySpan::new(3, 4, "DNA"));
        assert_eq!(spans[1], EntitySpan::new(1, 3, "protein"));
    }

    #[test]
    fn test_missing_output_block_falls_back() {
        let tokens = ["p53", "binds"];
        let raw = "<protein>p53</protein> binds";

        let (text, spans) = extract_spans(raw, &["protein"], &tokens);

        assert_eq!(text, "p53 binds");
        assert_eq!(spans, vec![EntitySpan::new(0, 1, "protein")]);
    }

    #[test]
    fn test_empty_output_block() {
        let tokens = ["a", "b"];
        let (text, spans) = extract_spans("<output></output>", &["protein"], &tokens);
        assert_eq!(text, "");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_empty_output_block_ignores_surrounding_chatter() {
        // A present-but-empty wrapper means no entities; the chatter around
        // it must not leak into the de-tagged text via the fallback path.
        let tokens = ["p53", "binds"];
        let raw = "No entities found.\n<output></output>\nDone.";

        let (text, spans) = extract_spans(raw, &["protein"], &tokens);
        assert_eq!(text, "");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_unclosed_entity_tag_yields_nothing() {
        let tokens = ["p53", "binds"];
        let raw = "<output><protein>p53 binds</output>";

        let (_, spans) = extract_spans(raw, &["protein"], &tokens);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_hallucinated_entity_is_dropped() {
        let tokens = ["nothing", "matches"];
        let raw = "<output><protein>GATA-3</protein> nothing matches</output>";

        let (_, spans) = extract_spans(raw, &["protein"], &tokens);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_escaped_newline_artifacts_removed() {
        let tokens = ["p53", "binds"];
        let raw = "<output>\\n<protein>p53</protein> binds\\n</output>";

        let (text, spans) = extract_spans(raw, &["protein"], &tokens);
        assert_eq!(text, "p53 binds");
        assert_eq!(spans, vec![EntitySpan::new(0, 1, "protein")]);
    }

    #[test]
    fn test_tokens_are_not_mutated() {
        let tokens = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        let raw = "<output><protein>A</protein> B <protein>A</protein></output>";

        let _ = extract_spans(raw, &["protein"], &tokens);

        assert_eq!(tokens, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_boundary_paraphrase_partial_match() {
        // The model tagged one word more than the sentence contains; the
        // matched prefix still anchors the span.
        let tokens = ["the", "NF-kB", "site", "upstream"];
        let raw = "<output>the <DNA>NF-kB site elements</DNA> upstream</output>";

        let (_, spans) = extract_spans(raw, &GENIA_TYPES, &tokens);
        assert_eq!(spans, vec![EntitySpan::new(1, 3, "DNA")]);
    }
}
