//! Conversions between span lists, IOB2 label sequences and inline-tagged text.
//!
//! All functions here are pure and deterministic. IOB2 output is always
//! well-formed even when the input spans overlap or arrive unordered.

use crate::{EntitySpan, Error, Result};

/// Convert entity spans to an IOB2 label sequence over `n_tokens` tokens.
///
/// Spans are processed sorted by start index (stable). Each span writes
/// labels only into positions still holding `"O"`; the first position it
/// actually writes gets `B-{type}`, the rest `I-{type}`. Earlier-starting
/// spans therefore own every token they cover, and a later overlapping span
/// begins at its first unclaimed position. First-come, by start index, wins.
///
/// Positions outside `0..n_tokens` are ignored.
///
/// # Example
///
/// ```rust
/// use tagalign::{spans_to_iob2, EntitySpan};
///
/// let spans = vec![EntitySpan::new(1, 3, "DNA")];
/// assert_eq!(spans_to_iob2(&spans, 4), vec!["O", "B-DNA", "I-DNA", "O"]);
/// ```
#[must_use]
pub fn spans_to_iob2(spans: &[EntitySpan], n_tokens: usize) -> Vec<String> {
    let mut labels = vec!["O".to_string(); n_tokens];

    let mut ordered: Vec<&EntitySpan> = spans.iter().collect();
    ordered.sort_by_key(|span| span.start);

    for span in ordered {
        let mut began = false;
        for pos in span.start..span.end.min(n_tokens) {
            if labels[pos] != "O" {
                continue;
            }
            labels[pos] = if began {
                format!("I-{}", span.entity_type)
            } else {
                began = true;
                format!("B-{}", span.entity_type)
            };
        }
    }

    labels
}

/// Render entity spans as inline-tagged text over their token sequence.
///
/// Each span contributes `<type>` before the token at `start` and `</type>`
/// after the token at `end - 1`; tokens are joined by single spaces. Spans
/// are processed sorted by start ascending, then end descending, so on a
/// shared boundary the wider span's tags end up outermost. Out-of-range and
/// degenerate spans are skipped.
///
/// # Example
///
/// ```rust
/// use tagalign::{spans_to_inline, EntitySpan};
///
/// let tokens = ["The", "p53", "gene"];
/// let spans = vec![EntitySpan::new(1, 2, "protein")];
/// assert_eq!(
///     spans_to_inline(&spans, &tokens),
///     "The <protein>p53</protein> gene"
/// );
/// ```
#[must_use]
pub fn spans_to_inline<S: AsRef<str>>(spans: &[EntitySpan], tokens: &[S]) -> String {
    let mut opens = vec![String::new(); tokens.len()];
    let mut closes = vec![String::new(); tokens.len()];

    let mut ordered: Vec<&EntitySpan> = spans.iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    for span in ordered {
        if span.is_empty() || span.end > tokens.len() {
            continue;
        }
        opens[span.start].push_str(&format!("<{}>", span.entity_type));
        // Inner spans close before outer ones on a shared last token.
        closes[span.end - 1].insert_str(0, &format!("</{}>", span.entity_type));
    }

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| format!("{}{}{}", opens[i], token.as_ref(), closes[i]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render an IOB2 label sequence as inline-tagged text.
///
/// Scans left to right keeping a stack of open entity types. A `B-X` label
/// closes whatever is open and opens a fresh `<X>`, so consecutive same-type
/// entities (`B-X I-X O B-X`) render as two distinct spans. An `I-X` whose
/// type matches the open entity continues it; an orphan `I-X` is promoted to
/// a new entity (lenient, matching common sequence-repair practice). `O`
/// closes the open entity after the previous token, and sequence end closes
/// everything still open.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `labels` and `tokens` differ in
/// length.
///
/// # Example
///
/// ```rust
/// use tagalign::iob2_to_inline;
///
/// let tokens = ["The", "p53", "gene"];
/// let labels = ["O", "B-protein", "O"];
/// assert_eq!(
///     iob2_to_inline(&labels, &tokens).unwrap(),
///     "The <protein>p53</protein> gene"
/// );
/// ```
pub fn iob2_to_inline<L, S>(labels: &[L], tokens: &[S]) -> Result<String>
where
    L: AsRef<str>,
    S: AsRef<str>,
{
    if labels.len() != tokens.len() {
        return Err(Error::invalid_input(format!(
            "label count ({}) != token count ({})",
            labels.len(),
            tokens.len()
        )));
    }

    let mut rendered: Vec<String> = Vec::with_capacity(tokens.len());
    let mut open: Vec<String> = Vec::new();

    for (label, token) in labels.iter().zip(tokens) {
        let label = label.as_ref();
        let token = token.as_ref();

        match split_iob2_label(label) {
            Some(('B', entity_type)) => {
                close_all(&mut open, &mut rendered);
                rendered.push(format!("<{entity_type}>{token}"));
                open.push(entity_type.to_string());
            }
            Some(('I', entity_type)) => {
                if open.last().map(String::as_str) == Some(entity_type) {
                    rendered.push(token.to_string());
                } else {
                    // Orphan I: treat as the start of a new entity.
                    close_all(&mut open, &mut rendered);
                    rendered.push(format!("<{entity_type}>{token}"));
                    open.push(entity_type.to_string());
                }
            }
            _ => {
                close_all(&mut open, &mut rendered);
                rendered.push(token.to_string());
            }
        }
    }

    close_all(&mut open, &mut rendered);
    Ok(rendered.join(" "))
}

/// Append `</type>` for every open entity onto the previous rendered token.
fn close_all(open: &mut Vec<String>, rendered: &mut [String]) {
    while let Some(entity_type) = open.pop() {
        if let Some(last) = rendered.last_mut() {
            last.push_str(&format!("</{entity_type}>"));
        }
    }
}

/// Split a `B-X`/`I-X` label into prefix and type; `None` for `O` and
/// anything else.
fn split_iob2_label(label: &str) -> Option<(char, &str)> {
    let rest = label
        .strip_prefix("B-")
        .map(|rest| ('B', rest))
        .or_else(|| label.strip_prefix("I-").map(|rest| ('I', rest)))?;
    if rest.1.is_empty() {
        return None;
    }
    Some(rest)
}

/// Extract the bare type name from a composite `{B|I}-{namespace}.{TYPE}`
/// label, the convention the BUSTER corpus uses.
///
/// Unlike the lenient tag parsing elsewhere, a label that does not follow
/// the documented format is a data error in the input dataset itself, so it
/// is rejected rather than silently mapped to garbage.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the prefix is not `B-`/`I-` or the
/// namespace separator is missing.
///
/// # Example
///
/// ```rust
/// use tagalign::bare_entity_type;
///
/// assert_eq!(
///     bare_entity_type("B-Companies.BUYING_COMPANY").unwrap(),
///     "BUYING_COMPANY"
/// );
/// assert!(bare_entity_type("BUYING_COMPANY").is_err());
/// ```
pub fn bare_entity_type(label: &str) -> Result<String> {
    let rest = label
        .strip_prefix("B-")
        .or_else(|| label.strip_prefix("I-"))
        .ok_or_else(|| {
            Error::parse(format!("composite label '{label}' lacks a B-/I- prefix"))
        })?;

    let (namespace, bare) = rest.rsplit_once('.').ok_or_else(|| {
        Error::parse(format!(
            "composite label '{label}' lacks a '.' namespace separator"
        ))
    })?;

    if namespace.is_empty() || bare.is_empty() {
        return Err(Error::parse(format!(
            "composite label '{label}' has an empty namespace or type"
        )));
    }

    Ok(bare.to_string())
}
