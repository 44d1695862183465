//! In-memory labeled dataset model and few-shot example rendering.
//!
//! Corpus downloading and file discovery stay outside this crate; callers
//! hand over token/label sequences (or a GENIA-style JSON string already in
//! memory) and get back the structures the extraction and grounding engines
//! consume, plus inline-tagged few-shot examples for prompt construction.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::convert::{iob2_to_inline, spans_to_iob2};
use crate::{EntitySpan, Error, Result};

/// One labeled sentence with its surrounding document context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Text preceding the sentence in its document, possibly empty.
    #[serde(default)]
    pub left_context: String,
    /// Text following the sentence in its document, possibly empty.
    #[serde(default)]
    pub right_context: String,
    /// The sentence as a plain string.
    pub text: String,
    /// The sentence's tokens.
    pub tokens: Vec<String>,
    /// One IOB2 label per token.
    pub labels: Vec<String>,
}

/// A labeled NER dataset held fully in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NerDataset {
    /// The entity types occurring in the data, in tag processing order.
    pub entity_types: Vec<String>,
    /// The labeled sentences.
    pub entries: Vec<DatasetEntry>,
}

/// A rendered few-shot example for prompt construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Document context before the sentence.
    pub left_context: String,
    /// Document context after the sentence.
    pub right_context: String,
    /// The untagged sentence the model would be asked to tag.
    pub text_to_tag: String,
    /// The same sentence with gold entities marked inline.
    pub tagged_text: String,
}

/// GENIA-style raw record: tokens plus entity spans and context tokens.
#[derive(Debug, Deserialize)]
struct RawRecord {
    tokens: Vec<String>,
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    ltokens: Vec<String>,
    #[serde(default)]
    rtokens: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    entity_type: String,
}

impl NerDataset {
    /// Parse a JSON array of GENIA-style records into a dataset.
    ///
    /// Each record carries `tokens`, an `entities` span list, and optional
    /// `ltokens`/`rtokens` context. Entity spans are converted to IOB2
    /// labels; the entity type inventory is collected from the labels in
    /// first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed JSON and [`Error::Dataset`] when
    /// a span runs past its sentence.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<RawRecord> = serde_json::from_str(json)?;

        let mut entity_types: Vec<String> = Vec::new();
        let mut entries = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let mut spans = Vec::with_capacity(record.entities.len());
            for entity in &record.entities {
                if entity.start >= entity.end || entity.end > record.tokens.len() {
                    return Err(Error::dataset(format!(
                        "record {index}: span {}..{} out of range for {} tokens",
                        entity.start,
                        entity.end,
                        record.tokens.len()
                    )));
                }
                if !entity_types.contains(&entity.entity_type) {
                    entity_types.push(entity.entity_type.clone());
                }
                spans.push(EntitySpan::new(
                    entity.start,
                    entity.end,
                    entity.entity_type.clone(),
                ));
            }

            let labels = spans_to_iob2(&spans, record.tokens.len());
            entries.push(DatasetEntry {
                left_context: record.ltokens.join(" "),
                right_context: record.rtokens.join(" "),
                text: record.tokens.join(" "),
                tokens: record.tokens,
                labels,
            });
        }

        Ok(Self {
            entity_types,
            entries,
        })
    }

    /// Sample `n` entries rendered as few-shot examples.
    ///
    /// Resamples until every entity type of the dataset appears in the
    /// sampled labels, giving up after a bounded number of attempts and
    /// returning the best-covering sample found. Deterministic for a seeded
    /// `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `n` is zero or exceeds the
    /// number of entries.
    pub fn examples<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Example>> {
        const MAX_ATTEMPTS: usize = 64;

        if n == 0 || n > self.entries.len() {
            return Err(Error::invalid_input(format!(
                "cannot sample {n} examples from {} entries",
                self.entries.len()
            )));
        }

        let mut best: Option<(usize, Vec<Example>)> = None;
        for _ in 0..MAX_ATTEMPTS {
            let sample: Vec<&DatasetEntry> = self.entries.choose_multiple(rng, n).collect();

            let mut covered: BTreeSet<String> = BTreeSet::new();
            let mut examples = Vec::with_capacity(n);
            for entry in &sample {
                covered.extend(entity_types_from_labels(&entry.labels));
                examples.push(Example {
                    left_context: entry.left_context.clone(),
                    right_context: entry.right_context.clone(),
                    text_to_tag: entry.text.clone(),
                    tagged_text: iob2_to_inline(&entry.labels, &entry.tokens)?,
                });
            }

            let coverage = self
                .entity_types
                .iter()
                .filter(|t| covered.contains(*t))
                .count();
            if coverage == self.entity_types.len() {
                return Ok(examples);
            }
            if best.as_ref().map_or(true, |(c, _)| coverage > *c) {
                best = Some((coverage, examples));
            }
        }

        log::warn!("no sample of {n} entries covered every entity type; returning best effort");
        Ok(best.map(|(_, examples)| examples).unwrap_or_default())
    }
}

/// Collect the bare entity types present in an IOB2 label sequence.
#[must_use]
pub fn entity_types_from_labels<S: AsRef<str>>(labels: &[S]) -> BTreeSet<String> {
    labels
        .iter()
        .filter_map(|label| {
            let label = label.as_ref();
            label
                .strip_prefix("B-")
                .or_else(|| label.strip_prefix("I-"))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .collect()
}
