//! Grounding of predicted entity types against types observed in labeled data.
//!
//! A [`KnowledgeBase`] indexes every surface form seen in a labeled corpus to
//! the set of entity types it has been observed to take. The
//! [`GroundingEngine`] re-runs the same surface-form scan over a fresh
//! prediction and reports, per surface form the knowledge base knows about,
//! which predicted types disagree with the observed ones. The rendered
//! feedback is handed back to the (out-of-crate) agent loop, which re-prompts
//! the model when the text is non-empty.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dataset::NerDataset;

/// Separator joining lower-cased tokens into a surface-form key.
pub const TOKEN_SEPARATOR: &str = "___";

/// Index from normalized surface form to the entity types observed for it.
///
/// Built once per evaluation run from labeled data, then queried read-only.
/// Ordered containers keep iteration and rendered feedback deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    data: BTreeMap<String, BTreeSet<String>>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a knowledge base from every entry of a labeled dataset.
    #[must_use]
    pub fn from_dataset(dataset: &NerDataset) -> Self {
        let mut kb = Self::new();
        for entry in &dataset.entries {
            kb.observe(&entry.tokens, &entry.labels);
        }
        kb
    }

    /// Fold one labeled example into the index.
    ///
    /// Every `B-` label starts a run extending to the first `O` (or sequence
    /// end); the run's tokens become a surface-form key and the first
    /// label's bare type is added to that key's observed set. A run deliberately
    /// does not require a uniform type per token: adjacent entities with no
    /// `O` gap fold into one combined surface form in this simplified scan.
    pub fn observe<S, L>(&mut self, tokens: &[S], labels: &[L])
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        collect_runs(tokens, labels, &mut self.data);
        // Degenerate zero-length runs must not pollute the index.
        self.data.remove("");
    }

    /// Normalize a token run into its lookup key.
    #[must_use]
    pub fn surface_key<S: AsRef<str>>(tokens: &[S]) -> String {
        tokens
            .iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join(TOKEN_SEPARATOR)
    }

    /// Observed types for a surface-form key, if any.
    #[must_use]
    pub fn types_for(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.data.get(key)
    }

    /// Number of distinct surface forms indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when nothing has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Types predicted for a surface form that disagree with the knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrongPrediction {
    /// Predicted types absent from the observed set.
    pub predicted_types: BTreeSet<String>,
    /// Types the knowledge base has observed for this surface form.
    pub grounded_types: BTreeSet<String>,
}

/// Result of verifying one prediction against the knowledge base.
///
/// Created fresh per verification call, rendered to text, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingFeedback {
    /// Surface forms whose predicted types all or partly matched.
    pub correct: BTreeMap<String, BTreeSet<String>>,
    /// Surface forms with at least one knowledge-base entry, and the
    /// mismatched subset of their predicted types (possibly empty).
    pub wrong: BTreeMap<String, WrongPrediction>,
}

impl GroundingFeedback {
    /// True when no predicted type disagrees with the knowledge base.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.wrong
            .values()
            .all(|wrong| wrong.predicted_types.is_empty())
    }

    /// Render the feedback as human-readable lines for re-prompting.
    ///
    /// Emits one line per mismatched predicted type; with `include_correct`,
    /// affirming lines for matching types come first. An empty string means
    /// there is nothing to feed back and the caller can skip the re-prompt
    /// cycle.
    #[must_use]
    pub fn render(&self, include_correct: bool) -> String {
        let mut feedback = String::new();

        if include_correct {
            for (surface, types) in &self.correct {
                for entity_type in types {
                    feedback.push_str(&format!(
                        "- '{}' is correctly tagged as '{}'\n",
                        display_form(surface),
                        entity_type
                    ));
                }
            }
        }

        for (surface, wrong) in &self.wrong {
            let grounded = wrong
                .grounded_types
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(" or ");
            for entity_type in &wrong.predicted_types {
                feedback.push_str(&format!(
                    "- '{}' is tagged as '{}'. It should likely be {} instead.\n",
                    display_form(surface),
                    entity_type,
                    grounded
                ));
            }
        }

        feedback
    }
}

/// Cross-checks predictions against a read-only knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroundingEngine {
    knowledge_base: KnowledgeBase,
}

impl GroundingEngine {
    /// Create an engine over an existing knowledge base.
    #[must_use]
    pub fn new(knowledge_base: KnowledgeBase) -> Self {
        Self { knowledge_base }
    }

    /// Build the knowledge base from a labeled dataset and wrap it.
    #[must_use]
    pub fn from_dataset(dataset: &NerDataset) -> Self {
        Self::new(KnowledgeBase::from_dataset(dataset))
    }

    /// The underlying knowledge base.
    #[must_use]
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Compare a predicted IOB2 labeling of `tokens` against the knowledge
    /// base.
    ///
    /// The prediction goes through the same run scan used at build time;
    /// each resulting surface form known to the knowledge base yields a
    /// `wrong` entry carrying the mismatched predicted types (possibly none)
    /// and, separately, the matching types under `correct`. Surface forms
    /// the knowledge base has never seen produce no feedback.
    #[must_use]
    pub fn verify<S, L>(&self, tokens: &[S], predicted_labels: &[L]) -> GroundingFeedback
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        log::debug!(
            "grounding {} predicted labels against {} known surface forms",
            predicted_labels.len(),
            self.knowledge_base.len()
        );

        let mut predicted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        collect_runs(tokens, predicted_labels, &mut predicted);
        predicted.remove("");

        let mut feedback = GroundingFeedback::default();
        for (surface, predicted_types) in predicted {
            let Some(grounded_types) = self.knowledge_base.types_for(&surface) else {
                continue;
            };

            let mismatched: BTreeSet<String> = predicted_types
                .difference(grounded_types)
                .cloned()
                .collect();
            let matching: BTreeSet<String> = predicted_types
                .intersection(grounded_types)
                .cloned()
                .collect();

            feedback.wrong.insert(
                surface.clone(),
                WrongPrediction {
                    predicted_types: mismatched,
                    grounded_types: grounded_types.clone(),
                },
            );
            if !matching.is_empty() {
                feedback.correct.insert(surface, matching);
            }
        }

        feedback
    }
}

/// Scan a labeled sequence for `B-`-initiated non-`O` runs and fold each
/// run's surface form and first type into `map`.
fn collect_runs<S, L>(tokens: &[S], labels: &[L], map: &mut BTreeMap<String, BTreeSet<String>>)
where
    S: AsRef<str>,
    L: AsRef<str>,
{
    let n = tokens.len().min(labels.len());
    for (i, label) in labels.iter().enumerate().take(n) {
        let label = label.as_ref();
        if !label.starts_with('B') {
            continue;
        }
        let Some(bare_type) = label.get(2..).filter(|t| !t.is_empty()) else {
            continue;
        };

        let end = labels[i..n]
            .iter()
            .position(|l| l.as_ref() == "O")
            .map_or(n, |offset| i + offset);

        let key = KnowledgeBase::surface_key(&tokens[i..end]);
        map.entry(key).or_default().insert(bare_type.to_string());
    }
}

fn display_form(surface: &str) -> String {
    surface.replace(TOKEN_SEPARATOR, " ")
}
