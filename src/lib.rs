//! # tagalign
//!
//! Span extraction, alignment and grounding for evaluating LLM-based NER.
//!
//! Large language models asked to tag entities return free text: an
//! `<output>...</output>` block whose entities are marked with bare
//! XML-like tags. That text is noisy by nature: tags go unclosed, nest,
//! and wrap phrases the source sentence never contained. This crate turns
//! such output into structured, token-aligned entity spans and keeps the
//! surrounding conversions deterministic and testable:
//!
//! - **Extraction**: [`extract_tag`] and [`extract_spans`] recover entity
//!   spans from tagged text, aligning each entity onto the token sequence
//!   with a longest-prefix match ([`align_entity`]) and disambiguating
//!   repeated mentions through a [`TokenMask`].
//! - **Conversion**: [`spans_to_iob2`], [`spans_to_inline`],
//!   [`iob2_to_inline`] and [`bare_entity_type`] move between span lists,
//!   IOB2 label sequences and inline-tagged display text.
//! - **Grounding**: a [`KnowledgeBase`] built from labeled data records
//!   which entity types each surface form has been observed to take;
//!   [`GroundingEngine::verify`] flags predictions that disagree and
//!   renders re-prompting feedback.
//! - **Data model**: [`NerDataset`] holds labeled sentences in memory and
//!   renders few-shot [`Example`]s; [`Ontology`] fixes a domain's entity
//!   types and their tag processing order.
//!
//! LLM clients, prompt templates, agent orchestration, corpus downloads and
//! metric computation live outside this crate; it only consumes token
//! sequences, raw completions and labeled examples.
//!
//! ## Quick start
//!
//! ```rust
//! use tagalign::{extract_spans, spans_to_iob2};
//!
//! let tokens = ["The", "p53", "gene", "is", "active", "."];
//! let raw = "<output>The <protein>p53</protein> gene is active.</output>";
//!
//! let (text, spans) = extract_spans(raw, &["protein"], &tokens);
//! assert_eq!(text, "The p53 gene is active.");
//! assert_eq!((spans[0].start, spans[0].end), (1, 2));
//!
//! let labels = spans_to_iob2(&spans, tokens.len());
//! assert_eq!(labels, vec!["O", "B-protein", "O", "O", "O", "O"]);
//! ```
//!
//! ## Grounding
//!
//! ```rust
//! use tagalign::{GroundingEngine, KnowledgeBase};
//!
//! let mut kb = KnowledgeBase::new();
//! kb.observe(&["the", "RAG-1", "gene"], &["O", "B-DNA", "I-DNA"]);
//!
//! let engine = GroundingEngine::new(kb);
//! let feedback = engine.verify(
//!     &["a", "RAG-1", "gene", "fragment"],
//!     &["O", "B-cell_line", "I-cell_line", "O"],
//! );
//! assert!(feedback.render(false).contains("should likely be DNA"));
//! ```

#![warn(missing_docs)]

pub mod align;
pub mod convert;
pub mod dataset;
mod error;
pub mod extract;
pub mod grounding;
pub mod ontology;
mod span;

pub use align::align_entity;
pub use convert::{bare_entity_type, iob2_to_inline, spans_to_iob2, spans_to_inline};
pub use dataset::{entity_types_from_labels, DatasetEntry, Example, NerDataset};
pub use error::{Error, Result};
pub use extract::{extract_spans, extract_tag, OUTPUT_TAG};
pub use grounding::{
    GroundingEngine, GroundingFeedback, KnowledgeBase, WrongPrediction, TOKEN_SEPARATOR,
};
pub use ontology::Ontology;
pub use span::{EntitySpan, TokenMask};
