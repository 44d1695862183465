//! Entity type inventories with human-readable descriptions.
//!
//! An ontology fixes the recognized entity types for a domain, the order in
//! which their tags are peeled during extraction, and the descriptions a
//! prompt-building collaborator can show the model.

use serde::{Deserialize, Serialize};

/// An ordered inventory of entity types for one NER domain.
///
/// Order is significant: it is the tag processing order handed to
/// [`extract_spans`](crate::extract_spans), which decides how nested tags
/// are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ontology {
    types: Vec<(String, String)>,
}

impl Ontology {
    /// Build an ontology from `(type name, description)` pairs, keeping
    /// their order.
    pub fn new<N, D>(types: impl IntoIterator<Item = (N, D)>) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Self {
            types: types
                .into_iter()
                .map(|(name, description)| (name.into(), description.into()))
                .collect(),
        }
    }

    /// The GENIA biomedical inventory.
    #[must_use]
    pub fn genia() -> Self {
        Self::new([
            (
                "protein",
                "protein family, protein group, protein complex, protein molecule, \
                 protein subunit, protein substructure, protein domain or protein region",
            ),
            (
                "DNA",
                "DNA family, DNA group, DNA molecule, DNA substructure, DNA domain, \
                 DNA region, DNA sequence, etc.",
            ),
            (
                "RNA",
                "RNA family, RNA group, RNA molecule, RNA substructure, RNA domain, \
                 RNA region, RNA sequence, etc.",
            ),
            (
                "cell_type",
                "any mention of specific biological cell categories or classes that \
                 occur naturally in organisms (e.g., 'T cells', 'neurons', 'fibroblasts')",
            ),
            (
                "cell_line",
                "any artificially maintained, immortalized cell populations with \
                 specific laboratory names or designations (e.g., 'HeLa cells', 'K562', \
                 'CHO cells'), typically derived from a source organism but now grown \
                 continuously in culture",
            ),
        ])
    }

    /// The BUSTER finance/legal inventory.
    #[must_use]
    pub fn buster() -> Self {
        Self::new([
            (
                "BUYING_COMPANY",
                "The company which is acquiring the target.",
            ),
            (
                "SELLING_COMPANY",
                "The company which is selling the target.",
            ),
            (
                "ACQUIRED_COMPANY",
                "The company target of the transaction.",
            ),
            (
                "LEGAL_CONSULTING_COMPANY",
                "A law firm providing advice on the transaction, such as: government \
                 regulation, litigation, anti-trust, structured finance, tax etc.",
            ),
            (
                "GENERIC_CONSULTING_COMPANY",
                "A general firm providing any other type of advice, such as: financial, \
                 accountability, due diligence, etc.",
            ),
            (
                "ANNUAL_REVENUES",
                "The past or present annual revenues of any company or asset involved \
                 in the transaction.",
            ),
        ])
    }

    /// Type names in tag processing order.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.types.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Description for a type name, if the ontology carries it.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, description)| description.as_str())
    }

    /// Number of types in the inventory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when the inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
