use std::collections::BTreeMap;

use super::{Function, Term};
use crate::prelude::*;

/// A translation unit contains all function definitions
/// recovered from one source text.
///
/// Functions whose parsing failed are not contained in the unit;
/// the corresponding diagnostics are returned separately by the
/// [`frontend`](crate::frontend), so that a parse failure in one function
/// never prevents the analysis of its siblings.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct TranslationUnit {
    /// The parsed functions, keyed by their (unique) name.
    pub functions: BTreeMap<String, Term<Function>>,
}

impl TranslationUnit {
    /// Create an empty translation unit.
    pub fn new() -> TranslationUnit {
        TranslationUnit {
            functions: BTreeMap::new(),
        }
    }

    /// Look up a function definition by name.
    pub fn find_function(&self, name: &str) -> Option<&Term<Function>> {
        self.functions.get(name)
    }
}
