//! This module defines the intermediate representation of a parsed translation unit.
//!
//! The main data structure is the [`TranslationUnit`] struct,
//! which contains the abstract syntax trees of all functions
//! recovered from the source text by the [`frontend`](crate::frontend).
//! To learn how individual statements are encoded,
//! you should first take a look at the `Expression` type and then at the `Stmt` data type,
//! which forms the body of the `Function` struct.

use crate::prelude::*;
use derive_more::*;

mod variable;
pub use variable::*;
mod expression;
pub use expression::*;
mod term;
pub use term::*;
mod stmt;
pub use stmt::*;
mod function;
pub use function::*;
mod unit;
pub use unit::*;

/// A position in the analyzed source text.
///
/// Lines and columns are 1-based.
/// The position `0:0` is reserved for entities without a known source position,
/// e.g. synthetic basic blocks created during control flow graph construction.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    Default,
)]
#[display(fmt = "{}:{}", line, column)]
pub struct SourceLocation {
    /// The 1-based line number.
    pub line: u64,
    /// The 1-based column number.
    pub column: u64,
}

impl SourceLocation {
    /// Create a new source position.
    pub fn new(line: u64, column: u64) -> SourceLocation {
        SourceLocation { line, column }
    }

    /// Create the reserved position for entities without a known source position.
    pub fn unknown() -> SourceLocation {
        SourceLocation { line: 0, column: 0 }
    }

    /// Returns true if this is the reserved unknown position.
    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.column == 0
    }
}
