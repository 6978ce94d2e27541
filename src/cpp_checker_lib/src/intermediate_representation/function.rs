use super::{Stmt, Term, Variable};
use crate::prelude::*;

/// A function definition with a given name, parameter list and body.
///
/// Functions are *single-entry*: execution starts with the first statement of the body.
/// A function may have multiple exits via `return` statements.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Function {
    /// The name of the function.
    /// Names are required to be unique within a translation unit.
    pub name: String,
    /// The parameters of the function in declaration order.
    pub parameters: Vec<Variable>,
    /// The statements of the function body in source order.
    pub body: Vec<Term<Stmt>>,
}

impl Function {
    /// Return the names of all functions called anywhere inside the body of this function.
    /// The returned list may contain duplicates (one entry per call site).
    pub fn call_targets(&self) -> Vec<&str> {
        self.body
            .iter()
            .flat_map(|stmt| stmt.term.call_targets())
            .collect()
    }
}
