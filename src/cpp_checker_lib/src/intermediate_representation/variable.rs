use crate::prelude::*;

/// A local variable or function parameter.
///
/// Whether the variable has pointer type is recorded at its declaration,
/// since only pointer variables are tracked by the null dereference analysis.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct Variable {
    /// The name of the variable.
    pub name: String,
    /// Whether the variable was declared with pointer type.
    pub is_pointer: bool,
}

impl Variable {
    /// Create a new variable with the given name and pointer-ness.
    pub fn new(name: impl ToString, is_pointer: bool) -> Variable {
        Variable {
            name: name.to_string(),
            is_pointer,
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_pointer {
            write!(formatter, "*{}", self.name)
        } else {
            write!(formatter, "{}", self.name)
        }
    }
}
