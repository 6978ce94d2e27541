use super::SourceLocation;
use crate::prelude::*;

/// A term identifier consisting of an ID string (which is required to be unique)
/// and a source position to indicate where the term is located in the analyzed text.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct Tid {
    /// The unique ID of the term.
    id: String,
    /// The source position of the term.
    pub location: SourceLocation,
}

impl Tid {
    /// Generate a new term identifier with the given ID string
    /// and with unknown source position.
    pub fn new<T: ToString>(val: T) -> Tid {
        Tid {
            id: val.to_string(),
            location: SourceLocation::unknown(),
        }
    }

    /// Set the source position of the term identifier.
    pub fn with_location(mut self, location: SourceLocation) -> Tid {
        self.location = location;
        self
    }

    /// Add a suffix to the ID string and return the new `Tid`.
    pub fn with_id_suffix(self, suffix: &str) -> Self {
        Tid {
            id: self.id + suffix,
            location: self.location,
        }
    }

    /// Generate the ID of the basic block with the given index
    /// inside the control flow graph of the given function.
    pub fn blk(function: &str, index: usize) -> Tid {
        Tid {
            id: format!("blk_{function}_{index}"),
            location: SourceLocation::unknown(),
        }
    }
}

impl std::fmt::Display for Tid {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.id)
    }
}

/// A term is an object inside a translation unit with a source position
/// and an unique ID (both contained in the `tid`).
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Term<T> {
    /// The term identifier, which also contains the source position of the term.
    pub tid: Tid,
    /// The object.
    pub term: T,
}
