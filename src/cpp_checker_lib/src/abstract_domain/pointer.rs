use super::AbstractDomain;
use crate::prelude::*;

/// An abstract domain tracking what is known about the value of one pointer variable.
///
/// The partial order of the domain is
/// ```text
///           MaybeNull  (Top)
///           /       \
///        Null     NonNull
/// ```
/// `Null` and `NonNull` are incomparable,
/// so merging them at a control flow join yields `MaybeNull`.
/// The bottom element (unreachable code) is not represented in the domain itself:
/// in a fixpoint computation it corresponds to the absence of a node value.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum PointerDomain {
    /// The pointer is null on every execution path reaching the program point.
    Null,
    /// The pointer is non-null on every execution path reaching the program point.
    NonNull,
    /// Nothing is known about the pointer value. This is the `Top` element.
    MaybeNull,
}

impl PointerDomain {
    /// Returns true if dereferencing a pointer with this value
    /// is a guaranteed null dereference.
    pub fn is_definitely_null(&self) -> bool {
        matches!(self, PointerDomain::Null)
    }
}

impl AbstractDomain for PointerDomain {
    /// Equal states merge to themselves, everything else merges to `MaybeNull`.
    fn merge(&self, other: &Self) -> Self {
        if self == other {
            *self
        } else {
            PointerDomain::MaybeNull
        }
    }

    fn is_top(&self) -> bool {
        matches!(self, PointerDomain::MaybeNull)
    }
}

impl std::fmt::Display for PointerDomain {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PointerDomain::Null => write!(formatter, "definitely-null"),
            PointerDomain::NonNull => write!(formatter, "definitely-non-null"),
            PointerDomain::MaybeNull => write!(formatter, "unknown"),
        }
    }
}
