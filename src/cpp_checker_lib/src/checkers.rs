//! The implemented checks.
//! See their module descriptions for detailed information about each check.

pub mod call_graph_from;
pub mod call_graph_to;
pub mod null_dereference;
