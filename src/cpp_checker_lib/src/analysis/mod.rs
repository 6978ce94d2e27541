//! Modules necessary for graph-based and fixpoint-based analyses,
//! as well as analyses depending on these modules.

pub mod callgraph;
pub mod fixpoint;
pub mod graph;
