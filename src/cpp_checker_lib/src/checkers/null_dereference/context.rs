use petgraph::graph::EdgeIndex;

use super::state::State;
use crate::abstract_domain::AbstractDomain;
use crate::analysis::fixpoint;
use crate::analysis::graph::{Cfg, CfgGraph, Edge};

/// The context object of the forward dataflow fixpoint computation
/// of the null dereference analysis.
///
/// The node value attached to each block is the state *at block entry*.
/// The transition function of an edge applies the transfer functions of all
/// statements of the source block and then narrows the resulting state
/// according to the branch condition of the taken edge.
pub struct Context<'a> {
    cfg: &'a Cfg,
}

impl<'a> Context<'a> {
    /// Create a new context object for the given control flow graph.
    pub fn new(cfg: &'a Cfg) -> Context<'a> {
        Context { cfg }
    }
}

impl<'a> fixpoint::Context for Context<'a> {
    type EdgeLabel = Edge;
    type NodeLabel = crate::intermediate_representation::Term<crate::analysis::graph::Blk>;
    type NodeValue = State;

    fn get_graph(&self) -> &CfgGraph {
        self.cfg.graph()
    }

    fn merge(&self, value1: &State, value2: &State) -> State {
        value1.merge(value2)
    }

    fn update_edge(&self, value: &State, edge: EdgeIndex) -> Option<State> {
        let graph = self.cfg.graph();
        let (source, _target) = graph.edge_endpoints(edge).expect("Edge not found");
        let block = &graph[source];
        let mut state = value.clone();
        for stmt in &block.term.stmts {
            state.handle_stmt(&stmt.term);
        }
        if let Some(condition) = &block.term.condition {
            match graph[edge] {
                // Edges into the true arm of a branch or into a loop body.
                Edge::TrueBranch => state.specialize_by_condition(condition, true),
                // Edges taken when the condition is false.
                // A `LoopExit` edge out of a block with a condition
                // is the edge leaving the loop header.
                Edge::FalseBranch | Edge::LoopExit => {
                    state.specialize_by_condition(condition, false)
                }
                // Switch edges and unconditional edges do not narrow pointer states.
                _ => (),
            }
        }
        Some(state)
    }
}
