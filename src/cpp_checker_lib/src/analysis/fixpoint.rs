//! Creating and computing generic fixpoint computations.
//!
//! A fixpoint problem is defined over a directed graph where:
//! - Each node `n` gets assigned a value `val(n)` out of a partially ordered set.
//! - Each edge `e` defines a rule `e: value -> value` on how to compute the value
//! at the end node of the edge given the value at its start node.
//!
//! A fixpoint is reached if `e(val(start_node)) <= val(end_node)` holds for all edges.
//! The computation uses an explicit worklist (never recursion),
//! so that graphs with cycles, i.e. control flow graphs with loops,
//! are handled without any risk of unbounded call stacks.
//!
//! Edge transition functions are allowed to return `None`
//! to indicate that no information flows through the edge for the given value.
//! In that case the value at the target node of the edge is not updated.
//! An analysis can use this to model branches that cannot be taken.
//!
//! # How to compute the solution to a fixpoint problem
//!
//! Implement the [`Context`] trait for an object holding the graph
//! and the transition functions of the problem.
//! Then create a [`Computation`] from it, seed the start values via
//! [`set_node_value`](Computation::set_node_value)
//! and run [`compute`](Computation::compute)
//! or [`compute_with_max_steps`](Computation::compute_with_max_steps).
//! Nodes without a seeded or computed value are unreachable from the start values,
//! which represents the bottom element of the value lattice.

use fnv::FnvHashMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet};

/// The context of a fixpoint computation.
///
/// All trait methods have access to the context object,
/// so that additional information needed by the transition functions
/// can be kept in it.
pub trait Context {
    /// The type of edge labels of the underlying graph.
    type EdgeLabel: Clone;
    /// The type of node labels of the underlying graph.
    type NodeLabel;
    /// The type of the value that gets assigned to each node.
    /// The values should form a partially ordered set.
    type NodeValue: PartialEq + Eq + Clone;

    /// Get the graph on which the fixpoint computation operates.
    fn get_graph(&self) -> &DiGraph<Self::NodeLabel, Self::EdgeLabel>;

    /// Merge two node values into an upper bound of both.
    fn merge(&self, value1: &Self::NodeValue, value2: &Self::NodeValue) -> Self::NodeValue;

    /// Compute the value at the end node of `edge` from the value at its start node.
    /// Return `None` to indicate that no information flows through the edge.
    fn update_edge(&self, value: &Self::NodeValue, edge: EdgeIndex) -> Option<Self::NodeValue>;
}

/// The computation struct contains an intermediate result of a fixpoint computation
/// and provides methods for continuing the computation
/// or extracting the (intermediate or final) results.
pub struct Computation<T: Context> {
    /// The context object needed for the fixpoint computation.
    fp_context: T,
    /// Maps a node index to its priority (higher priority nodes get stabilized first).
    node_priority_list: Vec<usize>,
    /// Maps a priority to the corresponding node index.
    priority_to_node_list: Vec<NodeIndex>,
    /// The worklist contains the priority numbers (not the node indices!)
    /// of nodes marked as not yet stabilized.
    worklist: BTreeSet<usize>,
    /// The internal map containing all known node values.
    node_values: FnvHashMap<NodeIndex, T::NodeValue>,
}

impl<T: Context> Computation<T> {
    /// Create a new fixpoint computation from a fixpoint problem
    /// and an optional default value for all nodes.
    pub fn new(fp_context: T, default_value: Option<T::NodeValue>) -> Self {
        let graph = fp_context.get_graph();
        // Order the nodes in weak topological order,
        // so that on acyclic graphs every node needs to be visited only once.
        let priority_sorted_nodes: Vec<NodeIndex> = petgraph::algo::kosaraju_scc(&graph)
            .into_iter()
            .flatten()
            .collect();
        let mut node_to_priority = BTreeMap::new();
        for (priority, node_index) in priority_sorted_nodes.iter().enumerate() {
            node_to_priority.insert(node_index, priority);
        }
        let node_priority_list: Vec<usize> = node_to_priority.values().copied().collect();
        let mut worklist = BTreeSet::new();
        let mut node_values: FnvHashMap<NodeIndex, T::NodeValue> = FnvHashMap::default();
        // If a default value exists, all nodes start out with it and are marked as unstable.
        if let Some(default) = default_value {
            for priority in 0..priority_sorted_nodes.len() {
                worklist.insert(priority);
                node_values.insert(NodeIndex::new(priority), default.clone());
            }
        }
        Computation {
            fp_context,
            node_priority_list,
            priority_to_node_list: priority_sorted_nodes,
            worklist,
            node_values,
        }
    }

    /// Get the value of a node.
    /// Returns `None` for nodes that are unreachable from the seeded start values.
    pub fn get_node_value(&self, node: NodeIndex) -> Option<&T::NodeValue> {
        self.node_values.get(&node)
    }

    /// Set the value of a node and mark the node as not yet stabilized.
    pub fn set_node_value(&mut self, node: NodeIndex, value: T::NodeValue) {
        self.node_values.insert(node, value);
        self.worklist.insert(self.node_priority_list[node.index()]);
    }

    /// Merge the value at a node with some new value.
    fn merge_node_value(&mut self, node: NodeIndex, value: T::NodeValue) {
        if let Some(old_value) = self.node_values.get(&node) {
            let merged_value = self.fp_context.merge(&value, old_value);
            if merged_value != *old_value {
                self.set_node_value(node, merged_value);
            }
        } else {
            self.set_node_value(node, value);
        }
    }

    /// Compute and update the value at the end node of an edge.
    fn update_edge(&mut self, edge: EdgeIndex) {
        let (start_node, end_node) = self
            .fp_context
            .get_graph()
            .edge_endpoints(edge)
            .expect("Edge not found");
        if let Some(start_value) = self.node_values.get(&start_node) {
            if let Some(new_end_value) = self.fp_context.update_edge(start_value, edge) {
                self.merge_node_value(end_node, new_end_value);
            }
        }
    }

    /// Update all outgoing edges of a node.
    fn update_node(&mut self, node: NodeIndex) {
        let edges: Vec<EdgeIndex> = self
            .fp_context
            .get_graph()
            .edges(node)
            .map(|edge_ref| edge_ref.id())
            .collect();
        for edge in edges {
            self.update_edge(edge);
        }
    }

    /// Remove the highest priority node from the internal worklist and return it.
    fn take_next_node_from_worklist(&mut self) -> Option<NodeIndex> {
        if let Some(priority) = self.worklist.iter().next_back().cloned() {
            let priority = self.worklist.take(&priority).unwrap();
            Some(self.priority_to_node_list[priority])
        } else {
            None
        }
    }

    /// Compute the fixpoint of the fixpoint problem.
    /// Each node will be visited at most `max_steps` times.
    /// If a node does not stabilize after `max_steps` visits,
    /// the end result will only be an intermediate result of the computation.
    pub fn compute_with_max_steps(&mut self, max_steps: u64) {
        let mut steps = vec![0; self.fp_context.get_graph().node_count()];
        let mut non_stabilized_nodes = BTreeSet::new();
        while let Some(priority) = self.worklist.iter().next_back().cloned() {
            let priority = self.worklist.take(&priority).unwrap();
            let node = self.priority_to_node_list[priority];
            if steps[node.index()] < max_steps {
                steps[node.index()] += 1;
                self.update_node(node);
            } else {
                non_stabilized_nodes.insert(priority);
            }
        }
        // After the algorithm finished, the new worklist is the list of non-stabilized nodes.
        self.worklist = non_stabilized_nodes;
    }

    /// Compute the fixpoint of the fixpoint problem.
    /// If the fixpoint algorithm does not converge, this function will not terminate.
    pub fn compute(&mut self) {
        while let Some(node) = self.take_next_node_from_worklist() {
            self.update_node(node);
        }
    }

    /// Get a reference to the internal map of all known node values.
    pub fn node_values(&self) -> &FnvHashMap<NodeIndex, T::NodeValue> {
        &self.node_values
    }

    /// Get a reference to the underlying graph.
    pub fn get_graph(&self) -> &DiGraph<T::NodeLabel, T::EdgeLabel> {
        self.fp_context.get_graph()
    }

    /// Get a reference to the underlying context object.
    pub fn get_context(&self) -> &T {
        &self.fp_context
    }

    /// Returns `true` if the computation has stabilized, i.e. the internal worklist is empty.
    pub fn has_stabilized(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Return a list of all nodes which are marked as not-stabilized.
    pub fn get_worklist(&self) -> Vec<NodeIndex> {
        self.worklist
            .iter()
            .map(|priority| self.priority_to_node_list[*priority])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FPContext {
        graph: DiGraph<(), u64>,
    }

    impl Context for FPContext {
        type EdgeLabel = u64;
        type NodeLabel = ();
        type NodeValue = u64;

        fn get_graph(&self) -> &DiGraph<(), u64> {
            &self.graph
        }

        fn merge(&self, value1: &Self::NodeValue, value2: &Self::NodeValue) -> Self::NodeValue {
            std::cmp::min(*value1, *value2)
        }

        fn update_edge(&self, value: &Self::NodeValue, edge: EdgeIndex) -> Option<Self::NodeValue> {
            Some(value + self.graph.edge_weight(edge).unwrap())
        }
    }

    #[test]
    fn fixpoint() {
        // A shortest-path problem on a chain with shortcut edges and a back edge.
        let mut graph: DiGraph<(), u64> = DiGraph::new();
        for _i in 0..101 {
            graph.add_node(());
        }
        for i in 0..100 {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(i + 1), i as u64 % 10 + 1);
        }
        for i in 0..10 {
            graph.add_edge(NodeIndex::new(i * 10), NodeIndex::new(i * 10 + 5), 0);
        }
        graph.add_edge(NodeIndex::new(100), NodeIndex::new(0), 0);

        let mut solution = Computation::new(FPContext { graph }, None);
        solution.set_node_value(NodeIndex::new(0), 0);
        solution.compute_with_max_steps(20);

        assert_eq!(30, *solution.get_node_value(NodeIndex::new(9)).unwrap());
        assert_eq!(0, *solution.get_node_value(NodeIndex::new(5)).unwrap());
    }

    #[test]
    fn fixpoint_with_default_value() {
        let mut graph: DiGraph<(), u64> = DiGraph::new();
        for _i in 0..101 {
            graph.add_node(());
        }
        for i in 0..100 {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(i + 1), i as u64 % 10 + 1);
        }
        for i in 0..10 {
            graph.add_edge(NodeIndex::new(i * 10), NodeIndex::new(i * 10 + 5), 0);
        }

        let mut solution = Computation::new(FPContext { graph }, Some(100));
        solution.set_node_value(NodeIndex::new(10), 0);
        solution.compute_with_max_steps(20);

        assert_eq!(100, *solution.get_node_value(NodeIndex::new(0)).unwrap());
        assert_eq!(3, *solution.get_node_value(NodeIndex::new(12)).unwrap());
    }

    #[test]
    fn unreachable_nodes_have_no_value() {
        let mut graph: DiGraph<(), u64> = DiGraph::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let unreachable = graph.add_node(());
        graph.add_edge(a, b, 1);

        let mut solution = Computation::new(FPContext { graph }, None);
        solution.set_node_value(a, 0);
        solution.compute();

        assert!(solution.has_stabilized());
        assert_eq!(solution.get_node_value(b), Some(&1));
        assert_eq!(solution.get_node_value(unreachable), None);
    }
}
