//! Generate call graphs out of a translation unit.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::intermediate_representation::*;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// The graph type of a call graph.
///
/// Nodes are function names.
/// Edges lead from the caller to the callee and are weighted with the `Tid`
/// of the statement containing the call.
pub type CallGraphType = DiGraph<String, Tid>;

/// A call graph of a translation unit together with a name lookup table.
#[derive(Debug, Clone)]
pub struct CallGraph {
    graph: CallGraphType,
    nodes_by_name: HashMap<String, NodeIndex>,
}

/// Generate a call graph for the given translation unit.
///
/// The nodes of the returned graph correspond to the function names in the unit.
/// One caller→callee edge is added per direct call expression found in the
/// caller's syntax tree, including calls inside conditions and call arguments.
///
/// Callees without a definition in the unit are recorded as leaf nodes
/// with no outgoing edges; an unresolved callee is never an error.
/// There are no edges for calls through function pointers or virtual dispatch,
/// because resolving those requires analyses that are out of scope for this crate.
pub fn build_call_graph(unit: &TranslationUnit) -> CallGraph {
    let mut graph = CallGraphType::new();
    let mut nodes_by_name = HashMap::new();
    for name in unit.functions.keys() {
        let node_index = graph.add_node(name.clone());
        nodes_by_name.insert(name.clone(), node_index);
    }
    for (name, function) in &unit.functions {
        let caller_index = nodes_by_name[name];
        for stmt in &function.term.body {
            add_call_edges(&mut graph, &mut nodes_by_name, caller_index, stmt);
        }
    }
    CallGraph {
        graph,
        nodes_by_name,
    }
}

/// Add one edge per call site contained in the given statement,
/// weighted with the `Tid` of the innermost statement containing the call.
/// Unresolved callees get a leaf node on first sight.
fn add_call_edges(
    graph: &mut CallGraphType,
    nodes_by_name: &mut HashMap<String, NodeIndex>,
    caller: NodeIndex,
    stmt: &Term<Stmt>,
) {
    for expr in stmt.term.expressions() {
        for target in expr.call_targets() {
            let callee = *nodes_by_name
                .entry(target.to_string())
                .or_insert_with(|| graph.add_node(target.to_string()));
            graph.add_edge(caller, callee, stmt.tid.clone());
        }
    }
    let mut nested_bodies: Vec<&[Term<Stmt>]> = Vec::new();
    match &stmt.term {
        Stmt::If {
            then_body,
            else_body,
            ..
        } => {
            nested_bodies.push(then_body);
            if let Some(else_body) = else_body {
                nested_bodies.push(else_body);
            }
        }
        Stmt::While { body, .. } => nested_bodies.push(body),
        Stmt::For {
            init, update, body, ..
        } => {
            if let Some(init) = init {
                nested_bodies.push(std::slice::from_ref(&**init));
            }
            if let Some(update) = update {
                nested_bodies.push(std::slice::from_ref(&**update));
            }
            nested_bodies.push(body);
        }
        Stmt::Switch { cases, default, .. } => {
            for case in cases {
                nested_bodies.push(&case.body);
            }
            if let Some(default) = default {
                nested_bodies.push(default);
            }
        }
        _ => (),
    }
    for body in nested_bodies {
        for nested in body {
            add_call_edges(graph, nodes_by_name, caller, nested);
        }
    }
}

impl CallGraph {
    /// Get the underlying graph.
    pub fn graph(&self) -> &CallGraphType {
        &self.graph
    }

    /// Look up the node of a function name.
    pub fn node_of(&self, name: &str) -> Option<NodeIndex> {
        self.nodes_by_name.get(name).copied()
    }

    /// Return the names of all functions transitively reachable from `name`
    /// by following call edges forward.
    ///
    /// The start function itself is only contained in the result
    /// if it is reachable from itself via a cycle of calls.
    /// Returns `None` if no function or callee with the given name exists.
    pub fn functions_reachable_from(&self, name: &str) -> Option<BTreeSet<String>> {
        self.reachable(name, Direction::Outgoing)
    }

    /// Return the names of all functions from which a forward path of calls
    /// reaches `name`, i.e. all direct and transitive callers.
    ///
    /// The target function itself is only contained in the result
    /// if it is reachable from itself via a cycle of calls.
    /// Returns `None` if no function or callee with the given name exists.
    pub fn functions_reaching(&self, name: &str) -> Option<BTreeSet<String>> {
        self.reachable(name, Direction::Incoming)
    }

    /// Breadth-first reachability with a visited set, so that call cycles terminate.
    fn reachable(&self, name: &str, direction: Direction) -> Option<BTreeSet<String>> {
        let start = self.node_of(name)?;
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        for neighbor in self.graph.neighbors_directed(start, direction) {
            queue.push_back(neighbor);
        }
        while let Some(node) = queue.pop_front() {
            if visited.insert(self.graph[node].clone()) {
                for neighbor in self.graph.neighbors_directed(node, direction) {
                    queue.push_back(neighbor);
                }
            }
        }
        Some(visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend;

    fn call_graph_of(source: &str) -> CallGraph {
        let (unit, logs) = frontend::parse_translation_unit(source);
        assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");
        build_call_graph(&unit)
    }

    fn names(set: Option<BTreeSet<String>>) -> Vec<String> {
        set.unwrap().into_iter().collect()
    }

    #[test]
    fn forward_reachability() {
        let call_graph = call_graph_of(
            r#"
            void unrelated1() {
            }

            void unrelated2() {
                unrelated1();
            }

            void sourceFunc() {
                unrelated1();
                unrelated2();
            }
            "#,
        );
        assert_eq!(
            names(call_graph.functions_reachable_from("sourceFunc")),
            vec!["unrelated1", "unrelated2"]
        );
        assert_eq!(
            names(call_graph.functions_reachable_from("unrelated2")),
            vec!["unrelated1"]
        );
        // The source is not part of its own reachable set.
        assert!(!call_graph
            .functions_reachable_from("sourceFunc")
            .unwrap()
            .contains("sourceFunc"));
    }

    #[test]
    fn backward_reachability() {
        let call_graph = call_graph_of(
            r#"
            void unrelated1() {
            }

            void targetFunc() {
                unrelated1();
            }

            void caller1() {
                targetFunc();
            }

            void caller2() {
                targetFunc();
            }
            "#,
        );
        assert_eq!(
            names(call_graph.functions_reaching("targetFunc")),
            vec!["caller1", "caller2"]
        );
        assert_eq!(
            names(call_graph.functions_reaching("unrelated1")),
            vec!["caller1", "caller2", "targetFunc"]
        );
        assert!(call_graph.functions_reaching("caller1").unwrap().is_empty());
    }

    #[test]
    fn call_cycles_terminate_and_are_reflexive() {
        let call_graph = call_graph_of(
            r#"
            void ping() {
                pong();
            }

            void pong() {
                ping();
            }
            "#,
        );
        assert_eq!(
            names(call_graph.functions_reachable_from("ping")),
            vec!["ping", "pong"]
        );
        assert_eq!(
            names(call_graph.functions_reaching("ping")),
            vec!["ping", "pong"]
        );
    }

    #[test]
    fn unresolved_callees_become_leaf_nodes() {
        let call_graph = call_graph_of(
            r#"
            void wrapper() {
                external_helper(1);
            }
            "#,
        );
        assert_eq!(
            names(call_graph.functions_reachable_from("wrapper")),
            vec!["external_helper"]
        );
        // The unresolved callee is a leaf: it reaches nothing.
        assert!(call_graph
            .functions_reachable_from("external_helper")
            .unwrap()
            .is_empty());
        assert_eq!(
            names(call_graph.functions_reaching("external_helper")),
            vec!["wrapper"]
        );
    }

    #[test]
    fn unknown_names_return_none() {
        let call_graph = call_graph_of("void lonely() {}");
        assert!(call_graph.functions_reachable_from("missing").is_none());
        assert!(call_graph.functions_reaching("missing").is_none());
    }

    #[test]
    fn calls_in_conditions_and_arguments_are_edges() {
        let call_graph = call_graph_of(
            r#"
            void complex_calls(int x) {
                if (check(x)) {
                    process(transform(x));
                }
            }
            "#,
        );
        assert_eq!(
            names(call_graph.functions_reachable_from("complex_calls")),
            vec!["check", "process", "transform"]
        );
    }
}
