//! Generate intraprocedural control flow graphs out of function terms.
//!
//! The generated graphs follow some basic principles:
//! * **Nodes** are basic blocks: maximal sequences of straight-line statements.
//! A block that ends at a branch point additionally carries the branch condition,
//! which is evaluated after the statements of the block.
//! * **Edges** denote possible transfers of control between blocks.
//! Every edge carries a kind describing why the transfer can happen,
//! e.g. `TrueBranch` for entering the true arm of an `if`
//! or `LoopBack` for the jump from the end of a loop body back to the loop header.
//!
//! # General guarantees
//!
//! * Each graph has exactly one entry block, which has in-degree zero.
//! * Every block is reachable from the entry block by construction:
//! join and exit blocks are only materialized when a predecessor links to them,
//! so dead *blocks* are never created.
//! Dead *edges* can exist if a branch condition is a compile-time constant;
//! recognizing those is deliberately out of scope.
//! * `return` statements terminate their block with no outgoing edges,
//! so a function can have several exit blocks.
//! Statements following a `return` or `break` in the same sequence are
//! unreachable and are not converted into blocks.
//!
//! # Modeling notes
//!
//! * A `switch` produces one `CaseBranch` edge per `case` label plus one
//! `DefaultBranch` edge. If the switch has no `default` arm, the
//! `DefaultBranch` edge leads directly to the continuation block.
//! * A case body that does not end in `break` or `return` falls through
//! into the block of the next case.

use crate::intermediate_representation::*;
use crate::prelude::*;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// The graph type of an intraprocedural control flow graph.
pub type CfgGraph = DiGraph<Term<Blk>, Edge>;

/// A basic block of a control flow graph.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct Blk {
    /// The straight-line statements of the block in execution order.
    pub stmts: Vec<Term<Stmt>>,
    /// The branch condition evaluated after the statements,
    /// if the block ends at a branch or switch.
    pub condition: Option<Expression>,
}

/// The edge type of an intraprocedural control flow graph.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Edge {
    /// An unconditional transfer to the successor block.
    Sequential,
    /// The transfer taken if the branch condition of the source block is true.
    TrueBranch,
    /// The transfer taken if the branch condition of the source block is false.
    FalseBranch,
    /// The jump from the end of a loop body back to the loop header.
    LoopBack,
    /// The transfer taken when a loop condition turns false
    /// or a `break` leaves the loop.
    LoopExit,
    /// The transfer into the body of the `case` arm with the given label value.
    CaseBranch(i64),
    /// The transfer taken if no `case` label of a switch matches.
    DefaultBranch,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Edge::Sequential => write!(formatter, "sequential"),
            Edge::TrueBranch => write!(formatter, "true-branch"),
            Edge::FalseBranch => write!(formatter, "false-branch"),
            Edge::LoopBack => write!(formatter, "loop-back"),
            Edge::LoopExit => write!(formatter, "loop-exit"),
            Edge::CaseBranch(value) => write!(formatter, "case {value}"),
            Edge::DefaultBranch => write!(formatter, "default"),
        }
    }
}

/// The control flow graph of one function.
#[derive(Debug, Clone)]
pub struct Cfg {
    graph: CfgGraph,
    entry: NodeIndex,
}

impl Cfg {
    /// Get the underlying graph.
    pub fn graph(&self) -> &CfgGraph {
        &self.graph
    }

    /// Get the node index of the entry block.
    pub fn entry(&self) -> NodeIndex {
        self.entry
    }

    /// Get the block corresponding to the given node index.
    pub fn block(&self, node: NodeIndex) -> &Term<Blk> {
        &self.graph[node]
    }

    /// Return the indices of all exit blocks, i.e. blocks without outgoing edges.
    pub fn exit_nodes(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|node| {
                self.graph
                    .edges_directed(*node, petgraph::Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }
}

impl std::fmt::Display for Cfg {
    /// Print the block and edge structure in a form suitable for external rendering.
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        for node in self.graph.node_indices() {
            let block = &self.graph[node];
            if node == self.entry {
                writeln!(formatter, "{} (entry):", block.tid)?;
            } else {
                writeln!(formatter, "{}:", block.tid)?;
            }
            for stmt in &block.term.stmts {
                writeln!(formatter, "    {}", stmt.term)?;
            }
            if let Some(condition) = &block.term.condition {
                writeln!(formatter, "    branch on {condition}")?;
            }
        }
        for edge in self.graph.edge_references() {
            writeln!(
                formatter,
                "{} -> {} ({})",
                self.graph[edge.source()].tid,
                self.graph[edge.target()].tid,
                edge.weight()
            )?;
        }
        Ok(())
    }
}

/// Build the control flow graph of the given function.
pub fn build_cfg(function: &Term<Function>) -> Cfg {
    let mut builder = CfgBuilder::new(&function.term.name);
    let entry = builder.new_block();
    let ends = builder.build_sequence(&function.term.body, entry, &mut Vec::new());
    // Dangling non-sequential exits (e.g. the loop-exit edge of a loop
    // at the end of the function) get a synthetic exit block,
    // so that every such edge is materialized in the graph.
    builder.normalize_to_single_block(ends);
    Cfg {
        graph: builder.graph,
        entry,
    }
}

/// A builder struct for control flow graphs.
///
/// During construction, the exits of already-built subgraphs are tracked as
/// *open ends*: pairs of a block index and the edge kind with which that block
/// wants to connect to whatever comes next.
struct CfgBuilder<'a> {
    function: &'a str,
    graph: CfgGraph,
    next_block_index: usize,
}

impl<'a> CfgBuilder<'a> {
    fn new(function: &'a str) -> CfgBuilder<'a> {
        CfgBuilder {
            function,
            graph: CfgGraph::new(),
            next_block_index: 0,
        }
    }

    /// Add a new empty block to the graph.
    fn new_block(&mut self) -> NodeIndex {
        let tid = Tid::blk(self.function, self.next_block_index);
        self.next_block_index += 1;
        self.graph.add_node(Term {
            tid,
            term: Blk::default(),
        })
    }

    fn connect(&mut self, ends: &[(NodeIndex, Edge)], target: NodeIndex) {
        for (source, edge) in ends {
            self.graph.add_edge(*source, target, *edge);
        }
    }

    /// Funnel the given open ends into a single block.
    ///
    /// A single sequential end is returned as-is.
    /// Any other non-empty end set gets a fresh block that all ends connect to.
    /// Returns `None` for an empty end set (all paths already terminated).
    fn normalize_to_single_block(&mut self, ends: Vec<(NodeIndex, Edge)>) -> Option<NodeIndex> {
        match ends.as_slice() {
            [] => None,
            [(node, Edge::Sequential)] => Some(*node),
            _ => {
                let join = self.new_block();
                self.connect(&ends, join);
                Some(join)
            }
        }
    }

    /// Convert a statement sequence into blocks.
    ///
    /// `entry` is the currently open block that the sequence starts in.
    /// `breaks` collects the open ends produced by `break` statements
    /// of the innermost enclosing loop or switch.
    /// Returns the open ends of the sequence.
    fn build_sequence(
        &mut self,
        stmts: &[Term<Stmt>],
        entry: NodeIndex,
        breaks: &mut Vec<(NodeIndex, Edge)>,
    ) -> Vec<(NodeIndex, Edge)> {
        let mut current = entry;
        for (index, stmt) in stmts.iter().enumerate() {
            let ends = match &stmt.term {
                Stmt::Decl { .. } | Stmt::Assign { .. } | Stmt::Expr(_) => {
                    self.graph[current].term.stmts.push(stmt.clone());
                    continue;
                }
                Stmt::Return(_) => {
                    self.graph[current].term.stmts.push(stmt.clone());
                    // No outgoing edges; the rest of the sequence is unreachable.
                    return Vec::new();
                }
                Stmt::Break => {
                    breaks.push((current, Edge::LoopExit));
                    return Vec::new();
                }
                Stmt::If {
                    condition,
                    then_body,
                    else_body,
                } => self.build_if(current, condition, then_body, else_body.as_deref(), breaks),
                Stmt::While { condition, body } => {
                    self.build_loop(current, Some(condition), None, body)
                }
                Stmt::For {
                    init,
                    condition,
                    update,
                    body,
                } => {
                    if let Some(init) = init {
                        self.graph[current].term.stmts.push((**init).clone());
                    }
                    self.build_loop(current, condition.as_ref(), update.as_deref(), body)
                }
                Stmt::Switch {
                    scrutinee,
                    cases,
                    default,
                } => self.build_switch(current, scrutinee, cases, default.as_deref()),
            };
            if index + 1 < stmts.len() {
                match self.normalize_to_single_block(ends) {
                    Some(join) => current = join,
                    // All paths terminated; the rest of the sequence is unreachable.
                    None => return Vec::new(),
                }
            } else {
                return ends;
            }
        }
        vec![(current, Edge::Sequential)]
    }

    /// Build the blocks of an `if` statement.
    /// Returns the open ends of both arms.
    fn build_if(
        &mut self,
        current: NodeIndex,
        condition: &Expression,
        then_body: &[Term<Stmt>],
        else_body: Option<&[Term<Stmt>]>,
        breaks: &mut Vec<(NodeIndex, Edge)>,
    ) -> Vec<(NodeIndex, Edge)> {
        self.graph[current].term.condition = Some(condition.clone());
        let then_entry = self.new_block();
        self.graph.add_edge(current, then_entry, Edge::TrueBranch);
        let mut ends = self.build_sequence(then_body, then_entry, breaks);
        match else_body {
            Some(else_body) => {
                let else_entry = self.new_block();
                self.graph.add_edge(current, else_entry, Edge::FalseBranch);
                ends.append(&mut self.build_sequence(else_body, else_entry, breaks));
            }
            None => ends.push((current, Edge::FalseBranch)),
        }
        ends
    }

    /// Build the blocks of a `while` or `for` loop:
    /// a loop header holding the condition, a `TrueBranch` edge into the body,
    /// a `LoopBack` edge from the end of the body to the header
    /// and a `LoopExit` edge as the open end towards the continuation.
    fn build_loop(
        &mut self,
        current: NodeIndex,
        condition: Option<&Expression>,
        update: Option<&Term<Stmt>>,
        body: &[Term<Stmt>],
    ) -> Vec<(NodeIndex, Edge)> {
        let header = self.new_block();
        self.graph.add_edge(current, header, Edge::Sequential);
        self.graph[header].term.condition = condition.cloned();
        let body_entry = self.new_block();
        let body_edge = if condition.is_some() {
            Edge::TrueBranch
        } else {
            // A loop without condition, e.g. `for (;;)`, always enters its body.
            Edge::Sequential
        };
        self.graph.add_edge(header, body_entry, body_edge);

        let mut breaks = Vec::new();
        let body_ends = self.build_sequence(body, body_entry, &mut breaks);
        if let Some(body_exit) = self.normalize_to_single_block(body_ends) {
            if let Some(update) = update {
                self.graph[body_exit].term.stmts.push(update.clone());
            }
            self.graph.add_edge(body_exit, header, Edge::LoopBack);
        }

        let mut ends = breaks;
        if condition.is_some() {
            ends.push((header, Edge::LoopExit));
        }
        ends
    }

    /// Build the blocks of a `switch` statement.
    fn build_switch(
        &mut self,
        current: NodeIndex,
        scrutinee: &Expression,
        cases: &[SwitchCase],
        default: Option<&[Term<Stmt>]>,
    ) -> Vec<(NodeIndex, Edge)> {
        self.graph[current].term.condition = Some(scrutinee.clone());
        let mut breaks = Vec::new();
        // Open ends of the previous case body that fall through into the next case.
        let mut fallthrough: Vec<(NodeIndex, Edge)> = Vec::new();
        for case in cases {
            let case_entry = self.new_block();
            self.graph
                .add_edge(current, case_entry, Edge::CaseBranch(case.value));
            self.connect(&fallthrough, case_entry);
            fallthrough = self.build_sequence(&case.body, case_entry, &mut breaks);
        }
        let mut ends = match default {
            Some(default_body) => {
                let default_entry = self.new_block();
                self.graph
                    .add_edge(current, default_entry, Edge::DefaultBranch);
                self.connect(&fallthrough, default_entry);
                self.build_sequence(default_body, default_entry, &mut breaks)
            }
            None => {
                // Without a `default` arm the switch can be skipped entirely.
                let mut ends = fallthrough;
                ends.push((current, Edge::DefaultBranch));
                ends
            }
        };
        // `break` leaves the switch towards the continuation.
        for (node, _) in breaks {
            ends.push((node, Edge::Sequential));
        }
        ends
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend;

    fn cfg_of(source: &str, name: &str) -> Cfg {
        let (unit, logs) = frontend::parse_translation_unit(source);
        assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");
        build_cfg(unit.find_function(name).unwrap())
    }

    fn edge_kinds(cfg: &Cfg) -> Vec<Edge> {
        cfg.graph()
            .edge_references()
            .map(|edge| *edge.weight())
            .collect()
    }

    #[test]
    fn empty_function_has_single_entry_block() {
        let cfg = cfg_of("void unrelated1() {}", "unrelated1");
        assert_eq!(cfg.graph().node_count(), 1);
        assert_eq!(cfg.graph().edge_count(), 0);
        assert_eq!(cfg.exit_nodes(), vec![cfg.entry()]);
    }

    #[test]
    fn branch_and_loop_structure() {
        let cfg = cfg_of(
            r#"
            void simpleMethod(int x) {
                int result = 0;
                if (x > 0) {
                    result = 1;
                } else {
                    result = -1;
                }
                for (int i = 0; i < 3; i++) {
                    result = result + i;
                }
            }
            "#,
            "simpleMethod",
        );
        assert!(cfg.graph().node_count() >= 4);
        let kinds = edge_kinds(&cfg);
        assert!(kinds.contains(&Edge::TrueBranch));
        assert!(kinds.contains(&Edge::FalseBranch));
        assert!(kinds.contains(&Edge::LoopBack));
        assert!(kinds.contains(&Edge::LoopExit));
        // Exactly one block has in-degree zero: the entry block.
        let roots: Vec<_> = cfg
            .graph()
            .node_indices()
            .filter(|node| {
                cfg.graph()
                    .edges_directed(*node, petgraph::Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        assert_eq!(roots, vec![cfg.entry()]);
        // At least one exit block exists.
        assert!(!cfg.exit_nodes().is_empty());
    }

    #[test]
    fn return_blocks_have_no_outgoing_edges() {
        let cfg = cfg_of(
            r#"
            int complexMethod(int value) {
                if (value < 0) {
                    return -1;
                }
                while (value > 10) {
                    value = value / 2;
                }
                switch (value) {
                    case 0:
                        return 0;
                    case 1:
                        return 1;
                    default:
                        return value * 2;
                }
            }
            "#,
            "complexMethod",
        );
        // Four return statements, each terminating its own exit block.
        let exit_nodes = cfg.exit_nodes();
        assert_eq!(exit_nodes.len(), 4);
        for node in exit_nodes {
            let last_stmt = cfg.block(node).term.stmts.last().unwrap();
            assert!(matches!(last_stmt.term, Stmt::Return(_)));
        }
        let kinds = edge_kinds(&cfg);
        assert!(kinds.contains(&Edge::CaseBranch(0)));
        assert!(kinds.contains(&Edge::CaseBranch(1)));
        assert!(kinds.contains(&Edge::DefaultBranch));
    }

    #[test]
    fn switch_without_default_branches_to_continuation() {
        let cfg = cfg_of(
            r#"
            void partial_switch(int x) {
                int y = 0;
                switch (x) {
                    case 1:
                        y = 1;
                        break;
                }
                y = 2;
            }
            "#,
            "partial_switch",
        );
        let kinds = edge_kinds(&cfg);
        assert!(kinds.contains(&Edge::CaseBranch(1)));
        assert!(kinds.contains(&Edge::DefaultBranch));
        // The default edge leads from the switch head directly to the continuation.
        let default_edge = cfg
            .graph()
            .edge_references()
            .find(|edge| *edge.weight() == Edge::DefaultBranch)
            .unwrap();
        assert_eq!(default_edge.source(), cfg.entry());
        let continuation = default_edge.target();
        assert!(matches!(
            cfg.block(continuation).term.stmts[0].term,
            Stmt::Assign { .. }
        ));
    }

    #[test]
    fn case_fallthrough_connects_to_next_case() {
        let cfg = cfg_of(
            r#"
            void fallthrough(int x) {
                int y = 0;
                switch (x) {
                    case 1:
                        y = 1;
                    case 2:
                        y = 2;
                        break;
                    default:
                        y = 3;
                }
            }
            "#,
            "fallthrough",
        );
        // Find the blocks of case 1 and case 2 via their case edges.
        let case_target = |value| {
            cfg.graph()
                .edge_references()
                .find(|edge| *edge.weight() == Edge::CaseBranch(value))
                .unwrap()
                .target()
        };
        let case_1 = case_target(1);
        let case_2 = case_target(2);
        assert!(cfg
            .graph()
            .edges_directed(case_1, petgraph::Direction::Outgoing)
            .any(|edge| edge.target() == case_2));
    }

    #[test]
    fn break_exits_the_loop() {
        let cfg = cfg_of(
            r#"
            void loop_with_break(int x) {
                while (x > 0) {
                    if (x == 1) {
                        break;
                    }
                    x = x - 1;
                }
                x = 0;
            }
            "#,
            "loop_with_break",
        );
        // Two loop exits reach the continuation: the header condition
        // turning false and the break edge.
        let loop_exit_count = edge_kinds(&cfg)
            .iter()
            .filter(|kind| **kind == Edge::LoopExit)
            .count();
        assert_eq!(loop_exit_count, 2);
    }

    #[test]
    fn code_after_return_creates_no_blocks() {
        let cfg = cfg_of(
            r#"
            int early(int x) {
                return x;
            }
            "#,
            "early",
        );
        assert_eq!(cfg.graph().node_count(), 1);
        let cfg = cfg_of(
            r#"
            int both_arms_return(int x) {
                if (x > 0) {
                    return 1;
                } else {
                    return 2;
                }
            }
            "#,
            "both_arms_return",
        );
        // Entry plus one block per arm; no dead join block.
        assert_eq!(cfg.graph().node_count(), 3);
    }

    #[test]
    fn cfg_display_lists_blocks_and_edges() {
        let cfg = cfg_of(
            r#"
            void tiny(int x) {
                if (x) {
                    x = 1;
                }
            }
            "#,
            "tiny",
        );
        let rendered = format!("{cfg}");
        assert!(rendered.contains("(entry)"));
        assert!(rendered.contains("branch on x"));
        assert!(rendered.contains("true-branch"));
        assert!(rendered.contains("false-branch"));
    }
}
