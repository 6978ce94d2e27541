//! End-to-end tests driving the full pipeline
//! (parse, control flow graphs, call graph, check modules)
//! over the workshop fixture files that the engine is built for.

use cpp_checker_lib::analysis::graph::Edge;
use cpp_checker_lib::frontend;
use cpp_checker_lib::AnalysisResults;
use petgraph::visit::EdgeRef;

/// The null dereference workshop fixture.
const NULL_DEREF_FIXTURE: &str = r#"
// Test code for null pointer dereference workshop

// POSITIVE CASE: Direct null dereference
void test_direct_null() {
    int* ptr = nullptr;
    *ptr = 42;  // Should be detected
}

// POSITIVE CASE: Null from literal 0
void test_null_zero() {
    int* ptr = 0;
    *ptr = 100;  // Should be detected
}

// NEGATIVE CASE: Safe pointer usage
void test_safe_pointer() {
    int value = 42;
    int* ptr = &value;
    *ptr = 100;
}

// NEGATIVE CASE: Null check before dereference
void test_with_check() {
    int* ptr = nullptr;
    if (ptr != nullptr) {
        *ptr = 42;
    }
}

// EDGE CASE: Multiple dereferences
void test_multiple() {
    int* ptr1 = nullptr;
    int* ptr2 = nullptr;
    *ptr1 = 1;  // Should be detected
    *ptr2 = 2;  // Should be detected
}
"#;

/// The control flow graph fixture.
const CFG_FIXTURE: &str = r#"
// COMPLIANT - Basic control flow for CFG testing
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

// NON_COMPLIANT - Function with complex control flow
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
"#;

/// The forward call graph fixture.
const CALL_GRAPH_FROM_FIXTURE: &str = r#"
// COMPLIANT: Functions that should not be analyzed
void unrelated1() {
    // No calls
}

void unrelated2() {
    unrelated1();
}

// NON_COMPLIANT: Source function for call graph analysis
void sourceFunc() {
    unrelated1();
    unrelated2();
}
"#;

/// The backward call graph fixture.
const CALL_GRAPH_TO_FIXTURE: &str = r#"
// COMPLIANT: Functions that should not be analyzed
void unrelated1() {
    // No calls
}

// NON_COMPLIANT: Target function for call graph analysis
void targetFunc() {
    unrelated1();
}

void caller1() {
    targetFunc();
}

void caller2() {
    targetFunc();
}
"#;

/// Run all check modules over a source text with the given configuration.
fn run_all_modules(
    source: &str,
    config: serde_json::Value,
) -> (
    Vec<cpp_checker_lib::utils::log::LogMessage>,
    Vec<cpp_checker_lib::utils::log::Finding>,
) {
    let (unit, mut all_logs) = frontend::parse_translation_unit(source);
    let control_flow_graphs = cpp_checker_lib::compute_control_flow_graphs(&unit);
    let analysis_results = AnalysisResults::new(&unit, &control_flow_graphs);
    let call_graph = analysis_results.compute_call_graph();
    let analysis_results = analysis_results.with_call_graph(Some(&call_graph));

    let mut all_findings = Vec::new();
    for module in cpp_checker_lib::get_modules() {
        let (mut logs, mut findings) = (module.run)(&analysis_results, &config[module.name]);
        all_logs.append(&mut logs);
        all_findings.append(&mut findings);
    }
    (all_logs, all_findings)
}

fn default_config() -> serde_json::Value {
    serde_json::json!({
        "NullDereference": { "max_steps": 100 },
        "CallGraphFrom": { "sources": [] },
        "CallGraphTo": { "targets": [] }
    })
}

#[test]
fn null_dereference_fixture_produces_exactly_the_expected_findings() {
    let (logs, findings) = run_all_modules(NULL_DEREF_FIXTURE, default_config());
    assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");

    // One finding per positive dereference site:
    // test_direct_null, test_null_zero and two sites in test_multiple.
    assert_eq!(findings.len(), 4);
    let mut flagged: Vec<(String, String)> = findings
        .iter()
        .map(|finding| {
            (
                finding.functions[0].clone(),
                finding.other[0][1].clone(),
            )
        })
        .collect();
    flagged.sort();
    assert_eq!(
        flagged,
        vec![
            ("test_direct_null".to_string(), "ptr".to_string()),
            ("test_multiple".to_string(), "ptr1".to_string()),
            ("test_multiple".to_string(), "ptr2".to_string()),
            ("test_null_zero".to_string(), "ptr".to_string()),
        ]
    );
    // The negative cases never appear.
    assert!(!findings
        .iter()
        .any(|finding| finding.functions[0] == "test_safe_pointer"
            || finding.functions[0] == "test_with_check"));
}

#[test]
fn call_graph_from_fixture_reports_the_forward_reachable_set() {
    let mut config = default_config();
    config["CallGraphFrom"]["sources"] = serde_json::json!(["sourceFunc"]);
    let (logs, findings) = run_all_modules(CALL_GRAPH_FROM_FIXTURE, config);
    assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");

    let finding = findings
        .iter()
        .find(|finding| finding.name == "CallGraphFrom")
        .unwrap();
    assert_eq!(finding.functions, vec!["unrelated1", "unrelated2"]);
    assert!(finding.description.contains("sourceFunc"));
}

#[test]
fn call_graph_to_fixture_reports_the_caller_set() {
    let mut config = default_config();
    config["CallGraphTo"]["targets"] = serde_json::json!(["targetFunc"]);
    let (logs, findings) = run_all_modules(CALL_GRAPH_TO_FIXTURE, config);
    assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");

    let finding = findings
        .iter()
        .find(|finding| finding.name == "CallGraphTo")
        .unwrap();
    assert_eq!(finding.functions, vec!["caller1", "caller2"]);
    assert!(finding.description.contains("targetFunc"));
}

#[test]
fn cfg_fixture_builds_the_expected_graph_shapes() {
    let (unit, logs) = frontend::parse_translation_unit(CFG_FIXTURE);
    assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");
    let control_flow_graphs = cpp_checker_lib::compute_control_flow_graphs(&unit);

    let simple = &control_flow_graphs["simpleMethod"];
    assert!(simple.graph().node_count() >= 4);
    let kinds: Vec<Edge> = simple
        .graph()
        .edge_references()
        .map(|edge| *edge.weight())
        .collect();
    assert!(kinds.contains(&Edge::TrueBranch));
    assert!(kinds.contains(&Edge::FalseBranch));
    assert!(kinds.contains(&Edge::LoopBack));
    // Exactly one block with in-degree zero: the entry block.
    let roots: Vec<_> = simple
        .graph()
        .node_indices()
        .filter(|node| {
            simple
                .graph()
                .edges_directed(*node, petgraph::Direction::Incoming)
                .next()
                .is_none()
        })
        .collect();
    assert_eq!(roots, vec![simple.entry()]);

    let complex = &control_flow_graphs["complexMethod"];
    // Every return statement ends an exit block of its own.
    assert_eq!(complex.exit_nodes().len(), 4);
    let kinds: Vec<Edge> = complex
        .graph()
        .edge_references()
        .map(|edge| *edge.weight())
        .collect();
    assert!(kinds.contains(&Edge::CaseBranch(0)));
    assert!(kinds.contains(&Edge::CaseBranch(1)));
    assert!(kinds.contains(&Edge::DefaultBranch));
    assert!(kinds.contains(&Edge::LoopExit));

    // The rendered structure is suitable for external tooling.
    let rendered = format!("{simple}");
    assert!(rendered.contains("(entry)"));
    assert!(rendered.contains("true-branch"));
    assert!(rendered.contains("loop-back"));
}
