//! This module implements the null dereference check.
//!
//! Dereferencing a pointer that is null crashes the program.
//! The check finds dereference sites that are reached with a pointer value
//! that is proven to be null on every execution path leading to the site.
//!
//! ## How the check works
//!
//! For each function a flow-sensitive, intraprocedural forward dataflow
//! analysis is run over its control flow graph:
//! * Pointer declarations and assignments set the abstract value of the
//!   pointer according to their right-hand side:
//!   the null sentinels `nullptr` and literal `0` are definitely null,
//!   address-of expressions are definitely non-null
//!   and everything else (e.g. call results) is unknown.
//! * Guards of shape `ptr != nullptr`, `ptr` or negations thereof narrow
//!   the pointer to definitely-non-null on the branch that proves non-nullness.
//! * At control flow joins the abstract values are merged with the lattice join,
//!   so conflicting values resolve to unknown.
//!
//! A dereference site only produces a finding if the abstract value of the
//! dereferenced pointer at that program point is definitely-null.
//! Unknown and definitely-non-null pointers never produce findings.
//! Each qualifying dereference site produces its own independent finding.
//!
//! ## False Positives
//!
//! - None known for the modeled language subset.
//!
//! ## False Negatives
//!
//! - The analysis is intraprocedural: null pointers passed as call arguments
//!   or returned from calls are not tracked across the call.
//! - A pointer that is null only on some of the paths reaching a dereference
//!   is unknown at the merge point and does not produce a finding,
//!   even though one concrete execution may crash.

use serde::{Deserialize, Serialize};

use crate::analysis::fixpoint::Computation;
use crate::analysis::graph::Cfg;
use crate::intermediate_representation::*;
use crate::prelude::*;
use crate::utils::log::{Finding, LogMessage};
use crate::CheckModule;

mod context;
mod state;

use context::Context;
use state::State;

const VERSION: &str = "0.1";

/// The module name and version.
pub static CHECK_MODULE: CheckModule = CheckModule {
    name: "NullDereference",
    version: VERSION,
    run: check_null_dereferences,
};

/// The configuration struct.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Config {
    /// Threshold for the fixpoint computation:
    /// every block is visited at most this many times.
    /// The lattice of the analysis has finite height,
    /// so any bound of at least `|blocks| * |pointer variables|` is exact.
    max_steps: u64,
}

/// Run the check.
///
/// Each function of the translation unit is analyzed independently:
/// an unstable fixpoint in one function (which can only happen with a
/// too small `max_steps` configuration) aborts the analysis of that
/// function only and is reported as an error-level log message.
pub fn check_null_dereferences(
    analysis_results: &AnalysisResults,
    check_params: &serde_json::Value,
) -> (Vec<LogMessage>, Vec<Finding>) {
    let config: Config = serde_json::from_value(check_params.clone()).unwrap();
    let mut logs = Vec::new();
    let mut findings = Vec::new();
    for (name, function) in &analysis_results.unit.functions {
        let Some(cfg) = analysis_results.control_flow_graphs.get(name) else {
            continue;
        };
        match check_function(function, cfg, config.max_steps) {
            Ok(mut function_findings) => findings.append(&mut function_findings),
            Err(log) => logs.push(log),
        }
    }
    (logs, findings)
}

/// Run the dataflow fixpoint for one function and collect the findings.
fn check_function(
    function: &Term<Function>,
    cfg: &Cfg,
    max_steps: u64,
) -> Result<Vec<Finding>, LogMessage> {
    let context = Context::new(cfg);
    let mut computation = Computation::new(context, None);
    computation.set_node_value(cfg.entry(), State::new_entry(&function.term));
    computation.compute_with_max_steps(max_steps);
    if !computation.has_stabilized() {
        return Err(LogMessage::new_error(format!(
            "fixpoint did not stabilize within {} steps per block",
            max_steps
        ))
        .location(function.tid.clone())
        .source(CHECK_MODULE.name));
    }

    let mut findings = Vec::new();
    for node in cfg.graph().node_indices() {
        // Blocks without a computed state are unreachable (the bottom element);
        // nothing in them is ever executed.
        let Some(state) = computation.get_node_value(node) else {
            continue;
        };
        let mut state = state.clone();
        let block = cfg.block(node);
        for stmt in &block.term.stmts {
            for var in stmt
                .term
                .expressions()
                .into_iter()
                .flat_map(|expr| expr.dereferenced_vars())
            {
                if let Some(binding) = state.get(&var.name) {
                    if binding.is_definitely_null() {
                        findings.push(generate_finding(function, stmt, var));
                    }
                }
            }
            state.handle_stmt(&stmt.term);
        }
        // The branch condition of the block is evaluated after its statements.
        if let Some(condition) = &block.term.condition {
            for var in condition.dereferenced_vars() {
                if let Some(binding) = state.get(&var.name) {
                    if binding.is_definitely_null() {
                        findings.push(generate_condition_finding(function, block, var));
                    }
                }
            }
        }
    }
    Ok(findings)
}

/// Generate the finding for a null dereference inside a statement.
fn generate_finding(function: &Term<Function>, stmt: &Term<Stmt>, var: &Variable) -> Finding {
    let location = stmt.tid.location;
    let description = format!(
        "(NULL Pointer Dereference) dereference of null pointer `{}` in function `{}` at {}",
        var.name, function.term.name, location
    );
    Finding::new(CHECK_MODULE.name, CHECK_MODULE.version, description)
        .locations(vec![location.to_string()])
        .tids(vec![format!("{}", stmt.tid)])
        .functions(vec![function.term.name.clone()])
        .other(vec![vec!["pointer".to_string(), var.name.clone()]])
}

/// Generate the finding for a null dereference inside a branch condition.
fn generate_condition_finding(
    function: &Term<Function>,
    block: &Term<crate::analysis::graph::Blk>,
    var: &Variable,
) -> Finding {
    // The condition has no own statement term; the block's last statement
    // (or the block itself for condition-only blocks) provides the position.
    let tid = block
        .term
        .stmts
        .last()
        .map(|stmt| &stmt.tid)
        .unwrap_or(&block.tid);
    let location = tid.location;
    let description = format!(
        "(NULL Pointer Dereference) dereference of null pointer `{}` in a branch condition of function `{}` at {}",
        var.name, function.term.name, location
    );
    Finding::new(CHECK_MODULE.name, CHECK_MODULE.version, description)
        .locations(vec![location.to_string()])
        .tids(vec![format!("{tid}")])
        .functions(vec![function.term.name.clone()])
        .other(vec![vec!["pointer".to_string(), var.name.clone()]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::graph::build_cfg;
    use crate::frontend;

    /// Parse the given source, analyze every function in it
    /// and return all findings of the check.
    fn findings_for(source: &str) -> Vec<Finding> {
        let (unit, logs) = frontend::parse_translation_unit(source);
        assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");
        let cfgs = unit
            .functions
            .iter()
            .map(|(name, function)| (name.clone(), build_cfg(function)))
            .collect();
        let analysis_results = AnalysisResults::new(&unit, &cfgs);
        let (logs, findings) =
            check_null_dereferences(&analysis_results, &serde_json::json!({ "max_steps": 100 }));
        assert!(logs.is_empty(), "unexpected log messages: {logs:?}");
        findings
    }

    #[test]
    fn direct_null_dereference_is_flagged() {
        let findings = findings_for(
            r#"
            void test_direct_null() {
                int* ptr = nullptr;
                *ptr = 42;
            }
            "#,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].other[0], vec!["pointer", "ptr"]);
        assert_eq!(findings[0].locations, vec!["4:17"]);
    }

    #[test]
    fn zero_literal_initializer_is_a_null_sentinel() {
        let findings = findings_for(
            r#"
            void test_null_zero() {
                int* ptr = 0;
                *ptr = 100;
            }
            "#,
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn address_of_initializer_is_safe() {
        let findings = findings_for(
            r#"
            void test_safe_pointer() {
                int value = 42;
                int* ptr = &value;
                *ptr = 100;
            }
            "#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn null_check_suppresses_the_finding() {
        let findings = findings_for(
            r#"
            void test_with_check() {
                int* ptr = nullptr;
                if (ptr != nullptr) {
                    *ptr = 42;
                }
            }
            "#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn truthy_guard_suppresses_the_finding() {
        let findings = findings_for(
            r#"
            void test_truthy_check(int* ptr) {
                if (ptr) {
                    *ptr = 1;
                }
            }
            "#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn early_return_guard_suppresses_the_finding() {
        let findings = findings_for(
            r#"
            void test_early_return(int* ptr) {
                if (ptr == nullptr) {
                    return;
                }
                *ptr = 1;
            }
            "#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn multiple_dereferences_produce_one_finding_each() {
        let findings = findings_for(
            r#"
            void test_multiple() {
                int* ptr1 = nullptr;
                int* ptr2 = nullptr;
                *ptr1 = 1;
                *ptr2 = 2;
            }
            "#,
        );
        assert_eq!(findings.len(), 2);
        let pointers: Vec<&str> = findings
            .iter()
            .map(|finding| finding.other[0][1].as_str())
            .collect();
        assert!(pointers.contains(&"ptr1"));
        assert!(pointers.contains(&"ptr2"));
    }

    #[test]
    fn reassignment_before_dereference_is_safe() {
        let findings = findings_for(
            r#"
            void test_reassignment() {
                int value = 0;
                int* ptr = nullptr;
                ptr = &value;
                *ptr = 1;
            }
            "#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn conflicting_branches_merge_to_unknown() {
        let findings = findings_for(
            r#"
            void test_merge(int x) {
                int value = 0;
                int* ptr = nullptr;
                if (x > 0) {
                    ptr = &value;
                }
                *ptr = 1;
            }
            "#,
        );
        // On the false branch the pointer stays null, on the true branch it
        // becomes non-null; the merge is unknown, which never flags.
        assert!(findings.is_empty());
    }

    #[test]
    fn null_on_all_branches_is_flagged_after_the_merge() {
        let findings = findings_for(
            r#"
            void test_merge_null(int x) {
                int* ptr = nullptr;
                if (x > 0) {
                    ptr = 0;
                }
                *ptr = 1;
            }
            "#,
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn dereference_inside_a_loop_is_flagged_once() {
        let findings = findings_for(
            r#"
            void test_loop() {
                int* ptr = nullptr;
                for (int i = 0; i < 3; i++) {
                    *ptr = i;
                }
            }
            "#,
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn dereference_in_a_condition_is_flagged() {
        let findings = findings_for(
            r#"
            void test_condition_deref() {
                int* ptr = nullptr;
                if (*ptr > 0) {
                    return;
                }
            }
            "#,
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description.contains("branch condition"));
    }

    #[test]
    fn dereference_on_the_right_hand_side_is_flagged() {
        let findings = findings_for(
            r#"
            void test_rhs_deref() {
                int* ptr = nullptr;
                int value = *ptr;
            }
            "#,
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn pointer_parameters_are_not_flagged_without_evidence() {
        let findings = findings_for(
            r#"
            void write_through(int* out) {
                *out = 1;
            }
            "#,
        );
        assert!(findings.is_empty());
    }
}
