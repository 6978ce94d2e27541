/*!
This module implements the backward call graph reachability check.

For every configured target function the check reports the set of functions
from which a forward path of calls reaches the target,
i.e. all direct and transitive callers of the target.

How the check works:

  * The whole-unit call graph is traversed backwards starting at each target
function configured in config.json (or supplied on the command line).
The target itself is only part of the result if it can reach itself
through a cycle of calls.

False Positives

* None known.

False Negatives

* Calls through function pointers and virtual dispatch are not resolved
and therefore not part of the call graph. This is a documented scope
limitation of the call graph construction, not of this check.
*/
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::intermediate_representation::SourceLocation;
use crate::utils::log::{Finding, LogMessage};

const VERSION: &str = "0.1";

/// The module name and version.
pub static CHECK_MODULE: crate::CheckModule = crate::CheckModule {
    name: "CallGraphTo",
    version: VERSION,
    run: check_calls_to,
};

/// Struct containing the query roots from config.json.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Config {
    /// The names of the functions whose caller sets are reported.
    targets: Vec<String>,
}

/// For each configured target function,
/// generate one finding listing the functions that reach it.
pub fn check_calls_to(
    analysis_results: &crate::AnalysisResults,
    check_params: &serde_json::Value,
) -> (Vec<LogMessage>, Vec<Finding>) {
    let config: Config = serde_json::from_value(check_params.clone()).unwrap();
    let call_graph = analysis_results.call_graph.unwrap();

    let mut logs = Vec::new();
    let mut findings = Vec::new();
    for target in &config.targets {
        match call_graph.functions_reaching(target) {
            Some(callers) => {
                let location = analysis_results
                    .unit
                    .find_function(target)
                    .map(|function| function.tid.location)
                    .unwrap_or_else(SourceLocation::unknown);
                let listing = if callers.is_empty() {
                    "no functions".to_string()
                } else {
                    callers.iter().join(", ")
                };
                let description = format!(
                    "(Call Graph To) `{target}` at {location} is reached from: {listing}"
                );
                findings.push(
                    Finding::new(CHECK_MODULE.name, CHECK_MODULE.version, description)
                        .locations(vec![location.to_string()])
                        .functions(callers.into_iter().collect()),
                );
            }
            None => logs.push(
                LogMessage::new_error(format!(
                    "no function or callee named `{target}` in the translation unit"
                ))
                .source(CHECK_MODULE.name),
            ),
        }
    }
    (logs, findings)
}
