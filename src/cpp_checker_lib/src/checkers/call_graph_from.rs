/*!
This module implements the forward call graph reachability check.

For every configured source function the check reports the set of functions
that are transitively reachable from it by following call edges forward,
i.e. everything the source may directly or indirectly invoke.

How the check works:

  * The whole-unit call graph is traversed starting at each source function
configured in config.json (or supplied on the command line).
The source itself is only part of the result if it can call itself
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
    name: "CallGraphFrom",
    version: VERSION,
    run: check_calls_from,
};

/// Struct containing the query roots from config.json.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Config {
    /// The names of the functions whose forward-reachable sets are reported.
    sources: Vec<String>,
}

/// For each configured source function,
/// generate one finding listing the functions reachable from it.
pub fn check_calls_from(
    analysis_results: &crate::AnalysisResults,
    check_params: &serde_json::Value,
) -> (Vec<LogMessage>, Vec<Finding>) {
    let config: Config = serde_json::from_value(check_params.clone()).unwrap();
    let call_graph = analysis_results.call_graph.unwrap();

    let mut logs = Vec::new();
    let mut findings = Vec::new();
    for source in &config.sources {
        match call_graph.functions_reachable_from(source) {
            Some(reachable) => {
                let location = analysis_results
                    .unit
                    .find_function(source)
                    .map(|function| function.tid.location)
                    .unwrap_or_else(SourceLocation::unknown);
                let listing = if reachable.is_empty() {
                    "no functions".to_string()
                } else {
                    reachable.iter().join(", ")
                };
                let description = format!(
                    "(Call Graph From) `{source}` at {location} reaches: {listing}"
                );
                findings.push(
                    Finding::new(CHECK_MODULE.name, CHECK_MODULE.version, description)
                        .locations(vec![location.to_string()])
                        .functions(reachable.into_iter().collect()),
                );
            }
            None => logs.push(
                LogMessage::new_error(format!(
                    "no function or callee named `{source}` in the translation unit"
                ))
                .source(CHECK_MODULE.name),
            ),
        }
    }
    (logs, findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::callgraph::build_call_graph;
    use crate::frontend;

    #[test]
    fn reports_the_reachable_set_of_each_source() {
        let (unit, _) = frontend::parse_translation_unit(
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
        let cfgs = std::collections::BTreeMap::new();
        let call_graph = build_call_graph(&unit);
        let analysis_results =
            crate::AnalysisResults::new(&unit, &cfgs).with_call_graph(Some(&call_graph));
        let (logs, findings) = check_calls_from(
            &analysis_results,
            &serde_json::json!({ "sources": ["sourceFunc", "unrelated1", "missing"] }),
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].functions, vec!["unrelated1", "unrelated2"]);
        assert!(findings[0].description.contains("sourceFunc"));
        assert!(findings[1].description.contains("no functions"));
        // Unknown query roots produce a diagnostic, not a crash.
        assert_eq!(logs.len(), 1);
        assert!(logs[0].text.contains("missing"));
    }
}
