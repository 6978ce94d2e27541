/*!
The main library of the cpp_checker containing all checks and analysis modules.

# What is the cpp_checker

The cpp_checker is a small query-based static analysis engine for
self-contained C++ source snippets, like the fixture files used in
static analysis training workshops.
It parses the functions of one translation unit into an intermediate
representation, builds a control flow graph per function and a call graph
for the whole unit, and runs a set of check modules on top of these:

- **NullDereference** finds dereferences of pointers that are proven null
  by a flow-sensitive dataflow analysis over the control flow graph.
- **CallGraphFrom** reports all functions transitively reachable from a
  given source function by following call edges forward.
- **CallGraphTo** reports all functions from which a forward path of calls
  reaches a given target function.

# Usage

If the cpp_checker is installed locally, just run
```sh
cpp_checker SOURCE_FILE.cpp
```
One can modify the behaviour of the cpp_checker through the command line.
Use the `--help` command line option for more information.
One can also provide a custom configuration file to modify the behaviour
of each check through the `--config` command line option.
Start by taking a look at the standard configuration file located at
`src/config.json` and read the [check-specific documentation](crate::checkers)
for more details about each field in the configuration file.

# Further documentation

You can find out more information about each check,
including its known false positives and false negatives,
by reading the check-specific module documentation in the [`checkers`] module.
*/

use std::collections::BTreeMap;

pub mod abstract_domain;
pub mod analysis;
pub mod checkers;
pub mod frontend;
pub mod intermediate_representation;
pub mod utils;

use analysis::callgraph::CallGraph;
use analysis::graph::Cfg;
use intermediate_representation::TranslationUnit;
use utils::log::{Finding, LogMessage};

mod prelude {
    pub use serde::{Deserialize, Serialize};

    pub use crate::intermediate_representation::{SourceLocation, Term, Tid};
    pub use crate::AnalysisResults;
    pub use anyhow::{anyhow, Context as _, Error};
}
use prelude::*;

/// The generic function signature for the main function of a check module.
pub type CheckModuleFn =
    fn(&AnalysisResults, &serde_json::Value) -> (Vec<LogMessage>, Vec<Finding>);

/// A structure containing general information about a check module,
/// including the function to be called to run the check.
pub struct CheckModule {
    /// The name of the check.
    pub name: &'static str,
    /// The version number of the check.
    /// Should be incremented whenever significant changes are made to the check.
    pub version: &'static str,
    /// The function that executes the check and returns the findings.
    pub run: CheckModuleFn,
}

impl std::fmt::Display for CheckModule {
    /// Print the module name and its version number.
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, r#""{}": "{}""#, self.name, self.version)
    }
}

/// Get a list of all known check modules.
pub fn get_modules() -> Vec<&'static CheckModule> {
    vec![
        &crate::checkers::null_dereference::CHECK_MODULE,
        &crate::checkers::call_graph_from::CHECK_MODULE,
        &crate::checkers::call_graph_to::CHECK_MODULE,
    ]
}

/// A struct containing pointers to all known analysis results
/// that may be needed as input for the check modules.
#[derive(Clone, Copy)]
pub struct AnalysisResults<'a> {
    /// The parsed translation unit.
    pub unit: &'a TranslationUnit,
    /// The control flow graphs of the functions in the unit,
    /// keyed by function name.
    pub control_flow_graphs: &'a BTreeMap<String, Cfg>,
    /// The call graph of the unit if already computed.
    pub call_graph: Option<&'a CallGraph>,
}

impl<'a> AnalysisResults<'a> {
    /// Create a new `AnalysisResults` struct with only the translation unit
    /// and its control flow graphs known.
    pub fn new(
        unit: &'a TranslationUnit,
        control_flow_graphs: &'a BTreeMap<String, Cfg>,
    ) -> AnalysisResults<'a> {
        AnalysisResults {
            unit,
            control_flow_graphs,
            call_graph: None,
        }
    }

    /// Compute the call graph of the translation unit.
    /// The result gets returned, but not saved to the `AnalysisResults` struct itself.
    pub fn compute_call_graph(&self) -> CallGraph {
        analysis::callgraph::build_call_graph(self.unit)
    }

    /// Create a new `AnalysisResults` struct containing the given call graph.
    pub fn with_call_graph(self, call_graph: Option<&'a CallGraph>) -> AnalysisResults<'a> {
        AnalysisResults { call_graph, ..self }
    }
}

/// Build the control flow graphs of all functions in the given translation unit.
pub fn compute_control_flow_graphs(unit: &TranslationUnit) -> BTreeMap<String, Cfg> {
    unit.functions
        .iter()
        .map(|(name, function)| (name.clone(), analysis::graph::build_cfg(function)))
        .collect()
}
