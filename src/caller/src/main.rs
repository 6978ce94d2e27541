//! This crate defines the command line interface for the cpp_checker.
//! General documentation about the cpp_checker is contained in the [`cpp_checker_lib`] crate.

extern crate cpp_checker_lib; // Needed for the docstring-link to work

use cpp_checker_lib::frontend;
use cpp_checker_lib::utils::log::print_all_messages;
use cpp_checker_lib::utils::read_config_file;
use cpp_checker_lib::AnalysisResults;
use std::collections::HashSet;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
/// Run static analysis checks on a C++ source file
struct CmdlineArgs {
    /// The path to the source file.
    #[structopt(required_unless("module-versions"), validator(check_file_existence))]
    source: Option<String>,

    /// Path to a custom configuration file to use instead of the standard one.
    #[structopt(long, short, validator(check_file_existence))]
    config: Option<String>,

    /// Write the results to a file instead of stdout.
    /// This only affects findings. Log messages are still printed to stdout.
    #[structopt(long, short)]
    out: Option<String>,

    /// Specify a specific set of checks to be run as a comma separated list,
    /// e.g. 'NullDereference,CallGraphFrom'.
    ///
    /// Use the "--module-versions" command line option to get a list of all valid check names.
    #[structopt(long, short)]
    partial: Option<String>,

    /// Add a source function for the CallGraphFrom check.
    /// Can be given multiple times.
    #[structopt(long = "calls-from")]
    calls_from: Vec<String>,

    /// Add a target function for the CallGraphTo check.
    /// Can be given multiple times.
    #[structopt(long = "calls-to")]
    calls_to: Vec<String>,

    /// Generate JSON output.
    #[structopt(long, short)]
    json: bool,

    /// Do not print log messages. This prevents polluting stdout for json output.
    #[structopt(long, short)]
    quiet: bool,

    /// Prints out the version numbers of all known modules.
    #[structopt(long)]
    module_versions: bool,

    /// Print the control flow graphs of all functions in the unit and exit.
    #[structopt(long)]
    debug: bool,
}

fn main() {
    let cmdline_args = CmdlineArgs::from_args();

    run_checks(cmdline_args);
}

/// Check the existence of a file
fn check_file_existence(file_path: String) -> Result<(), String> {
    if std::fs::metadata(&file_path)
        .map_err(|err| format!("{}", err))?
        .is_file()
    {
        Ok(())
    } else {
        Err(format!("{} is not a file.", file_path))
    }
}

/// Run the cpp_checker on the given source file.
fn run_checks(args: CmdlineArgs) {
    let mut modules = cpp_checker_lib::get_modules();
    if args.module_versions {
        // Only print the module versions and then quit.
        println!("[cpp_checker] module_versions:");
        for module in modules.iter() {
            println!("{}", module);
        }
        return;
    }

    // Get the configuration file.
    let mut config: serde_json::Value = if let Some(config_path) = args.config {
        let file = std::io::BufReader::new(std::fs::File::open(config_path).unwrap());
        serde_json::from_reader(file).expect("Parsing of the configuration file failed")
    } else {
        read_config_file("config.json").expect(
            "Could not read the standard configuration file. Is the cpp_checker installed correctly?",
        )
    };
    // Query roots given on the command line extend the configured ones.
    append_query_roots(&mut config, "CallGraphFrom", "sources", &args.calls_from);
    append_query_roots(&mut config, "CallGraphTo", "targets", &args.calls_to);

    // Filter the modules to be executed if the `--partial` parameter is set.
    if let Some(ref partial_module_list) = args.partial {
        filter_modules_for_partial_run(&mut modules, partial_module_list);
    }

    let source_path = args.source.unwrap();
    let source = std::fs::read_to_string(&source_path)
        .unwrap_or_else(|_| panic!("Error: Could not read from file path {}", source_path));

    // Parse the translation unit and gather the per-function parse diagnostics.
    let (unit, mut all_logs) = frontend::parse_translation_unit(&source);
    // Generate the control flow graphs of all functions in the unit.
    let control_flow_graphs = cpp_checker_lib::compute_control_flow_graphs(&unit);

    let analysis_results = AnalysisResults::new(&unit, &control_flow_graphs);

    let modules_depending_on_call_graph = ["CallGraphFrom", "CallGraphTo"];
    let call_graph = if modules
        .iter()
        .any(|module| modules_depending_on_call_graph.contains(&module.name))
    {
        Some(analysis_results.compute_call_graph())
    } else {
        None
    };
    let analysis_results = analysis_results.with_call_graph(call_graph.as_ref());

    // Print the control flow graphs and then return.
    if args.debug {
        for (name, cfg) in control_flow_graphs.iter() {
            println!("CFG of function `{}`:", name);
            println!("{}", cfg);
        }
        return;
    }

    // Execute the modules and collect their logs and findings.
    let mut all_findings = Vec::new();
    for module in modules {
        let (mut logs, mut findings) = (module.run)(&analysis_results, &config[&module.name]);
        all_logs.append(&mut logs);
        all_findings.append(&mut findings);
    }

    // Print the results of the modules.
    if args.quiet {
        all_logs = Vec::new(); // Suppress all log messages since the `--quiet` flag is set.
    }
    print_all_messages(all_logs, all_findings, args.out.as_deref(), args.json);
}

/// Append the query roots given on the command line
/// to the configured root list of the given check module.
fn append_query_roots(
    config: &mut serde_json::Value,
    module_name: &str,
    field: &str,
    roots: &[String],
) {
    if roots.is_empty() {
        return;
    }
    let configured_roots = &mut config[module_name][field];
    if configured_roots.is_null() {
        *configured_roots = serde_json::json!([]);
    }
    let configured_roots = configured_roots
        .as_array_mut()
        .expect("Malformed configuration file");
    for root in roots {
        configured_roots.push(serde_json::json!(root));
    }
}

/// Only keep the modules specified by the `--partial` parameter in the `modules` list.
/// The parameter is a comma-separated list of module names, e.g. 'NullDereference,CallGraphTo'.
fn filter_modules_for_partial_run(
    modules: &mut Vec<&cpp_checker_lib::CheckModule>,
    partial_param: &str,
) {
    let module_names: HashSet<&str> = partial_param.split(',').collect();
    *modules = module_names
        .into_iter()
        .filter_map(|module_name| {
            if let Some(module) = modules.iter().find(|module| module.name == module_name) {
                Some(*module)
            } else if module_name.is_empty() {
                None
            } else {
                panic!("Error: {} is not a valid module name.", module_name)
            }
        })
        .collect();
}
