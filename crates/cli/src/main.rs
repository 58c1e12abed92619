use abstraction_tracker::commands::{
    add_contract_command, call_path_command, check_command, graph_command, index_command,
    init_project_command, list_contracts_command, project_info_command, remove_contract_command,
    show_contract_command, show_function_command, AddContractArgs,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding `--log-level` with a full filter directive.
const LOG_ENV: &str = "ABSTRACTION_LOG";

/// Call-graph abstraction levels, drift detection and function contracts.
///
/// This CLI is a thin wrapper around `abstraction-core`. All substantive logic
/// lives in the library so it can be tested thoroughly and reused from other
/// frontends.
#[derive(Parser, Debug)]
#[command(
    name = "abstraction-tracker",
    version,
    about = "Track function abstraction levels and code drift",
    long_about = None
)]
struct Cli {
    /// Log level or filter directive (e.g. `info`, `abstraction_core=debug`).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new project at the given root.
    ///
    /// This will:
    /// - Create a `.abstraction` metadata directory and a `reports` directory.
    /// - Write a `.abstraction/project.json` config file.
    /// - Create the project database.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Default source directory to index, relative to the root.
        #[arg(long)]
        source: Option<String>,
    },

    /// Show information about an existing project.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Parse the source tree, build the call graph and record a new baseline.
    Index {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Source directory (overrides the configured one).
        #[arg(long)]
        source: Option<String>,
    },

    /// Show call graph statistics, entry points and a call tree.
    Graph {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Function to draw the call tree from. Defaults to the first entry point.
        #[arg(long)]
        entry: Option<String>,

        /// Maximum depth of the call tree.
        #[arg(long, default_value_t = 10)]
        max_depth: usize,

        /// Print the stored graph as JSON instead.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the graph in Graphviz DOT format to this path.
        #[arg(long)]
        dot: Option<String>,
    },

    /// Show where a function sits in the call graph.
    ShowFunction {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Function name.
        name: String,

        /// Restrict the lookup to this file (path relative to the root).
        #[arg(long)]
        file: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the shortest call path between two functions.
    CallPath {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Calling function name.
        #[arg(long)]
        from: String,

        /// Called function name.
        #[arg(long)]
        to: String,
    },

    /// Detect changes since the last recorded baseline.
    Check {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Source directory (overrides the configured one).
        #[arg(long)]
        source: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Replace the baseline (and call graph) with the current state.
        #[arg(long, default_value_t = false)]
        update_baseline: bool,

        /// Write the report to `reports/change_report_<timestamp>.json`.
        #[arg(long, default_value_t = false)]
        write_report: bool,
    },

    /// Create or update a function contract.
    AddContract {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Function name (may come from --from-spec instead).
        #[arg(long)]
        name: Option<String>,

        /// File containing the function, relative to the root (may come from --from-spec).
        #[arg(long)]
        file: Option<String>,

        /// Definition line. Defaults to the indexed line.
        #[arg(long)]
        line: Option<u32>,

        /// Precondition (repeatable).
        #[arg(long = "pre")]
        pre: Vec<String>,

        /// Postcondition (repeatable).
        #[arg(long = "post")]
        post: Vec<String>,

        /// Predicted inputs.
        #[arg(long)]
        input: Option<String>,

        /// Predicted outputs.
        #[arg(long)]
        output: Option<String>,

        /// Expected behavior in prose.
        #[arg(long)]
        behavior: Option<String>,

        /// Abstraction level: entry_point, high, medium, low or system.
        #[arg(long)]
        level: Option<String>,

        /// Load contract fields from a YAML or JSON file.
        #[arg(long)]
        from_spec: Option<String>,
    },

    /// Show one contract.
    ShowContract {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        file: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List all contracts.
    ListContracts {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete a contract.
    RemoveContract {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        file: String,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::InitProject { root, name, source } => init_project_command(&root, name, source)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::Index { root, source } => index_command(&root, source)?,
        Command::Graph { root, entry, max_depth, json, dot } => {
            graph_command(&root, entry, max_depth, json, dot)?
        }
        Command::ShowFunction { root, name, file, json } => {
            show_function_command(&root, &name, file, json)?
        }
        Command::CallPath { root, from, to } => call_path_command(&root, &from, &to)?,
        Command::Check { root, source, json, update_baseline, write_report } => {
            check_command(&root, source, json, update_baseline, write_report)?
        }
        Command::AddContract {
            root,
            name,
            file,
            line,
            pre,
            post,
            input,
            output,
            behavior,
            level,
            from_spec,
        } => add_contract_command(
            &root,
            AddContractArgs {
                name,
                file,
                line,
                pre,
                post,
                input,
                output,
                behavior,
                level,
                from_spec,
            },
        )?,
        Command::ShowContract { root, name, file, json } => {
            show_contract_command(&root, &name, &file, json)?
        }
        Command::ListContracts { root, json } => list_contracts_command(&root, json)?,
        Command::RemoveContract { root, name, file } => {
            remove_contract_command(&root, &name, &file)?
        }
    }

    Ok(())
}
