use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ffi_audit::commands::{
    analyze_command, info_command, init_command, runs_command, show_run_command, table_command,
    AnalyzeArgs,
};

/// Soundness audit of native functions called across a JNI boundary.
///
/// This CLI is a thin wrapper around `ffi-audit-core`. All substantive logic
/// lives in the library so it can be tested thoroughly and reused.
#[derive(Parser, Debug)]
#[command(
    name = "ffi-audit",
    version,
    about = "Audit JNI entry points for purity, pointer arithmetic, casts and dynamic memory",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize an audit workspace at the given root.
    ///
    /// Creates `.ffi-audit/config.json`, the run-history database and the
    /// logs directory.
    Init {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show configuration and paths of an existing workspace.
    Info {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Audit every boundary entry of an IR dump (JSON or YAML).
    Analyze {
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the IR dump. Relative paths are looked up under the root first.
        #[arg(long)]
        program: String,

        /// `all`, `purity`, `pointer-arithmetic`, `type-casts` or `dynamic-memory`.
        #[arg(long)]
        analysis: Option<String>,

        /// `assume-clean` or `assume-violation`. Defaults to the workspace config.
        #[arg(long)]
        cycle_policy: Option<String>,

        /// Name prefix of boundary entries. Defaults to the workspace config.
        #[arg(long)]
        entry_prefix: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// Do not append to the text logs.
        #[arg(long, default_value_t = false)]
        no_log: bool,
    },

    /// List recorded audit runs.
    Runs {
        #[arg(long, default_value = ".")]
        root: String,

        /// Only runs of this IR dump path.
        #[arg(long)]
        program: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show one recorded run with its verdicts, findings and diagnostics.
    ShowRun {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        id: i64,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the memory-management operations known to the dynamic-memory analysis.
    Table {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Init { root, name } => init_command(&root, name)?,
        Command::Info { root, json } => info_command(&root, json)?,
        Command::Analyze { root, program, analysis, cycle_policy, entry_prefix, json, no_log } => {
            let args =
                AnalyzeArgs { root, program, analysis, cycle_policy, entry_prefix, json, no_log };
            analyze_command(&args)?
        }
        Command::Runs { root, program, json } => runs_command(&root, program.as_deref(), json)?,
        Command::ShowRun { root, id, json } => show_run_command(&root, id, json)?,
        Command::Table { json } => table_command(json)?,
    }

    Ok(())
}
