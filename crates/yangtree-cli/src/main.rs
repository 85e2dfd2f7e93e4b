//! yangtree CLI
//!
//! Command-line interface for the yangtree statement tree engine

mod commands;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing::error;
use yangtree_core::init_tracing;

#[derive(Parser)]
#[command(name = "yangtree")]
#[command(about = "yangtree: build and check statement trees of YANG-like schema modules")]
#[command(version = yangtree_core::VERSION)]
#[command(
    long_about = "yangtree builds typed statement trees from module documents (JSON or YAML),\n\
enforces child cardinalities, validates extension statements and resolves\n\
identities and features across all modules of a schema.\n\
\n\
Examples:\n  \
yangtree check models/                      # Build every document under models/\n  \
yangtree check --format json a.yaml b.yaml  # Machine-readable findings\n  \
yangtree tree --supported-features m:F1 --prune m.yaml\n  \
yangtree config init                        # Initialize configuration file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.yangtreerc.json/.yangtreerc.toml/yangtree.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all documents into one schema and report findings
    #[command(alias = "lint")]
    Check {
        /// Documents or directories to check
        #[arg(help = "Module documents or directories (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(
            short,
            long,
            default_value = "human",
            help = "Output format for findings"
        )]
        format: OutputFormat,

        /// Minimum severity level to report
        #[arg(
            long,
            default_value = "warning",
            help = "Minimum severity level to report"
        )]
        min_severity: Severity,

        #[command(flatten)]
        features: FeatureArgs,

        /// Stop at the first finding of this severity or worse
        #[arg(long, help = "Abort the build on the first finding at this severity")]
        fail_fast: Option<Severity>,
    },

    /// Print the built statement trees with their effective attributes
    Tree {
        /// Documents or directories to build
        #[arg(help = "Module documents or directories (default: current directory)")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        features: FeatureArgs,

        /// Only print the tree of this module
        #[arg(short, long, help = "Only print the named module")]
        module: Option<String>,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

/// Feature selection shared by `check` and `tree`
#[derive(clap::Args, Clone, Debug, Default)]
pub struct FeatureArgs {
    /// Features to support, as `module:feature`
    #[arg(
        long,
        value_delimiter = ',',
        help = "Supported features (module:feature, comma separated)"
    )]
    supported_features: Option<Vec<String>>,

    /// Remove statements whose if-feature condition is not satisfied
    #[arg(long, help = "Remove statements not satisfying their if-feature")]
    prune: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "json", help = "Configuration file format")]
        format: ConfigFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Severity {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warning,
    /// Show hints, warnings and errors
    Hint,
    /// Show all findings
    Info,
}

impl Severity {
    fn to_core(self) -> yangtree_core::Severity {
        match self {
            Severity::Error => yangtree_core::Severity::Error,
            Severity::Warning => yangtree_core::Severity::Warning,
            Severity::Hint => yangtree_core::Severity::Hint,
            Severity::Info => yangtree_core::Severity::Info,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// TOML configuration format
    Toml,
    /// YAML configuration format
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return Ok(());
    }

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "yangtree=error",
        1 => "yangtree=warn",
        2 => "yangtree=info",
        3 => "yangtree=debug",
        _ => "yangtree=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        std::process::exit(1);
    }

    match run_command(cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("yangtree failed: {}", e);
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn default_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    }
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Check {
            paths,
            format,
            min_severity,
            features,
            fail_fast,
        }) => {
            let clean = commands::check::check_command(
                default_paths(paths),
                format,
                min_severity.to_core(),
                features,
                fail_fast.map(Severity::to_core),
                cli.config,
            )?;
            if !clean {
                std::process::exit(1);
            }
            Ok(())
        }

        Some(Commands::Tree {
            paths,
            features,
            module,
        }) => commands::tree::tree_command(default_paths(paths), features, module, cli.config),

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => commands::config::init_command(format, force),
            ConfigAction::Show => commands::config::show_command(cli.config),
            ConfigAction::Schema => commands::config::schema_command(),
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("yangtree {}", yangtree_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!("  Finding codes: {}", yangtree_core::FindingKind::ALL.len());
            } else {
                println!("{}", yangtree_core::VERSION);
            }
            Ok(())
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
