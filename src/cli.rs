//! Command-line interface for dsmcheck.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::arguments::ArgumentSpec;
use crate::config::{self, Config};
use crate::registry::PluginRegistry;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Architecture quality gate - check design principles against a Design
/// Structure Matrix.
///
/// dsmcheck reads a DSM (a square matrix of dependency weights between named
/// entities) and evaluates it against classical design principles: layering,
/// complete mediation, separation and least privileges, economy of mechanism,
/// least common mechanism and absence of cycles.
#[derive(Parser)]
#[command(name = "dsmcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level or filter directive (default: RUST_LOG, else "error")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Do not use colors
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured analyzers and report the results
    Check(CheckArgs),
    /// List the available checkers and providers
    List,
    /// Create a new configuration file from a template
    Init(InitArgs),
}

/// Output formats of the check command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Tap,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Configuration file to use (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSV input for the default configuration (default: standard input)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Do not load configuration from file, use the default configuration
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "dsmcheck.yml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available configuration templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

/// All available templates.
static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Conventional checks for a layered application",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "layered",
        description: "Layer order and dependency cycles only",
        content: include_str!("templates/layered.yaml"),
    },
    Template {
        name: "access-control",
        description: "Privilege checks on an access-control matrix",
        content: include_str!("templates/access-control.yaml"),
    },
    Template {
        name: "full",
        description: "Every bundled checker with its default arguments",
        content: include_str!("templates/full.yaml"),
    },
];

/// Install the tracing subscriber writing to stderr.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

/// Apply the color preference of the command line.
pub fn init_colors(no_color: bool) {
    if no_color {
        colored::control::set_override(false);
    }
}

/// Resolve the configuration to run, with a label for reports and the
/// directory relative paths resolve against.
fn load_config(args: &CheckArgs) -> anyhow::Result<(Config, String, PathBuf)> {
    let default = |reason: &str| {
        tracing::info!("{}, using the default configuration", reason);
        (
            Config::default_for_input(args.input.as_deref()),
            "(default)".to_string(),
            PathBuf::new(),
        )
    };

    if args.no_config {
        return Ok(default("--no-config given"));
    }

    let path = match &args.config {
        Some(path) => path.clone(),
        None => match config::discover() {
            Some(path) => path,
            None => return Ok(default("no configuration file found")),
        },
    };

    tracing::info!("loading configuration from {}", path.display());
    if args.input.is_some() {
        tracing::warn!("--input is ignored when a configuration file is used");
    }
    let config = Config::parse_file(&path)?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((config, path.display().to_string(), base_dir))
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    let registry = PluginRegistry::with_builtins();

    let (config, config_label, base_dir) = match load_config(args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let analysis = match config::build(&config, &registry, &base_dir) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    tracing::info!("running {} analyzers", analysis.analyzers().len());
    let result = analysis.run();

    match args.format {
        OutputFormat::Json => report::write_json(&result)?,
        OutputFormat::Tap => report::write_tap(&result)?,
        OutputFormat::Pretty => report::write_pretty(&result, &config_label),
    }

    if result.passed() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the list command.
pub fn run_list() -> anyhow::Result<i32> {
    let registry = PluginRegistry::with_builtins();

    println!("Providers:");
    println!();
    for provider in registry.providers()? {
        print_plugin(
            provider.identifier(),
            provider.name(),
            provider.description(),
            provider.arguments(),
        );
    }

    println!("Checkers:");
    println!();
    for checker in registry.checkers()? {
        print_plugin(
            checker.identifier(),
            checker.name(),
            checker.description(),
            checker.arguments(),
        );
    }

    Ok(EXIT_SUCCESS)
}

fn print_plugin(identifier: &str, name: &str, description: &str, arguments: &[ArgumentSpec]) {
    println!("  {} ({})", identifier, name);
    println!("    {}", description);
    if !arguments.is_empty() {
        println!("    Arguments:");
        for arg in arguments {
            println!(
                "      {:<24} {:<20} default: {}",
                arg.name,
                arg.kind.as_str(),
                arg.default
            );
            println!("      {:<24} {}", "", arg.description);
        }
    }
    println!();
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // List mode
    if args.list {
        return list_templates();
    }

    // Find template
    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'dsmcheck init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Point file_path at your matrix in {}", args.output.display());
    println!("  2. Run: dsmcheck check --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "default" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  dsmcheck init --template <name>");

    Ok(EXIT_SUCCESS)
}
