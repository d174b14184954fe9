//! dsmcheck CLI entry point.

use clap::Parser;
use dsmcheck::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    cli::init_logging(cli.log_level.as_deref());
    cli::init_colors(cli.no_color);

    let result = match &cli.command {
        Commands::Check(args) => cli::run_check(args),
        Commands::List => cli::run_list(),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
