//! ocpack - component packager
//!
//! Command line entry point. All packaging logic lives in the library.

use clap::Parser;

mod cli;
mod commands;
mod progress;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    ocpack::logging::init(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Package(args) => commands::package::run(config, args),
        Commands::PackageAll(args) => commands::package_all::run(config, args),
        Commands::List(args) => commands::list::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
