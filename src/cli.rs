//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ocpack - component packager
///
/// Package registry components into deterministic, content-addressed artifacts.
#[derive(Parser, Debug)]
#[command(
    name = "ocpack",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Packager for registry-distributed UI components",
    long_about = "ocpack validates a component directory, compiles its template into a \
                  content-addressed renderer, bundles its data handler with local JSON \
                  inlined, and writes the packaged artifact in one atomic step.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  ocpack package ./hello-world\n    \
                  ocpack package-all ./components --jobs 4\n    \
                  ocpack list ./components --all"
)]
pub struct Cli {
    /// Settings file (defaults to ./ocpack.yaml when present)
    #[arg(long, short = 'c', global = true, env = "OCPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Package one component directory
    Package(PackageArgs),

    /// Package every unpackaged component under a directory
    PackageAll(PackageAllArgs),

    /// List component directories
    List(ListArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by the packaging commands
#[derive(Args, Debug, Clone, Default)]
pub struct BuildOptions {
    /// Write unminified output
    #[arg(long)]
    pub no_minify: bool,

    /// Output directory name inside each component
    #[arg(long, value_name = "NAME")]
    pub output_dir: Option<String>,
}

/// Arguments for the package command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Package a component:\n    ocpack package ./hello-world\n\n\
                  Stamp an explicit version:\n    ocpack package ./hello-world --set-version 1.2.0\n\n\
                  Keep output readable:\n    ocpack package ./hello-world --no-minify")]
pub struct PackageArgs {
    /// Component directory
    pub dir: PathBuf,

    /// Version to stamp instead of the configured source
    #[arg(long, value_name = "VERSION")]
    pub set_version: Option<String>,

    #[command(flatten)]
    pub build: BuildOptions,
}

/// Arguments for the package-all command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Package everything under ./components:\n    ocpack package-all ./components\n\n\
                  Limit parallelism:\n    ocpack package-all ./components --jobs 2")]
pub struct PackageAllArgs {
    /// Directory whose children are components
    pub parent: PathBuf,

    /// Number of components packaged in parallel
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub build: BuildOptions,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List components waiting to be packaged:\n    ocpack list .\n\n\
                  List packaged components:\n    ocpack list ./components --packaged\n\n\
                  List every component:\n    ocpack list ./components --all")]
pub struct ListArgs {
    /// Directory whose children are scanned
    #[arg(default_value = ".")]
    pub parent: PathBuf,

    /// Only packaged components
    #[arg(long, conflicts_with = "all")]
    pub packaged: bool,

    /// Packaged and unpackaged components
    #[arg(long)]
    pub all: bool,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    ocpack completions --shell bash > ~/.bash_completion.d/ocpack\n\n\
                  Generate zsh completions:\n    ocpack completions --shell zsh > ~/.zfunc/_ocpack\n\n\
                  Generate fish completions:\n    ocpack completions --shell fish > ~/.config/fish/completions/ocpack.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long, value_name = "SHELL")]
    pub shell: String,
}
