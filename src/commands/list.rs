//! List command implementation
//!
//! Prints one component directory per line, in the form the scanner
//! returns it, so the output can be piped into other tools.

use console::Style;
use ocpack::config::ManifestState;
use ocpack::error::Result;
use ocpack::scanner::{self, PackagedState};

use crate::cli::ListArgs;

/// Run list command
pub fn run(args: ListArgs) -> Result<()> {
    let state = if args.all {
        PackagedState::Any
    } else if args.packaged {
        PackagedState::Packaged
    } else {
        PackagedState::Unpackaged
    };

    let dirs = scanner::discover(&args.parent, state);
    if dirs.is_empty() {
        eprintln!("No components found in {}.", args.parent.display());
        return Ok(());
    }

    let dim = Style::new().dim();
    for dir in &dirs {
        if state == PackagedState::Any {
            let packaged = ManifestState::read(dir).is_some_and(|m| m.is_packaged());
            let label = if packaged { "packaged" } else { "unpackaged" };
            println!("{} {}", dir.display(), dim.apply_to(format!("[{label}]")));
        } else {
            println!("{}", dir.display());
        }
    }

    Ok(())
}
