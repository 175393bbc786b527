//! Package-all command implementation
//!
//! Discovers unpackaged components under a directory and packages them in
//! parallel. Every component is attempted; the command fails if any did.

use std::path::Path;

use console::Style;
use ocpack::error::{OcpackError, Result};
use ocpack::scanner::{self, PackagedState};

use crate::cli::PackageAllArgs;
use crate::progress::ProgressDisplay;

/// Run package-all command
pub fn run(config: Option<&Path>, args: PackageAllArgs) -> Result<()> {
    let mut settings = super::load_settings(config, &args.build)?;
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs;
        settings.validate()?;
    }
    let jobs = settings.jobs;
    let packager = super::packager(settings)?;

    let dirs = scanner::discover(&args.parent, PackagedState::Unpackaged);
    if dirs.is_empty() {
        println!("No unpackaged components in {}.", args.parent.display());
        return Ok(());
    }

    let progress = ProgressDisplay::new(dirs.len() as u64);
    let results = packager.package_all_with(&dirs, jobs, |dir, _| {
        progress.component_done(&dir.display().to_string());
    })?;
    progress.finish();

    let ok = Style::new().green().bold();
    let failed_style = Style::new().red().bold();
    let mut failed = 0;
    for (dir, result) in dirs.iter().zip(&results) {
        match result {
            Ok(artifact) => println!(
                "{} {} ({})",
                ok.apply_to("✓"),
                dir.display(),
                artifact.manifest.oc.version.as_deref().unwrap_or("-")
            ),
            Err(e) => {
                failed += 1;
                println!("{} {}: {e}", failed_style.apply_to("✗"), dir.display());
            }
        }
    }

    if failed > 0 {
        return Err(OcpackError::PackagingFailed {
            failed,
            total: dirs.len(),
        });
    }
    Ok(())
}
