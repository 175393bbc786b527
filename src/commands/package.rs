//! Package command implementation

use std::path::Path;

use console::Style;
use ocpack::error::Result;
use ocpack::packager::version::FixedVersion;

use crate::cli::PackageArgs;

/// Run package command
pub fn run(config: Option<&Path>, args: PackageArgs) -> Result<()> {
    let settings = super::load_settings(config, &args.build)?;
    let mut packager = super::packager(settings)?;
    if let Some(version) = args.set_version {
        packager = packager.with_version_source(FixedVersion(version));
    }

    let artifact = packager.package(&args.dir)?;

    let version = artifact.manifest.oc.version.as_deref().unwrap_or("-");
    println!(
        "{} {} {} -> {}",
        Style::new().green().bold().apply_to("Packaged"),
        artifact.manifest.name,
        Style::new().dim().apply_to(version),
        artifact.output_dir.display()
    );
    println!("  template key: {}", artifact.template_key);
    if let Some(key) = &artifact.data_provider_key {
        println!("  data provider key: {key}");
    }

    Ok(())
}
