//! Version command implementation

use ocpack::error::Result;
use ocpack::template::EngineRegistry;

/// Run version command
pub fn run() -> Result<()> {
    println!("ocpack {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Template engines:");
    let engines = EngineRegistry::with_defaults();
    for tag in engines.types() {
        if let Some(engine) = engines.get(tag) {
            println!("  {tag} {}", engine.version());
        }
    }
    println!();
    println!("Build info:");
    println!("  Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("  Profile: {}", build_profile());

    Ok(())
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
