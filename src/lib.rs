//! ocpack - packager for registry-distributed UI components
//!
//! A component is a directory with a `package.json` manifest, a template
//! and an optional server-side data handler. Packaging validates the
//! manifest, compiles the template into a content-addressed renderer,
//! bundles the data handler with its local JSON inlined, and commits the
//! result to `<component>/_package/` in one step.
//!
//! ```no_run
//! use std::path::Path;
//! use ocpack::packager::Packager;
//! use ocpack::template::EngineRegistry;
//!
//! let packager = Packager::new(EngineRegistry::with_defaults());
//! let artifact = packager.package(Path::new("./hello-world"))?;
//! println!("{}", artifact.template_key);
//! # Ok::<(), ocpack::error::OcpackError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod hash;
pub mod logging;
pub mod minify;
pub mod packager;
pub mod path_utils;
pub mod scanner;
pub mod script;
pub mod template;
pub mod transaction;

pub use error::{OcpackError, Result};
