//! Data handler processing
//!
//! - [`lexer`] tokenizes JavaScript just enough to skip comments and literals
//! - [`analyzer`] finds and classifies `require` calls
//! - [`bundler`] turns a handler into its packaged bundle

pub mod analyzer;
pub mod bundler;
pub mod lexer;

pub use analyzer::{DependencyKind, DependencyReference, ImportSpecifier};
pub use bundler::{BundlePolicy, DataBundle, bundle};
