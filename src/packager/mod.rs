//! Component packaging
//!
//! [`Packager::package`] runs the whole pipeline for one component:
//!
//! 1. Validate the manifest and resolve source paths
//! 2. Compile the template with the engine registered for its type
//! 3. Bundle the data handler, if one is declared
//! 4. Minify both outputs
//! 5. Stamp the version and mark the manifest as packaged
//! 6. Write everything through one [`Transaction`]
//!
//! Every step before the last is a pure transformation of values, so any
//! failure leaves the filesystem exactly as it was.

pub mod validate;
pub mod version;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::manifest::MANIFEST_FILE;
use crate::config::{ComponentManifest, PackagedFile, PackagerSettings};
use crate::error::{OcpackError, Result};
use crate::hash;
use crate::minify::{self, Minifier, OxcMinifier, PassthroughMinifier};
use crate::script::{self, BundlePolicy, DataBundle};
use crate::template::{self, EngineRegistry, TemplateArtifact};
use crate::transaction::Transaction;

pub use validate::{ValidatedComponent, validate};
pub use version::VersionSource;

/// Packaged template file name
pub const TEMPLATE_FILE: &str = "template.js";

/// Packaged data handler file name
pub const SERVER_FILE: &str = "server.js";

/// `type` recorded for the packaged data handler
pub const DATA_PROVIDER_TYPE: &str = "node.js";

/// Result of packaging one component
#[derive(Debug, Clone)]
pub struct PackagedArtifact {
    /// Directory holding the packaged files
    pub output_dir: PathBuf,
    /// Manifest as written to the output directory
    pub manifest: ComponentManifest,
    pub template_key: String,
    pub data_provider_key: Option<String>,
}

/// Packages component directories
///
/// A `Packager` holds no per-run state and can be shared across threads.
pub struct Packager {
    engines: EngineRegistry,
    minifier: Box<dyn Minifier>,
    version_source: Box<dyn VersionSource>,
    settings: PackagerSettings,
}

impl Packager {
    /// Create a packager with default settings
    pub fn new(engines: EngineRegistry) -> Self {
        Self::from_settings(engines, PackagerSettings::default(), Path::new("."))
    }

    /// Create a packager from settings
    ///
    /// `base_dir` anchors relative paths found in the settings.
    pub fn from_settings(engines: EngineRegistry, settings: PackagerSettings, base_dir: &Path) -> Self {
        let minifier: Box<dyn Minifier> = if settings.minify {
            Box::new(OxcMinifier)
        } else {
            Box::new(PassthroughMinifier)
        };

        Self {
            engines,
            minifier,
            version_source: version::from_setting(&settings.version, base_dir),
            settings,
        }
    }

    /// Replace the minifier
    #[must_use]
    pub fn with_minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.minifier = Box::new(minifier);
        self
    }

    /// Replace the version source
    #[must_use]
    pub fn with_version_source(mut self, source: impl VersionSource + 'static) -> Self {
        self.version_source = Box::new(source);
        self
    }

    pub fn settings(&self) -> &PackagerSettings {
        &self.settings
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    /// Package one component directory
    pub fn package(&self, component_dir: &Path) -> Result<PackagedArtifact> {
        let span = tracing::debug_span!("package", component = %component_dir.display());
        let _enter = span.enter();

        let component = validate(component_dir, &self.engines)?;

        let template =
            template::compile_template(&self.engines, &component.template_type, &component.template_path)?;

        let bundle = component
            .data_path
            .as_deref()
            .map(|path| self.bundle_data(&component, path))
            .transpose()?;

        let template_js =
            minify::minify_target(self.minifier.as_ref(), TEMPLATE_FILE, &template.registration_script())?;
        let server_js = bundle
            .map(|bundle| minify::minify_target(self.minifier.as_ref(), SERVER_FILE, &bundle.source))
            .transpose()?;

        let version = version::resolve(self.version_source.as_ref(), &component.manifest)?;
        let manifest = packaged_manifest(component.manifest, &template, server_js.as_deref(), &version);
        let manifest_json = manifest.to_json()?;

        let transaction = Transaction::begin(&component.dir, &self.settings.output_dir)?;
        transaction.write_file(TEMPLATE_FILE, &template_js)?;
        if let Some(server_js) = &server_js {
            transaction.write_file(SERVER_FILE, server_js)?;
        }
        transaction.write_file(MANIFEST_FILE, &manifest_json)?;
        let output_dir = transaction.commit()?;

        tracing::info!(
            component = %manifest.name,
            %version,
            key = %template.key,
            output = %output_dir.display(),
            "packaged component"
        );

        Ok(PackagedArtifact {
            output_dir,
            data_provider_key: manifest
                .oc
                .files
                .data_provider
                .as_ref()
                .map(|provider| provider.hash_key.clone()),
            template_key: template.key,
            manifest,
        })
    }

    /// Package several components on a pool of `jobs` threads
    ///
    /// Results come back in the order of `dirs`. One component failing does
    /// not stop the others.
    pub fn package_all(&self, dirs: &[PathBuf], jobs: usize) -> Result<Vec<Result<PackagedArtifact>>> {
        self.package_all_with(dirs, jobs, |_, _| {})
    }

    /// Like [`Packager::package_all`], calling `on_done` as each component finishes
    pub fn package_all_with<F>(
        &self,
        dirs: &[PathBuf],
        jobs: usize,
        on_done: F,
    ) -> Result<Vec<Result<PackagedArtifact>>>
    where
        F: Fn(&Path, &Result<PackagedArtifact>) + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| OcpackError::ConfigInvalid {
                message: format!("cannot start {jobs} packaging threads: {e}"),
            })?;

        tracing::debug!(components = dirs.len(), jobs, "packaging in parallel");
        Ok(pool.install(|| {
            dirs.par_iter()
                .map(|dir| {
                    let result = self.package(dir);
                    on_done(dir, &result);
                    result
                })
                .collect()
        }))
    }

    fn bundle_data(&self, component: &ValidatedComponent, data_path: &Path) -> Result<DataBundle> {
        let source = std::fs::read_to_string(data_path).map_err(|e| OcpackError::FileReadFailed {
            path: data_path.display().to_string(),
            reason: e.to_string(),
        })?;
        let base_dir = data_path.parent().unwrap_or(&component.dir);
        let policy = BundlePolicy {
            component_dir: &component.dir,
            dependencies: &component.manifest.dependencies,
            allowed_modules: &self.settings.allowed_modules,
        };
        script::bundle(&source, base_dir, &policy)
    }
}

/// Rewrite a source manifest into its packaged form
fn packaged_manifest(
    mut manifest: ComponentManifest,
    template: &TemplateArtifact,
    server_js: Option<&str>,
    version: &semver::Version,
) -> ComponentManifest {
    let files = &mut manifest.oc.files;
    files.template.src = TEMPLATE_FILE.to_string();
    files.template.hash_key = Some(template.key.clone());
    files.data = None;
    files.data_provider = server_js.map(|code| PackagedFile {
        file_type: DATA_PROVIDER_TYPE.to_string(),
        src: SERVER_FILE.to_string(),
        hash_key: hash::content_key(code),
    });

    manifest.oc.version = Some(version.to_string());
    manifest.oc.packaged = true;
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::version::FixedVersion;
    use tempfile::TempDir;

    fn write_component(dir: &Path, data: bool) {
        let data_field = if data { r#","data":"server.js""# } else { "" };
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join(MANIFEST_FILE),
            format!(
                r#"{{"name":"hello","version":"1.0.0","dependencies":{{"underscore":"1.8.3"}},"oc":{{"files":{{"template":{{"type":"mustache","src":"template.html"}}{data_field}}}}},"custom":{{"keep":true}}}}"#
            ),
        )
        .unwrap();
        std::fs::write(dir.join("template.html"), "<p>Hello {{name}}</p>\n").unwrap();
        std::fs::write(
            dir.join("server.js"),
            "var data = require('./someJson');\nvar _ = require('underscore');\nmodule.exports.data = function(context, cb) { return cb(null, data); };\n",
        )
        .unwrap();
        std::fs::write(dir.join("someJson.json"), r#"{"name":"world"}"#).unwrap();
    }

    #[test]
    fn test_package_writes_artifact() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), true);

        let packager = Packager::new(EngineRegistry::with_defaults());
        let artifact = packager.package(temp.path()).unwrap();

        assert_eq!(artifact.output_dir, temp.path().join("_package"));
        assert!(hash::is_content_key(&artifact.template_key));
        assert!(artifact.data_provider_key.is_some());

        let template_js = std::fs::read_to_string(artifact.output_dir.join(TEMPLATE_FILE)).unwrap();
        assert!(template_js.contains(&format!("oc.components[\"{}\"]=", artifact.template_key)));
        assert!(!template_js.contains('\n'));

        let server_js = std::fs::read_to_string(artifact.output_dir.join(SERVER_FILE)).unwrap();
        assert!(server_js.contains("__ocInlined"));
        assert!(server_js.contains(r#""world""#));
        assert_eq!(
            artifact.data_provider_key.as_deref(),
            Some(hash::content_key(&server_js).as_str())
        );
    }

    #[test]
    fn test_package_manifest_is_stamped() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), true);

        let packager = Packager::new(EngineRegistry::with_defaults())
            .with_version_source(FixedVersion("2.3.4".to_string()));
        let artifact = packager.package(temp.path()).unwrap();

        let written = ComponentManifest::load(&artifact.output_dir).unwrap();
        assert!(written.oc.packaged);
        assert_eq!(written.oc.version.as_deref(), Some("2.3.4"));
        assert_eq!(written.oc.files.template.src, TEMPLATE_FILE);
        assert_eq!(written.oc.files.template.hash_key.as_deref(), Some(artifact.template_key.as_str()));
        assert!(written.oc.files.data.is_none());
        let provider = written.oc.files.data_provider.unwrap();
        assert_eq!(provider.file_type, "node.js");
        assert_eq!(provider.src, SERVER_FILE);
        assert_eq!(written.extra["custom"]["keep"], serde_json::Value::Bool(true));

        // The source manifest is left alone
        let source = ComponentManifest::load(temp.path()).unwrap();
        assert!(!source.oc.packaged);
        assert!(source.oc.version.is_none());
    }

    #[test]
    fn test_package_without_data_handler() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), false);

        let artifact = Packager::new(EngineRegistry::with_defaults())
            .package(temp.path())
            .unwrap();
        assert!(artifact.data_provider_key.is_none());
        assert!(!artifact.output_dir.join(SERVER_FILE).exists());
    }

    #[test]
    fn test_package_is_deterministic() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), true);
        let packager = Packager::new(EngineRegistry::with_defaults());

        let first = packager.package(temp.path()).unwrap();
        let first_files: Vec<String> = [TEMPLATE_FILE, SERVER_FILE, MANIFEST_FILE]
            .iter()
            .map(|f| std::fs::read_to_string(first.output_dir.join(f)).unwrap())
            .collect();

        let second = packager.package(temp.path()).unwrap();
        let second_files: Vec<String> = [TEMPLATE_FILE, SERVER_FILE, MANIFEST_FILE]
            .iter()
            .map(|f| std::fs::read_to_string(second.output_dir.join(f)).unwrap())
            .collect();

        assert_eq!(first.template_key, second.template_key);
        assert_eq!(first_files, second_files);
    }

    #[test]
    fn test_package_failure_leaves_no_output() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), true);
        std::fs::write(
            temp.path().join("server.js"),
            "var request = require('request');",
        )
        .unwrap();

        let err = Packager::new(EngineRegistry::with_defaults())
            .package(temp.path())
            .unwrap_err();
        assert!(matches!(err, OcpackError::MissingDependencies { .. }));

        let names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(!names.iter().any(|n| n == "_package" || n.starts_with(".ocpack-")));
    }

    #[test]
    fn test_package_failure_keeps_previous_output() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), true);
        let packager = Packager::new(EngineRegistry::with_defaults());
        let artifact = packager.package(temp.path()).unwrap();
        let before = std::fs::read_to_string(artifact.output_dir.join(TEMPLATE_FILE)).unwrap();

        std::fs::write(temp.path().join("template.html"), "{{#open}}").unwrap();
        let err = packager.package(temp.path()).unwrap_err();
        assert!(matches!(err, OcpackError::TemplateCompileError { .. }));

        let after = std::fs::read_to_string(artifact.output_dir.join(TEMPLATE_FILE)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_package_without_minify_keeps_source() {
        let temp = TempDir::new().unwrap();
        write_component(temp.path(), true);
        let settings = PackagerSettings {
            minify: false,
            ..PackagerSettings::default()
        };

        let artifact = Packager::from_settings(EngineRegistry::with_defaults(), settings, temp.path())
            .package(temp.path())
            .unwrap();
        let server_js = std::fs::read_to_string(artifact.output_dir.join(SERVER_FILE)).unwrap();
        assert!(server_js.ends_with("module.exports.data = function(context, cb) { return cb(null, data); };\n"));
    }

    #[test]
    fn test_package_all_keeps_input_order() {
        let temp = TempDir::new().unwrap();
        let dirs: Vec<PathBuf> = (0..4).map(|i| temp.path().join(format!("comp-{i}"))).collect();
        for dir in &dirs {
            write_component(dir, true);
        }
        std::fs::write(dirs[2].join("template.html"), "{{/bad}}").unwrap();

        let packager = Packager::new(EngineRegistry::with_defaults());
        let results = packager.package_all(&dirs, 3).unwrap();

        assert_eq!(results.len(), 4);
        for (idx, result) in results.iter().enumerate() {
            if idx == 2 {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap().output_dir, dirs[idx].join("_package"));
            }
        }
    }

    #[test]
    fn test_packager_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Packager>();
    }
}
