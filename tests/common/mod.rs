//! Common test utilities for ocpack integration tests

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory holding component directories
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    #[allow(dead_code)]
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Create a minimal html component
    #[allow(dead_code)]
    pub fn create_component(&self, name: &str) -> PathBuf {
        self.write_file(
            &format!("{name}/package.json"),
            &format!(
                r#"{{"name":"{name}","oc":{{"files":{{"template":{{"type":"html","src":"template.html"}}}}}}}}"#
            ),
        );
        self.write_file(&format!("{name}/template.html"), "<p>static</p>");
        self.path.join(name)
    }

    /// Copy a fixture component into the workspace
    #[allow(dead_code)]
    pub fn copy_fixture_component(&self, fixture_name: &str, target_name: &str) -> PathBuf {
        let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("common")
            .join("fixtures")
            .join("components")
            .join(fixture_name);

        let target_path = self.path.join(target_name);
        copy_dir_recursive(&fixture_path, &target_path).expect("Failed to copy fixture component");
        target_path
    }

    /// Names of the entries directly under a workspace directory, sorted
    #[allow(dead_code)]
    pub fn entries(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path.join(dir))
            .expect("Failed to read directory")
            .map(|e| {
                e.expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

/// Recursively copy a directory
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
