//! Shared fixtures for traintrack-core integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary model library with an artifact directory next to it.
pub struct TestLibrary {
    pub temp: TempDir,
}

impl TestLibrary {
    /// Library with set `A`: `net.toml` exports `Net`, `hooks.toml` exports
    /// `EarlyStop` and `LogImages`.
    pub fn standard() -> Self {
        let library = Self::empty();
        library.write_module("A", "net", "[symbols.Net]\ndescription = \"Two-layer MLP\"\n");
        library.write_module("A", "hooks", "[symbols.EarlyStop]\n[symbols.LogImages]\n[symbols._Internal]\n");
        library
    }

    pub fn empty() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp directory");
        fs::create_dir_all(temp.path().join("lib")).expect("Failed to create lib");
        Self { temp }
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("lib")
    }

    pub fn artifacts(&self) -> PathBuf {
        self.temp.path().join("artifacts")
    }

    pub fn write_module(&self, namespace: &str, module: &str, content: &str) -> PathBuf {
        let dir = self.root().join(namespace).join("Models");
        fs::create_dir_all(&dir).expect("Failed to create Models dir");
        let path = dir.join(format!("{module}.toml"));
        fs::write(&path, content).expect("Failed to write module");
        path
    }

    /// Job YAML for set `A` / model `Net` rooted at this library.
    pub fn job_yaml(&self, extra: &str) -> String {
        format!(
            "set: A\nname: Net\nmodel_library: {}\nartifact_library: {}\nmax_epochs: 10\n{extra}",
            yaml_path(&self.root()),
            yaml_path(&self.artifacts())
        )
    }
}

fn yaml_path(path: &Path) -> String {
    format!("'{}'", path.display())
}
