//! Component registry over a model library.
//!
//! Resolves `(namespace, symbol)` pairs against the flat module layout
//! `<library_root>/<namespace>/Models/*.toml`. Each namespace is indexed once
//! per registry; later lookups are served from the cache.

use crate::error::{RegistryError, RegistryResult};
use crate::module::{ComponentClass, ComponentModule, MODELS_DIR, MODULE_EXTENSION};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Modules of one namespace, ordered by module id.
#[derive(Debug, Default)]
struct NamespaceIndex {
    modules: Vec<ComponentModule>,
}

impl NamespaceIndex {
    fn exporters(&self, symbol: &str) -> Vec<&ComponentModule> {
        self.modules.iter().filter(|m| m.exports_symbol(symbol)).collect()
    }
}

/// Registry of components discovered in a model library.
#[derive(Debug)]
pub struct ComponentRegistry {
    library_root: PathBuf,
    namespaces: RwLock<HashMap<String, Arc<NamespaceIndex>>>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        Self { library_root: library_root.into(), namespaces: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// `<library_root>/<namespace>/Models`
    #[must_use]
    pub fn models_dir(&self, namespace: &str) -> PathBuf {
        self.library_root.join(namespace).join(MODELS_DIR)
    }

    /// Look up `symbol` in `namespace`.
    ///
    /// Returns `Ok(None)` when no module exports the symbol. Broken modules
    /// and symbols exported by more than one module are errors.
    pub fn resolve(&self, namespace: &str, symbol: &str) -> RegistryResult<Option<ComponentClass>> {
        let index = self.namespace_index(namespace)?;
        let exporters = index.exporters(symbol);

        match exporters.as_slice() {
            [] => {
                tracing::warn!(
                    namespace,
                    symbol,
                    search_path = %self.models_dir(namespace).display(),
                    "Couldn't find model or callback"
                );
                Ok(None)
            }
            [module] => {
                let class = module.component(symbol);
                if let Some(class) = &class {
                    tracing::debug!(component = %class.qualified_name(), "Component found");
                }
                Ok(class)
            }
            many => Err(RegistryError::Ambiguous {
                namespace: namespace.to_string(),
                symbol: symbol.to_string(),
                modules: many.iter().map(|m| m.import_path()).collect(),
            }),
        }
    }

    /// Like [`resolve`](Self::resolve), but absence is an error.
    pub fn require(&self, namespace: &str, symbol: &str) -> RegistryResult<ComponentClass> {
        self.resolve(namespace, symbol)?.ok_or_else(|| RegistryError::NotFound {
            namespace: namespace.to_string(),
            symbol: symbol.to_string(),
            search_path: self.models_dir(namespace),
        })
    }

    /// Every exported component of `namespace`, sorted by qualified name.
    pub fn components(&self, namespace: &str) -> RegistryResult<Vec<ComponentClass>> {
        let index = self.namespace_index(namespace)?;

        let symbols: BTreeSet<&str> =
            index.modules.iter().flat_map(|m| m.exports().iter().map(String::as_str)).collect();

        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(class) = self.resolve(namespace, symbol)? {
                out.push(class);
            }
        }
        out.sort_by_key(ComponentClass::qualified_name);
        Ok(out)
    }

    /// Index every namespace under the library root that has a `Models`
    /// directory, failing on the first broken module or duplicate export.
    /// Returns the namespaces found, sorted.
    pub fn scan_all(&self) -> RegistryResult<Vec<String>> {
        let mut namespaces = Vec::new();

        for entry in std::fs::read_dir(&self.library_root)? {
            let entry = entry?;
            if !entry.path().join(MODELS_DIR).is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            namespaces.push(name);
        }
        namespaces.sort();

        for namespace in &namespaces {
            self.components(namespace)?;
        }

        tracing::info!(
            library_root = %self.library_root.display(),
            namespaces = namespaces.len(),
            "Model library scanned"
        );
        Ok(namespaces)
    }

    /// Namespaces indexed so far, sorted.
    pub fn namespaces(&self) -> RegistryResult<Vec<String>> {
        let cache = self.namespaces.read().map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        let mut names: Vec<String> = cache.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn namespace_index(&self, namespace: &str) -> RegistryResult<Arc<NamespaceIndex>> {
        {
            let cache = self.namespaces.read().map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
            if let Some(index) = cache.get(namespace) {
                return Ok(Arc::clone(index));
            }
        }

        let index = Arc::new(self.load_namespace(namespace)?);

        let mut cache = self.namespaces.write().map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(Arc::clone(cache.entry(namespace.to_string()).or_insert(index)))
    }

    fn load_namespace(&self, namespace: &str) -> RegistryResult<NamespaceIndex> {
        let dir = self.models_dir(namespace);
        tracing::debug!(namespace, dir = %dir.display(), "Indexing namespace");

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(NamespaceIndex::default()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == MODULE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let modules =
            paths.iter().map(|path| ComponentModule::load(namespace, path)).collect::<RegistryResult<Vec<_>>>()?;

        Ok(NamespaceIndex { modules })
    }
}

/// One-shot lookup without keeping a registry around.
pub fn find_component(namespace: &str, symbol: &str, library_root: &Path) -> RegistryResult<Option<ComponentClass>> {
    ComponentRegistry::new(library_root).resolve(namespace, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_module(root: &Path, namespace: &str, module: &str, content: &str) {
        let dir = root.join(namespace).join(MODELS_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{module}.{MODULE_EXTENSION}")), content).unwrap();
    }

    #[test]
    fn test_resolve_finds_exported_symbol() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "A", "net", "[symbols.Net]\n");
        write_module(temp.path(), "A", "hooks", "[symbols.EarlyStop]\n");

        let registry = ComponentRegistry::new(temp.path());
        let class = registry.resolve("A", "Net").unwrap().unwrap();

        assert_eq!(class.name(), "Net");
        assert_eq!(class.module, "net");
        assert_eq!(class.qualified_name(), "A.Models.net.Net");
    }

    #[test]
    fn test_resolve_missing_symbol_is_none() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "A", "net", "[symbols.Net]\n");

        let registry = ComponentRegistry::new(temp.path());
        assert!(registry.resolve("A", "Transformer").unwrap().is_none());
        assert!(registry.resolve("MissingSet", "Net").unwrap().is_none());
    }

    #[test]
    fn test_require_reports_search_path() {
        let temp = TempDir::new().unwrap();
        let registry = ComponentRegistry::new(temp.path());

        match registry.require("A", "Net") {
            Err(RegistryError::NotFound { namespace, symbol, search_path }) => {
                assert_eq!(namespace, "A");
                assert_eq!(symbol, "Net");
                assert_eq!(search_path, temp.path().join("A").join("Models"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_export_is_ambiguous() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "A", "net_v1", "[symbols.Net]\n");
        write_module(temp.path(), "A", "net_v2", "[symbols.Net]\n");

        let registry = ComponentRegistry::new(temp.path());
        match registry.resolve("A", "Net") {
            Err(RegistryError::Ambiguous { modules, .. }) => {
                assert_eq!(modules, vec!["A.Models.net_v1".to_string(), "A.Models.net_v2".to_string()]);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_is_not_recursive_and_ignores_other_extensions() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "A", "net", "[symbols.Net]\n");
        let nested = temp.path().join("A").join(MODELS_DIR).join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.toml"), "[symbols.Deep]\n").unwrap();
        fs::write(temp.path().join("A").join(MODELS_DIR).join("notes.txt"), "[symbols.Notes]\n").unwrap();

        let registry = ComponentRegistry::new(temp.path());
        assert!(registry.resolve("A", "Deep").unwrap().is_none());
        assert!(registry.resolve("A", "Notes").unwrap().is_none());
        assert_eq!(registry.components("A").unwrap().len(), 1);
    }

    #[test]
    fn test_namespace_is_indexed_once() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "A", "net", "[symbols.Net]\n");

        let registry = ComponentRegistry::new(temp.path());
        assert!(registry.resolve("A", "Net").unwrap().is_some());

        // Modules added after indexing are not picked up by this registry.
        write_module(temp.path(), "A", "late", "[symbols.Late]\n");
        assert!(registry.resolve("A", "Late").unwrap().is_none());
        assert!(find_component("A", "Late", temp.path()).unwrap().is_some());
    }

    #[test]
    fn test_broken_module_propagates_import_error() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "A", "net", "[symbols.Net]\n");
        write_module(temp.path(), "A", "broken", "symbols = 3\n");

        let registry = ComponentRegistry::new(temp.path());
        assert!(matches!(registry.resolve("A", "Net"), Err(RegistryError::Import { .. })));
    }

    #[test]
    fn test_scan_all_lists_namespaces() {
        let temp = TempDir::new().unwrap();
        write_module(temp.path(), "B", "net", "[symbols.Net]\n");
        write_module(temp.path(), "A", "net", "[symbols.Net]\n");
        fs::create_dir_all(temp.path().join("not_a_set")).unwrap();

        let registry = ComponentRegistry::new(temp.path());
        assert_eq!(registry.scan_all().unwrap(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(registry.namespaces().unwrap(), vec!["A".to_string(), "B".to_string()]);
    }
}
