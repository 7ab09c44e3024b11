//! Model library module manifests.
//!
//! A model set keeps its components in `<library>/<set>/Models/*.toml`. Each
//! file is one module:
//!
//! ```toml
//! exports = ["Net"]              # optional allow-list
//!
//! [symbols.Net]
//! entry = "A.Models.net:Net"     # optional runtime entry point
//! description = "Two-layer MLP"
//!
//! [symbols._Scratch]             # private unless listed in `exports`
//! ```

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File extension of module manifests.
pub const MODULE_EXTENSION: &str = "toml";

/// Directory under each model set that holds its modules.
pub const MODELS_DIR: &str = "Models";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleFile {
    #[serde(default)]
    exports: Option<Vec<String>>,
    #[serde(default)]
    symbols: BTreeMap<String, SymbolDef>,
}

/// A symbol declared by a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolDef {
    #[serde(default)]
    pub entry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A parsed module of a model set.
#[derive(Debug, Clone)]
pub struct ComponentModule {
    namespace: String,
    module_id: String,
    path: PathBuf,
    exports: Vec<String>,
    symbols: BTreeMap<String, SymbolDef>,
}

impl ComponentModule {
    /// Read and parse a module manifest. The module id is the file stem.
    pub fn load(namespace: &str, path: &Path) -> RegistryResult<Self> {
        let module_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| RegistryError::Import {
                path: path.to_path_buf(),
                reason: "module file name is not valid UTF-8".to_string(),
            })?
            .to_string();

        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Import {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(namespace, &module_id, path, &content)
    }

    pub fn parse(namespace: &str, module_id: &str, path: &Path, content: &str) -> RegistryResult<Self> {
        let file: ModuleFile = toml::from_str(content).map_err(|e| RegistryError::Import {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let exports = match file.exports {
            Some(allow_list) => {
                if let Some(missing) = allow_list.iter().find(|name| !file.symbols.contains_key(*name)) {
                    return Err(RegistryError::Import {
                        path: path.to_path_buf(),
                        reason: format!("`exports` names undefined symbol `{missing}`"),
                    });
                }
                allow_list
            }
            None => file.symbols.keys().filter(|name| !name.starts_with('_')).cloned().collect(),
        };

        Ok(Self {
            namespace: namespace.to_string(),
            module_id: module_id.to_string(),
            path: path.to_path_buf(),
            exports,
            symbols: file.symbols,
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dotted import path, e.g. `A.Models.net`.
    #[must_use]
    pub fn import_path(&self) -> String {
        format!("{}.{}.{}", self.namespace, MODELS_DIR, self.module_id)
    }

    #[must_use]
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    #[must_use]
    pub fn exports_symbol(&self, symbol: &str) -> bool {
        self.exports.iter().any(|name| name == symbol)
    }

    /// The exported component named `symbol`, if any.
    #[must_use]
    pub fn component(&self, symbol: &str) -> Option<ComponentClass> {
        if !self.exports_symbol(symbol) {
            return None;
        }
        let def = self.symbols.get(symbol)?;
        Some(ComponentClass {
            namespace: self.namespace.clone(),
            module: self.module_id.clone(),
            name: symbol.to_string(),
            entry: def.entry.clone().unwrap_or_else(|| format!("{}:{symbol}", self.import_path())),
            description: def.description.clone(),
            source: self.path.clone(),
        })
    }
}

/// A component resolved from the model library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentClass {
    pub namespace: String,
    pub module: String,
    pub name: String,
    /// Runtime entry point handed to the training runtime.
    pub entry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: PathBuf,
}

impl ComponentClass {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<namespace>.Models.<module>.<name>`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}.{}", self.namespace, MODELS_DIR, self.module, self.name)
    }

    /// Instantiate with no constructor arguments.
    #[must_use]
    pub fn instantiate(&self) -> ComponentInstance {
        ComponentInstance { class: self.clone() }
    }
}

/// An instance of a library component, constructed without arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub class: ComponentClass,
}

impl ComponentInstance {
    #[must_use]
    pub fn name(&self) -> &str {
        self.class.name()
    }
}
