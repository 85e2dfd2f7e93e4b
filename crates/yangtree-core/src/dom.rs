//! Generic document tree consumed by the statement builder
//!
//! Tokenizing module text is somebody else's job. The engine consumes an
//! already-tokenized tree of named elements with optional values, where each
//! subtree carries the prefix resolver that was in scope when it was read.
//! Elements are shared (`Arc`) so that cloned statements can keep viewing the
//! same element, and with it the same prefix context.
//!
//! [`DocumentSpec`] is a serde form of such a tree (JSON or YAML), used by the
//! CLI and by tests.

use crate::diagnostics::ElementRef;
use crate::error::YangError;
use crate::result::Result;
use crate::statement::ModuleId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Resolves statement prefixes to the modules that define them
pub trait PrefixResolver: Send + Sync + fmt::Debug {
    /// Module bound to `prefix`, if any
    fn module_for_prefix(&self, prefix: &str) -> Option<ModuleId>;

    /// Module that unprefixed names belong to
    fn default_module(&self) -> ModuleId;
}

/// Map-backed prefix resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePrefixResolver {
    default_module: ModuleId,
    prefixes: HashMap<String, ModuleId>,
}

impl ModulePrefixResolver {
    pub fn new(default_module: impl Into<ModuleId>) -> Self {
        Self {
            default_module: default_module.into(),
            prefixes: HashMap::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, module: impl Into<ModuleId>) -> Self {
        self.add_prefix(prefix, module);
        self
    }

    pub fn add_prefix(&mut self, prefix: impl Into<String>, module: impl Into<ModuleId>) {
        self.prefixes.insert(prefix.into(), module.into());
    }

    pub fn prefixes(&self) -> &HashMap<String, ModuleId> {
        &self.prefixes
    }
}

impl PrefixResolver for ModulePrefixResolver {
    fn module_for_prefix(&self, prefix: &str) -> Option<ModuleId> {
        self.prefixes.get(prefix).cloned()
    }

    fn default_module(&self) -> ModuleId {
        self.default_module.clone()
    }
}

/// One element of a tokenized document
#[derive(Clone)]
pub struct DomElement {
    name: String,
    value: Option<String>,
    line: Option<u32>,
    source: Option<Arc<str>>,
    children: Vec<Arc<DomElement>>,
    resolver: Arc<dyn PrefixResolver>,
}

impl DomElement {
    pub fn new(
        name: impl Into<String>,
        value: Option<&str>,
        resolver: Arc<dyn PrefixResolver>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
            line: None,
            source: None,
            children: Vec::new(),
            resolver,
        }
    }

    pub fn with_children(mut self, children: Vec<DomElement>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: Arc<str>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> &[Arc<DomElement>] {
        &self.children
    }

    pub fn prefix_resolver(&self) -> &Arc<dyn PrefixResolver> {
        &self.resolver
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn source(&self) -> Option<&Arc<str>> {
        self.source.as_ref()
    }

    /// Whether the name carries a `prefix:` part (an extension usage)
    pub fn is_prefixed(&self) -> bool {
        self.name.contains(':')
    }

    /// Split `prefix:local`; unprefixed names return `None` as prefix
    pub fn split_name(&self) -> (Option<&str>, &str) {
        match self.name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, self.name.as_str()),
        }
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef {
            source: self.source.clone(),
            name: self.name.clone(),
            line: self.line,
        }
    }
}

impl fmt::Debug for DomElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomElement")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("line", &self.line)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Serializable document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    /// Name used in reports (usually the module file name)
    #[serde(default)]
    pub source: Option<String>,

    /// Module for unprefixed names; derived from the root statement when absent
    #[serde(default)]
    pub default_module: Option<String>,

    /// Extra prefix bindings on top of the ones declared by the document
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,

    pub root: ElementSpec,
}

/// Serializable document element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSpec {
    pub name: String,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub line: Option<u32>,

    /// Prefix bindings that only apply to this subtree
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    fn child_value(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.value.as_deref())
    }
}

impl DocumentSpec {
    /// Parse a document from JSON text
    pub fn from_json_str(source_name: &str, content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| YangError::document_error(source_name, e.to_string()))
    }

    /// Parse a document from YAML text
    pub fn from_yaml_str(source_name: &str, content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| YangError::document_error(source_name, e.to_string()))
    }

    /// Load a document from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| YangError::io_error(path, e))?;
        let name = path.display().to_string();
        let mut spec = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&name, &content)?,
            Some("json") => Self::from_json_str(&name, &content)?,
            _ => {
                return Err(YangError::document_error(
                    name,
                    "Unsupported file extension (expected .json, .yaml or .yml)",
                ));
            }
        };
        if spec.source.is_none() {
            spec.source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
        }
        Ok(spec)
    }

    /// Module that owns unprefixed statements of this document
    ///
    /// A module owns its own statements; a submodule's statements belong to
    /// the module named by its `belongs-to`.
    pub fn effective_default_module(&self) -> String {
        if let Some(module) = &self.default_module {
            return module.clone();
        }
        match self.root.name.as_str() {
            "module" => self.root.value.clone().unwrap_or_default(),
            "submodule" => self
                .root
                .child_value("belongs-to")
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    /// Prefix bindings declared by the document itself: its own prefix
    /// (under `module` or `belongs-to`) and one per `import`
    fn declared_prefixes(&self, default_module: &str) -> BTreeMap<String, String> {
        let mut prefixes = BTreeMap::new();
        let root = &self.root;

        if let Some(own) = root.child_value("prefix") {
            prefixes.insert(own.to_string(), default_module.to_string());
        }
        if let Some(belongs_to) = root.children.iter().find(|c| c.name == "belongs-to")
            && let Some(own) = belongs_to.child_value("prefix")
        {
            prefixes.insert(own.to_string(), default_module.to_string());
        }
        for import in root.children.iter().filter(|c| c.name == "import") {
            if let (Some(module), Some(prefix)) = (import.value.as_deref(), import.child_value("prefix"))
            {
                prefixes.insert(prefix.to_string(), module.to_string());
            }
        }
        prefixes
    }

    /// Turn the serializable form into a shared element tree
    pub fn into_element(self) -> Arc<DomElement> {
        let default_module = self.effective_default_module();
        let mut resolver = ModulePrefixResolver::new(default_module.as_str());
        for (prefix, module) in self.declared_prefixes(&default_module) {
            resolver.add_prefix(prefix, module);
        }
        for (prefix, module) in &self.prefixes {
            resolver.add_prefix(prefix.as_str(), module.as_str());
        }
        let source: Option<Arc<str>> = self.source.as_deref().map(Arc::from);
        Arc::new(convert_element(self.root, &resolver, &source))
    }
}

fn convert_element(
    spec: ElementSpec,
    inherited: &ModulePrefixResolver,
    source: &Option<Arc<str>>,
) -> DomElement {
    let scoped;
    let resolver = if spec.prefixes.is_empty() {
        inherited
    } else {
        let mut nested = inherited.clone();
        for (prefix, module) in &spec.prefixes {
            nested.add_prefix(prefix.as_str(), module.as_str());
        }
        scoped = nested;
        &scoped
    };

    let children = spec
        .children
        .into_iter()
        .map(|child| Arc::new(convert_element(child, resolver, source)))
        .collect();

    DomElement {
        name: spec.name,
        value: spec.value,
        line: spec.line,
        source: source.clone(),
        children,
        resolver: Arc::new(resolver.clone()),
    }
}
