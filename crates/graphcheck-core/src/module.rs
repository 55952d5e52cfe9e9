use crate::types::FunctionSignature;
use serde::{Deserialize, Serialize};

/// Structural summary of one parsed source file. Built fresh on every parse
/// pass, immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedModule {
    /// Dotted module path derived from the file's location under the ingest
    /// root (`pkg/util.py` -> `pkg.util`).
    pub module_path: String,
    pub file_path: String,
    pub imports: Vec<Import>,
    pub classes: Vec<ClassDef>,
    /// Module-level functions only; methods live on their class.
    pub functions: Vec<FunctionDef>,
}

impl ParsedModule {
    pub fn find_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// One top-level import binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// The name being imported: a module path for `import a.b`, a symbol
    /// name for `from m import N`, `*` for wildcard imports.
    pub name: String,
    /// Source module for `from`-imports; empty for plain imports.
    pub source_module: String,
    pub alias: Option<String>,
    /// Number of leading dots on a relative import.
    pub relative_level: u32,
}

impl Import {
    /// The local name this import binds, when it binds one.
    pub fn bound_name(&self) -> Option<&str> {
        if self.name == "*" {
            return None;
        }
        if let Some(alias) = &self.alias {
            return Some(alias);
        }
        if self.source_module.is_empty() {
            // `import a.b` binds the root name `a`.
            Some(self.name.split('.').next().unwrap_or(&self.name))
        } else {
            Some(&self.name)
        }
    }

    /// The fully-qualified path the bound name refers to.
    pub fn qualified_target(&self) -> Option<String> {
        if self.name == "*" {
            return None;
        }
        if self.source_module.is_empty() {
            if self.alias.is_some() {
                Some(self.name.clone())
            } else {
                // Unaliased `import a.b`: the binding `a` refers to module `a`
                // and deeper members are reached through attribute access.
                Some(
                    self.name
                        .split('.')
                        .next()
                        .unwrap_or(&self.name)
                        .to_string(),
                )
            }
        } else {
            Some(format!("{}.{}", self.source_module, self.name))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub qualified_name: String,
    /// Base class names exactly as written, unresolved.
    pub bases: Vec<String>,
    pub methods: Vec<FunctionDef>,
    pub attributes: Vec<AttributeDef>,
    pub line: u32,
    /// True for classes declared inside another class body.
    pub nested: bool,
}

impl ClassDef {
    pub fn find_method(&self, name: &str) -> Option<&FunctionDef> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub qualified_name: String,
    pub signature: FunctionSignature,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub qualified_name: String,
    /// Annotation text, a literal's builtin type name, or the class name of
    /// an obvious constructor assignment. None when nothing is statically
    /// determinable.
    pub type_annotation: Option<String>,
    pub line: u32,
}

/// Statically-evident kind of a call argument, used for the conservative
/// annotated-type check. Anything not an obvious literal is Unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Str,
    Int,
    Float,
    Bool,
    NoneLit,
    List,
    Dict,
    Set,
    Tuple,
    Unknown,
}

impl LiteralKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralKind::Str => "str",
            LiteralKind::Int => "int",
            LiteralKind::Float => "float",
            LiteralKind::Bool => "bool",
            LiteralKind::NoneLit => "None",
            LiteralKind::List => "list",
            LiteralKind::Dict => "dict",
            LiteralKind::Set => "set",
            LiteralKind::Tuple => "tuple",
            LiteralKind::Unknown => "unknown",
        }
    }
}

/// Where a resolved call target lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetScope {
    /// Resolved through the script's imports; validated against the graph.
    Imported,
    /// Defined in the script itself; validated against the script's module.
    Local,
}

/// Best-effort resolution of a call expression to a qualified symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub qualified_name: String,
    pub scope: TargetScope,
    /// True when the call went through an instance binding
    /// (`x = Foo(); x.bar()`), so the target names a class member.
    pub via_instance: bool,
}

/// One call expression found in the analyzed script. Never persisted;
/// consumed by the validator within the same invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    /// The callee expression as written (`client.search`, `Foo`).
    pub callee_text: String,
    pub resolved: Option<ResolvedTarget>,
    pub positional_count: usize,
    pub keyword_names: Vec<String>,
    /// Literal kinds of positional arguments, index-aligned.
    pub positional_literals: Vec<LiteralKind>,
    /// Literal kinds of keyword arguments, aligned with `keyword_names`.
    pub keyword_literals: Vec<LiteralKind>,
    /// True when the argument list uses `*`/`**` unpacking; such calls
    /// cannot be shape-checked.
    pub uses_unpacking: bool,
    pub line: u32,
}

impl CallSite {
    pub fn unresolved(callee_text: impl Into<String>, line: u32) -> Self {
        Self {
            callee_text: callee_text.into(),
            resolved: None,
            positional_count: 0,
            keyword_names: Vec::new(),
            positional_literals: Vec::new(),
            keyword_literals: Vec::new(),
            uses_unpacking: false,
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_import_binds_root_name() {
        let import = Import {
            name: "os.path".to_string(),
            source_module: String::new(),
            alias: None,
            relative_level: 0,
        };
        assert_eq!(import.bound_name(), Some("os"));
        assert_eq!(import.qualified_target().as_deref(), Some("os"));
    }

    #[test]
    fn aliased_import_binds_alias_to_full_path() {
        let import = Import {
            name: "pkg.client".to_string(),
            source_module: String::new(),
            alias: Some("pc".to_string()),
            relative_level: 0,
        };
        assert_eq!(import.bound_name(), Some("pc"));
        assert_eq!(import.qualified_target().as_deref(), Some("pkg.client"));
    }

    #[test]
    fn from_import_with_alias_binds_alias() {
        let import = Import {
            name: "Client".to_string(),
            source_module: "pkg.client".to_string(),
            alias: Some("C".to_string()),
            relative_level: 0,
        };
        assert_eq!(import.bound_name(), Some("C"));
        assert_eq!(
            import.qualified_target().as_deref(),
            Some("pkg.client.Client")
        );
    }

    #[test]
    fn wildcard_import_binds_nothing() {
        let import = Import {
            name: "*".to_string(),
            source_module: "pkg.util".to_string(),
            alias: None,
            relative_level: 0,
        };
        assert_eq!(import.bound_name(), None);
        assert_eq!(import.qualified_target(), None);
    }
}
