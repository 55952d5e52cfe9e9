use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of nodes persisted in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Repository,
    File,
    Class,
    Method,
    Function,
    Attribute,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Repository => "repository",
            SymbolKind::File => "file",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Function => "function",
            SymbolKind::Attribute => "attribute",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repository" => Ok(SymbolKind::Repository),
            "file" => Ok(SymbolKind::File),
            "class" => Ok(SymbolKind::Class),
            "method" => Ok(SymbolKind::Method),
            "function" => Ok(SymbolKind::Function),
            "attribute" => Ok(SymbolKind::Attribute),
            other => Err(format!("unknown symbol kind: {}", other)),
        }
    }
}

/// The single structural edge connecting a node to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Contains,
    Defines,
    HasMethod,
    HasAttribute,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::HasMethod => "HAS_METHOD",
            EdgeKind::HasAttribute => "HAS_ATTRIBUTE",
        };
        write!(f, "{}", s)
    }
}

/// One declared parameter of a function or method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub has_default: bool,
    /// Source text of the default value, when present.
    pub default_repr: Option<String>,
    /// Annotation text as written, unresolved.
    pub annotation: Option<String>,
    /// `*args`
    pub is_variadic: bool,
    /// `**kwargs`
    pub is_keyword_variadic: bool,
}

impl Param {
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_default: false,
            default_repr: None,
            annotation: None,
            is_variadic: false,
            is_keyword_variadic: false,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.has_default && !self.is_variadic && !self.is_keyword_variadic
    }
}

/// Declared signature of a function or method, read from the definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub decorators: Vec<String>,
    pub is_async: bool,
}

impl FunctionSignature {
    /// Render in roughly the shape it was declared, for reports and lookups.
    pub fn render(&self, name: &str) -> String {
        let mut parts = Vec::with_capacity(self.params.len());
        for p in &self.params {
            let mut s = String::new();
            if p.is_variadic {
                s.push('*');
            } else if p.is_keyword_variadic {
                s.push_str("**");
            }
            s.push_str(&p.name);
            if let Some(ann) = &p.annotation {
                s.push_str(": ");
                s.push_str(ann);
            }
            if let Some(default) = &p.default_repr {
                s.push('=');
                s.push_str(default);
            }
            parts.push(s);
        }
        let ret = self
            .return_type
            .as_ref()
            .map(|r| format!(" -> {}", r))
            .unwrap_or_default();
        format!("{}({}){}", name, parts.join(", "), ret)
    }
}

/// One persisted graph node. The qualified name is the natural key within a
/// repository namespace; every node except the Repository root records its
/// parent's qualified name and the kind of that single incoming edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub qualified_name: String,
    pub name: String,
    pub kind: SymbolKind,
    pub parent: Option<String>,
    pub parent_edge: Option<EdgeKind>,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    /// Present for Method/Function nodes.
    pub signature: Option<FunctionSignature>,
    /// Base class names as written, for Class nodes.
    pub bases: Vec<String>,
    /// Statically determined type, for Attribute nodes.
    pub type_annotation: Option<String>,
}

impl GraphNode {
    pub fn new(qualified_name: impl Into<String>, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            name: name.into(),
            kind,
            parent: None,
            parent_edge: None,
            file_path: None,
            line: None,
            signature: None,
            bases: Vec::new(),
            type_annotation: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>, edge: EdgeKind) -> Self {
        self.parent = Some(parent.into());
        self.parent_edge = Some(edge);
        self
    }

    pub fn with_location(mut self, file_path: impl Into<String>, line: u32) -> Self {
        self.file_path = Some(file_path.into());
        self.line = Some(line);
        self
    }

    pub fn with_signature(mut self, signature: FunctionSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_bases(mut self, bases: Vec<String>) -> Self {
        self.bases = bases;
        self
    }

    pub fn with_type_annotation(mut self, ty: impl Into<String>) -> Self {
        self.type_annotation = Some(ty.into());
        self
    }
}

/// Identity of an ingested repository: the name doubles as the graph
/// namespace, the source location records where it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub name: String,
    pub source_location: String,
}

impl RepositoryIdentity {
    pub fn new(name: impl Into<String>, source_location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_location: source_location.into(),
        }
    }
}

/// Counts returned by a subtree upsert. Nodes whose stored payload already
/// matches the new payload count as neither created nor updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub created: usize,
    pub updated: usize,
}

/// One file skipped during ingest, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Result of one repository ingest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    pub repository: String,
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub nodes_deleted: usize,
    pub files_parsed: usize,
    pub files_skipped: Vec<SkippedFile>,
}

impl IngestResult {
    pub fn is_zero_diff(&self) -> bool {
        self.nodes_created == 0 && self.nodes_updated == 0 && self.nodes_deleted == 0
    }
}

/// Per-namespace bookkeeping stored beside the nodes, never inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceMeta {
    pub repository: String,
    pub source_location: String,
    pub ingested_at: chrono::DateTime<chrono::Utc>,
    pub file_count: usize,
    pub node_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_kind_round_trips_through_strings() {
        for kind in [
            SymbolKind::Repository,
            SymbolKind::File,
            SymbolKind::Class,
            SymbolKind::Method,
            SymbolKind::Function,
            SymbolKind::Attribute,
        ] {
            let parsed: SymbolKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("widget".parse::<SymbolKind>().is_err());
    }

    #[test]
    fn signature_render_includes_defaults_and_variadics() {
        let sig = FunctionSignature {
            params: vec![
                Param::positional("self"),
                Param {
                    name: "limit".to_string(),
                    has_default: true,
                    default_repr: Some("10".to_string()),
                    annotation: Some("int".to_string()),
                    is_variadic: false,
                    is_keyword_variadic: false,
                },
                Param {
                    name: "kwargs".to_string(),
                    has_default: false,
                    default_repr: None,
                    annotation: None,
                    is_variadic: false,
                    is_keyword_variadic: true,
                },
            ],
            return_type: Some("list".to_string()),
            decorators: Vec::new(),
            is_async: false,
        };
        assert_eq!(
            sig.render("search"),
            "search(self, limit: int=10, **kwargs) -> list"
        );
    }

    #[test]
    fn graph_node_builder_sets_parent_edge() {
        let node = GraphNode::new("pkg.mod.Foo", "Foo", SymbolKind::Class)
            .with_parent("pkg.mod", EdgeKind::Defines)
            .with_location("pkg/mod.py", 3);
        assert_eq!(node.parent.as_deref(), Some("pkg.mod"));
        assert_eq!(node.parent_edge, Some(EdgeKind::Defines));
        assert_eq!(node.line, Some(3));
    }
}
