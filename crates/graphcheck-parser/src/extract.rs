use graphcheck_core::{
    AttributeDef, ClassDef, FunctionDef, FunctionSignature, Import, LiteralKind, Param,
    ParsedModule,
};
use std::collections::HashSet;
use tree_sitter::{Node, Tree};

/// Extracts the structural summary of one Python module from its syntax
/// tree: imports, classes with methods and attributes, module-level
/// functions. Signatures are read directly from the definitions; base class
/// names are captured verbatim.
pub struct ModuleExtractor;

impl ModuleExtractor {
    pub fn extract(tree: &Tree, content: &str, module_path: &str, file_path: &str) -> ParsedModule {
        let collector = Collector {
            content,
            module_path,
        };
        let mut module = ParsedModule {
            module_path: module_path.to_string(),
            file_path: file_path.to_string(),
            ..Default::default()
        };
        collector.collect_module(tree.root_node(), &mut module);
        module
    }
}

/// First ERROR or MISSING node in the tree, used to localize syntax errors.
pub fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        if child.has_error() {
            if let Some(err) = first_error_node(child) {
                return Some(err);
            }
        }
    }
    None
}

/// Statically-evident kind of an expression, for literal arguments and
/// attribute type inference. Anything else is Unknown.
pub fn literal_kind_of(node: &Node) -> LiteralKind {
    match node.kind() {
        "string" | "concatenated_string" => LiteralKind::Str,
        "integer" => LiteralKind::Int,
        "float" => LiteralKind::Float,
        "true" | "false" => LiteralKind::Bool,
        "none" => LiteralKind::NoneLit,
        "list" | "list_comprehension" => LiteralKind::List,
        "dictionary" | "dictionary_comprehension" => LiteralKind::Dict,
        "set" | "set_comprehension" => LiteralKind::Set,
        "tuple" => LiteralKind::Tuple,
        "unary_operator" => match node.child_by_field_name("argument") {
            Some(arg) => match literal_kind_of(&arg) {
                k @ (LiteralKind::Int | LiteralKind::Float) => k,
                _ => LiteralKind::Unknown,
            },
            None => LiteralKind::Unknown,
        },
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => literal_kind_of(&inner),
            None => LiteralKind::Unknown,
        },
        _ => LiteralKind::Unknown,
    }
}

pub fn node_text(node: &Node, content: &str) -> String {
    node.utf8_text(content.as_bytes()).unwrap_or("").to_string()
}

/// Import records declared by one `import`/`from`/`__future__` statement.
/// Usable on statements anywhere in a tree, not just at module level.
pub fn imports_of_statement(node: Node<'_>, content: &str) -> Vec<Import> {
    match node.kind() {
        "import_statement" => plain_imports(node, content),
        "import_from_statement" => from_imports(node, content, None),
        "future_import_statement" => from_imports(node, content, Some("__future__")),
        _ => Vec::new(),
    }
}

fn plain_imports(node: Node<'_>, content: &str) -> Vec<Import> {
    let mut imports = Vec::new();
    let mut cursor = node.walk();
    let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
    for item in names {
        match item.kind() {
            "dotted_name" => imports.push(Import {
                name: node_text(&item, content),
                source_module: String::new(),
                alias: None,
                relative_level: 0,
            }),
            "aliased_import" => {
                let name = item
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, content))
                    .unwrap_or_default();
                let alias = item
                    .child_by_field_name("alias")
                    .map(|n| node_text(&n, content));
                imports.push(Import {
                    name,
                    source_module: String::new(),
                    alias,
                    relative_level: 0,
                });
            }
            _ => {}
        }
    }
    imports
}

fn from_imports(node: Node<'_>, content: &str, fixed_source: Option<&str>) -> Vec<Import> {
    let (source_module, relative_level) = match fixed_source {
        Some(src) => (src.to_string(), 0),
        None => match node.child_by_field_name("module_name") {
            Some(m) if m.kind() == "relative_import" => {
                let text = node_text(&m, content);
                let dots = text.chars().take_while(|c| *c == '.').count() as u32;
                (text.trim_start_matches('.').to_string(), dots)
            }
            Some(m) => (node_text(&m, content), 0),
            None => (String::new(), 0),
        },
    };

    let mut wildcard = false;
    {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "wildcard_import" {
                wildcard = true;
            }
        }
    }
    if wildcard {
        return vec![Import {
            name: "*".to_string(),
            source_module,
            alias: None,
            relative_level,
        }];
    }

    let mut imports = Vec::new();
    let mut cursor = node.walk();
    let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
    for item in names {
        // The module_name child also carries the "name" field in some
        // grammar versions; skip it by position.
        if let Some(m) = node.child_by_field_name("module_name") {
            if item.id() == m.id() {
                continue;
            }
        }
        match item.kind() {
            "dotted_name" => imports.push(Import {
                name: node_text(&item, content),
                source_module: source_module.clone(),
                alias: None,
                relative_level,
            }),
            "aliased_import" => {
                let name = item
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, content))
                    .unwrap_or_default();
                let alias = item
                    .child_by_field_name("alias")
                    .map(|n| node_text(&n, content));
                imports.push(Import {
                    name,
                    source_module: source_module.clone(),
                    alias,
                    relative_level,
                });
            }
            _ => {}
        }
    }
    imports
}

struct Collector<'a> {
    content: &'a str,
    module_path: &'a str,
}

impl<'a> Collector<'a> {
    fn collect_module(&self, root: Node<'a>, module: &mut ParsedModule) {
        let mut cursor = root.walk();
        let children: Vec<Node> = root.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "import_statement" | "import_from_statement" | "future_import_statement" => {
                    module
                        .imports
                        .extend(imports_of_statement(child, self.content));
                }
                "class_definition" => {
                    let classes = self.collect_class(child, &[], Vec::new());
                    module.classes.extend(classes);
                }
                "function_definition" => {
                    let qualified = format!("{}.{}", self.module_path, self.def_name(child));
                    module
                        .functions
                        .push(self.collect_function(child, qualified, Vec::new()));
                }
                "decorated_definition" => {
                    let decorators = self.decorator_names(child);
                    if let Some(def) = child.child_by_field_name("definition") {
                        match def.kind() {
                            "class_definition" => {
                                let classes = self.collect_class(def, &[], decorators);
                                module.classes.extend(classes);
                            }
                            "function_definition" => {
                                let qualified =
                                    format!("{}.{}", self.module_path, self.def_name(def));
                                module
                                    .functions
                                    .push(self.collect_function(def, qualified, decorators));
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Collects a class and, recursively, any classes nested in its body.
    /// The enclosing class itself comes first in the returned list; nested
    /// classes carry the enclosing path in their qualified names.
    fn collect_class(
        &self,
        node: Node<'a>,
        enclosing: &[String],
        _decorators: Vec<String>,
    ) -> Vec<ClassDef> {
        let name = self.def_name(node);
        let mut path_parts: Vec<&str> = vec![self.module_path];
        for part in enclosing {
            path_parts.push(part);
        }
        path_parts.push(&name);
        let qualified_name = path_parts.join(".");

        let bases = self.base_names(node);
        let mut methods = Vec::new();
        let mut method_bodies: Vec<Node> = Vec::new();
        let mut attributes = Vec::new();
        let mut seen_attrs: HashSet<String> = HashSet::new();
        let mut nested = Vec::new();

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            let children: Vec<Node> = body.named_children(&mut cursor).collect();
            for child in children {
                match child.kind() {
                    "function_definition" => {
                        let qualified = format!("{}.{}", qualified_name, self.def_name(child));
                        methods.push(self.collect_function(child, qualified, Vec::new()));
                        method_bodies.push(child);
                    }
                    "class_definition" => {
                        let mut inner_enclosing = enclosing.to_vec();
                        inner_enclosing.push(name.clone());
                        nested.extend(self.collect_class(child, &inner_enclosing, Vec::new()));
                    }
                    "decorated_definition" => {
                        let decorators = self.decorator_names(child);
                        if let Some(def) = child.child_by_field_name("definition") {
                            match def.kind() {
                                "function_definition" => {
                                    let qualified =
                                        format!("{}.{}", qualified_name, self.def_name(def));
                                    methods.push(self.collect_function(def, qualified, decorators));
                                    method_bodies.push(def);
                                }
                                "class_definition" => {
                                    let mut inner_enclosing = enclosing.to_vec();
                                    inner_enclosing.push(name.clone());
                                    nested.extend(self.collect_class(
                                        def,
                                        &inner_enclosing,
                                        Vec::new(),
                                    ));
                                }
                                _ => {}
                            }
                        }
                    }
                    "expression_statement" => {
                        if let Some(assign) = child.named_child(0).filter(|n| n.kind() == "assignment")
                        {
                            self.collect_class_body_attribute(
                                assign,
                                &qualified_name,
                                &mut attributes,
                                &mut seen_attrs,
                            );
                        }
                    }
                    _ => {}
                }
            }
        }

        // Attributes assigned on self inside method bodies, constructor first
        // by source order.
        for body_def in method_bodies {
            if let Some(body) = body_def.child_by_field_name("body") {
                self.collect_self_attributes(body, &qualified_name, &mut attributes, &mut seen_attrs);
            }
        }

        let mut result = vec![ClassDef {
            name,
            qualified_name,
            bases,
            methods,
            attributes,
            line: node.start_position().row as u32 + 1,
            nested: !enclosing.is_empty(),
        }];
        result.extend(nested);
        result
    }

    fn collect_class_body_attribute(
        &self,
        assign: Node<'a>,
        class_qualified: &str,
        attributes: &mut Vec<AttributeDef>,
        seen: &mut HashSet<String>,
    ) {
        let left = match assign.child_by_field_name("left") {
            Some(l) if l.kind() == "identifier" => l,
            _ => return,
        };
        let name = self.text(&left);
        if !seen.insert(name.clone()) {
            return;
        }
        let type_annotation = self.attribute_type(&assign);
        attributes.push(AttributeDef {
            qualified_name: format!("{}.{}", class_qualified, name),
            name,
            type_annotation,
            line: assign.start_position().row as u32 + 1,
        });
    }

    fn collect_self_attributes(
        &self,
        node: Node<'a>,
        class_qualified: &str,
        attributes: &mut Vec<AttributeDef>,
        seen: &mut HashSet<String>,
    ) {
        if node.kind() == "assignment" {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "attribute" {
                    let object = left.child_by_field_name("object");
                    let attr = left.child_by_field_name("attribute");
                    if let (Some(object), Some(attr)) = (object, attr) {
                        if object.kind() == "identifier" && self.text(&object) == "self" {
                            let name = self.text(&attr);
                            if seen.insert(name.clone()) {
                                let type_annotation = self.attribute_type(&node);
                                attributes.push(AttributeDef {
                                    qualified_name: format!("{}.{}", class_qualified, name),
                                    name,
                                    type_annotation,
                                    line: node.start_position().row as u32 + 1,
                                });
                            }
                        }
                    }
                }
            }
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            // Nested defs get their own scope; self there is not this class.
            if child.kind() == "function_definition" || child.kind() == "class_definition" {
                continue;
            }
            self.collect_self_attributes(child, class_qualified, attributes, seen);
        }
    }

    /// Annotation text when declared, otherwise the builtin type of a
    /// literal right-hand side, otherwise the class name of a constructor
    /// call. None when nothing is statically determinable.
    fn attribute_type(&self, assign: &Node<'a>) -> Option<String> {
        if let Some(ty) = assign.child_by_field_name("type") {
            return Some(self.text(&ty));
        }
        let right = assign.child_by_field_name("right")?;
        match literal_kind_of(&right) {
            LiteralKind::Unknown => {
                if right.kind() == "call" {
                    let function = right.child_by_field_name("function")?;
                    match function.kind() {
                        "identifier" | "attribute" => Some(self.text(&function)),
                        _ => None,
                    }
                } else {
                    None
                }
            }
            LiteralKind::NoneLit => None,
            kind => Some(kind.type_name().to_string()),
        }
    }

    fn collect_function(
        &self,
        node: Node<'a>,
        qualified_name: String,
        decorators: Vec<String>,
    ) -> FunctionDef {
        let name = self.def_name(node);
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.collect_params(p))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("return_type")
            .map(|r| self.text(&r));
        let mut cursor = node.walk();
        let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

        FunctionDef {
            name,
            qualified_name,
            signature: FunctionSignature {
                params,
                return_type,
                decorators,
                is_async,
            },
            line: node.start_position().row as u32 + 1,
        }
    }

    fn collect_params(&self, parameters: Node<'a>) -> Vec<Param> {
        let mut params = Vec::new();
        let mut cursor = parameters.walk();
        let children: Vec<Node> = parameters.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "identifier" => params.push(Param::positional(self.text(&child))),
                "typed_parameter" => {
                    let annotation = child.child_by_field_name("type").map(|t| self.text(&t));
                    match child.named_child(0) {
                        Some(inner) if inner.kind() == "list_splat_pattern" => {
                            params.push(Param {
                                name: self.splat_name(&inner),
                                has_default: false,
                                default_repr: None,
                                annotation,
                                is_variadic: true,
                                is_keyword_variadic: false,
                            });
                        }
                        Some(inner) if inner.kind() == "dictionary_splat_pattern" => {
                            params.push(Param {
                                name: self.splat_name(&inner),
                                has_default: false,
                                default_repr: None,
                                annotation,
                                is_variadic: false,
                                is_keyword_variadic: true,
                            });
                        }
                        Some(inner) => {
                            params.push(Param {
                                name: self.text(&inner),
                                has_default: false,
                                default_repr: None,
                                annotation,
                                is_variadic: false,
                                is_keyword_variadic: false,
                            });
                        }
                        None => {}
                    }
                }
                "default_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.text(&n))
                        .unwrap_or_default();
                    let default_repr = child.child_by_field_name("value").map(|v| self.text(&v));
                    params.push(Param {
                        name,
                        has_default: true,
                        default_repr,
                        annotation: None,
                        is_variadic: false,
                        is_keyword_variadic: false,
                    });
                }
                "typed_default_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.text(&n))
                        .unwrap_or_default();
                    let annotation = child.child_by_field_name("type").map(|t| self.text(&t));
                    let default_repr = child.child_by_field_name("value").map(|v| self.text(&v));
                    params.push(Param {
                        name,
                        has_default: true,
                        default_repr,
                        annotation,
                        is_variadic: false,
                        is_keyword_variadic: false,
                    });
                }
                "list_splat_pattern" => params.push(Param {
                    name: self.splat_name(&child),
                    has_default: false,
                    default_repr: None,
                    annotation: None,
                    is_variadic: true,
                    is_keyword_variadic: false,
                }),
                "dictionary_splat_pattern" => params.push(Param {
                    name: self.splat_name(&child),
                    has_default: false,
                    default_repr: None,
                    annotation: None,
                    is_variadic: false,
                    is_keyword_variadic: true,
                }),
                // Bare `*` and `/` markers declare ordering, not parameters.
                "keyword_separator" | "positional_separator" => {}
                "tuple_pattern" => params.push(Param::positional(self.text(&child))),
                _ => {}
            }
        }
        params
    }

    fn splat_name(&self, pattern: &Node<'a>) -> String {
        pattern
            .named_child(0)
            .map(|n| self.text(&n))
            .unwrap_or_else(|| self.text(pattern).trim_start_matches('*').to_string())
    }

    fn base_names(&self, class_node: Node<'a>) -> Vec<String> {
        let mut bases = Vec::new();
        if let Some(superclasses) = class_node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for child in superclasses.named_children(&mut cursor) {
                match child.kind() {
                    "keyword_argument" | "comment" => {}
                    // `class A(B, metaclass=M)`: keyword arguments are not
                    // bases; everything else is captured verbatim.
                    _ => bases.push(self.text(&child)),
                }
            }
        }
        bases
    }

    fn decorator_names(&self, decorated: Node<'a>) -> Vec<String> {
        let mut decorators = Vec::new();
        let mut cursor = decorated.walk();
        for child in decorated.children(&mut cursor) {
            if child.kind() == "decorator" {
                if let Some(expr) = child.named_child(0) {
                    decorators.push(self.text(&expr));
                }
            }
        }
        decorators
    }

    fn def_name(&self, node: Node<'a>) -> String {
        node.child_by_field_name("name")
            .map(|n| self.text(&n))
            .unwrap_or_default()
    }

    fn text(&self, node: &Node<'a>) -> String {
        node_text(node, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::python_parser;

    fn extract(source: &str) -> ParsedModule {
        let mut parser = python_parser().unwrap();
        let tree = parser.parse(source, None).unwrap();
        assert!(!tree.root_node().has_error(), "fixture should parse clean");
        ModuleExtractor::extract(&tree, source, "pkg.mod", "pkg/mod.py")
    }

    #[test]
    fn collects_import_variants() {
        let source = r#"
import os.path
import numpy as np
from pkg.client import Client as C, helper
from . import sibling
from ..base import Thing
from pkg.util import *
"#;
        let module = extract(source);
        assert_eq!(module.imports.len(), 7);

        assert_eq!(module.imports[0].name, "os.path");
        assert!(module.imports[0].source_module.is_empty());

        assert_eq!(module.imports[1].name, "numpy");
        assert_eq!(module.imports[1].alias.as_deref(), Some("np"));

        assert_eq!(module.imports[2].name, "Client");
        assert_eq!(module.imports[2].source_module, "pkg.client");
        assert_eq!(module.imports[2].alias.as_deref(), Some("C"));

        assert_eq!(module.imports[3].name, "helper");
        assert_eq!(module.imports[3].source_module, "pkg.client");

        assert_eq!(module.imports[4].name, "sibling");
        assert_eq!(module.imports[4].relative_level, 1);

        assert_eq!(module.imports[5].name, "Thing");
        assert_eq!(module.imports[5].source_module, "base");
        assert_eq!(module.imports[5].relative_level, 2);

        assert_eq!(module.imports[6].name, "*");
        assert_eq!(module.imports[6].source_module, "pkg.util");
    }

    #[test]
    fn collects_class_with_methods_and_bases() {
        let source = r#"
class Searcher(Base, mixins.Cached):
    def search(self, query: str, limit: int = 10) -> list:
        return []

    async def refresh(self, *args, **kwargs):
        pass
"#;
        let module = extract(source);
        assert_eq!(module.classes.len(), 1);
        let class = &module.classes[0];
        assert_eq!(class.name, "Searcher");
        assert_eq!(class.qualified_name, "pkg.mod.Searcher");
        assert_eq!(class.bases, vec!["Base", "mixins.Cached"]);
        assert_eq!(class.methods.len(), 2);

        let search = class.find_method("search").unwrap();
        assert_eq!(search.qualified_name, "pkg.mod.Searcher.search");
        assert_eq!(search.signature.params.len(), 3);
        assert_eq!(search.signature.params[0].name, "self");
        assert_eq!(search.signature.params[1].annotation.as_deref(), Some("str"));
        assert!(search.signature.params[2].has_default);
        assert_eq!(search.signature.params[2].default_repr.as_deref(), Some("10"));
        assert_eq!(search.signature.return_type.as_deref(), Some("list"));

        let refresh = class.find_method("refresh").unwrap();
        assert!(refresh.signature.is_async);
        assert!(refresh.signature.params[1].is_variadic);
        assert!(refresh.signature.params[2].is_keyword_variadic);
    }

    #[test]
    fn collects_attributes_from_body_and_constructor() {
        let source = r#"
class Config:
    retries: int = 3
    label = "default"

    def __init__(self, path):
        self.path = path
        self.client = Client()
        self.timeout: float = 1.5
"#;
        let module = extract(source);
        let class = &module.classes[0];
        let names: Vec<&str> = class.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["retries", "label", "path", "client", "timeout"]);

        let by_name = |n: &str| class.attributes.iter().find(|a| a.name == n).unwrap();
        assert_eq!(by_name("retries").type_annotation.as_deref(), Some("int"));
        assert_eq!(by_name("label").type_annotation.as_deref(), Some("str"));
        assert_eq!(by_name("path").type_annotation, None);
        assert_eq!(by_name("client").type_annotation.as_deref(), Some("Client"));
        assert_eq!(by_name("timeout").type_annotation.as_deref(), Some("float"));
        assert_eq!(
            by_name("client").qualified_name,
            "pkg.mod.Config.client"
        );
    }

    #[test]
    fn nested_classes_carry_enclosing_path() {
        let source = r#"
class Outer:
    class Inner:
        def ping(self):
            pass
"#;
        let module = extract(source);
        assert_eq!(module.classes.len(), 2);
        assert_eq!(module.classes[0].name, "Outer");
        assert!(!module.classes[0].nested);
        let inner = &module.classes[1];
        assert_eq!(inner.qualified_name, "pkg.mod.Outer.Inner");
        assert!(inner.nested);
        assert_eq!(
            inner.methods[0].qualified_name,
            "pkg.mod.Outer.Inner.ping"
        );
    }

    #[test]
    fn collects_decorated_and_module_level_functions() {
        let source = r#"
@retry(times=3)
def fetch(url, timeout=30):
    pass

class Api:
    @property
    def base_url(self):
        return self._base
"#;
        let module = extract(source);
        let fetch = module.find_function("fetch").unwrap();
        assert_eq!(fetch.qualified_name, "pkg.mod.fetch");
        assert_eq!(fetch.signature.decorators, vec!["retry(times=3)"]);
        assert!(fetch.signature.params[1].has_default);

        let prop = module.classes[0].find_method("base_url").unwrap();
        assert_eq!(prop.signature.decorators, vec!["property"]);
    }

    #[test]
    fn keyword_separator_is_not_a_parameter() {
        let source = r#"
def connect(host, *, port=5432, timeout: float = 5.0):
    pass
"#;
        let module = extract(source);
        let connect = module.find_function("connect").unwrap();
        let names: Vec<&str> = connect
            .signature
            .params
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["host", "port", "timeout"]);
        assert!(connect.signature.params[2].annotation.is_some());
    }

    #[test]
    fn literal_kinds_cover_common_expressions() {
        let mut parser = python_parser().unwrap();
        let source = "x = (\"a\", 1, 1.5, True, None, [1], {\"k\": 1}, {1, 2}, -3)\n";
        let tree = parser.parse(source, None).unwrap();
        let root = tree.root_node();
        let assign = root.named_child(0).unwrap().named_child(0).unwrap();
        let tuple = assign.child_by_field_name("right").unwrap();
        let mut cursor = tuple.walk();
        let kinds: Vec<LiteralKind> = tuple
            .named_children(&mut cursor)
            .map(|n| literal_kind_of(&n))
            .collect();
        assert_eq!(
            kinds,
            vec![
                LiteralKind::Str,
                LiteralKind::Int,
                LiteralKind::Float,
                LiteralKind::Bool,
                LiteralKind::NoneLit,
                LiteralKind::List,
                LiteralKind::Dict,
                LiteralKind::Set,
                LiteralKind::Int,
            ]
        );
    }

    #[test]
    fn finds_first_error_in_broken_source() {
        let mut parser = python_parser().unwrap();
        let source = "def broken(:\n    pass\n";
        let tree = parser.parse(source, None).unwrap();
        assert!(tree.root_node().has_error());
        let err = first_error_node(tree.root_node()).unwrap();
        assert!(err.is_error() || err.is_missing());
    }
}
