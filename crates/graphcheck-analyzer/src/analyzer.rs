use graphcheck_core::{CallSite, LiteralKind, ParsedModule, ResolvedTarget, Result, TargetScope};
use graphcheck_parser::{imports_of_statement, literal_kind_of, node_text, PythonParser};
use std::collections::HashMap;
use tree_sitter::Node;

/// Module path scripts are parsed under; their own definitions get
/// qualified names below it.
pub const SCRIPT_MODULE: &str = "__main__";

/// Names that belong to the language, not to any indexed repository.
/// Calls to these are not emitted as call sites unless the script rebinds
/// the name itself.
const PYTHON_BUILTINS: &[&str] = &[
    "abs", "all", "any", "ascii", "bin", "bool", "bytearray", "bytes", "callable", "chr",
    "classmethod", "compile", "complex", "delattr", "dict", "dir", "divmod", "enumerate", "eval",
    "exec", "filter", "float", "format", "frozenset", "getattr", "globals", "hasattr", "hash",
    "hex", "id", "input", "int", "isinstance", "issubclass", "iter", "len", "list", "locals",
    "map", "max", "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
    "property", "range", "repr", "reversed", "round", "set", "setattr", "slice", "sorted",
    "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip", "ArithmeticError",
    "AssertionError", "AttributeError", "BaseException", "ConnectionError", "Exception",
    "FileNotFoundError", "ImportError", "IndexError", "IOError", "KeyError", "KeyboardInterrupt",
    "LookupError", "MemoryError", "ModuleNotFoundError", "NameError", "NotImplementedError",
    "OSError", "OverflowError", "PermissionError", "RecursionError", "RuntimeError",
    "StopAsyncIteration", "StopIteration", "SystemExit", "TimeoutError", "TypeError",
    "UnboundLocalError", "UnicodeDecodeError", "UnicodeEncodeError", "ValueError",
    "ZeroDivisionError",
];

/// What a name in the script currently refers to.
#[derive(Debug, Clone, PartialEq)]
enum Binding {
    /// Fully-qualified path seeded from an import (module, class, or
    /// symbol; attribute chains extend it).
    Imported(String),
    /// Class or function defined in the script itself.
    Local(String),
    /// Instance produced by calling the named class; member calls resolve
    /// against that class.
    InstanceOf { class: String, scope: TargetScope },
}

#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
}

impl Scope {
    fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    fn unbind(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

/// Parsed script structure plus every call expression found in it, with
/// best-effort target resolution. Line-ordered.
#[derive(Debug)]
pub struct ScriptAnalysis {
    pub module: ParsedModule,
    pub calls: Vec<CallSite>,
}

/// Walks a script's syntax tree with a name-resolution scope: imports and
/// local definitions seed the table, assignments track instances, call
/// expressions are emitted as CallSites.
pub struct ScriptAnalyzer;

impl ScriptAnalyzer {
    pub fn analyze(script: &str) -> Result<ScriptAnalysis> {
        let (module, tree) = PythonParser::parse_with_tree(script, SCRIPT_MODULE, "<script>")?;
        let mut walker = CallWalker {
            content: script,
            calls: Vec::new(),
        };
        let mut scope = Scope::default();
        walker.walk(tree.root_node(), &mut scope);
        walker.calls.sort_by_key(|c| c.line);
        Ok(ScriptAnalysis {
            module,
            calls: walker.calls,
        })
    }
}

struct CallWalker<'a> {
    content: &'a str,
    calls: Vec<CallSite>,
}

impl<'a> CallWalker<'a> {
    fn walk(&mut self, node: Node<'a>, scope: &mut Scope) {
        match node.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                for import in imports_of_statement(node, self.content) {
                    if let (Some(bound), Some(target)) =
                        (import.bound_name(), import.qualified_target())
                    {
                        scope.bind(bound.to_string(), Binding::Imported(target));
                    }
                }
            }
            "class_definition" => self.handle_class(node, scope, None),
            "function_definition" => self.handle_function(node, scope, None),
            "decorated_definition" => {
                if let Some(def) = node.child_by_field_name("definition") {
                    self.walk(def, scope);
                }
            }
            "assignment" => self.handle_assignment(node, scope),
            "augmented_assignment" => {
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right, scope);
                }
            }
            "call" => self.handle_call(node, scope),
            "for_statement" => {
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right, scope);
                }
                if let Some(left) = node.child_by_field_name("left") {
                    self.unbind_pattern(left, scope);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body, scope);
                }
                if let Some(alternative) = node.child_by_field_name("alternative") {
                    self.walk(alternative, scope);
                }
            }
            "with_statement" => self.handle_with(node, scope),
            "lambda" => {
                let mut inner = scope.clone();
                if let Some(parameters) = node.child_by_field_name("parameters") {
                    for name in self.parameter_names(parameters) {
                        inner.unbind(&name);
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body, &mut inner);
                }
            }
            _ => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.walk(child, scope);
                }
            }
        }
    }

    fn handle_class(&mut self, node: Node<'a>, scope: &mut Scope, enclosing: Option<&str>) {
        let name = match node.child_by_field_name("name") {
            Some(n) => node_text(&n, self.content),
            None => return,
        };
        let qualified = match enclosing {
            Some(outer) => format!("{}.{}", outer, name),
            None => format!("{}.{}", SCRIPT_MODULE, name),
        };
        scope.bind(name, Binding::Local(qualified.clone()));

        let body = match node.child_by_field_name("body") {
            Some(b) => b,
            None => return,
        };
        // Class-body names are attributes, not enclosing-scope bindings.
        let mut class_scope = scope.clone();
        let mut cursor = body.walk();
        let children: Vec<Node> = body.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "function_definition" => {
                    self.handle_function(child, &mut class_scope, Some(&qualified))
                }
                "class_definition" => self.handle_class(child, &mut class_scope, Some(&qualified)),
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition") {
                        match def.kind() {
                            "function_definition" => {
                                self.handle_function(def, &mut class_scope, Some(&qualified))
                            }
                            "class_definition" => {
                                self.handle_class(def, &mut class_scope, Some(&qualified))
                            }
                            _ => {}
                        }
                    }
                }
                _ => self.walk(child, &mut class_scope),
            }
        }
    }

    fn handle_function(&mut self, node: Node<'a>, scope: &mut Scope, method_of: Option<&str>) {
        let name = match node.child_by_field_name("name") {
            Some(n) => node_text(&n, self.content),
            None => return,
        };
        let qualified = match method_of {
            Some(class) => format!("{}.{}", class, name),
            None => format!("{}.{}", SCRIPT_MODULE, name),
        };
        scope.bind(name, Binding::Local(qualified));

        let mut body_scope = scope.clone();
        if let Some(parameters) = node.child_by_field_name("parameters") {
            // Default values evaluate in the enclosing scope.
            self.walk(parameters, scope);
            for (index, param) in self.parameter_names(parameters).iter().enumerate() {
                body_scope.unbind(param);
                if index == 0 && (param == "self" || param == "cls") {
                    if let Some(class) = method_of {
                        body_scope.bind(
                            param.clone(),
                            Binding::InstanceOf {
                                class: class.to_string(),
                                scope: TargetScope::Local,
                            },
                        );
                    }
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body, &mut body_scope);
        }
    }

    fn handle_assignment(&mut self, node: Node<'a>, scope: &mut Scope) {
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right, scope);
        }
        let left = match node.child_by_field_name("left") {
            Some(l) => l,
            None => return,
        };
        match left.kind() {
            "identifier" => {
                let name = node_text(&left, self.content);
                let binding = node
                    .child_by_field_name("right")
                    .and_then(|right| self.binding_for_expr(right, scope))
                    .or_else(|| {
                        node.child_by_field_name("type")
                            .and_then(|t| self.binding_for_annotation(t, scope))
                    });
                match binding {
                    Some(binding) => scope.bind(name, binding),
                    None => scope.unbind(&name),
                }
            }
            "pattern_list" | "tuple_pattern" => self.unbind_pattern(left, scope),
            _ => {}
        }
    }

    fn handle_with(&mut self, node: Node<'a>, scope: &mut Scope) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            if child.kind() != "with_clause" {
                self.walk(child, scope);
                continue;
            }
            let mut item_cursor = child.walk();
            let items: Vec<Node> = child.named_children(&mut item_cursor).collect();
            for item in items {
                let value = match item.child_by_field_name("value").or_else(|| item.named_child(0))
                {
                    Some(v) => v,
                    None => continue,
                };
                if value.kind() == "as_pattern" {
                    let expr = value.named_child(0);
                    if let Some(expr) = expr {
                        self.walk(expr, scope);
                    }
                    let alias = value
                        .child_by_field_name("alias")
                        .and_then(|a| a.named_child(0).or(Some(a)))
                        .filter(|a| a.kind() == "identifier");
                    if let Some(alias) = alias {
                        let name = node_text(&alias, self.content);
                        match expr.and_then(|e| self.binding_for_expr(e, scope)) {
                            Some(binding) => scope.bind(name, binding),
                            None => scope.unbind(&name),
                        }
                    }
                } else {
                    self.walk(value, scope);
                }
            }
        }
    }

    fn handle_call(&mut self, node: Node<'a>, scope: &mut Scope) {
        if let Some(site) = self.extract_call(node, scope) {
            self.calls.push(site);
        }
        // Nested calls live in the callee expression (`make().run()`) and in
        // the arguments (`g(h(1))`); both get their own sites.
        if let Some(function) = node.child_by_field_name("function") {
            self.walk(function, scope);
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.walk(arguments, scope);
        }
    }

    fn extract_call(&mut self, node: Node<'a>, scope: &Scope) -> Option<CallSite> {
        let function = node.child_by_field_name("function")?;
        let callee_text = node_text(&function, self.content);
        let line = node.start_position().row as u32 + 1;

        if function.kind() == "identifier"
            && scope.get(&callee_text).is_none()
            && PYTHON_BUILTINS.contains(&callee_text.as_str())
        {
            return None;
        }

        let resolved = self.resolve_callee(&function, scope);

        let mut positional_count = 0;
        let mut keyword_names = Vec::new();
        let mut positional_literals = Vec::new();
        let mut keyword_literals = Vec::new();
        let mut uses_unpacking = false;
        if let Some(arguments) = node.child_by_field_name("arguments") {
            let mut cursor = arguments.walk();
            for child in arguments.named_children(&mut cursor) {
                match child.kind() {
                    "keyword_argument" => {
                        let name = child
                            .child_by_field_name("name")
                            .map(|n| node_text(&n, self.content))
                            .unwrap_or_default();
                        let kind = child
                            .child_by_field_name("value")
                            .map(|v| literal_kind_of(&v))
                            .unwrap_or(LiteralKind::Unknown);
                        keyword_names.push(name);
                        keyword_literals.push(kind);
                    }
                    "list_splat" | "dictionary_splat" => uses_unpacking = true,
                    "comment" => {}
                    _ => {
                        positional_count += 1;
                        positional_literals.push(literal_kind_of(&child));
                    }
                }
            }
        }

        Some(CallSite {
            callee_text,
            resolved,
            positional_count,
            keyword_names,
            positional_literals,
            keyword_literals,
            uses_unpacking,
            line,
        })
    }

    fn resolve_callee(&self, function: &Node<'a>, scope: &Scope) -> Option<ResolvedTarget> {
        match function.kind() {
            "identifier" => {
                let name = node_text(function, self.content);
                match scope.get(&name)? {
                    Binding::Imported(q) => Some(ResolvedTarget {
                        qualified_name: q.clone(),
                        scope: TargetScope::Imported,
                        via_instance: false,
                    }),
                    Binding::Local(q) => Some(ResolvedTarget {
                        qualified_name: q.clone(),
                        scope: TargetScope::Local,
                        via_instance: false,
                    }),
                    // Calling the instance itself goes through __call__,
                    // which is not tracked.
                    Binding::InstanceOf { .. } => None,
                }
            }
            "attribute" => {
                let mut attrs: Vec<String> = Vec::new();
                let mut current = *function;
                while current.kind() == "attribute" {
                    let attr = current.child_by_field_name("attribute")?;
                    attrs.push(node_text(&attr, self.content));
                    current = current.child_by_field_name("object")?;
                    while current.kind() == "parenthesized_expression" {
                        current = current.named_child(0)?;
                    }
                }
                attrs.reverse();
                let chain = attrs.join(".");

                match current.kind() {
                    "identifier" => {
                        let base = node_text(&current, self.content);
                        match scope.get(&base)? {
                            Binding::Imported(q) => Some(ResolvedTarget {
                                qualified_name: format!("{}.{}", q, chain),
                                scope: TargetScope::Imported,
                                via_instance: false,
                            }),
                            Binding::Local(q) => Some(ResolvedTarget {
                                qualified_name: format!("{}.{}", q, chain),
                                scope: TargetScope::Local,
                                via_instance: false,
                            }),
                            Binding::InstanceOf { class, scope: s } => Some(ResolvedTarget {
                                qualified_name: format!("{}.{}", class, chain),
                                scope: *s,
                                via_instance: true,
                            }),
                        }
                    }
                    "call" => {
                        let inner = current.child_by_field_name("function")?;
                        let constructed = self.resolve_callee(&inner, scope)?;
                        if constructed.via_instance {
                            return None;
                        }
                        Some(ResolvedTarget {
                            qualified_name: format!("{}.{}", constructed.qualified_name, chain),
                            scope: constructed.scope,
                            via_instance: true,
                        })
                    }
                    _ => None,
                }
            }
            "parenthesized_expression" => function
                .named_child(0)
                .and_then(|inner| self.resolve_callee(&inner, scope)),
            _ => None,
        }
    }

    fn binding_for_expr(&self, expr: Node<'a>, scope: &Scope) -> Option<Binding> {
        match expr.kind() {
            "call" => {
                let function = expr.child_by_field_name("function")?;
                let target = self.resolve_callee(&function, scope)?;
                // Method return types are not tracked; only direct
                // constructor-style calls yield a usable binding.
                if target.via_instance {
                    return None;
                }
                Some(Binding::InstanceOf {
                    class: target.qualified_name,
                    scope: target.scope,
                })
            }
            "identifier" => scope.get(&node_text(&expr, self.content)).cloned(),
            "attribute" => {
                let target = self.resolve_callee(&expr, scope)?;
                if target.via_instance {
                    return None;
                }
                match target.scope {
                    TargetScope::Imported => Some(Binding::Imported(target.qualified_name)),
                    TargetScope::Local => Some(Binding::Local(target.qualified_name)),
                }
            }
            "parenthesized_expression" => expr
                .named_child(0)
                .and_then(|inner| self.binding_for_expr(inner, scope)),
            "await" => expr
                .named_child(0)
                .and_then(|inner| self.binding_for_expr(inner, scope)),
            _ => None,
        }
    }

    /// A flat annotated declaration (`client: Client = ...`) binds the name
    /// to the annotated class when that class resolves through the table.
    /// Subscripted annotations are left alone.
    fn binding_for_annotation(&self, type_node: Node<'a>, scope: &Scope) -> Option<Binding> {
        let text = node_text(&type_node, self.content);
        let text = text.trim();
        if text.is_empty()
            || !text
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            return None;
        }
        let mut parts = text.split('.');
        let base = parts.next()?;
        let rest: Vec<&str> = parts.collect();

        let qualify = |q: &str| {
            if rest.is_empty() {
                q.to_string()
            } else {
                format!("{}.{}", q, rest.join("."))
            }
        };
        match scope.get(base)? {
            Binding::Imported(q) => Some(Binding::InstanceOf {
                class: qualify(q),
                scope: TargetScope::Imported,
            }),
            Binding::Local(q) => Some(Binding::InstanceOf {
                class: qualify(q),
                scope: TargetScope::Local,
            }),
            Binding::InstanceOf { .. } => None,
        }
    }

    fn unbind_pattern(&self, pattern: Node<'a>, scope: &mut Scope) {
        match pattern.kind() {
            "identifier" => scope.unbind(&node_text(&pattern, self.content)),
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                let mut cursor = pattern.walk();
                let children: Vec<Node> = pattern.named_children(&mut cursor).collect();
                for child in children {
                    self.unbind_pattern(child, scope);
                }
            }
            _ => {}
        }
    }

    fn parameter_names(&self, parameters: Node<'a>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = parameters.walk();
        let children: Vec<Node> = parameters.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "identifier" => names.push(node_text(&child, self.content)),
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        names.push(node_text(&name, self.content));
                    }
                }
                "typed_parameter" => {
                    if let Some(inner) = child.named_child(0) {
                        match inner.kind() {
                            "identifier" => names.push(node_text(&inner, self.content)),
                            "list_splat_pattern" | "dictionary_splat_pattern" => {
                                if let Some(id) = inner.named_child(0) {
                                    names.push(node_text(&id, self.content));
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    if let Some(id) = child.named_child(0) {
                        names.push(node_text(&id, self.content));
                    }
                }
                _ => {}
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(script: &str) -> ScriptAnalysis {
        ScriptAnalyzer::analyze(script).unwrap()
    }

    fn target(site: &CallSite) -> &ResolvedTarget {
        site.resolved
            .as_ref()
            .unwrap_or_else(|| panic!("call '{}' should resolve", site.callee_text))
    }

    #[test]
    fn imports_seed_the_symbol_table() {
        let script = r#"
import pkg.client
import numpy as np
from pkg.search import Searcher as S, helper

pkg.client.connect("host")
np.zeros(3)
S()
helper()
"#;
        let analysis = analyze(script);
        let targets: Vec<&str> = analysis
            .calls
            .iter()
            .map(|c| target(c).qualified_name.as_str())
            .collect();
        assert_eq!(
            targets,
            vec![
                "pkg.client.connect",
                "numpy.zeros",
                "pkg.search.Searcher",
                "pkg.search.helper",
            ]
        );
        assert!(analysis.calls.iter().all(|c| !target(c).via_instance));
    }

    #[test]
    fn instance_binding_resolves_member_calls() {
        let script = r#"
from pkg.client import Client

c = Client("host")
c.search("rust", limit=5)
"#;
        let analysis = analyze(script);
        assert_eq!(analysis.calls.len(), 2);

        let ctor = &analysis.calls[0];
        assert_eq!(target(ctor).qualified_name, "pkg.client.Client");
        assert_eq!(ctor.positional_count, 1);
        assert_eq!(ctor.positional_literals, vec![LiteralKind::Str]);

        let search = &analysis.calls[1];
        assert_eq!(target(search).qualified_name, "pkg.client.Client.search");
        assert!(target(search).via_instance);
        assert_eq!(search.positional_count, 1);
        assert_eq!(search.keyword_names, vec!["limit"]);
        assert_eq!(search.keyword_literals, vec![LiteralKind::Int]);
    }

    #[test]
    fn chained_constructor_calls_resolve_and_emit_both_sites() {
        let script = r#"
from pkg.client import Client

Client().ping()
"#;
        let analysis = analyze(script);
        assert_eq!(analysis.calls.len(), 2);
        let ping = analysis
            .calls
            .iter()
            .find(|c| c.callee_text == "Client().ping")
            .unwrap();
        assert_eq!(target(ping).qualified_name, "pkg.client.Client.ping");
        assert!(target(ping).via_instance);
        assert!(analysis
            .calls
            .iter()
            .any(|c| target(c).qualified_name == "pkg.client.Client" && !target(c).via_instance));
    }

    #[test]
    fn builtin_calls_are_not_emitted() {
        let analysis = analyze("print(len([1, 2]))\nisinstance(1, int)\n");
        assert!(analysis.calls.is_empty());
    }

    #[test]
    fn shadowed_builtin_is_emitted() {
        let script = r#"
from mytools import print

print("hello")
"#;
        let analysis = analyze(script);
        assert_eq!(analysis.calls.len(), 1);
        assert_eq!(target(&analysis.calls[0]).qualified_name, "mytools.print");
    }

    #[test]
    fn rebinding_clears_instance_tracking() {
        let script = r#"
from pkg.client import Client

c = Client()
c = unknown_factory()
c.search("x")
"#;
        let analysis = analyze(script);
        let search = analysis
            .calls
            .iter()
            .find(|c| c.callee_text == "c.search")
            .unwrap();
        assert!(search.resolved.is_none());
    }

    #[test]
    fn local_definitions_and_self_resolve_locally() {
        let script = r#"
class Greeter:
    def hello(self):
        self.wave()

    def wave(self):
        pass

def run():
    g = Greeter()
    g.hello()

run()
"#;
        let analysis = analyze(script);
        let by_text = |text: &str| {
            analysis
                .calls
                .iter()
                .find(|c| c.callee_text == text)
                .unwrap_or_else(|| panic!("missing call {}", text))
        };

        let wave = by_text("self.wave");
        assert_eq!(target(wave).qualified_name, "__main__.Greeter.wave");
        assert_eq!(target(wave).scope, TargetScope::Local);
        assert!(target(wave).via_instance);

        let ctor = by_text("Greeter");
        assert_eq!(target(ctor).qualified_name, "__main__.Greeter");

        let hello = by_text("g.hello");
        assert_eq!(target(hello).qualified_name, "__main__.Greeter.hello");

        let run = by_text("run");
        assert_eq!(target(run).qualified_name, "__main__.run");
        assert_eq!(target(run).scope, TargetScope::Local);
    }

    #[test]
    fn module_attribute_chains_extend_the_import_path() {
        let script = r#"
import pkg.sub as ps

ps.helper.run(1, 2)
"#;
        let analysis = analyze(script);
        let run = &analysis.calls[0];
        assert_eq!(target(run).qualified_name, "pkg.sub.helper.run");
        assert_eq!(target(run).scope, TargetScope::Imported);
        assert!(!target(run).via_instance);
        assert_eq!(run.positional_count, 2);
    }

    #[test]
    fn unpacked_arguments_set_the_flag() {
        let script = r#"
from pkg.util import merge

merge(*parts, **extras)
"#;
        let analysis = analyze(script);
        let merge = &analysis.calls[0];
        assert!(merge.uses_unpacking);
        assert_eq!(merge.positional_count, 0);
        assert!(merge.keyword_names.is_empty());
    }

    #[test]
    fn loop_variables_do_not_keep_stale_bindings() {
        let script = r#"
from pkg.client import Client

c = Client()
for c in load_all():
    c.search("x")
"#;
        let analysis = analyze(script);
        let search = analysis
            .calls
            .iter()
            .find(|c| c.callee_text == "c.search")
            .unwrap();
        assert!(search.resolved.is_none());
    }

    #[test]
    fn with_as_binds_the_constructed_instance() {
        let script = r#"
from pkg.client import Client

with Client("host") as c:
    c.search("x")
"#;
        let analysis = analyze(script);
        let search = analysis
            .calls
            .iter()
            .find(|c| c.callee_text == "c.search")
            .unwrap();
        assert_eq!(target(search).qualified_name, "pkg.client.Client.search");
        assert!(target(search).via_instance);
    }

    #[test]
    fn annotated_declarations_bind_the_annotation_type() {
        let script = r#"
from pkg.client import Client

c: Client = make_somehow()
c.search("x")
"#;
        let analysis = analyze(script);
        let search = analysis
            .calls
            .iter()
            .find(|c| c.callee_text == "c.search")
            .unwrap();
        assert_eq!(target(search).qualified_name, "pkg.client.Client.search");
    }

    #[test]
    fn function_parameters_shadow_outer_bindings() {
        let script = r#"
from pkg.client import Client

def use(client):
    client.search("x")
"#;
        let analysis = analyze(script);
        let search = analysis
            .calls
            .iter()
            .find(|c| c.callee_text == "client.search")
            .unwrap();
        assert!(search.resolved.is_none(), "parameter types are unknown");
    }
}
