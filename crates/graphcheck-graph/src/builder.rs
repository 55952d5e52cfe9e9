use graphcheck_core::{
    ClassDef, EdgeKind, FunctionDef, GraphNode, ParsedModule, RepositoryIdentity, SymbolKind,
};

/// Turns parsed modules into the node batch an ingest persists. Every node
/// except the repository root carries exactly one parent edge:
/// Repository -CONTAINS-> File, File -DEFINES-> top-level Class/Function,
/// File -CONTAINS-> nested Class, Class -HAS_METHOD-> Method,
/// Class -HAS_ATTRIBUTE-> Attribute.
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn build(repository: &RepositoryIdentity, modules: &[ParsedModule]) -> Vec<GraphNode> {
        let mut nodes = Vec::new();
        nodes.push(GraphNode::new(
            &repository.name,
            &repository.name,
            SymbolKind::Repository,
        ));

        for module in modules {
            nodes.push(Self::file_node(&repository.name, module));
            for function in &module.functions {
                nodes.push(Self::function_node(
                    module,
                    function,
                    SymbolKind::Function,
                    &module.module_path,
                    EdgeKind::Defines,
                ));
            }
            for class in &module.classes {
                Self::collect_class(module, class, &mut nodes);
            }
        }
        nodes
    }

    fn file_node(repository: &str, module: &ParsedModule) -> GraphNode {
        let name = module
            .module_path
            .rsplit('.')
            .next()
            .unwrap_or(&module.module_path)
            .to_string();
        let mut node = GraphNode::new(&module.module_path, name, SymbolKind::File)
            .with_parent(repository, EdgeKind::Contains);
        node.file_path = Some(module.file_path.clone());
        node
    }

    fn collect_class(module: &ParsedModule, class: &ClassDef, nodes: &mut Vec<GraphNode>) {
        let edge = if class.nested {
            EdgeKind::Contains
        } else {
            EdgeKind::Defines
        };
        nodes.push(
            GraphNode::new(&class.qualified_name, &class.name, SymbolKind::Class)
                .with_parent(&module.module_path, edge)
                .with_location(&module.file_path, class.line)
                .with_bases(class.bases.clone()),
        );

        for method in &class.methods {
            nodes.push(Self::function_node(
                module,
                method,
                SymbolKind::Method,
                &class.qualified_name,
                EdgeKind::HasMethod,
            ));
        }
        for attribute in &class.attributes {
            let mut node =
                GraphNode::new(&attribute.qualified_name, &attribute.name, SymbolKind::Attribute)
                    .with_parent(&class.qualified_name, EdgeKind::HasAttribute)
                    .with_location(&module.file_path, attribute.line);
            node.type_annotation = attribute.type_annotation.clone();
            nodes.push(node);
        }
    }

    fn function_node(
        module: &ParsedModule,
        function: &FunctionDef,
        kind: SymbolKind,
        parent: &str,
        edge: EdgeKind,
    ) -> GraphNode {
        GraphNode::new(&function.qualified_name, &function.name, kind)
            .with_parent(parent, edge)
            .with_location(&module.file_path, function.line)
            .with_signature(function.signature.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcheck_parser::PythonParser;

    const SOURCE: &str = r#"
class Searcher:
    retries: int = 3

    def search(self, query, limit=10):
        return []

    class Options:
        def validate(self):
            pass

def top_level(x):
    return x
"#;

    fn build_nodes() -> Vec<GraphNode> {
        let module =
            PythonParser::parse_content(SOURCE, "pkg.search", "pkg/search.py").unwrap();
        let repo = RepositoryIdentity::new("repo", "/tmp/repo");
        GraphBuilder::build(&repo, &[module])
    }

    fn find<'a>(nodes: &'a [GraphNode], qualified: &str) -> &'a GraphNode {
        nodes
            .iter()
            .find(|n| n.qualified_name == qualified)
            .unwrap_or_else(|| panic!("missing node {}", qualified))
    }

    #[test]
    fn repository_and_file_nodes_anchor_the_tree() {
        let nodes = build_nodes();

        let root = find(&nodes, "repo");
        assert_eq!(root.kind, SymbolKind::Repository);
        assert!(root.parent.is_none());

        let file = find(&nodes, "pkg.search");
        assert_eq!(file.kind, SymbolKind::File);
        assert_eq!(file.parent.as_deref(), Some("repo"));
        assert_eq!(file.parent_edge, Some(EdgeKind::Contains));
        assert_eq!(file.file_path.as_deref(), Some("pkg/search.py"));
    }

    #[test]
    fn top_level_symbols_hang_off_the_file_with_defines() {
        let nodes = build_nodes();

        let class = find(&nodes, "pkg.search.Searcher");
        assert_eq!(class.parent_edge, Some(EdgeKind::Defines));

        let function = find(&nodes, "pkg.search.top_level");
        assert_eq!(function.kind, SymbolKind::Function);
        assert_eq!(function.parent_edge, Some(EdgeKind::Defines));
        assert!(function.signature.is_some());
    }

    #[test]
    fn class_members_use_their_own_edge_kinds() {
        let nodes = build_nodes();

        let method = find(&nodes, "pkg.search.Searcher.search");
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.parent.as_deref(), Some("pkg.search.Searcher"));
        assert_eq!(method.parent_edge, Some(EdgeKind::HasMethod));
        let signature = method.signature.as_ref().unwrap();
        assert_eq!(signature.params.len(), 3);

        let attribute = find(&nodes, "pkg.search.Searcher.retries");
        assert_eq!(attribute.parent_edge, Some(EdgeKind::HasAttribute));
        assert_eq!(attribute.type_annotation.as_deref(), Some("int"));
    }

    #[test]
    fn nested_classes_are_contained_by_the_file() {
        let nodes = build_nodes();

        let nested = find(&nodes, "pkg.search.Searcher.Options");
        assert_eq!(nested.kind, SymbolKind::Class);
        assert_eq!(nested.parent.as_deref(), Some("pkg.search"));
        assert_eq!(nested.parent_edge, Some(EdgeKind::Contains));

        let nested_method = find(&nodes, "pkg.search.Searcher.Options.validate");
        assert_eq!(
            nested_method.parent.as_deref(),
            Some("pkg.search.Searcher.Options")
        );
    }
}
