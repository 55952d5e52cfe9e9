use graphcheck_core::{GraphCheckError, Result};
use std::path::Path;
use tree_sitter::Parser;

/// Extensions treated as Python source.
const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

pub fn is_python_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| PYTHON_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Construct a tree-sitter parser configured for the Python grammar.
pub fn python_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| {
            GraphCheckError::InvalidOperation(format!("failed to load Python grammar: {}", e))
        })?;
    Ok(parser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_python_extensions() {
        assert!(is_python_source(Path::new("pkg/mod.py")));
        assert!(is_python_source(Path::new("stubs/mod.pyi")));
        assert!(!is_python_source(Path::new("readme.md")));
        assert!(!is_python_source(Path::new("Makefile")));
    }

    #[test]
    fn parser_loads_grammar() {
        let mut parser = python_parser().unwrap();
        let tree = parser.parse("x = 1\n", None).unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }
}
