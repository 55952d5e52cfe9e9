use std::path::{Component, Path};

/// Derives dotted Python module paths from file locations under an ingest
/// root. When the root itself is a package (contains `__init__.py`), its
/// directory name prefixes every module path, matching how the package would
/// be imported.
#[derive(Debug, Clone)]
pub struct ModulePathResolver {
    prefix: Option<String>,
}

impl ModulePathResolver {
    pub fn new(root: &Path) -> Self {
        let prefix = if root.join("__init__.py").exists() {
            root.file_name()
                .and_then(|n| n.to_str())
                .map(|s| s.to_string())
        } else {
            None
        };
        Self { prefix }
    }

    /// Resolver for already-relative paths, used when no filesystem root is
    /// involved.
    pub fn without_prefix() -> Self {
        Self { prefix: None }
    }

    pub fn resolve(&self, root: &Path, file: &Path) -> String {
        let relative = file.strip_prefix(root).unwrap_or(file);
        self.resolve_relative(relative)
    }

    pub fn resolve_relative(&self, relative: &Path) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(prefix) = &self.prefix {
            parts.push(prefix.clone());
        }
        for component in relative.components() {
            if let Component::Normal(os) = component {
                if let Some(s) = os.to_str() {
                    parts.push(s.to_string());
                }
            }
        }
        if let Some(last) = parts.last_mut() {
            if let Some(stem) = last.strip_suffix(".py").or_else(|| last.strip_suffix(".pyi")) {
                *last = stem.to_string();
            }
        }
        if parts.last().map(|s| s.as_str()) == Some("__init__") {
            parts.pop();
        }
        if parts.is_empty() {
            // A bare __init__.py at a non-package root still needs a name.
            return "__init__".to_string();
        }
        parts.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn nested_file_becomes_dotted_path() {
        let resolver = ModulePathResolver::without_prefix();
        assert_eq!(
            resolver.resolve_relative(&PathBuf::from("pkg/util/helpers.py")),
            "pkg.util.helpers"
        );
    }

    #[test]
    fn init_names_the_package() {
        let resolver = ModulePathResolver::without_prefix();
        assert_eq!(
            resolver.resolve_relative(&PathBuf::from("pkg/__init__.py")),
            "pkg"
        );
    }

    #[test]
    fn top_level_module_is_its_stem() {
        let resolver = ModulePathResolver::without_prefix();
        assert_eq!(resolver.resolve_relative(&PathBuf::from("main.py")), "main");
    }

    #[test]
    fn stub_extension_is_stripped() {
        let resolver = ModulePathResolver::without_prefix();
        assert_eq!(
            resolver.resolve_relative(&PathBuf::from("pkg/types.pyi")),
            "pkg.types"
        );
    }

    #[test]
    fn package_root_prefixes_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("__init__.py"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/mod.py"), "x = 1\n").unwrap();

        let resolver = ModulePathResolver::new(dir.path());
        let pkg = dir.path().file_name().unwrap().to_str().unwrap();
        assert_eq!(
            resolver.resolve(dir.path(), &dir.path().join("sub/mod.py")),
            format!("{}.sub.mod", pkg)
        );
        assert_eq!(
            resolver.resolve(dir.path(), &dir.path().join("__init__.py")),
            pkg
        );
    }
}
