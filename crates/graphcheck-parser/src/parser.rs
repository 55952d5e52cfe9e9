use crate::extract::{first_error_node, ModuleExtractor};
use crate::file_collect::{collect_python_files, FileCollectionConfig};
use crate::language::python_parser;
use crate::module_path::ModulePathResolver;
use graphcheck_core::{GraphCheckError, ParsedModule, Result, SkippedFile};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Python source parser. Parsing itself is synchronous and pure; directory
/// parsing fans out over blocking worker tasks bounded by a semaphore.
pub struct PythonParser {
    max_concurrent: usize,
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of parsing one source tree. Per-file parse failures land in
/// `skipped`, never abort the batch.
#[derive(Debug, Default)]
pub struct DirectoryParse {
    pub modules: Vec<ParsedModule>,
    pub skipped: Vec<SkippedFile>,
    pub files_collected: usize,
}

impl PythonParser {
    pub fn new() -> Self {
        Self {
            max_concurrent: num_cpus::get().min(8),
        }
    }

    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrent = workers.max(1);
        self
    }

    /// Parse file content into its structural summary. Fails only on
    /// malformed source, with the first syntax error located.
    pub fn parse_content(
        content: &str,
        module_path: &str,
        file_path: &str,
    ) -> Result<ParsedModule> {
        let tree = Self::parse_tree(content, file_path)?;
        Ok(ModuleExtractor::extract(&tree, content, module_path, file_path))
    }

    /// Parse content and keep the syntax tree, for callers that walk call
    /// sites after extraction.
    pub fn parse_with_tree(
        content: &str,
        module_path: &str,
        file_path: &str,
    ) -> Result<(ParsedModule, tree_sitter::Tree)> {
        let tree = Self::parse_tree(content, file_path)?;
        let module = ModuleExtractor::extract(&tree, content, module_path, file_path);
        Ok((module, tree))
    }

    fn parse_tree(content: &str, file_path: &str) -> Result<tree_sitter::Tree> {
        let mut parser = python_parser()?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| GraphCheckError::Parse {
                path: file_path.to_string(),
                line: 0,
                column: 0,
                message: "parser produced no tree".to_string(),
            })?;
        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error_node(root)
                .map(|n| {
                    (
                        n.start_position().row as u32 + 1,
                        n.start_position().column as u32,
                    )
                })
                .unwrap_or((0, 0));
            return Err(GraphCheckError::Parse {
                path: file_path.to_string(),
                line,
                column,
                message: "invalid syntax".to_string(),
            });
        }
        Ok(tree)
    }

    /// Read and parse one file, off the async runtime's core threads.
    pub async fn parse_file(
        &self,
        root: &Path,
        file: &Path,
        resolver: &ModulePathResolver,
    ) -> Result<ParsedModule> {
        let content = fs::read_to_string(file).await.map_err(GraphCheckError::Io)?;
        let module_path = resolver.resolve(root, file);
        let file_path = file.to_string_lossy().to_string();
        tokio::task::spawn_blocking(move || {
            Self::parse_content(&content, &module_path, &file_path)
        })
        .await
        .map_err(|e| GraphCheckError::InvalidOperation(format!("parse task failed: {}", e)))?
    }

    /// Parse every Python file under `dir`. Files that fail to read or
    /// parse are recorded as skipped; the rest of the batch continues.
    pub async fn parse_directory(
        &self,
        dir: &Path,
        collection: &FileCollectionConfig,
    ) -> Result<DirectoryParse> {
        let started = Instant::now();
        let files = collect_python_files(dir, collection)?;
        let resolver = ModulePathResolver::new(dir);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut result = DirectoryParse {
            files_collected: files.len(),
            ..Default::default()
        };

        let mut handles = Vec::new();
        for (path, size) in files {
            if size > collection.max_file_size_bytes {
                warn!("Skipping oversized file ({} bytes): {:?}", size, path);
                result.skipped.push(SkippedFile {
                    path: path.to_string_lossy().to_string(),
                    reason: format!("file exceeds size limit ({} bytes)", size),
                });
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let resolver = resolver.clone();
            let root = dir.to_path_buf();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|_| {
                    GraphCheckError::InvalidOperation("parse semaphore closed".to_string())
                })?;
                let content = fs::read_to_string(&path)
                    .await
                    .map_err(GraphCheckError::Io)?;
                let module_path = resolver.resolve(&root, &path);
                let file_path = path.to_string_lossy().to_string();
                tokio::task::spawn_blocking(move || {
                    PythonParser::parse_content(&content, &module_path, &file_path)
                })
                .await
                .map_err(|e| {
                    GraphCheckError::InvalidOperation(format!("parse task failed: {}", e))
                })?
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(module)) => {
                    debug!("Parsed module {}", module.module_path);
                    result.modules.push(module);
                }
                Ok(Err(e)) => {
                    let (path, reason) = match &e {
                        GraphCheckError::Parse { path, .. } => (path.clone(), e.to_string()),
                        other => (String::new(), other.to_string()),
                    };
                    warn!("Skipping file: {}", reason);
                    result.skipped.push(SkippedFile { path, reason });
                }
                Err(join_err) => {
                    warn!("Parse task aborted: {}", join_err);
                    result.skipped.push(SkippedFile {
                        path: String::new(),
                        reason: format!("parse task aborted: {}", join_err),
                    });
                }
            }
        }

        info!(
            "Parsed {}/{} files in {:.2}s ({} skipped)",
            result.modules.len(),
            result.files_collected,
            started.elapsed().as_secs_f64(),
            result.skipped.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    #[test]
    fn parse_content_reports_syntax_error_location() {
        let err = PythonParser::parse_content("def broken(:\n    pass\n", "bad", "bad.py")
            .expect_err("syntax error should fail the parse");
        match err {
            GraphCheckError::Parse { path, line, .. } => {
                assert_eq!(path, "bad.py");
                assert!(line >= 1, "error should carry a 1-based line");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn parse_directory_collects_modules_and_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::create_dir(dir.path().join("pkg")).unwrap();
        std_fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        std_fs::write(
            dir.path().join("pkg/models.py"),
            "class User:\n    def rename(self, new_name):\n        self.name = new_name\n",
        )
        .unwrap();
        std_fs::write(dir.path().join("broken.py"), "def broken(:\n    pass\n").unwrap();

        let parser = PythonParser::new().with_concurrency(2);
        let parsed = parser
            .parse_directory(dir.path(), &FileCollectionConfig::default())
            .await
            .unwrap();

        assert_eq!(parsed.files_collected, 3);
        assert_eq!(parsed.modules.len(), 2, "broken file should be skipped");
        assert_eq!(parsed.skipped.len(), 1);
        assert!(parsed.skipped[0].path.ends_with("broken.py"));

        let models = parsed
            .modules
            .iter()
            .find(|m| m.module_path == "pkg.models")
            .expect("pkg.models should be parsed");
        assert_eq!(models.classes[0].qualified_name, "pkg.models.User");
    }

    #[tokio::test]
    async fn parse_directory_skips_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("big.py"), "x = 1\n".repeat(100)).unwrap();
        std_fs::write(dir.path().join("small.py"), "x = 1\n").unwrap();

        let collection = FileCollectionConfig {
            max_file_size_bytes: 64,
            ..Default::default()
        };
        let parser = PythonParser::new();
        let parsed = parser.parse_directory(dir.path(), &collection).await.unwrap();

        assert_eq!(parsed.modules.len(), 1);
        assert_eq!(parsed.modules[0].module_path, "small");
        assert_eq!(parsed.skipped.len(), 1);
        assert!(parsed.skipped[0].reason.contains("size limit"));
    }
}
