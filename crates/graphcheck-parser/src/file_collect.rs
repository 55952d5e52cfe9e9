use crate::language::is_python_source;
use graphcheck_core::{GraphCheckError, Result};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration for source-tree file collection
#[derive(Debug, Clone)]
pub struct FileCollectionConfig {
    pub recursive: bool,
    /// Files larger than this are left out of the collection result and
    /// reported by the caller.
    pub max_file_size_bytes: u64,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for FileCollectionConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_file_size_bytes: 5 * 1024 * 1024,
            include_patterns: vec![],
            exclude_patterns: vec![],
        }
    }
}

/// Directories that never contain first-party Python source.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/__pycache__/**",
    "**/.git/**",
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/venv/**",
    "**/.venv/**",
    "**/env/**",
    "**/.mypy_cache/**",
    "**/.pytest_cache/**",
    "**/.tox/**",
    "**/.eggs/**",
    "**/*.egg-info/**",
    "**/site-packages/**",
    "**/.graphcheck/**",
];

/// Collect Python source files under `dir`, honoring gitignore rules plus
/// the default and configured exclusions. Returns paths with their sizes.
pub fn collect_python_files(
    dir: &Path,
    config: &FileCollectionConfig,
) -> Result<Vec<(PathBuf, u64)>> {
    info!("Collecting Python files from: {:?}", dir);

    let mut ovr = OverrideBuilder::new(dir);

    for exclude in DEFAULT_EXCLUDES {
        let _ = ovr.add(&format!("!{}", exclude));
    }

    for exclude in &config.exclude_patterns {
        let pattern = if exclude.starts_with('!') {
            exclude.clone()
        } else {
            format!("!{}", exclude)
        };
        let _ = ovr.add(&pattern);
        debug!("Added exclude pattern: {}", pattern);
    }

    for include in &config.include_patterns {
        let _ = ovr.add(include);
        debug!("Added include pattern: {}", include);
    }

    let overrides = ovr
        .build()
        .map_err(|e| GraphCheckError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let mut walker_builder = WalkBuilder::new(dir);
    walker_builder
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .ignore(true)
        .overrides(overrides);

    if !config.recursive {
        walker_builder.max_depth(Some(1));
        debug!("Non-recursive: limited to depth 1");
    }

    let walker = walker_builder.build();

    let mut paths = Vec::new();
    let mut total_files = 0;

    for dent in walker {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                warn!("Walker error: {}", e);
                continue;
            }
        };

        let path = dent.path();
        if !path.is_file() {
            continue;
        }
        total_files += 1;

        if !is_python_source(path) {
            continue;
        }

        let size = dent.metadata().map(|m| m.len()).unwrap_or(0);
        paths.push((path.to_path_buf(), size));
    }

    // Deterministic ingest order regardless of directory iteration order.
    paths.sort();

    info!(
        "File collection complete: {} files seen, {} Python sources",
        total_files,
        paths.len()
    );

    Ok(paths)
}
