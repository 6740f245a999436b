//! Reading extracted spec documents from disk.

use std::path::{Path, PathBuf};

use specport_core::SpecDocument;

use crate::error::ReplayError;
use crate::options::ReplayOptions;

/// Every `*.json` in `dir` whose name does not start with `_`, sorted.
pub fn spec_paths(dir: &Path) -> Result<Vec<PathBuf>, ReplayError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ReplayError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            let name = p.file_name().unwrap_or_default().to_string_lossy();
            p.extension().and_then(|e| e.to_str()) == Some("json") && !name.starts_with('_')
        })
        .collect();
    paths.sort();
    Ok(paths)
}

pub fn read_spec(path: &Path) -> Result<SpecDocument, ReplayError> {
    let src = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&src).map_err(|source| ReplayError::InvalidSpec {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every spec in `dir` that passes the file and config filters.
pub fn load_specs(dir: &Path, options: &ReplayOptions) -> Result<Vec<SpecDocument>, ReplayError> {
    let mut specs = Vec::new();
    for path in spec_paths(dir)? {
        let spec = read_spec(&path)?;
        if !options.includes_file(&spec.file) {
            tracing::debug!(file = %spec.file, "filtered out by only/skip");
            continue;
        }
        if options.skips_config(&spec.config) {
            tracing::debug!(file = %spec.file, config = %spec.config, "config skipped");
            continue;
        }
        specs.push(spec);
    }
    tracing::info!(count = specs.len(), dir = %dir.display(), "loaded specs");
    Ok(specs)
}
