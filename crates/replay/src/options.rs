//! Replay options: which specs and tests to run, and where.

use std::path::Path;

use serde::Deserialize;

use crate::error::ReplayError;

/// Filters and target for one replay run.
///
/// Loadable from TOML:
///
/// ```toml
/// target = "http://localhost:3000"
/// only = ["query"]
/// skip = ["unicode"]
/// skip_tests = ["Range requests > counts exactly"]
/// skip_configs = ["max-rows", "plan-enabled"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayOptions {
    /// Base URL of the service under test.
    pub target: Option<String>,
    /// Run only spec files whose name contains one of these
    /// (case-insensitive).
    pub only: Vec<String>,
    /// Skip spec files whose name contains one of these (case-insensitive).
    pub skip: Vec<String>,
    /// Skip tests whose ` > `-joined description contains one of these.
    pub skip_tests: Vec<String>,
    /// Skip spec files extracted under one of these configurations.
    pub skip_configs: Vec<String>,
}

impl ReplayOptions {
    pub fn from_toml_str(src: &str, path: &Path) -> Result<Self, ReplayError> {
        toml::from_str(src).map_err(|source| ReplayError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let src = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src, path)
    }

    /// Overlay `other` on top of `self`: a set target replaces ours and
    /// non-empty lists replace ours.
    pub fn merge(mut self, other: ReplayOptions) -> Self {
        if other.target.is_some() {
            self.target = other.target;
        }
        for (mine, theirs) in [
            (&mut self.only, other.only),
            (&mut self.skip, other.skip),
            (&mut self.skip_tests, other.skip_tests),
            (&mut self.skip_configs, other.skip_configs),
        ] {
            if !theirs.is_empty() {
                *mine = theirs;
            }
        }
        self
    }

    /// Whether a spec file named `file` passes the `only`/`skip` filters.
    pub fn includes_file(&self, file: &str) -> bool {
        let file = file.to_lowercase();
        let hit = |p: &String| file.contains(&p.to_lowercase());
        (self.only.is_empty() || self.only.iter().any(hit)) && !self.skip.iter().any(hit)
    }

    pub fn skips_config(&self, config: &str) -> bool {
        self.skip_configs.iter().any(|c| c == config)
    }

    pub fn skips_test(&self, full_description: &str) -> bool {
        self.skip_tests
            .iter()
            .any(|p| full_description.contains(p.as_str()))
    }
}
