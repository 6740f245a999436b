//! Replay runner.
//!
//! Convention:
//!   <specs>/*.json    -- one extracted document per spec file
//!   <specs>/_*.json   -- run artifacts (flagged list, stats), never replayed
//!
//! Each test case becomes one TAP line named `file > description...`.

use std::path::Path;

use specport_core::{SpecDocument, TestCase};

use crate::client::{build_request, Target};
use crate::error::ReplayError;
use crate::load::load_specs;
use crate::matchers::check_response;
use crate::options::ReplayOptions;
use crate::tap::{Tap, TapSummary};

pub struct RunResult {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl From<TapSummary> for RunResult {
    fn from(s: TapSummary) -> Self {
        RunResult {
            passed: s.pass,
            failed: s.fail,
            skipped: s.skip,
        }
    }
}

/// Load the specs under `dir`, replay them against `target`, print TAP.
pub fn replay_dir(
    dir: &Path,
    target: &Target,
    options: &ReplayOptions,
) -> Result<RunResult, ReplayError> {
    let specs = load_specs(dir, options)?;
    let mut tap = Tap::new();
    run_specs(&specs, target, options, &mut tap);
    let summary = tap.finish().map_err(|source| ReplayError::Io {
        path: "<stdout>".into(),
        source,
    })?;
    Ok(summary.into())
}

/// Replay already-loaded specs into `tap`.
pub fn run_specs(specs: &[SpecDocument], target: &Target, options: &ReplayOptions, tap: &mut Tap) {
    for spec in specs {
        for tc in &spec.tests {
            run_test(&spec.file, tc, target, options, tap);
        }
    }
}

fn run_test(file: &str, tc: &TestCase, target: &Target, options: &ReplayOptions, tap: &mut Tap) {
    let full_desc = tc.description.join(" > ");
    let test_name = format!("{} > {}", file, full_desc);

    if options.skips_test(&full_desc) {
        tap.skip(test_name);
        return;
    }

    let req = build_request(&tc.request);
    let resp = match target.execute(&req) {
        Ok(r) => r,
        Err(e) => {
            tap.not_ok(&test_name, format!("request failed: {}", e));
            return;
        }
    };

    let mismatches = check_response(&resp, &tc.expected);
    if mismatches.is_empty() {
        tap.ok(test_name);
    } else {
        tracing::debug!(test = %test_name, count = mismatches.len(), "assertion mismatches");
        let diag = mismatches
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        tap.not_ok(
            test_name,
            format!("{} {}\n{}", req.method, req.path, diag),
        );
    }
}
