use std::path::Path;

use anyhow::Context;
use specport_replay::{replay_dir, ReplayError, ReplayOptions, Target};

/// Replay the specs under `specs_dir`. `Ok(false)` when any test failed.
pub(crate) fn cmd_replay(
    specs_dir: &Path,
    config: Option<&Path>,
    overrides: ReplayOptions,
) -> anyhow::Result<bool> {
    let options = match config {
        Some(path) => ReplayOptions::load(path)?.merge(overrides),
        None => overrides,
    };
    let url = options.target.clone().ok_or(ReplayError::MissingTarget)?;
    tracing::debug!(target_url = %url, "replaying");

    let result = replay_dir(specs_dir, &Target::base_url(url), &options)
        .with_context(|| format!("replay of {} failed", specs_dir.display()))?;

    if result.failed > 0 {
        eprintln!(
            "{} failed, {} passed, {} skipped",
            result.failed, result.passed, result.skipped
        );
    }
    Ok(result.failed == 0)
}
