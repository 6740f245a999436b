use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;
use serde::Serialize;
use specport_core::{
    extract_file, parse_config_map, ConfigMap, FlaggedEntry, ParseResult, RunStats,
};

const SPEC_SUFFIX: &str = "Spec.hs";
const FLAGGED_FILE: &str = "_flagged.json";
const STATS_FILE: &str = "_stats.json";

/// Output file stem: `AndOrParamsSpec` -> `and-or-params`.
pub(crate) fn kebab_name(stem: &str) -> String {
    let base = stem.strip_suffix("Spec").unwrap_or(stem);
    let mut out = String::with_capacity(base.len() + 4);
    let mut prev_lower = false;
    for c in base.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push('-');
        }
        prev_lower = c.is_ascii_lowercase();
        out.push(c.to_ascii_lowercase());
    }
    out
}

fn spec_files(upstream: &Path) -> anyhow::Result<Vec<String>> {
    let entries = fs::read_dir(upstream)
        .with_context(|| format!("cannot read upstream directory {}", upstream.display()))?;
    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(SPEC_SUFFIX))
        .collect();
    names.sort();
    Ok(names)
}

fn load_config_map(upstream: &Path) -> anyhow::Result<ConfigMap> {
    let main_hs = upstream.join("Main.hs");
    if !main_hs.exists() {
        tracing::warn!(path = %main_hs.display(), "no Main.hs, every spec runs as default");
        return Ok(ConfigMap::new());
    }
    let src = fs::read_to_string(&main_hs)
        .with_context(|| format!("cannot read {}", main_hs.display()))?;
    Ok(parse_config_map(&src))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("cannot serialize {}", path.display()))?;
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}

struct Extracted {
    /// File name without `.hs`, e.g. `QuerySpec`.
    stem: String,
    result: ParseResult,
}

pub(crate) fn cmd_extract(upstream: &Path, output: &Path, quiet: bool) -> anyhow::Result<()> {
    let config_map = load_config_map(upstream)?;
    let files = spec_files(upstream)?;
    fs::create_dir_all(output)
        .with_context(|| format!("cannot create output directory {}", output.display()))?;

    // Parsing is pure per file; collect keeps the sorted order. A file that
    // cannot be read is logged and left out of every output.
    let extracted: Vec<Extracted> = files
        .par_iter()
        .filter_map(|name| {
            let path: PathBuf = upstream.join(name);
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "skipping unreadable spec file"
                    );
                    return None;
                }
            };
            let stem = name.trim_end_matches(".hs").to_owned();
            let config = config_map.config_for(&stem);
            let result = extract_file(name, &source, config);
            Some(Extracted { stem, result })
        })
        .collect();

    let mut flagged = Vec::new();
    let mut stats = RunStats::default();

    for Extracted { stem, result } in extracted {
        let out_path = output.join(format!("{}.json", kebab_name(&stem)));
        write_json(&out_path, &result.to_document())?;

        stats.record(&stem, &result);
        tracing::info!(
            file = %stem,
            config = %result.config,
            tests = result.tests.len(),
            flagged = result.flagged.len(),
            "wrote {}",
            out_path.display()
        );
        if !quiet {
            println!(
                "{}: {} tests, {} flagged",
                stem,
                result.tests.len(),
                result.flagged.len()
            );
        }

        flagged.extend(result.flagged.into_iter().map(|f| FlaggedEntry {
            flagged: f,
            file: stem.clone(),
        }));
    }

    write_json(&output.join(FLAGGED_FILE), &flagged)?;
    write_json(&output.join(STATS_FILE), &stats)?;

    if !quiet {
        println!(
            "\nTotal: {} tests, {} flagged across {} files",
            stats.total_tests, stats.total_flagged, stats.total_files
        );
    }
    Ok(())
}
