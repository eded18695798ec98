//! Collate the `home*.json` dumps of a directory into one `home-collated.json`.
//!
//! Each dump is an object with a `data` array. Dumps are read in file name
//! order and their arrays concatenated; the merged array is written back as
//! `{ "data": [...] }`. Any read or parse failure aborts before the output is
//! touched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

/// File names picked up as inputs.
pub const HOME_DUMP_PATTERN: &str = r"^home.*\.json$";

/// Name of the merged output, written next to the inputs.
pub const COLLATED_FILE_NAME: &str = "home-collated.json";

/// One dump file. Top-level fields other than `data` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeDump {
    pub data: Vec<Value>,
}

/// Outcome of a full run over one directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CollateSummary {
    pub inputs: Vec<PathBuf>,
    pub items: usize,
    pub output: PathBuf,
}

/// Matching entries directly under `dir`, sorted by file name.
///
/// Directories are skipped. Any other matching entry is an input, and one
/// whose metadata cannot be read (a dangling symlink, say) fails the listing.
pub fn find_home_dumps(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(HOME_DUMP_PATTERN)?;

    let entries =
        fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;

    let mut names = Vec::<String>::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;

        // non UTF-8 names cannot match
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !pattern.is_match(&name) {
            continue;
        }
        let path = entry.path();
        let meta =
            fs::metadata(&path).with_context(|| format!("reading {}", path.display()))?;
        if meta.is_dir() {
            debug!("skipping {name}: directory");
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// Read and parse a single dump.
///
/// Duplicate top-level keys are accepted; the last `data` wins.
pub fn read_home_dump(path: &Path) -> Result<HomeDump> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let json: Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;

    let data = match json {
        Value::Object(mut map) => map.remove("data"),
        _ => None,
    };
    let data = match data {
        Some(Value::Array(arr)) => arr,
        Some(other) => bail!(
            "parsing {}: `data` is not an array (found {})",
            path.display(),
            other
        ),
        None => bail!("parsing {}: missing `data` field", path.display()),
    };

    debug!("{}: {} item(s)", path.display(), data.len());
    Ok(HomeDump { data })
}

/// Concatenate the `data` arrays of `paths`, in the given order.
///
/// Stops at the first file that cannot be read or parsed.
pub fn collate(paths: &[PathBuf]) -> Result<HomeDump> {
    let mut merged = HomeDump::default();

    for path in paths {
        if path.file_name().and_then(|n| n.to_str()) == Some(COLLATED_FILE_NAME) {
            warn!(
                "{} is a previous collation output and will be merged again",
                path.display()
            );
        }
        let dump = read_home_dump(path)?;
        merged.data.extend(dump.data);
    }

    Ok(merged)
}

/// Write `dump` as pretty JSON to `dir/home-collated.json`, replacing any
/// existing file. Returns the path written.
///
/// The text goes to a temp file in `dir` first and is renamed over the
/// target, so a failed write never leaves a truncated output behind.
pub fn write_collated(dir: &Path, dump: &HomeDump) -> Result<PathBuf> {
    let out_path = dir.join(COLLATED_FILE_NAME);
    let pretty = serde_json::to_string_pretty(dump).context("serializing collated output")?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(pretty.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .with_context(|| format!("writing {}", tmp.path().display()))?;
    tmp.persist(&out_path)
        .with_context(|| format!("writing {}", out_path.display()))?;

    info!("Wrote {} item(s) → {}", dump.data.len(), out_path.display());
    Ok(out_path)
}

/// Discover, merge and persist the dumps found in `dir`.
pub fn collate_home_dir(dir: &Path) -> Result<CollateSummary> {
    let inputs = find_home_dumps(dir)?;
    info!("Found {} dump(s) in {}", inputs.len(), dir.display());

    let merged = collate(&inputs)?;
    let output = write_collated(dir, &merged)?;

    Ok(CollateSummary {
        items: merged.data.len(),
        inputs,
        output,
    })
}
