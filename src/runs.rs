use std::fmt;
use std::path::{Path, PathBuf};

use log::warn;

use crate::config::Config;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Run discovery and condition/replicate classification
// ---------------------------------------------------------------------------

/// What a file name tells us about its run: which condition it belongs to
/// and which biological replicate / timepoint it is.
///
/// Runs are paired with their baseline by this key, never by position in a
/// directory listing — independently globbed lists do not line up reliably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunKey {
    pub condition: String,
    pub replicate: String,
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.condition, self.replicate)
    }
}

/// One discovered instrument export and its classification.
#[derive(Debug, Clone)]
pub struct RunFile {
    pub path: PathBuf,
    pub key: RunKey,
}

/// Scan the run directory for exports and classify each by file name.
///
/// Files whose stem matches no configured condition key are skipped with a
/// warning. Fails with [`PipelineError::NoInputFiles`] when nothing usable
/// is found — an empty batch must not produce output.
pub fn discover_runs(config: &Config) -> Result<Vec<RunFile>, PipelineError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&config.run_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_export(p))
        .collect();
    paths.sort();

    let mut runs = Vec::new();
    for path in paths {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        match classify_stem(stem, config) {
            Some(key) => runs.push(RunFile { path, key }),
            None => warn!(
                "skipping {}: stem matches no configured condition",
                path.display()
            ),
        }
    }

    if runs.is_empty() {
        return Err(PipelineError::NoInputFiles(config.run_dir.clone()));
    }
    Ok(runs)
}

fn is_export(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    path.is_file() && matches!(ext.as_str(), "xls" | "xlsx")
}

/// Extract (condition, replicate) from a file stem.
///
/// The condition is the longest configured key found in the stem
/// (case-insensitive substring); what remains, trimmed of `-`, `_`, `.` and
/// spaces, is the replicate identifier. A stem that is exactly a condition
/// key gets replicate "1".
pub fn classify_stem(stem: &str, config: &Config) -> Option<RunKey> {
    // ASCII case folding keeps byte offsets valid for slicing `stem`.
    let stem_lower = stem.to_ascii_lowercase();

    let mut keys: Vec<&str> = config.all_conditions().collect();
    // Longest first so "sample12" is not claimed by key "sample1".
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    for key in keys {
        let key_lower = key.to_ascii_lowercase();
        if let Some(pos) = stem_lower.find(&key_lower) {
            let mut residue = String::new();
            residue.push_str(&stem[..pos]);
            residue.push_str(&stem[pos + key.len()..]);
            let replicate = residue
                .trim_matches(&['-', '_', '.', ' '][..])
                .to_string();
            return Some(RunKey {
                condition: key.to_string(),
                replicate: if replicate.is_empty() {
                    "1".to_string()
                } else {
                    replicate
                },
            });
        }
    }
    None
}
