use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Immutable configuration for one batch run.
///
/// Built once in `main` from the command line and passed by reference into
/// the pipeline; there is no process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for instrument exports (.xls / .xlsx).
    pub run_dir: PathBuf,

    /// Housekeeping gene used for ΔCT normalisation (e.g. "GAPDH").
    pub reference_target: String,

    /// Condition key of the baseline runs (e.g. "control").
    pub baseline_condition: String,

    /// Experimental condition keys, in reporting order.
    pub condition_keys: Vec<String>,

    /// Stage-B replicate-consistency threshold, in CT units.
    pub replicate_threshold: f64,

    /// Where result CSVs are written.
    pub out_dir: PathBuf,
}

impl Config {
    /// All condition keys, baseline first. The baseline is included so the
    /// sanity fold-change (baseline vs itself, ≈ 1.0) is emitted too.
    pub fn all_conditions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.baseline_condition.as_str())
            .chain(self.condition_keys.iter().map(String::as_str))
    }
}
