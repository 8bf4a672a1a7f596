use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CtValue – a single CT cell as exported by the instrument
// ---------------------------------------------------------------------------

/// One CT cell, before cleaning. Instrument exports mix numeric cells with
/// the "Undetermined" sentinel (no amplification), empty cells and the
/// occasional stray text, so the raw value is kept until the Cleaner runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CtValue {
    Value(f64),
    Undetermined,
    Missing,
    /// Unparseable text, carried along so the Cleaner can report it.
    Raw(String),
}

impl fmt::Display for CtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtValue::Value(v) => write!(f, "{v:.3}"),
            CtValue::Undetermined => write!(f, "Undetermined"),
            CtValue::Missing => write!(f, "<missing>"),
            CtValue::Raw(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement – one well/row of the export
// ---------------------------------------------------------------------------

/// A raw measurement row: one well of one instrument run.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub sample_name: String,
    pub target_name: String,
    pub ct: CtValue,
}

/// A cleaned measurement: CT coerced to numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanMeasurement {
    pub sample_name: String,
    pub target_name: String,
    pub ct: f64,
}

// ---------------------------------------------------------------------------
// GroupKey / ReplicateGroups – technical replicates per (sample, target)
// ---------------------------------------------------------------------------

/// Grouping key for technical replicates.
///
/// `Ord` so groups live in a `BTreeMap` and every downstream stage emits in
/// a deterministic order (reruns on identical input produce byte-identical
/// CSVs).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub sample_name: String,
    pub target_name: String,
}

impl GroupKey {
    pub fn new(sample: impl Into<String>, target: impl Into<String>) -> Self {
        GroupKey {
            sample_name: sample.into(),
            target_name: target.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sample_name, self.target_name)
    }
}

/// Replicate CT values per key; values keep their input order.
pub type ReplicateGroups = BTreeMap<GroupKey, Vec<f64>>;

// ---------------------------------------------------------------------------
// Pipeline output records
// ---------------------------------------------------------------------------

/// Mean CT of the surviving replicates for one (sample, target) key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    pub sample_name: String,
    pub target_name: String,
    pub mean_ct: f64,
}

/// ΔCT row: a target's mean CT normalised against the housekeeping gene of
/// the same sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub sample_name: String,
    pub target_name: String,
    pub mean_ct: f64,
    pub reference_ct: f64,
    pub delta_ct: f64,
}

/// ΔΔCT row: one target of one condition run joined against the baseline
/// run. `fold_change = 2^(−delta_delta_ct)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldChangeRecord {
    pub target_name: String,
    pub delta_ct_condition: f64,
    pub delta_ct_baseline: f64,
    pub delta_delta_ct: f64,
    pub fold_change: f64,
}
