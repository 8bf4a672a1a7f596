use log::{debug, warn};

use crate::error::PipelineError;
use super::model::ReplicateGroups;

// ---------------------------------------------------------------------------
// Outlier filter – two-stage replicate rejection, per group
// ---------------------------------------------------------------------------

/// Per-group tally of what the filter removed.
#[derive(Debug, Default, PartialEq)]
pub struct FilterStats {
    /// Individual CT values rejected by the IQR stage.
    pub iqr_rejected: usize,
    /// Individual CT values rejected by the consistency stage.
    pub consistency_rejected: usize,
    /// Groups whose replicates were all rejected.
    pub groups_discarded: usize,
}

/// Apply both rejection stages to every replicate group independently.
///
/// Groups never interact. The input is consumed; survivors are collected
/// into a fresh map (groups left empty are dropped from it, with a warning)
/// rather than removed from a collection mid-iteration.
pub fn filter_outliers(groups: ReplicateGroups, threshold: f64) -> (ReplicateGroups, FilterStats) {
    let mut stats = FilterStats::default();
    let mut surviving = ReplicateGroups::new();

    for (key, values) in groups {
        let n_initial = values.len();

        let after_iqr = iqr_stage(&values);
        stats.iqr_rejected += n_initial - after_iqr.len();

        let after_consistency = consistency_stage(&after_iqr, threshold);
        stats.consistency_rejected += after_iqr.len() - after_consistency.len();

        if after_consistency.is_empty() {
            let err = PipelineError::EmptyGroup {
                sample: key.sample_name,
                target: key.target_name,
            };
            warn!("dropping group of {n_initial} replicate(s): {err}");
            stats.groups_discarded += 1;
        } else {
            if after_consistency.len() < n_initial {
                debug!(
                    "{key}: kept {}/{} replicates",
                    after_consistency.len(),
                    n_initial
                );
            }
            surviving.insert(key, after_consistency);
        }
    }

    (surviving, stats)
}

// ---------------------------------------------------------------------------
// Stage A – IQR rule
// ---------------------------------------------------------------------------

/// Tukey fence: keep values within [Q1 − 1.5·IQR, Q3 + 1.5·IQR].
///
/// With fewer than 2 distinct values IQR is 0 and the fences collapse to
/// Q1 = Q3, which retains everything equal to the common value. That is the
/// intended behaviour, not an edge-case failure.
fn iqr_stage(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    values
        .iter()
        .copied()
        .filter(|v| (lower..=upper).contains(v))
        .collect()
}

/// Percentile of pre-sorted values with linear interpolation
/// (rank = p·(n−1), the same convention NumPy defaults to).
fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Stage B – replicate-consistency rule
// ---------------------------------------------------------------------------

/// Absolute-threshold consistency check on the IQR survivors.
///
/// * 0 or 1 value: discard the group — a single replicate cannot be
///   validated against anything.
/// * exactly 2 values: both stand or fall together on |v1 − v2| ≤ threshold.
/// * 3 or more: keep values within `threshold` of the group median. A group
///   pruned down to one survivor is kept here (it was corroborated by the
///   replicates that placed the median); if nothing survives the group is
///   discarded.
fn consistency_stage(values: &[f64], threshold: f64) -> Vec<f64> {
    match values {
        [] | [_] => Vec::new(),
        [a, b] => {
            if (a - b).abs() > threshold {
                Vec::new()
            } else {
                values.to_vec()
            }
        }
        _ => {
            let med = median(values);
            values
                .iter()
                .copied()
                .filter(|v| (v - med).abs() <= threshold)
                .collect()
        }
    }
}

fn median(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    }
}
