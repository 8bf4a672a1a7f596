use std::collections::BTreeMap;

use log::warn;

use crate::data::model::{FoldChangeRecord, NormalizedRecord};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Fold-change calculator – ΔΔCT and 2^-ΔΔCT against a baseline run
// ---------------------------------------------------------------------------

/// Fold-change rows plus the number of condition targets absent from the
/// baseline (inner-join exclusions).
#[derive(Debug)]
pub struct FoldChangeOutcome {
    pub records: Vec<FoldChangeRecord>,
    pub join_mismatches: usize,
}

/// Join one condition's ΔCT rows against the baseline's on target name and
/// compute `delta_delta_ct = ΔCT_condition − ΔCT_baseline` and
/// `fold_change = 2^(−delta_delta_ct)`.
///
/// Inner-join semantics: targets missing from either side are excluded, with
/// the condition-side misses counted. Called with the baseline as its own
/// condition this yields the sanity output (fold_change ≈ 1 per target).
pub fn fold_changes(
    condition: &[NormalizedRecord],
    baseline: &[NormalizedRecord],
) -> FoldChangeOutcome {
    // Baseline ΔCT per target (case-insensitive key). First occurrence wins;
    // a duplicate target inside one run set is a protocol anomaly worth a
    // warning, not an abort.
    let mut baseline_delta: BTreeMap<String, f64> = BTreeMap::new();
    for rec in baseline {
        let key = rec.target_name.to_lowercase();
        if baseline_delta.contains_key(&key) {
            warn!(
                "baseline has multiple '{}' rows; keeping the first",
                rec.target_name
            );
            continue;
        }
        baseline_delta.insert(key, rec.delta_ct);
    }

    let mut records = Vec::new();
    let mut join_mismatches = 0;
    for rec in condition {
        match baseline_delta.get(&rec.target_name.to_lowercase()) {
            Some(&delta_ct_baseline) => {
                let delta_delta_ct = rec.delta_ct - delta_ct_baseline;
                records.push(FoldChangeRecord {
                    target_name: rec.target_name.clone(),
                    delta_ct_condition: rec.delta_ct,
                    delta_ct_baseline,
                    delta_delta_ct,
                    fold_change: (-delta_delta_ct).exp2(),
                });
            }
            None => {
                let err = PipelineError::JoinMismatch {
                    target: rec.target_name.clone(),
                };
                warn!("excluding target: {err}");
                join_mismatches += 1;
            }
        }
    }

    records.sort_by(|a, b| a.target_name.cmp(&b.target_name));
    FoldChangeOutcome {
        records,
        join_mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(sample: &str, target: &str, delta_ct: f64) -> NormalizedRecord {
        NormalizedRecord {
            sample_name: sample.into(),
            target_name: target.into(),
            mean_ct: 0.0,
            reference_ct: 0.0,
            delta_ct,
        }
    }

    #[test]
    fn delta_delta_ct_and_fold_change() {
        let baseline = vec![rec("ctl", "COL1", 4.0)];
        let condition = vec![rec("d7", "COL1", 2.0)];

        let out = fold_changes(&condition, &baseline);
        assert_eq!(out.records.len(), 1);
        let fc = &out.records[0];
        assert_eq!(fc.delta_delta_ct, -2.0);
        assert_eq!(fc.fold_change, 4.0);
        assert_eq!(out.join_mismatches, 0);
    }

    #[test]
    fn baseline_against_itself_is_unity() {
        let baseline = vec![rec("ctl", "COL1", 4.0), rec("ctl", "ACAN", 6.5)];
        let out = fold_changes(&baseline, &baseline);
        assert_eq!(out.records.len(), 2);
        for fc in &out.records {
            assert_eq!(fc.delta_delta_ct, 0.0);
            assert!((fc.fold_change - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn unmatched_targets_are_excluded_and_counted() {
        let baseline = vec![rec("ctl", "COL1", 4.0), rec("ctl", "SOX9", 5.0)];
        let condition = vec![rec("d7", "COL1", 3.0), rec("d7", "ACAN", 6.0)];

        let out = fold_changes(&condition, &baseline);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].target_name, "COL1");
        // ACAN missing from baseline; SOX9 missing from condition is silent
        assert_eq!(out.join_mismatches, 1);
    }

    #[test]
    fn output_is_sorted_by_target() {
        let baseline = vec![rec("ctl", "SOX9", 1.0), rec("ctl", "ACAN", 2.0)];
        let condition = vec![rec("d7", "SOX9", 1.5), rec("d7", "ACAN", 2.5)];
        let out = fold_changes(&condition, &baseline);
        let names: Vec<&str> = out.records.iter().map(|r| r.target_name.as_str()).collect();
        assert_eq!(names, ["ACAN", "SOX9"]);
    }
}
