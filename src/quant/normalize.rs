use std::collections::BTreeMap;

use log::warn;

use crate::data::model::{AggregatedRecord, NormalizedRecord};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Normalizer – ΔCT against the housekeeping gene
// ---------------------------------------------------------------------------

/// ΔCT rows plus the number of samples dropped for want of a reference.
#[derive(Debug)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    pub missing_reference: usize,
}

/// Subtract the reference (housekeeping) gene's mean CT from every other
/// target of the *same* sample: `delta_ct = mean_ct − reference_ct`.
///
/// Gene-name casing varies between export templates, so the reference target
/// is matched case-insensitively. A sample with no reference record loses
/// its rows (logged and counted); the rest of the batch proceeds.
pub fn normalize(
    records: Vec<AggregatedRecord>,
    reference_target: &str,
) -> NormalizeOutcome {
    // Pass 1: reference mean CT per sample.
    let mut reference_ct: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in &records {
        if rec.target_name.eq_ignore_ascii_case(reference_target) {
            reference_ct.insert(rec.sample_name.as_str(), rec.mean_ct);
        }
    }

    // Pass 2: ΔCT for every non-reference record.
    let mut out = Vec::new();
    let mut samples_missing: Vec<&str> = Vec::new();
    for rec in &records {
        if rec.target_name.eq_ignore_ascii_case(reference_target) {
            continue;
        }
        match reference_ct.get(rec.sample_name.as_str()) {
            Some(&ref_ct) => out.push(NormalizedRecord {
                sample_name: rec.sample_name.clone(),
                target_name: rec.target_name.clone(),
                mean_ct: rec.mean_ct,
                reference_ct: ref_ct,
                delta_ct: rec.mean_ct - ref_ct,
            }),
            None => {
                if !samples_missing.contains(&rec.sample_name.as_str()) {
                    samples_missing.push(rec.sample_name.as_str());
                }
            }
        }
    }

    for sample in &samples_missing {
        let err = PipelineError::ReferenceNotFound {
            sample: (*sample).to_string(),
            reference: reference_target.to_string(),
        };
        warn!("dropping sample: {err}");
    }

    NormalizeOutcome {
        records: out,
        missing_reference: samples_missing.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(sample: &str, target: &str, mean_ct: f64) -> AggregatedRecord {
        AggregatedRecord {
            sample_name: sample.into(),
            target_name: target.into(),
            mean_ct,
        }
    }

    #[test]
    fn delta_ct_is_target_minus_reference_per_sample() {
        let outcome = normalize(
            vec![
                rec("d1", "GAPDH", 18.0),
                rec("d1", "COL1", 22.0),
                rec("d7", "GAPDH", 18.5),
                rec("d7", "COL1", 21.0),
            ],
            "GAPDH",
        );

        assert_eq!(outcome.records.len(), 2);
        let d1 = &outcome.records[0];
        assert_eq!(d1.sample_name, "d1");
        assert_eq!(d1.delta_ct, 4.0);
        assert_eq!(d1.reference_ct, 18.0);
        let d7 = &outcome.records[1];
        assert_eq!(d7.delta_ct, 2.5);
        assert_eq!(outcome.missing_reference, 0);
    }

    #[test]
    fn reference_match_ignores_case() {
        let outcome = normalize(
            vec![rec("d1", "Gapdh", 18.0), rec("d1", "COL1", 22.0)],
            "GAPDH",
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].delta_ct, 4.0);
    }

    #[test]
    fn sample_without_reference_is_dropped_not_fatal() {
        let outcome = normalize(
            vec![
                rec("d1", "GAPDH", 18.0),
                rec("d1", "COL1", 22.0),
                rec("d7", "COL1", 21.0), // no GAPDH for d7
            ],
            "GAPDH",
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].sample_name, "d1");
        assert_eq!(outcome.missing_reference, 1);
    }
}
