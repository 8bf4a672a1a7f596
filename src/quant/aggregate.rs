use crate::data::model::{AggregatedRecord, ReplicateGroups};

// ---------------------------------------------------------------------------
// Aggregator – replicate groups → mean CT
// ---------------------------------------------------------------------------

/// Reduce each surviving group to its arithmetic mean CT.
///
/// Groups emptied by the outlier filter never reach this point, so every
/// record has a real mean; no null-valued rows are emitted.
pub fn aggregate(groups: ReplicateGroups) -> Vec<AggregatedRecord> {
    groups
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, values)| {
            let mean_ct = values.iter().sum::<f64>() / values.len() as f64;
            AggregatedRecord {
                sample_name: key.sample_name,
                target_name: key.target_name,
                mean_ct,
            }
        })
        .collect()
}
