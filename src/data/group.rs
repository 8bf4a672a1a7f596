use super::model::{CleanMeasurement, GroupKey, ReplicateGroups};

// ---------------------------------------------------------------------------
// Grouper – technical replicates per (sample, target)
// ---------------------------------------------------------------------------

/// Partition cleaned rows into replicate groups keyed by (sample, target).
///
/// Grouping is stable: within a group the CT values keep their input order.
/// The `BTreeMap` makes emission order deterministic for downstream stages.
pub fn group_replicates(rows: Vec<CleanMeasurement>) -> ReplicateGroups {
    let mut groups = ReplicateGroups::new();
    for row in rows {
        groups
            .entry(GroupKey::new(row.sample_name, row.target_name))
            .or_default()
            .push(row.ct);
    }
    groups
}
