use std::io::Write;

use serde::Serialize;

use crate::data::model::{FoldChangeRecord, NormalizedRecord};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Per-run CSV row: [sample_name, target_name, mean_ct, delta_ct].
#[derive(Serialize)]
struct NormalizedRow<'a> {
    sample_name: &'a str,
    target_name: &'a str,
    mean_ct: f64,
    delta_ct: f64,
}

/// Write the per-run ΔCT table.
///
/// Rows are sorted by (sample, target) before writing so a rerun on the same
/// input is byte-identical regardless of upstream emission order.
pub fn write_normalized<W: Write>(
    sink: W,
    records: &[NormalizedRecord],
) -> Result<(), PipelineError> {
    let mut ordered: Vec<&NormalizedRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        (&a.sample_name, &a.target_name).cmp(&(&b.sample_name, &b.target_name))
    });

    let mut writer = csv::Writer::from_writer(sink);
    for rec in ordered {
        writer.serialize(NormalizedRow {
            sample_name: &rec.sample_name,
            target_name: &rec.target_name,
            mean_ct: rec.mean_ct,
            delta_ct: rec.delta_ct,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one condition-vs-baseline fold-change table
/// ([target_name, delta_ct_condition, delta_ct_baseline, delta_delta_ct,
/// fold_change]). Records arrive target-sorted from the calculator.
pub fn write_fold_changes<W: Write>(
    sink: W,
    records: &[FoldChangeRecord],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_writer(sink);
    for rec in records {
        writer.serialize(rec)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(sample: &str, target: &str, mean_ct: f64, delta_ct: f64) -> NormalizedRecord {
        NormalizedRecord {
            sample_name: sample.into(),
            target_name: target.into(),
            mean_ct,
            reference_ct: mean_ct - delta_ct,
            delta_ct,
        }
    }

    #[test]
    fn normalized_csv_is_sorted_and_stable() {
        let records = vec![
            normalized("d7", "COL1", 21.0, 2.5),
            normalized("d1", "SOX9", 24.0, 6.0),
            normalized("d1", "COL1", 22.0, 4.0),
        ];

        let mut first = Vec::new();
        write_normalized(&mut first, &records).unwrap();

        // Same records, different emission order
        let mut shuffled = records.clone();
        shuffled.reverse();
        let mut second = Vec::new();
        write_normalized(&mut second, &shuffled).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sample_name,target_name,mean_ct,delta_ct");
        assert!(lines[1].starts_with("d1,COL1,"));
        assert!(lines[2].starts_with("d1,SOX9,"));
        assert!(lines[3].starts_with("d7,COL1,"));
    }

    #[test]
    fn fold_change_csv_has_spec_columns() {
        let records = vec![FoldChangeRecord {
            target_name: "COL1".into(),
            delta_ct_condition: 2.0,
            delta_ct_baseline: 4.0,
            delta_delta_ct: -2.0,
            fold_change: 4.0,
        }];
        let mut buf = Vec::new();
        write_fold_changes(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "target_name,delta_ct_condition,delta_ct_baseline,delta_delta_ct,fold_change"
        );
        assert_eq!(lines[1], "COL1,2.0,4.0,-2.0,4.0");
    }
}
