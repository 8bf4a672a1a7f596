use log::warn;

use crate::error::PipelineError;
use super::model::{CleanMeasurement, CtValue, Measurement};

// ---------------------------------------------------------------------------
// Cleaner – drop non-numeric CT rows, coerce the rest
// ---------------------------------------------------------------------------

/// What the Cleaner kept and what it threw away.
#[derive(Debug, Default)]
pub struct CleanOutcome {
    pub rows: Vec<CleanMeasurement>,
    /// "Undetermined" sentinel or empty CT cell — expected data loss.
    pub dropped_undetermined: usize,
    /// Text that is neither numeric nor the sentinel — unexpected, warned.
    pub dropped_malformed: usize,
}

/// Pure transform: keep rows with a numeric CT, drop the sentinel and
/// missing cells, flag anything else as malformed.
///
/// Malformed rows are skipped (the run continues) but each one is logged and
/// counted so the loss is auditable downstream.
pub fn clean(measurements: Vec<Measurement>) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    for (row_no, m) in measurements.into_iter().enumerate() {
        match m.ct {
            CtValue::Value(ct) => outcome.rows.push(CleanMeasurement {
                sample_name: m.sample_name,
                target_name: m.target_name,
                ct,
            }),
            CtValue::Undetermined | CtValue::Missing => {
                outcome.dropped_undetermined += 1;
            }
            CtValue::Raw(raw) => {
                let err = PipelineError::MalformedRow {
                    row: row_no,
                    sample: m.sample_name,
                    target: m.target_name,
                    raw,
                };
                warn!("skipping row: {err}");
                outcome.dropped_malformed += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sample: &str, target: &str, ct: CtValue) -> Measurement {
        Measurement {
            sample_name: sample.into(),
            target_name: target.into(),
            ct,
        }
    }

    #[test]
    fn keeps_numeric_drops_sentinel_and_malformed() {
        let outcome = clean(vec![
            row("d1", "COL1", CtValue::Value(22.0)),
            row("d1", "COL1", CtValue::Undetermined),
            row("d1", "COL1", CtValue::Missing),
            row("d1", "COL1", CtValue::Raw("oops".into())),
            row("d1", "GAPDH", CtValue::Value(18.0)),
        ]);

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].ct, 22.0);
        assert_eq!(outcome.rows[1].target_name, "GAPDH");
        assert_eq!(outcome.dropped_undetermined, 2);
        assert_eq!(outcome.dropped_malformed, 1);
    }
}
