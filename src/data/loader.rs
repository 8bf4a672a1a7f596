use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use log::debug;

use crate::error::PipelineError;
use super::model::{CtValue, Measurement};

// How many leading rows to scan for the header. The instrument writes it at
// a fixed offset (row 8 in current firmware), but the offset has moved
// between firmware versions, so we locate it instead of hard-coding it.
const HEADER_SCAN_ROWS: usize = 20;

const SAMPLE_COL: &str = "Sample Name";
const TARGET_COL: &str = "Target Name";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read one instrument export (.xls or .xlsx, first worksheet) into raw
/// [`Measurement`] rows.
///
/// Rows whose sample or target cell is empty are skipped here — real exports
/// end with legend/blank rows that are not measurements. CT cells are kept
/// verbatim as [`CtValue`]; coercion and validation belong to the Cleaner.
pub fn load_export(path: &Path) -> Result<Vec<Measurement>, PipelineError> {
    let sheet_err = |message: String| PipelineError::Sheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook =
        open_workbook_auto(path).map_err(|e| sheet_err(format!("cannot open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| sheet_err("workbook has no worksheets".into()))?
        .map_err(|e| sheet_err(format!("cannot read first worksheet: {e}")))?;

    let rows: Vec<&[Data]> = range.rows().collect();

    let (header_row, sample_idx, target_idx, ct_idx) =
        locate_header(&rows).ok_or_else(|| {
            sheet_err(format!(
                "no header row with '{SAMPLE_COL}', '{TARGET_COL}' and a CT column \
                 in the first {HEADER_SCAN_ROWS} rows"
            ))
        })?;
    debug!(
        "{}: header at row {header_row} (sample={sample_idx}, target={target_idx}, ct={ct_idx})",
        path.display()
    );

    let mut measurements = Vec::new();
    for row in rows.iter().skip(header_row + 1) {
        let sample_name = cell_to_string(row.get(sample_idx));
        let target_name = cell_to_string(row.get(target_idx));
        if sample_name.is_empty() || target_name.is_empty() {
            continue;
        }
        measurements.push(Measurement {
            sample_name,
            target_name,
            ct: cell_to_ct(row.get(ct_idx)),
        });
    }

    Ok(measurements)
}

// ---------------------------------------------------------------------------
// Header detection
// ---------------------------------------------------------------------------

/// Find the header row and the column indices of sample, target and CT.
fn locate_header(rows: &[&[Data]]) -> Option<(usize, usize, usize, usize)> {
    for (row_no, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let mut sample_idx = None;
        let mut target_idx = None;
        let mut ct_idx = None;
        for (col, cell) in row.iter().enumerate() {
            let text = cell_to_string(Some(cell));
            if text == SAMPLE_COL {
                sample_idx = Some(col);
            } else if text == TARGET_COL {
                target_idx = Some(col);
            } else if ct_idx.is_none() && is_ct_header(&text) {
                ct_idx = Some(col);
            }
        }
        if let (Some(s), Some(t), Some(c)) = (sample_idx, target_idx, ct_idx) {
            return Some((row_no, s, t, c));
        }
    }
    None
}

/// Accept the CT column header in either canonical form: ASCII "CT"/"Ct" or
/// the locale export "Cт" (Latin C + Cyrillic small te), case-insensitively.
pub(crate) fn is_ct_header(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower == "ct" || lower == "cт"
}

// ---------------------------------------------------------------------------
// Cell conversion
// ---------------------------------------------------------------------------

fn cell_to_string(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(n)) => n.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(Data::Error(e)) => format!("ERR({e:?})"),
        Some(Data::DateTime(dt)) => dt.as_f64().to_string(),
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.clone(),
    }
}

fn cell_to_ct(cell: Option<&Data>) -> CtValue {
    match cell {
        None | Some(Data::Empty) => CtValue::Missing,
        Some(Data::Float(n)) => CtValue::Value(*n),
        Some(Data::Int(i)) => CtValue::Value(*i as f64),
        Some(Data::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                CtValue::Missing
            } else if s.eq_ignore_ascii_case("undetermined") {
                CtValue::Undetermined
            } else if let Ok(v) = s.parse::<f64>() {
                CtValue::Value(v)
            } else {
                CtValue::Raw(s.to_string())
            }
        }
        Some(other) => CtValue::Raw(cell_to_string(Some(other))),
    }
}
