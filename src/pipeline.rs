use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::Config;
use crate::data::clean::clean;
use crate::data::filter::filter_outliers;
use crate::data::group::group_replicates;
use crate::data::loader::load_export;
use crate::data::model::{Measurement, NormalizedRecord};
use crate::error::PipelineError;
use crate::export::{write_fold_changes, write_normalized};
use crate::quant::aggregate::aggregate;
use crate::quant::fold::fold_changes;
use crate::quant::normalize::normalize;
use crate::runs::{discover_runs, RunFile};

// ---------------------------------------------------------------------------
// Drop accounting
// ---------------------------------------------------------------------------

/// Everything one run excluded on its way to ΔCT, for downstream audit of
/// data loss. Every exclusion in the pipeline lands in exactly one counter.
#[derive(Debug, Default)]
pub struct DropReport {
    pub rows_loaded: usize,
    pub undetermined_rows: usize,
    pub malformed_rows: usize,
    pub iqr_rejected_values: usize,
    pub inconsistent_values: usize,
    pub groups_discarded: usize,
    pub samples_missing_reference: usize,
}

impl DropReport {
    fn log(&self, name: &str) {
        info!(
            "{name}: {} rows loaded, {} undetermined, {} malformed, \
             {} IQR-rejected, {} inconsistent, {} group(s) discarded, \
             {} sample(s) without reference",
            self.rows_loaded,
            self.undetermined_rows,
            self.malformed_rows,
            self.iqr_rejected_values,
            self.inconsistent_values,
            self.groups_discarded,
            self.samples_missing_reference,
        );
    }
}

// ---------------------------------------------------------------------------
// Per-run pipeline
// ---------------------------------------------------------------------------

/// Run the in-memory pipeline for one instrument run:
/// clean → group → outlier filter → aggregate → normalise.
///
/// Each stage consumes its input and hands a fresh collection to the next;
/// nothing is shared or mutated across stage boundaries.
pub fn quantify_run(
    measurements: Vec<Measurement>,
    config: &Config,
) -> (Vec<NormalizedRecord>, DropReport) {
    let mut report = DropReport {
        rows_loaded: measurements.len(),
        ..DropReport::default()
    };

    let cleaned = clean(measurements);
    report.undetermined_rows = cleaned.dropped_undetermined;
    report.malformed_rows = cleaned.dropped_malformed;

    let groups = group_replicates(cleaned.rows);
    let (surviving, stats) = filter_outliers(groups, config.replicate_threshold);
    report.iqr_rejected_values = stats.iqr_rejected;
    report.inconsistent_values = stats.consistency_rejected;
    report.groups_discarded = stats.groups_discarded;

    let aggregated = aggregate(surviving);
    let normalized = normalize(aggregated, &config.reference_target);
    report.samples_missing_reference = normalized.missing_reference;

    (normalized.records, report)
}

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

/// Process every export under `config.run_dir`: per-run ΔCT CSVs, then
/// per-replicate fold-change CSVs of each condition against the baseline run
/// with the same replicate identifier.
pub fn run_batch(config: &Config) -> Result<()> {
    let runs = discover_runs(config)?;
    std::fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("creating {}", config.out_dir.display()))?;

    // replicate id → condition → ΔCT rows
    let mut by_replicate: BTreeMap<String, BTreeMap<String, Vec<NormalizedRecord>>> =
        BTreeMap::new();
    let mut processed = 0usize;

    for run in &runs {
        match process_file(run, config) {
            Ok(records) => {
                processed += 1;
                let slot = by_replicate
                    .entry(run.key.replicate.clone())
                    .or_default();
                if slot.contains_key(&run.key.condition) {
                    warn!(
                        "duplicate run for {}; keeping the first, ignoring {}",
                        run.key,
                        run.path.display()
                    );
                } else {
                    slot.insert(run.key.condition.clone(), records);
                }
            }
            Err(err) => warn!("skipping {}: {err:#}", run.path.display()),
        }
    }

    if processed == 0 {
        return Err(PipelineError::NoInputFiles(config.run_dir.clone()).into());
    }

    let mut total_mismatches = 0usize;
    for (replicate, conditions) in &by_replicate {
        let Some(baseline) = conditions.get(&config.baseline_condition) else {
            warn!(
                "replicate '{replicate}' has no '{}' run; skipping its fold changes",
                config.baseline_condition
            );
            continue;
        };

        for condition in config.all_conditions() {
            let Some(records) = conditions.get(condition) else {
                continue;
            };
            let outcome = fold_changes(records, baseline);
            total_mismatches += outcome.join_mismatches;

            let out_path = config
                .out_dir
                .join(format!("{condition}_{replicate}_foldchange.csv"));
            let file = File::create(&out_path)
                .with_context(|| format!("creating {}", out_path.display()))?;
            write_fold_changes(file, &outcome.records)?;
            info!(
                "wrote {} ({} targets)",
                out_path.display(),
                outcome.records.len()
            );
        }
    }

    info!(
        "batch done: {processed}/{} run(s) processed, {total_mismatches} join mismatch(es)",
        runs.len()
    );
    Ok(())
}

/// Load one export, quantify it, and write its ΔCT CSV.
fn process_file(run: &RunFile, config: &Config) -> Result<Vec<NormalizedRecord>> {
    let measurements = load_export(&run.path)?;
    let (records, report) = quantify_run(measurements, config);
    report.log(&display_name(&run.path));

    let out_path = config
        .out_dir
        .join(format!("{}_normalized.csv", display_name(&run.path)));
    let file = File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    write_normalized(file, &records)?;

    Ok(records)
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("run")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CtValue;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            run_dir: PathBuf::from("."),
            reference_target: "GAPDH".into(),
            baseline_condition: "control".into(),
            condition_keys: vec!["loaded".into()],
            replicate_threshold: 1.0,
            out_dir: PathBuf::from("."),
        }
    }

    fn m(sample: &str, target: &str, ct: CtValue) -> Measurement {
        Measurement {
            sample_name: sample.into(),
            target_name: target.into(),
            ct,
        }
    }

    fn v(sample: &str, target: &str, ct: f64) -> Measurement {
        m(sample, target, CtValue::Value(ct))
    }

    /// End-to-end: raw rows with sentinels and an outlier, down to fold
    /// change against a baseline run.
    #[test]
    fn full_pipeline_to_fold_change() {
        let config = test_config();

        // Condition run: COL1 triplet carries one outlier (25.0).
        let condition_rows = vec![
            v("d7", "GAPDH", 18.0),
            v("d7", "GAPDH", 18.2),
            v("d7", "GAPDH", 18.1),
            v("d7", "COL1", 20.0),
            v("d7", "COL1", 20.3),
            v("d7", "COL1", 25.0),
            m("d7", "COL1", CtValue::Undetermined),
        ];
        let (condition, report) = quantify_run(condition_rows, &config);

        assert_eq!(report.rows_loaded, 7);
        assert_eq!(report.undetermined_rows, 1);
        assert_eq!(report.inconsistent_values, 1); // the 25.0
        assert_eq!(condition.len(), 1);
        let col1 = &condition[0];
        assert!((col1.mean_ct - 20.15).abs() < 1e-9);
        assert!((col1.reference_ct - 18.1).abs() < 1e-9);
        assert!((col1.delta_ct - 2.05).abs() < 1e-9);

        // Baseline run: tighter COL1, same reference level.
        let baseline_rows = vec![
            v("d7", "GAPDH", 18.1),
            v("d7", "GAPDH", 18.1),
            v("d7", "COL1", 22.15),
            v("d7", "COL1", 22.15),
        ];
        let (baseline, _) = quantify_run(baseline_rows, &config);
        assert!((baseline[0].delta_ct - 4.05).abs() < 1e-9);

        let out = fold_changes(&condition, &baseline);
        assert_eq!(out.records.len(), 1);
        let fc = &out.records[0];
        assert!((fc.delta_delta_ct - (-2.0)).abs() < 1e-9);
        assert!((fc.fold_change - 4.0).abs() < 1e-6);
    }

    /// Every key in the final output traces back to a surviving input
    /// measurement; exclusion never fabricates keys.
    #[test]
    fn output_keys_trace_to_input() {
        let config = test_config();
        let rows = vec![
            v("d1", "GAPDH", 18.0),
            v("d1", "GAPDH", 18.0),
            v("d1", "COL1", 22.0),
            v("d1", "COL1", 22.2),
            // SOX9 pair too far apart: whole group discarded
            v("d1", "SOX9", 24.0),
            v("d1", "SOX9", 27.0),
        ];
        let input_targets: Vec<String> =
            rows.iter().map(|r| r.target_name.clone()).collect();

        let (records, report) = quantify_run(rows, &config);
        assert_eq!(report.groups_discarded, 1);
        assert_eq!(records.len(), 1);
        for rec in &records {
            assert!(input_targets.contains(&rec.target_name));
            assert_eq!(rec.sample_name, "d1");
        }
        assert!(records.iter().all(|r| r.target_name != "SOX9"));
    }

    /// A run whose every group fails QC still normalises to an empty set
    /// rather than an error.
    #[test]
    fn fully_rejected_run_yields_empty_output() {
        let config = test_config();
        let rows = vec![v("d1", "COL1", 20.0), v("d1", "COL1", 28.0)];
        let (records, report) = quantify_run(rows, &config);
        assert!(records.is_empty());
        assert_eq!(report.groups_discarded, 1);
    }
}
