use std::path::PathBuf;

use thiserror::Error;

/// Errors raised along the quantification pipeline.
///
/// Everything row-, group- or key-local is recovered by exclusion and tallied
/// in the run's [`DropReport`](crate::pipeline::DropReport); only
/// [`PipelineError::NoInputFiles`] aborts a batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// CT cell holds text that is neither numeric nor the
    /// "Undetermined" sentinel.
    #[error("row {row} ({sample}/{target}): unparseable CT value '{raw}'")]
    MalformedRow {
        row: usize,
        sample: String,
        target: String,
        raw: String,
    },

    /// Every replicate for a (sample, target) key was rejected.
    #[error("all replicates rejected for {sample}/{target}")]
    EmptyGroup { sample: String, target: String },

    /// No housekeeping-gene record exists for a sample.
    #[error("no '{reference}' record for sample '{sample}'")]
    ReferenceNotFound { sample: String, reference: String },

    /// Target present on one side of the condition/baseline join only.
    #[error("target '{target}' missing from baseline")]
    JoinMismatch { target: String },

    /// No readable instrument export in the run directory.
    #[error("no usable input files under {0}")]
    NoInputFiles(PathBuf),

    /// Workbook could not be opened or its sheet is unusable.
    #[error("spreadsheet error in {path}: {message}")]
    Sheet { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
