/// Data layer: core types, loading, cleaning, grouping and outlier QC.
///
/// Architecture:
/// ```text
///  .xls / .xlsx instrument export
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  worksheet → Vec<Measurement>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  drop Undetermined / malformed, coerce CT
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  group    │  (sample, target) → replicate CT values
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  IQR fence, then replicate-consistency rule
///   └──────────┘
/// ```

pub mod clean;
pub mod filter;
pub mod group;
pub mod loader;
pub mod model;
