//! Relative quantification: mean CT → ΔCT → ΔΔCT / fold change.

pub mod aggregate;
pub mod fold;
pub mod normalize;
