//! mnemo_accel — Rust acceleration for memory decay scoring and embedding similarity.

pub mod capability;
pub mod config;
pub mod decay;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod strings;
pub mod vector;

#[cfg(feature = "python")]
mod python;

pub use capability::{capabilities, has_avx2, has_neon, vectorized_path_active, Capabilities};
pub use config::{DecayConfig, MemoryType, TypeMultipliers};
pub use decay::{
    apply_circadian_stability, calculate, calculate_batch, calculate_batch_columns, detect_peak_hours,
    DecayColumns, DecayInput,
};
pub use error::{AccelError, AccelResult};
pub use matrix::{Matrix, MatrixView};
pub use vector::{cosine_similarity, cosine_similarity_batch, find_duplicates_by_embedding, DuplicatePair};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python extension module; see `python.rs` for the submodule layout.
#[cfg(feature = "python")]
#[pymodule]
fn mnemo_accel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
