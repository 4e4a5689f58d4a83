//! Python bindings. Each engine is exposed as a submodule of `mnemo_accel`.

use std::collections::{HashMap, HashSet};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::{DecayConfig, TypeMultipliers};
use crate::decay::{self, DecayColumns, DecayInput};
use crate::error::AccelError;
use crate::matrix::Matrix;
use crate::{capability, graph, strings, vector};

impl From<AccelError> for PyErr {
    fn from(err: AccelError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Mutable decay parameters; validated every time a calculation uses them.
#[pyclass(name = "DecayConfig", module = "mnemo_accel.decay_ops")]
#[derive(Clone)]
pub struct PyDecayConfig {
    #[pyo3(get, set)]
    base_decay_rate: f64,
    #[pyo3(get, set)]
    min_retention: f64,
    #[pyo3(get, set)]
    access_stability_k: f64,
    #[pyo3(get, set)]
    relation_resistance_k: f64,
    #[pyo3(get, set)]
    channel_diversity_k: f64,
    type_multipliers: TypeMultipliers,
}

impl From<DecayConfig> for PyDecayConfig {
    fn from(config: DecayConfig) -> Self {
        Self {
            base_decay_rate: config.base_decay_rate,
            min_retention: config.min_retention,
            access_stability_k: config.access_stability_k,
            relation_resistance_k: config.relation_resistance_k,
            channel_diversity_k: config.channel_diversity_k,
            type_multipliers: config.type_multipliers,
        }
    }
}

impl PyDecayConfig {
    fn to_config(&self) -> PyResult<DecayConfig> {
        let config = DecayConfig {
            base_decay_rate: self.base_decay_rate,
            min_retention: self.min_retention,
            access_stability_k: self.access_stability_k,
            relation_resistance_k: self.relation_resistance_k,
            channel_diversity_k: self.channel_diversity_k,
            type_multipliers: self.type_multipliers,
        };
        config.validate()?;
        Ok(config)
    }
}

#[pymethods]
impl PyDecayConfig {
    #[new]
    fn new() -> Self {
        DecayConfig::default().into()
    }

    /// Load from a TOML document; missing keys keep their defaults.
    #[staticmethod]
    fn from_toml(source: &str) -> PyResult<Self> {
        Ok(DecayConfig::from_toml_str(source)?.into())
    }

    fn set_type_multipliers(&mut self, conversation: f64, fact: f64, preference: f64, insight: f64) {
        self.type_multipliers = TypeMultipliers::new(conversation, fact, preference, insight);
    }

    #[getter]
    fn type_multipliers(&self) -> Vec<f64> {
        self.type_multipliers.as_array().to_vec()
    }

    #[setter(type_multipliers)]
    fn set_type_multiplier_list(&mut self, values: Vec<f64>) -> PyResult<()> {
        self.type_multipliers = TypeMultipliers::try_from(values.as_slice())?;
        Ok(())
    }
}

/// One record with sentinel-encoded fields (negative hours mean absent).
#[pyclass(name = "DecayInput", module = "mnemo_accel.decay_ops")]
#[derive(Clone)]
pub struct PyDecayInput {
    #[pyo3(get, set)]
    importance: f64,
    #[pyo3(get, set)]
    hours_passed: f64,
    #[pyo3(get, set)]
    access_count: i64,
    #[pyo3(get, set)]
    connection_count: i64,
    #[pyo3(get, set)]
    last_access_hours: f64,
    #[pyo3(get, set)]
    memory_type: i64,
    #[pyo3(get, set)]
    channel_mentions: i64,
}

#[pymethods]
impl PyDecayInput {
    #[new]
    #[pyo3(signature = (
        importance = 0.0,
        hours_passed = 0.0,
        access_count = 0,
        connection_count = 0,
        last_access_hours = -1.0,
        memory_type = 0,
        channel_mentions = 0
    ))]
    fn new(
        importance: f64,
        hours_passed: f64,
        access_count: i64,
        connection_count: i64,
        last_access_hours: f64,
        memory_type: i64,
        channel_mentions: i64,
    ) -> Self {
        Self {
            importance,
            hours_passed,
            access_count,
            connection_count,
            last_access_hours,
            memory_type,
            channel_mentions,
        }
    }
}

impl PyDecayInput {
    fn to_input(&self) -> DecayInput {
        DecayInput::from_raw(
            self.importance,
            self.hours_passed,
            self.access_count,
            self.connection_count,
            self.last_access_hours,
            self.memory_type,
            self.channel_mentions,
        )
    }
}

/// Decayed importance for a single memory.
#[pyfunction]
fn calculate(input: PyRef<'_, PyDecayInput>, config: PyRef<'_, PyDecayConfig>) -> PyResult<f64> {
    Ok(decay::calculate(&input.to_input(), &config.to_config()?))
}

/// Decayed importance for a list of DecayInput objects.
#[pyfunction]
fn calculate_batch(
    py: Python<'_>,
    inputs: Vec<PyDecayInput>,
    config: PyRef<'_, PyDecayConfig>,
) -> PyResult<Vec<f64>> {
    let config = config.to_config()?;
    let inputs: Vec<DecayInput> = inputs.iter().map(PyDecayInput::to_input).collect();
    Ok(py.allow_threads(|| decay::calculate_batch(&inputs, &config)))
}

/// Decayed importance over parallel arrays; raises ValueError on length mismatch.
#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn calculate_batch_arrays(
    py: Python<'_>,
    importance: Vec<f64>,
    hours_passed: Vec<f64>,
    access_count: Vec<i64>,
    connection_count: Vec<i64>,
    last_access_hours: Vec<f64>,
    memory_type: Vec<i64>,
    channel_mentions: Vec<i64>,
    config: PyRef<'_, PyDecayConfig>,
) -> PyResult<Vec<f64>> {
    let config = config.to_config()?;
    let columns = DecayColumns {
        importance: &importance,
        hours_passed: &hours_passed,
        access_count: &access_count,
        connection_count: &connection_count,
        last_access_hours: &last_access_hours,
        memory_type: &memory_type,
        channel_mentions: &channel_mentions,
    };
    Ok(py.allow_threads(|| decay::calculate_batch_columns(&columns, &config))?)
}

/// Names `calculate_batch_arrays` is exported under in `decay_ops`.
const COLUMN_BATCH_NAMES: [&str; 2] = ["calculate_batch_arrays", "calculate_batch_numpy"];

/// Peak activity hours of a 24-bucket histogram.
#[pyfunction]
fn detect_peak_hours(hourly_rate: Vec<f64>) -> Vec<u8> {
    decay::detect_peak_hours(&hourly_rate)
}

/// Access count with one extra credit when last touched in a peak hour.
#[pyfunction]
fn apply_circadian_stability(access_count: i64, last_accessed_hour: u8, peak_hours: Vec<u8>) -> u32 {
    let access_count = u32::try_from(access_count.max(0)).unwrap_or(u32::MAX);
    decay::apply_circadian_stability(access_count, last_accessed_hour, &peak_hours)
}

/// Cosine similarity between two vectors.
#[pyfunction]
fn cosine_similarity(a: Vec<f64>, b: Vec<f64>) -> f64 {
    vector::cosine_similarity(&a, &b)
}

/// Cosine similarity of one query vector against N stored vectors.
#[pyfunction]
fn cosine_similarity_batch(py: Python<'_>, query: Vec<f64>, corpus: Vec<Vec<f64>>) -> PyResult<Vec<f64>> {
    let corpus = Matrix::from_rows(&corpus)?;
    Ok(py.allow_threads(|| vector::cosine_similarity_batch(&query, &corpus.view())))
}

/// Near-duplicate pairs as (i, j, similarity) tuples.
#[pyfunction]
fn find_duplicates_by_embedding(
    py: Python<'_>,
    embeddings: Vec<Vec<f64>>,
    threshold: f64,
) -> PyResult<Vec<(usize, usize, f64)>> {
    let embeddings = Matrix::from_rows(&embeddings)?;
    let pairs = py.allow_threads(|| vector::find_duplicates_by_embedding(&embeddings.view(), threshold));
    Ok(pairs.into_iter().map(Into::into).collect())
}

/// Nodes within `max_depth` hops of the start nodes.
#[pyfunction]
fn bfs_neighbors(
    adjacency: HashMap<usize, Vec<usize>>,
    start_nodes: Vec<usize>,
    max_depth: i64,
) -> HashSet<usize> {
    let max_depth = usize::try_from(max_depth.max(0)).unwrap_or(usize::MAX);
    graph::bfs_neighbors(&adjacency, &start_nodes, max_depth)
}

#[pyfunction]
fn find_connected_components(adjacency: HashMap<usize, Vec<usize>>, n_nodes: usize) -> Vec<usize> {
    graph::find_connected_components(&adjacency, n_nodes)
}

#[pyfunction]
fn levenshtein_distance(a: &str, b: &str) -> usize {
    strings::levenshtein_distance(a, b)
}

#[pyfunction]
fn string_similarity(a: &str, b: &str) -> f64 {
    strings::string_similarity(a, b)
}

#[pyfunction]
fn find_string_duplicates(strings: Vec<String>, threshold: f64) -> Vec<(usize, usize, f64)> {
    crate::strings::find_string_duplicates(&strings, threshold)
        .into_iter()
        .map(Into::into)
        .collect()
}

#[pyfunction]
fn string_similarity_batch(query: &str, targets: Vec<String>) -> Vec<f64> {
    strings::string_similarity_batch(query, &targets)
}

#[pyfunction]
#[pyo3(name = "has_avx2")]
fn py_has_avx2() -> bool {
    capability::has_avx2()
}

#[pyfunction]
#[pyo3(name = "has_neon")]
fn py_has_neon() -> bool {
    capability::has_neon()
}

#[pyfunction]
#[pyo3(name = "vectorized_path_active")]
fn py_vectorized_path_active() -> bool {
    capability::vectorized_path_active()
}

pub(crate) fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();

    // Decay math
    let decay_ops = PyModule::new_bound(py, "decay_ops")?;
    decay_ops.add_class::<PyDecayConfig>()?;
    decay_ops.add_class::<PyDecayInput>()?;
    decay_ops.add_function(wrap_pyfunction!(calculate, &decay_ops)?)?;
    decay_ops.add_function(wrap_pyfunction!(calculate_batch, &decay_ops)?)?;
    let column_batch = wrap_pyfunction!(calculate_batch_arrays, &decay_ops)?;
    for name in COLUMN_BATCH_NAMES {
        decay_ops.add(name, &column_batch)?;
    }
    decay_ops.add_function(wrap_pyfunction!(detect_peak_hours, &decay_ops)?)?;
    decay_ops.add_function(wrap_pyfunction!(apply_circadian_stability, &decay_ops)?)?;
    m.add_submodule(&decay_ops)?;

    // Vector operations
    let vector_ops = PyModule::new_bound(py, "vector_ops")?;
    vector_ops.add_function(wrap_pyfunction!(cosine_similarity, &vector_ops)?)?;
    vector_ops.add_function(wrap_pyfunction!(cosine_similarity_batch, &vector_ops)?)?;
    vector_ops.add_function(wrap_pyfunction!(find_duplicates_by_embedding, &vector_ops)?)?;
    m.add_submodule(&vector_ops)?;

    // Graph traversal
    let graph_ops = PyModule::new_bound(py, "graph_ops")?;
    graph_ops.add_function(wrap_pyfunction!(bfs_neighbors, &graph_ops)?)?;
    graph_ops.add_function(wrap_pyfunction!(find_connected_components, &graph_ops)?)?;
    m.add_submodule(&graph_ops)?;

    // String similarity
    let string_ops = PyModule::new_bound(py, "string_ops")?;
    string_ops.add_function(wrap_pyfunction!(levenshtein_distance, &string_ops)?)?;
    string_ops.add_function(wrap_pyfunction!(string_similarity, &string_ops)?)?;
    string_ops.add_function(wrap_pyfunction!(find_string_duplicates, &string_ops)?)?;
    string_ops.add_function(wrap_pyfunction!(string_similarity_batch, &string_ops)?)?;
    m.add_submodule(&string_ops)?;

    // Module info
    m.add_function(wrap_pyfunction!(py_has_avx2, m)?)?;
    m.add_function(wrap_pyfunction!(py_has_neon, m)?)?;
    m.add_function(wrap_pyfunction!(py_vectorized_path_active, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    tracing::debug!(capabilities = ?capability::capabilities(), "mnemo_accel loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_batch_keeps_both_export_names() {
        assert!(COLUMN_BATCH_NAMES.contains(&"calculate_batch_arrays"));
        assert!(COLUMN_BATCH_NAMES.contains(&"calculate_batch_numpy"));
    }
}
