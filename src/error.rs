use thiserror::Error;

/// Structural caller errors.
///
/// Numeric degeneracy (zero vectors, mismatched vector lengths, empty input) is
/// not represented here; those cases return a `0.0` score instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccelError {
    /// A decay config field is out of its valid range.
    #[error("invalid decay config: `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// The type multiplier table does not have one entry per memory type.
    #[error("type multiplier table needs {expected} entries, got {actual}")]
    TypeMultiplierCount { expected: usize, actual: usize },

    /// A TOML config document could not be parsed.
    #[error("failed to parse decay config: {0}")]
    ConfigParse(String),

    /// Parallel input columns disagree in length.
    #[error("column `{column}` has length {actual}, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Flat matrix data does not divide into rows of the given dimension.
    #[error("matrix data of length {len} does not fit rows of dimension {dim}")]
    MatrixShape { len: usize, dim: usize },

    /// A row of a matrix built from nested rows has the wrong dimension.
    #[error("row {row} has dimension {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

pub type AccelResult<T> = Result<T, AccelError>;
