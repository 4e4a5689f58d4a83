use crate::error::{AccelError, AccelResult};

/// Borrowed row-major matrix: `rows` vectors of `dim` values each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixView<'a> {
    data: &'a [f64],
    rows: usize,
    dim: usize,
}

impl<'a> MatrixView<'a> {
    /// View flat row-major data as rows of `dim` values.
    pub fn new(data: &'a [f64], dim: usize) -> AccelResult<Self> {
        if dim == 0 {
            if !data.is_empty() {
                return Err(AccelError::MatrixShape {
                    len: data.len(),
                    dim,
                });
            }
            return Ok(Self { data, rows: 0, dim });
        }
        if data.len() % dim != 0 {
            return Err(AccelError::MatrixShape {
                len: data.len(),
                dim,
            });
        }
        Ok(Self {
            data,
            rows: data.len() / dim,
            dim,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, index: usize) -> &'a [f64] {
        let start = index * self.dim;
        &self.data[start..start + self.dim]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &'a [f64]> + 'a {
        let view = *self;
        (0..view.rows).map(move |i| view.row(i))
    }

    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }
}

/// Owned row-major matrix, usually built from nested rows handed in by a caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    dim: usize,
}

impl Matrix {
    /// Flatten rows. Every row must share the first row's dimension.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> AccelResult<Self> {
        let dim = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * dim);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(AccelError::RaggedRow {
                    row: index,
                    expected: dim,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            dim,
        })
    }

    pub fn view(&self) -> MatrixView<'_> {
        MatrixView {
            data: &self.data,
            rows: self.rows,
            dim: self.dim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_splits_rows() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = MatrixView::new(&data, 3).unwrap();
        assert_eq!(view.nrows(), 2);
        assert_eq!(view.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(view.rows().len(), 2);
    }

    #[test]
    fn view_rejects_partial_rows() {
        let data = [1.0, 2.0, 3.0];
        assert_eq!(
            MatrixView::new(&data, 2),
            Err(AccelError::MatrixShape { len: 3, dim: 2 })
        );
        assert!(MatrixView::new(&data, 0).is_err());
        assert!(MatrixView::new(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Matrix::from_rows(&[vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            AccelError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn from_rows_keeps_zero_width_rows() {
        let matrix = Matrix::from_rows(&[Vec::<f64>::new(), Vec::new()]).unwrap();
        assert_eq!(matrix.view().nrows(), 2);
        assert_eq!(matrix.view().dim(), 0);
        assert!(matrix.view().row(1).is_empty());
    }
}
