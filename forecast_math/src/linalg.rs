//! Dense linear algebra for small symmetric systems
//!
//! The regression problems solved here have a few dozen columns at most, so
//! matrices are stored as flat row-major `Vec<f64>` and factorized directly.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Row-major design matrix built one observation at a time
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    cols: usize,
    data: Vec<f64>,
}

impl DesignMatrix {
    /// Create an empty design matrix with a fixed number of columns
    pub fn new(cols: usize) -> Result<Self> {
        if cols == 0 {
            return Err(MathError::InvalidInput(
                "Design matrix needs at least one column".to_string(),
            ));
        }

        Ok(Self {
            cols,
            data: Vec::new(),
        })
    }

    /// Append one row of regressor values
    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.cols {
            return Err(MathError::DimensionMismatch {
                expected: self.cols,
                got: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Non-finite value in design row {}",
                self.rows()
            )));
        }

        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.len() / self.cols
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow a single row
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }

    /// Compute `XᵀX` (row-major, `cols × cols`) and `Xᵀy`
    pub fn normal_equations(&self, y: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        if y.len() != self.rows() {
            return Err(MathError::DimensionMismatch {
                expected: self.rows(),
                got: y.len(),
            });
        }

        let p = self.cols;
        let mut xtx = vec![0.0; p * p];
        let mut xty = vec![0.0; p];

        for (row, &target) in self.iter_rows().zip(y) {
            for i in 0..p {
                let xi = row[i];
                if xi == 0.0 {
                    continue;
                }
                xty[i] += xi * target;
                for j in 0..=i {
                    xtx[i * p + j] += xi * row[j];
                }
            }
        }

        // Mirror the lower triangle
        for i in 0..p {
            for j in 0..i {
                xtx[j * p + i] = xtx[i * p + j];
            }
        }

        Ok((xtx, xty))
    }
}

/// Cholesky factor `L` of a symmetric positive definite matrix `A = L Lᵀ`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cholesky {
    dim: usize,
    /// Lower triangle, row-major `dim × dim`
    lower: Vec<f64>,
}

impl Cholesky {
    /// Factorize a row-major symmetric matrix
    pub fn factor(matrix: &[f64], dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(MathError::InvalidInput("Empty matrix".to_string()));
        }
        if matrix.len() != dim * dim {
            return Err(MathError::DimensionMismatch {
                expected: dim * dim,
                got: matrix.len(),
            });
        }

        let mut lower = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..=i {
                let mut sum = matrix[i * dim + j];
                for k in 0..j {
                    sum -= lower[i * dim + k] * lower[j * dim + k];
                }

                if i == j {
                    if sum <= 0.0 || !sum.is_finite() {
                        return Err(MathError::NotPositiveDefinite {
                            pivot: i,
                            value: sum,
                        });
                    }
                    lower[i * dim + i] = sum.sqrt();
                } else {
                    lower[i * dim + j] = sum / lower[j * dim + j];
                }
            }
        }

        Ok(Self { dim, lower })
    }

    /// Dimension of the factorized matrix
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Solve `L z = b`
    pub fn forward(&self, rhs: &[f64]) -> Result<Vec<f64>> {
        self.check_len(rhs)?;
        let n = self.dim;
        let mut z = vec![0.0; n];
        for i in 0..n {
            let mut sum = rhs[i];
            for j in 0..i {
                sum -= self.lower[i * n + j] * z[j];
            }
            z[i] = sum / self.lower[i * n + i];
        }
        Ok(z)
    }

    /// Solve `A x = b`
    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>> {
        let z = self.forward(rhs)?;
        let n = self.dim;

        // Backward substitution: Lᵀ x = z
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = z[i];
            for j in (i + 1)..n {
                sum -= self.lower[j * n + i] * x[j];
            }
            x[i] = sum / self.lower[i * n + i];
        }
        Ok(x)
    }

    /// Compute `xᵀ A⁻¹ x` as `‖L⁻¹ x‖²`
    pub fn inverse_quadratic_form(&self, x: &[f64]) -> Result<f64> {
        let z = self.forward(x)?;
        Ok(z.iter().map(|v| v * v).sum())
    }

    fn check_len(&self, rhs: &[f64]) -> Result<()> {
        if rhs.len() != self.dim {
            return Err(MathError::DimensionMismatch {
                expected: self.dim,
                got: rhs.len(),
            });
        }
        Ok(())
    }
}
