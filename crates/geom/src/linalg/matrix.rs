use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

use super::Matrix4x4;
use crate::error::{GeomError, Result};

/// Dense matrix with an arbitrary number of rows and columns.
///
/// Elements are stored row-major. Equality is exact, element by element, and
/// includes the dimensions; callers that need a tolerance must round first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParams", into = "MatrixParams")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Serialized form of a [`Matrix`]; deserialization checks the element count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixParams {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl TryFrom<MatrixParams> for Matrix {
    type Error = GeomError;

    fn try_from(p: MatrixParams) -> Result<Self> {
        Matrix::from_row_major(p.rows, p.cols, p.data)
    }
}

impl From<Matrix> for MatrixParams {
    fn from(m: Matrix) -> Self {
        MatrixParams {
            rows: m.rows,
            cols: m.cols,
            data: m.data,
        }
    }
}

impl Matrix {
    /// Zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(order: usize) -> Self {
        let mut result = Self::new(order, order);
        for i in 0..order {
            result.data[i * order + i] = 1.0;
        }
        result
    }

    /// Build from a list of rows. All rows must have the same, non-zero length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || cols == 0 {
            return Err(GeomError::validation("matrix needs at least one row and column"));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(GeomError::validation(format!(
                "row {bad} has {} columns, expected {cols}",
                rows[bad].len()
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    }

    /// Build from row-major elements; `data` must hold exactly `rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(GeomError::validation(format!(
                "{rows}x{cols} matrix needs {} elements, got {}",
                rows.saturating_mul(cols),
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// All elements, row-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows {
            return Err(GeomError::IndexOutOfRange {
                index: row,
                len: self.rows,
            });
        }
        if col >= self.cols {
            return Err(GeomError::IndexOutOfRange {
                index: col,
                len: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    /// Bounds-checked element read.
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.offset(row, col).map(|i| self.data[i])
    }

    /// Bounds-checked element reference for in-place writes.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut f64> {
        let i = self.offset(row, col)?;
        Ok(&mut self.data[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        *self.get_mut(row, col)? = value;
        Ok(())
    }

    /// Set every element to zero, keeping the dimensions.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Change the dimensions. All elements are reset to zero.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.data.clear();
        self.data.resize(rows * cols, 0.0);
    }

    pub fn transposed(&self) -> Self {
        let mut result = Self::new(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                result.data[col * self.rows + row] = self.at(row, col);
            }
        }
        result
    }

    /// Matrix formed by omitting one row and one column.
    pub fn omit(&self, row: usize, col: usize) -> Result<Self> {
        self.offset(row, col)?;
        if self.rows < 2 || self.cols < 2 {
            return Err(GeomError::validation(format!(
                "cannot omit a row and column from a {}x{} matrix",
                self.rows, self.cols
            )));
        }
        Ok(self.without(row, col))
    }

    /// Determinant by cofactor expansion along the first row.
    pub fn determinant(&self) -> Result<f64> {
        if !self.is_square() || self.rows == 0 {
            return Err(GeomError::validation(format!(
                "determinant requires a non-empty square matrix, got {}x{}",
                self.rows, self.cols
            )));
        }
        Ok(self.expand_determinant())
    }

    fn expand_determinant(&self) -> f64 {
        match self.rows {
            1 => self.data[0],
            2 => self.data[0] * self.data[3] - self.data[1] * self.data[2],
            n => (0..n)
                .map(|col| {
                    let sign = if col % 2 == 1 { -1.0 } else { 1.0 };
                    let minor = self.without(0, col);
                    sign * self.at(0, col) * minor.expand_determinant()
                })
                .sum(),
        }
    }

    // Unchecked omit; callers guarantee indices in range and at least 2x2.
    fn without(&self, row: usize, col: usize) -> Self {
        let mut data = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for i in (0..self.rows).filter(|&i| i != row) {
            for j in (0..self.cols).filter(|&j| j != col) {
                data.push(self.at(i, j));
            }
        }
        Self {
            rows: self.rows - 1,
            cols: self.cols - 1,
            data,
        }
    }

    /// Determinant of the matrix without `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> Result<f64> {
        self.omit(row, col)?.determinant()
    }

    pub fn cofactor(&self, row: usize, col: usize) -> Result<f64> {
        let sign = if (row + col) % 2 == 1 { -1.0 } else { 1.0 };
        Ok(sign * self.minor(row, col)?)
    }

    /// Inverse through the adjugate: `inv(i, j) = cofactor(j, i) / det`.
    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant()?;
        if det == 0.0 || !det.is_finite() {
            return Err(GeomError::degenerate("matrix is singular and has no inverse"));
        }
        let order = self.rows;
        if order == 1 {
            return Ok(Self {
                rows: 1,
                cols: 1,
                data: vec![1.0 / det],
            });
        }
        let mut result = Self::new(order, order);
        for i in 0..order {
            for j in 0..order {
                let sign = if (i + j) % 2 == 1 { -1.0 } else { 1.0 };
                result.data[i * order + j] = sign * self.without(j, i).expand_determinant() / det;
            }
        }
        Ok(result)
    }

    /// Solve `self * x = rhs` for `x` using an LU decomposition.
    pub fn solve(&self, rhs: &Matrix) -> Result<Self> {
        if !self.is_square() || self.rows == 0 {
            return Err(GeomError::validation(format!(
                "solve requires a non-empty square matrix, got {}x{}",
                self.rows, self.cols
            )));
        }
        if rhs.rows != self.rows {
            return Err(GeomError::validation(format!(
                "right-hand side has {} rows, expected {}",
                rhs.rows, self.rows
            )));
        }
        let lu = DMatrix::from(self).lu();
        lu.solve(&DMatrix::from(rhs))
            .map(|x| Self::from(&x))
            .ok_or_else(|| GeomError::degenerate("matrix is singular, system has no unique solution"))
    }

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(GeomError::validation(format!(
                "matrix dimensions mismatch: {}x{} and {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect(),
        }
    }

    /// Matrix product. The column count of `self` must equal the row count of `other`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(GeomError::validation(format!(
                "cannot multiply {}x{} by {}x{}: inner dimensions differ",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut result = Self::new(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.at(i, k) * other.at(k, j);
                }
                result.data[i * other.cols + j] = sum;
            }
        }
        Ok(result)
    }

    pub fn scale(&self, scalar: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * scalar).collect(),
        }
    }

    pub fn divide(&self, scalar: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v / scalar).collect(),
        }
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;
    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl Div<f64> for &Matrix {
    type Output = Matrix;
    fn div(self, rhs: f64) -> Self::Output {
        self.divide(rhs)
    }
}

impl From<&Matrix> for DMatrix<f64> {
    fn from(m: &Matrix) -> Self {
        DMatrix::from_row_slice(m.rows, m.cols, &m.data)
    }
}

impl From<&DMatrix<f64>> for Matrix {
    fn from(m: &DMatrix<f64>) -> Self {
        let (rows, cols) = m.shape();
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(m[(row, col)]);
            }
        }
        Self { rows, cols, data }
    }
}

impl From<Matrix4x4> for Matrix {
    fn from(t: Matrix4x4) -> Self {
        Self {
            rows: 4,
            cols: 4,
            data: t.to_row_major().to_vec(),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}, {})", self.rows, self.cols)?;
        for row in 0..self.rows {
            writeln!(f)?;
            let cells: Vec<String> = (0..self.cols).map(|col| self.at(row, col).to_string()).collect();
            write!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}
