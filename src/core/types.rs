use std::ops::Index;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::KernelError;

/// Dense f32 matrix stored as a flat row-major buffer
///
/// The shape travels with the data, so kernels never trust a separately passed
/// row/column count. Element (i, j) lives at offset `i * cols + j`.
/// Both dimensions are at least 1 and `data.len() == rows * cols` always holds.
/// A vector of length n is represented as a 1 x n matrix (see [`Matrix::row_vector`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix", into = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// Wire form of a matrix, validated on the way in
#[derive(Serialize, Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = KernelError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        Matrix::new(raw.rows, raw.cols, raw.data)
    }
}

impl From<Matrix> for RawMatrix {
    fn from(m: Matrix) -> Self {
        RawMatrix {
            rows: m.rows,
            cols: m.cols,
            data: m.data,
        }
    }
}

fn checked_len(rows: usize, cols: usize) -> Result<usize, KernelError> {
    if rows == 0 || cols == 0 {
        return Err(KernelError::InvalidShape { rows, cols });
    }
    rows.checked_mul(cols)
        .ok_or(KernelError::AllocationFailure { elements: usize::MAX })
}

impl Matrix {
    /// Wrap an existing row-major buffer
    ///
    /// # Errors
    /// - `InvalidShape` if either dimension is zero
    /// - `BufferSizeMismatch` if `data.len() != rows * cols`
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, KernelError> {
        let expected = checked_len(rows, cols)?;
        if data.len() != expected {
            return Err(KernelError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Zero-filled matrix. The buffer is reserved fallibly so that a huge
    /// request surfaces as `AllocationFailure` instead of aborting.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, KernelError> {
        let len = checked_len(rows, cols)?;
        let mut data: Vec<f32> = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| KernelError::AllocationFailure { elements: len })?;
        data.resize(len, 0.0);
        Ok(Self { rows, cols, data })
    }

    /// n x n identity
    pub fn identity(n: usize) -> Result<Self, KernelError> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// 1 x n matrix holding `data`
    pub fn row_vector(data: Vec<f32>) -> Result<Self, KernelError> {
        let cols = data.len();
        Self::new(1, cols, data)
    }

    /// Matrix with entries drawn uniformly from [-1, 1)
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<Self, KernelError> {
        let mut m = Self::zeros(rows, cols)?;
        for x in m.data.iter_mut() {
            *x = rng.gen_range(-1.0f32..1.0);
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed matrix
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the whole buffer
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Row `i`, or None if out of range
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.rows {
            return None;
        }
        Some(&self.data[i * self.cols..(i + 1) * self.cols])
    }

    pub fn rows_iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.cols)
    }

    pub fn rows_iter_mut(&mut self) -> std::slice::ChunksExactMut<'_, f32> {
        self.data.chunks_exact_mut(self.cols)
    }

    /// Bounds-checked element read
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    /// Bounds-checked element write
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<(), KernelError> {
        if row >= self.rows || col >= self.cols {
            return Err(KernelError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.data[row * self.cols + col] = value;
        Ok(())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}
