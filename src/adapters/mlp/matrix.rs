//! Row-major dense matrix used by the network layers.

use std::collections::TryReserveError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Allocate without aborting the process on failure.
    pub(crate) fn try_zeros(rows: usize, cols: usize) -> Result<Self, TryReserveError> {
        let len = rows * cols;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0.0);
        Ok(Self { rows, cols, data })
    }

    pub(crate) fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub(crate) fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub(crate) fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Copy the given rows, in order, into a new matrix.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &r in indices {
            data.extend_from_slice(self.row(r));
        }
        Self::from_vec(indices.len(), self.cols, data)
    }

    /// Contiguous row range `[start, end)`.
    pub(crate) fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self::from_vec(
            end - start,
            self.cols,
            self.data[start * self.cols..end * self.cols].to_vec(),
        )
    }

    /// `self · other`
    pub(crate) fn matmul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let out_row = &mut out.data[i * other.cols..(i + 1) * other.cols];
            for (k, &a) in self.row(i).iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                for (o, &b) in out_row.iter_mut().zip(other.row(k)) {
                    *o += a * b;
                }
            }
        }
        out
    }

    /// `selfᵀ · other`
    pub(crate) fn transpose_matmul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.rows, other.rows);
        let mut out = Matrix::zeros(self.cols, other.cols);
        for r in 0..self.rows {
            let b_row = other.row(r);
            for (i, &a) in self.row(r).iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                let out_row = &mut out.data[i * other.cols..(i + 1) * other.cols];
                for (o, &b) in out_row.iter_mut().zip(b_row) {
                    *o += a * b;
                }
            }
        }
        out
    }

    /// `self · otherᵀ`
    pub(crate) fn matmul_transpose(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.cols);
        let mut out = Matrix::zeros(self.rows, other.rows);
        for i in 0..self.rows {
            let a_row = self.row(i);
            for j in 0..other.rows {
                out.data[i * other.rows + j] = a_row
                    .iter()
                    .zip(other.row(j))
                    .map(|(a, b)| a * b)
                    .sum();
            }
        }
        out
    }

    pub(crate) fn add_row_vector(&mut self, v: &[f64]) {
        debug_assert_eq!(v.len(), self.cols);
        for r in 0..self.rows {
            for (x, b) in self.row_mut(r).iter_mut().zip(v) {
                *x += b;
            }
        }
    }

    pub(crate) fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (s, x) in sums.iter_mut().zip(self.row(r)) {
                *s += x;
            }
        }
        sums
    }

    /// Element-wise product in place.
    pub(crate) fn hadamard_inplace(&mut self, other: &Matrix) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a *= b;
        }
    }

    pub(crate) fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        for x in &mut self.data {
            *x = f(*x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: usize, cols: usize, data: &[f64]) -> Matrix {
        Matrix::from_vec(rows, cols, data.to_vec())
    }

    #[test]
    fn test_matmul_variants_agree() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = m(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        assert_eq!(a.matmul(&b), m(2, 2, &[58.0, 64.0, 139.0, 154.0]));

        // aᵀ is 3×2; aᵀ·a is 3×3
        let ata = a.transpose_matmul(&a);
        assert_eq!(ata.rows(), 3);
        assert_eq!(ata.row(0), &[17.0, 22.0, 27.0]);

        // a·aᵀ is 2×2
        assert_eq!(a.matmul_transpose(&a), m(2, 2, &[14.0, 32.0, 32.0, 77.0]));
    }

    #[test]
    fn test_row_helpers() {
        let mut a = m(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.select_rows(&[2, 0]), m(2, 2, &[5.0, 6.0, 1.0, 2.0]));
        assert_eq!(a.slice_rows(1, 3), m(2, 2, &[3.0, 4.0, 5.0, 6.0]));
        assert_eq!(a.column_sums(), vec![9.0, 12.0]);

        a.add_row_vector(&[1.0, -1.0]);
        assert_eq!(a.row(0), &[2.0, 1.0]);
    }

    #[test]
    fn test_try_zeros() {
        let z = Matrix::try_zeros(4, 5).expect("small allocation");
        assert_eq!(z.as_slice().len(), 20);
        assert!(z.as_slice().iter().all(|v| *v == 0.0));
    }
}
