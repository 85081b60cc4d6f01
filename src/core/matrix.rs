//! Dense row-major 2-D buffer used for spectra, estimates and masks.
//!
//! Spectrum matrices are indexed `(frequency bin, time frame)`, so a row is
//! one bin across time and a column is one STFT frame.

use crate::error::{HpssError, Result};
use rustfft::num_complex::Complex64;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign};

/// Dense 2-D container with `rows * cols` elements stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Complex short-time spectrum, `(bin, frame)`.
pub type ComplexSpectrumMatrix = Matrix<Complex64>;
/// Elementwise squared magnitude of a [`ComplexSpectrumMatrix`].
pub type PowerSpectrumMatrix = Matrix<f64>;
/// Per-bin weights in `[0, 1]`.
pub type MaskMatrix = Matrix<f64>;

impl<T: Copy + Default> Matrix<T> {
    /// Creates a `rows x cols` matrix filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Wraps existing row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`HpssError::InvalidParams`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(HpssError::InvalidParams(format!(
                "matrix data has {} elements, {}x{} needs {}",
                data.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Borrowed view of row `r`.
    pub fn row(&self, r: usize) -> &[T] {
        assert!(r < self.rows, "row {} out of range ({} rows)", r, self.rows);
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        assert!(r < self.rows, "row {} out of range ({} rows)", r, self.rows);
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Copy of column `c`.
    pub fn column(&self, c: usize) -> Vec<T> {
        assert!(c < self.cols, "column {} out of range ({} cols)", c, self.cols);
        self.data
            .iter()
            .skip(c)
            .step_by(self.cols)
            .copied()
            .collect()
    }

    /// Overwrites column `c` with `values`.
    pub fn set_column(&mut self, c: usize, values: &[T]) {
        assert!(c < self.cols, "column {} out of range ({} cols)", c, self.cols);
        assert_eq!(values.len(), self.rows, "column length mismatch");
        for (r, &v) in values.iter().enumerate() {
            self.data[r * self.cols + c] = v;
        }
    }

    /// Resizes to `rows x cols`. Existing linear storage is kept, new cells
    /// are `T::default()`.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if self.rows != rows || self.cols != cols {
            self.rows = rows;
            self.cols = cols;
            self.data.resize(rows * cols, T::default());
        }
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    /// Applies `f` to every element, producing a new matrix of the same shape.
    pub fn map<U, F>(&self, f: F) -> Matrix<U>
    where
        U: Copy + Default,
        F: Fn(T) -> U,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    fn assert_same_shape<U>(&self, other: &Matrix<U>, op: &str) {
        assert!(
            self.rows == other.rows && self.cols == other.cols,
            "matrix elementwise {} with mismatched dimensions: {}x{} vs {}x{}",
            op,
            self.rows,
            self.cols,
            other.rows,
            other.cols
        );
    }
}

impl<T: Copy + Default + MulAssign<f64>> Matrix<T> {
    /// Multiplies every element by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for x in self.data.iter_mut() {
            *x *= factor;
        }
    }
}

impl Matrix<Complex64> {
    /// Elementwise product with a real-valued mask of the same shape.
    pub fn apply_mask(&self, mask: &MaskMatrix) -> Self {
        self.assert_same_shape(mask, "masking");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(mask.data.iter())
                .map(|(&x, &m)| x * m)
                .collect(),
        }
    }

    /// Elementwise `|x|²`.
    pub fn power(&self) -> PowerSpectrumMatrix {
        self.map(|x| x.norm_sqr())
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &T {
        debug_assert!(r < self.rows && c < self.cols);
        &self.data[r * self.cols + c]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        debug_assert!(r < self.rows && c < self.cols);
        &mut self.data[r * self.cols + c]
    }
}

macro_rules! elementwise_op {
    ($assign_trait:ident, $assign_fn:ident, $trait:ident, $fn:ident, $name:literal) => {
        impl<T: Copy + Default + $assign_trait> $assign_trait<&Matrix<T>> for Matrix<T> {
            fn $assign_fn(&mut self, rhs: &Matrix<T>) {
                self.assert_same_shape(rhs, $name);
                for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
                    a.$assign_fn(b);
                }
            }
        }

        impl<T: Copy + Default + $assign_trait> $trait<&Matrix<T>> for Matrix<T> {
            type Output = Matrix<T>;

            fn $fn(mut self, rhs: &Matrix<T>) -> Matrix<T> {
                self.$assign_fn(rhs);
                self
            }
        }

        impl<T: Copy + Default + $assign_trait> $trait<&Matrix<T>> for &Matrix<T> {
            type Output = Matrix<T>;

            fn $fn(self, rhs: &Matrix<T>) -> Matrix<T> {
                self.clone().$fn(rhs)
            }
        }
    };
}

elementwise_op!(AddAssign, add_assign, Add, add, "addition");
elementwise_op!(MulAssign, mul_assign, Mul, mul, "multiplication");
elementwise_op!(DivAssign, div_assign, Div, div, "division");

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<f64> {
        Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_new_is_zeroed() {
        let m: Matrix<f64> = Matrix::new(3, 4);
        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.len(), 12);
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        assert!(Matrix::from_vec(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn test_row_major_indexing() {
        let m = sample();
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.column(1), vec![2.0, 5.0]);
    }

    #[test]
    fn test_set_column() {
        let mut m = sample();
        m.set_column(2, &[9.0, 8.0]);
        assert_eq!(m.column(2), vec![9.0, 8.0]);
        assert_eq!(m.row(0), &[1.0, 2.0, 9.0]);
    }

    #[test]
    fn test_elementwise_ops() {
        let a = sample();
        let b = Matrix::from_vec(2, 3, vec![2.0; 6]).unwrap();
        assert_eq!((&a + &b).as_slice(), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!((&a * &b).as_slice(), &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        assert_eq!((&a / &b).as_slice(), &[0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    #[should_panic(expected = "mismatched dimensions")]
    fn test_mismatched_dimensions_panic() {
        let a = sample();
        let b: Matrix<f64> = Matrix::new(3, 2);
        let _ = &a + &b;
    }

    #[test]
    fn test_transpose() {
        let t = sample().transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transpose(), sample());
    }

    #[test]
    fn test_resize_keeps_storage_invariant() {
        let mut m = sample();
        m.resize(4, 4);
        assert_eq!(m.len(), 16);
        m.resize(1, 2);
        assert_eq!(m.len(), 2);
        assert_eq!(m.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_scale_and_map() {
        let mut m = sample();
        m.scale(0.5);
        assert_eq!(m[(1, 2)], 3.0);
        let doubled = m.map(|x| x * 2.0);
        assert_eq!(doubled, sample());
    }

    #[test]
    fn test_complex_mask_and_power() {
        let x = Matrix::from_vec(
            1,
            2,
            vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, -2.0)],
        )
        .unwrap();
        let mask = Matrix::from_vec(1, 2, vec![0.5, 1.0]).unwrap();
        let masked = x.apply_mask(&mask);
        assert_eq!(masked[(0, 0)], Complex64::new(1.5, 2.0));
        assert_eq!(masked[(0, 1)], Complex64::new(0.0, -2.0));
        assert_eq!(x.power().as_slice(), &[25.0, 4.0]);
    }
}
