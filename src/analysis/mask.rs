//! Harmonic/percussive masks derived from the median estimates.

use crate::core::matrix::{ComplexSpectrumMatrix, MaskMatrix, Matrix, PowerSpectrumMatrix};
use crate::core::parallel::WorkerPool;
use crate::core::types::MaskPolicy;
use crate::error::Result;

/// Binary mask for one bin: the larger estimate takes everything, ties go to
/// the harmonic side.
#[inline]
pub fn binary_mask(yh: f64, yp: f64) -> (f64, f64) {
    if yh >= yp {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    }
}

/// Soft mask for one bin with compression exponent `power`.
///
/// `mH = (yH^p + ε/2) / (yH^p + yP^p + ε)` and `mP = 1 - mH`, so the pair
/// always sums to one and both estimates vanishing gives an even split.
#[inline]
pub fn soft_mask(yh: f64, yp: f64, power: f64, epsilon: f64) -> (f64, f64) {
    let h = yh.max(0.0).powf(power);
    let p = yp.max(0.0).powf(power);
    let mh = ((h + epsilon / 2.0) / (h + p + epsilon)).clamp(0.0, 1.0);
    (mh, 1.0 - mh)
}

/// Mask pair for one bin under `policy`.
#[inline]
pub fn mask_bin(yh: f64, yp: f64, policy: MaskPolicy) -> (f64, f64) {
    match policy {
        MaskPolicy::Binary => binary_mask(yh, yp),
        MaskPolicy::Soft { power, epsilon } => soft_mask(yh, yp, power, epsilon),
    }
}

/// Builds `(mH, mP)` from the harmonic and percussive estimates.
///
/// # Panics
///
/// Panics if `yh` and `yp` differ in shape.
pub fn compute_masks(
    yh: &PowerSpectrumMatrix,
    yp: &PowerSpectrumMatrix,
    policy: MaskPolicy,
    pool: &WorkerPool,
) -> Result<(MaskMatrix, MaskMatrix)> {
    assert_eq!(
        yh.shape(),
        yp.shape(),
        "harmonic and percussive estimates differ in shape"
    );
    let (rows, cols) = yh.shape();
    let mut mh: MaskMatrix = Matrix::new(rows, cols);
    let mut mp: MaskMatrix = Matrix::new(rows, cols);
    if mh.is_empty() {
        return Ok((mh, mp));
    }

    pool.for_each_chunk_mut(mh.as_mut_slice(), cols, |bins, chunk| {
        let start = bins.start * cols;
        for (i, m) in chunk.iter_mut().enumerate() {
            let idx = start + i;
            *m = mask_bin(yh.as_slice()[idx], yp.as_slice()[idx], policy).0;
        }
        Ok(())
    })?;

    // The percussive mask is the complement for both policies.
    let mh_ref = &mh;
    pool.for_each_chunk_mut(mp.as_mut_slice(), cols, |bins, chunk| {
        let start = bins.start * cols;
        for (i, m) in chunk.iter_mut().enumerate() {
            *m = 1.0 - mh_ref.as_slice()[start + i];
        }
        Ok(())
    })?;

    Ok((mh, mp))
}

/// Elementwise product of `spectrum` with `mask`, split by rows.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn apply_mask(
    spectrum: &ComplexSpectrumMatrix,
    mask: &MaskMatrix,
    pool: &WorkerPool,
) -> Result<ComplexSpectrumMatrix> {
    assert_eq!(
        spectrum.shape(),
        mask.shape(),
        "matrix elementwise masking with mismatched dimensions"
    );
    let (rows, cols) = spectrum.shape();
    let mut out: ComplexSpectrumMatrix = Matrix::new(rows, cols);
    if out.is_empty() {
        return Ok(out);
    }
    pool.for_each_chunk_mut(out.as_mut_slice(), cols, |bins, chunk| {
        for (r, row) in bins.zip(chunk.chunks_exact_mut(cols)) {
            for ((o, &x), &m) in row.iter_mut().zip(spectrum.row(r)).zip(mask.row(r)) {
                *o = x * m;
            }
        }
        Ok(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DEFAULT_MASK_EPSILON, DEFAULT_MASK_POWER};
    use rustfft::num_complex::Complex64;

    fn soft(yh: f64, yp: f64) -> (f64, f64) {
        soft_mask(yh, yp, DEFAULT_MASK_POWER, DEFAULT_MASK_EPSILON)
    }

    #[test]
    fn test_binary_harmonic_selected() {
        assert_eq!(binary_mask(10.0, 9.0), (1.0, 0.0));
    }

    #[test]
    fn test_binary_percussive_selected() {
        assert_eq!(binary_mask(7.0, 9.0), (0.0, 1.0));
    }

    #[test]
    fn test_binary_tie_goes_harmonic() {
        assert_eq!(binary_mask(3.0, 3.0), (1.0, 0.0));
    }

    #[test]
    fn test_soft_harmonic_bias() {
        let (mh, mp) = soft(10.0, 9.0);
        assert!(mh > mp);
        assert!((0.0..=1.0).contains(&mh));
    }

    #[test]
    fn test_soft_percussive_bias() {
        let (mh, mp) = soft(7.0, 9.0);
        assert!(mp > mh);
        assert!((0.0..=1.0).contains(&mp));
    }

    #[test]
    fn test_soft_zero_estimates_split_evenly() {
        let (mh, mp) = soft(0.0, 0.0);
        assert!((mh - 0.5).abs() < 1e-12);
        assert!((mp - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_soft_mask_properties() {
        let values = [0.0, 1e-12, 1e-6, 0.01, 0.5, 1.0, 3.0, 9.0, 10.0, 1e4, 1e9];
        for &yh in &values {
            for &yp in &values {
                let (mh, mp) = soft(yh, yp);
                assert!((mh + mp - 1.0).abs() < 1e-12, "sum for {} {}", yh, yp);
                assert!((0.0..=1.0).contains(&mh));
                assert!((0.0..=1.0).contains(&mp));
                assert_eq!(mh > mp, yh > yp, "ordering for {} {}", yh, yp);
            }
        }
    }

    #[test]
    fn test_compute_masks_complementary() {
        let pool = WorkerPool::new(2).unwrap();
        let yh = Matrix::from_vec(2, 3, vec![1.0, 5.0, 0.0, 2.0, 2.0, 8.0]).unwrap();
        let yp = Matrix::from_vec(2, 3, vec![4.0, 1.0, 0.0, 2.0, 3.0, 1.0]).unwrap();

        let (mh, mp) = compute_masks(&yh, &yp, MaskPolicy::Binary, &pool).unwrap();
        assert_eq!(mh.as_slice(), &[0.0, 1.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(mp.as_slice(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

        let (mh, mp) = compute_masks(&yh, &yp, MaskPolicy::default(), &pool).unwrap();
        for (h, p) in mh.as_slice().iter().zip(mp.as_slice()) {
            assert!((h + p - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_masked_spectra_sum_to_original() {
        let pool = WorkerPool::new(3).unwrap();
        let spectrum = Matrix::from_vec(
            2,
            2,
            vec![
                Complex64::new(1.0, 2.0),
                Complex64::new(-3.0, 0.5),
                Complex64::new(0.0, -1.0),
                Complex64::new(4.0, 4.0),
            ],
        )
        .unwrap();
        let yh = Matrix::from_vec(2, 2, vec![0.3, 7.0, 1.0, 0.0]).unwrap();
        let yp = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 5.0]).unwrap();
        let (mh, mp) = compute_masks(&yh, &yp, MaskPolicy::default(), &pool).unwrap();
        let h = apply_mask(&spectrum, &mh, &pool).unwrap();
        let p = apply_mask(&spectrum, &mp, &pool).unwrap();
        for ((a, b), x) in h
            .as_slice()
            .iter()
            .zip(p.as_slice())
            .zip(spectrum.as_slice())
        {
            assert!((a + b - x).norm() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "mismatched dimensions")]
    fn test_apply_mask_shape_mismatch() {
        let pool = WorkerPool::new(1).unwrap();
        let spectrum: ComplexSpectrumMatrix = Matrix::new(2, 2);
        let mask: MaskMatrix = Matrix::new(2, 3);
        let _ = apply_mask(&spectrum, &mask, &pool);
    }
}
