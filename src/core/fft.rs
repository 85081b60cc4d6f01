//! Radix-2 Cooley-Tukey FFT/IFFT with Nyquist folding.
//!
//! Real input is transformed in place on a complex scratch buffer, then only
//! the non-negative frequencies (`N/2 + 1` bins) are kept. The inverse can
//! rebuild the mirrored half from such a folded spectrum before running the
//! same butterfly network with the twiddle angle reversed.

use crate::core::bits::{bit_reverse_permute, is_power_of_two};
use crate::error::{HpssError, Result};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Zero-valued complex number, used for buffer initialization.
pub const COMPLEX_ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Number of bins retained after Nyquist folding of an `n`-point transform.
#[inline]
pub fn nyquist_size(n: usize) -> usize {
    n / 2 + 1
}

/// Nyquist-folded spectrum of a single real frame.
///
/// Always holds `window_size / 2 + 1` bins, DC through Nyquist inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDomain {
    window_size: usize,
    bins: Vec<Complex64>,
}

impl FrequencyDomain {
    /// Creates a zeroed spectrum for frames of `window_size` samples.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            bins: vec![COMPLEX_ZERO; nyquist_size(window_size)],
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[Complex64] {
        &self.bins
    }

    pub fn bins_mut(&mut self) -> &mut [Complex64] {
        &mut self.bins
    }

    pub fn into_bins(self) -> Vec<Complex64> {
        self.bins
    }

    fn resize(&mut self, window_size: usize) {
        self.window_size = window_size;
        self.bins.resize(nyquist_size(window_size), COMPLEX_ZERO);
    }
}

/// Precomputed radix-2 transform of a fixed power-of-two size.
///
/// Holds the twiddle factors `exp(-2πik/N)` for `k < N/2`; stage `s` reads
/// every `N / 2^s`-th entry, so no trigonometry runs per frame.
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    size: usize,
    num_stages: u32,
    twiddles: Vec<Complex64>,
}

impl Radix2Fft {
    /// Plans a transform of `size` points.
    ///
    /// # Errors
    ///
    /// Returns [`HpssError::NotPowerOfTwo`] if `size` is not a power of two.
    pub fn new(size: usize) -> Result<Self> {
        if !is_power_of_two(size) {
            log::warn!("transform size is not a power of two: {}", size);
            return Err(HpssError::NotPowerOfTwo(size));
        }
        let twiddles = (0..size / 2)
            .map(|k| Complex64::from_polar(1.0, -2.0 * PI * k as f64 / size as f64))
            .collect();
        Ok(Self {
            size,
            num_stages: size.trailing_zeros(),
            twiddles,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real frame into a Nyquist-folded spectrum.
    ///
    /// `output` is resized to `size / 2 + 1` bins if needed. On error it is
    /// left untouched.
    pub fn forward(&self, input: &[f64], output: &mut FrequencyDomain) -> Result<()> {
        self.check_len(input.len())?;
        let mut buf: Vec<Complex64> = input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        self.run(&mut buf, false);

        if output.window_size() != self.size {
            output.resize(self.size);
        }
        output
            .bins_mut()
            .copy_from_slice(&buf[..nyquist_size(self.size)]);
        Ok(())
    }

    /// Full in-place forward transform of a complex buffer (no folding).
    pub fn forward_complex(&self, buf: &mut [Complex64]) -> Result<()> {
        self.check_len(buf.len())?;
        self.run(buf, false);
        Ok(())
    }

    /// In-place inverse transform of a full spectrum, scaled by `1/N`.
    pub fn inverse(&self, buf: &mut [Complex64]) -> Result<()> {
        self.check_len(buf.len())?;
        self.run(buf, true);
        let norm = 1.0 / self.size as f64;
        for x in buf.iter_mut() {
            *x *= norm;
        }
        Ok(())
    }

    /// Inverse transform of a Nyquist-folded spectrum into `out`.
    ///
    /// `out` is resized to `size` samples and holds the complex time-domain
    /// frame on success.
    pub fn inverse_folded(&self, folded: &[Complex64], out: &mut Vec<Complex64>) -> Result<()> {
        if folded.len() != nyquist_size(self.size) {
            return Err(HpssError::InvalidParams(format!(
                "folded spectrum has {} bins, expected {}",
                folded.len(),
                nyquist_size(self.size)
            )));
        }
        unfold_nyquist_into(folded, out);
        self.inverse(out)
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.size {
            if !is_power_of_two(len) {
                return Err(HpssError::NotPowerOfTwo(len));
            }
            return Err(HpssError::InvalidParams(format!(
                "buffer has {} points, transform planned for {}",
                len, self.size
            )));
        }
        Ok(())
    }

    /// Bit-reversal reorder followed by `log2(N)` butterfly stages.
    fn run(&self, buf: &mut [Complex64], inverse: bool) {
        bit_reverse_permute(buf, self.num_stages);

        for s in 1..=self.num_stages {
            let stage_n = 1usize << s;
            let half = stage_n >> 1;
            let stride = self.size / stage_n;

            for block in buf.chunks_exact_mut(stage_n) {
                let (lo, hi) = block.split_at_mut(half);
                for (j, (u, v)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                    let w = self.twiddles[j * stride];
                    let w = if inverse { w.conj() } else { w };
                    let t = w * *v;
                    *v = *u - t;
                    *u += t;
                }
            }
        }
    }
}

/// Rebuilds a full `N`-point spectrum from its first `N/2 + 1` bins.
///
/// Bin `N - i` receives `conj(X[i])` for `i` in `[1, N/2)`; DC and Nyquist
/// are never mirrored.
pub fn unfold_nyquist(folded: &[Complex64]) -> Vec<Complex64> {
    let mut full = Vec::new();
    unfold_nyquist_into(folded, &mut full);
    full
}

fn unfold_nyquist_into(folded: &[Complex64], full: &mut Vec<Complex64>) {
    full.clear();
    if folded.len() <= 1 {
        // A one-point transform folds onto itself.
        full.extend_from_slice(folded);
        return;
    }
    let n = 2 * (folded.len() - 1);
    full.resize(n, COMPLEX_ZERO);
    full[..folded.len()].copy_from_slice(folded);
    for i in 1..folded.len() - 1 {
        full[n - i] = folded[i].conj();
    }
}

/// Forward transform of a real buffer whose length must be a power of two.
pub fn forward_transform(x: &[f64]) -> Result<FrequencyDomain> {
    let fft = Radix2Fft::new(x.len())?;
    let mut out = FrequencyDomain::new(x.len());
    fft.forward(x, &mut out)?;
    Ok(out)
}

/// Inverse transform of an `n`-point spectrum.
///
/// With `nyquist_applied`, `spectrum` holds only the `n/2 + 1` folded bins and
/// the negative frequencies are mirrored back in first. Otherwise it must
/// hold all `n` bins.
pub fn inverse_transform(
    spectrum: &[Complex64],
    n: usize,
    nyquist_applied: bool,
) -> Result<Vec<Complex64>> {
    let fft = Radix2Fft::new(n)?;
    let mut out = Vec::with_capacity(n);
    if nyquist_applied {
        fft.inverse_folded(spectrum, &mut out)?;
    } else {
        if spectrum.len() != n {
            return Err(HpssError::InvalidParams(format!(
                "spectrum has {} bins, expected {}",
                spectrum.len(),
                n
            )));
        }
        out.extend_from_slice(spectrum);
        fft.inverse(&mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn test_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                (0.3 * t).sin() + 0.5 * (1.7 * t + 0.2).cos() - 0.1 * (i % 5) as f64
            })
            .collect()
    }

    #[test]
    fn test_non_power_of_two_rejected() {
        assert_eq!(
            Radix2Fft::new(12).unwrap_err(),
            HpssError::NotPowerOfTwo(12)
        );
        assert!(forward_transform(&[1.0; 6]).is_err());
        assert!(inverse_transform(&[COMPLEX_ZERO; 5], 6, false).is_err());
    }

    #[test]
    fn test_forward_error_leaves_output_untouched() {
        let fft = Radix2Fft::new(8).unwrap();
        let mut out = FrequencyDomain::new(8);
        out.bins_mut()[2] = Complex64::new(3.0, -1.0);
        let before = out.clone();
        assert!(fft.forward(&[1.0; 6], &mut out).is_err());
        assert_eq!(out, before);
    }

    #[test]
    fn test_impulse_is_flat() {
        let mut x = vec![0.0; 16];
        x[0] = 1.0;
        let spec = forward_transform(&x).unwrap();
        assert_eq!(spec.num_bins(), 9);
        for bin in spec.bins() {
            assert!((bin.norm() - 1.0).abs() < TOL, "bin magnitude {}", bin.norm());
        }
    }

    #[test]
    fn test_dc_only_in_bin_zero() {
        let spec = forward_transform(&[1.0; 32]).unwrap();
        assert!((spec.bins()[0].re - 32.0).abs() < TOL);
        for bin in &spec.bins()[1..] {
            assert!(bin.norm() < TOL, "leakage {}", bin.norm());
        }
    }

    #[test]
    fn test_single_point_transform() {
        let spec = forward_transform(&[2.5]).unwrap();
        assert_eq!(spec.num_bins(), 1);
        assert!((spec.bins()[0].re - 2.5).abs() < TOL);
        let back = inverse_transform(spec.bins(), 1, false).unwrap();
        assert!((back[0].re - 2.5).abs() < TOL);
    }

    #[test]
    fn test_round_trip_folded() {
        for n in [2usize, 4, 8, 64, 1024] {
            let x = test_signal(n);
            let spec = forward_transform(&x).unwrap();
            let back = inverse_transform(spec.bins(), n, true).unwrap();
            assert_eq!(back.len(), n);
            for (a, b) in x.iter().zip(back.iter()) {
                assert!((a - b.re).abs() < TOL, "n={} {} vs {}", n, a, b.re);
                assert!(b.im.abs() < TOL);
            }
        }
    }

    #[test]
    fn test_round_trip_full_spectrum() {
        let n = 256;
        let x = test_signal(n);
        let fft = Radix2Fft::new(n).unwrap();
        let mut buf: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        fft.forward_complex(&mut buf).unwrap();
        let back = inverse_transform(&buf, n, false).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b.re).abs() < TOL);
        }
    }

    #[test]
    fn test_unfold_mirrors_conjugates() {
        let folded = vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 1.0),
            Complex64::new(3.0, -2.0),
            Complex64::new(4.0, 0.0),
            Complex64::new(5.0, 0.0),
        ];
        let full = unfold_nyquist(&folded);
        assert_eq!(full.len(), 8);
        assert_eq!(full[4], Complex64::new(5.0, 0.0));
        assert_eq!(full[7], Complex64::new(2.0, -1.0));
        assert_eq!(full[6], Complex64::new(3.0, 2.0));
        assert_eq!(full[5], Complex64::new(4.0, 0.0));
    }

    #[test]
    fn test_inverse_folded_rejects_wrong_bin_count() {
        let fft = Radix2Fft::new(8).unwrap();
        let mut out = Vec::new();
        assert!(fft.inverse_folded(&[COMPLEX_ZERO; 4], &mut out).is_err());
    }
}
