//! Harmonic-Percussive Source Separation (HPSS) in the spectral domain.
//!
//! Harmonic content is identified by temporal continuity (time-axis median),
//! percussive content by broadband energy within a frame (frequency-axis
//! median). The two estimates become a pair of masks that split the complex
//! spectrum into two spectra summing to the original.

use crate::analysis::mask::{apply_mask, compute_masks};
use crate::analysis::median::median_estimates;
use crate::analysis::spectrum::Spectra;
use crate::core::matrix::{ComplexSpectrumMatrix, MaskMatrix};
use crate::core::parallel::WorkerPool;
use crate::core::types::HpssParams;
use crate::error::Result;

/// Output of the spectral separation stage.
#[derive(Debug, Clone)]
pub struct SeparatedSpectra {
    /// Complex spectrum multiplied by the harmonic mask.
    pub harmonic: ComplexSpectrumMatrix,
    /// Complex spectrum multiplied by the percussive mask.
    pub percussive: ComplexSpectrumMatrix,
    pub harmonic_mask: MaskMatrix,
    pub percussive_mask: MaskMatrix,
}

/// Splits `spectra.complex` into harmonic and percussive spectra.
///
/// Each step waits for all of its workers before the next one starts.
pub fn separate_spectra(
    spectra: &Spectra,
    params: &HpssParams,
    pool: &WorkerPool,
) -> Result<SeparatedSpectra> {
    let (yh, yp) = median_estimates(&spectra.power, params, pool)?;
    let (harmonic_mask, percussive_mask) = compute_masks(&yh, &yp, params.mask, pool)?;
    log::debug!("computed {:?} masks", params.mask);

    let (harmonic, percussive) = pool.join(
        || apply_mask(&spectra.complex, &harmonic_mask, pool),
        || apply_mask(&spectra.complex, &percussive_mask, pool),
    );

    Ok(SeparatedSpectra {
        harmonic: harmonic?,
        percussive: percussive?,
        harmonic_mask,
        percussive_mask,
    })
}
