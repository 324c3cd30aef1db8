//! Offline resampling of a whole clip to the model's 16 kHz rate.
//!
//! Uses a fixed-quality FFT resampler. The filter is deterministic, so
//! identical input always produces bit-identical output.

use super::{AudioError, TARGET_SAMPLE_RATE};
use rubato::{FftFixedIn, Resampler};
use tracing::debug;

/// Input chunk size fed to the FFT resampler
const CHUNK_SIZE: usize = 1024;

/// Resample a mono clip from `source_rate` to 16 kHz.
///
/// Returns the input unchanged when the source is already at 16 kHz.
/// The resampler's filter delay is trimmed so the output aligns with the
/// start of the input and has length `round(len * 16000 / source_rate)`.
pub fn resample_to_target(input: &[f32], source_rate: u32) -> Result<Vec<f32>, AudioError> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(input.to_vec());
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let expected = (input.len() as f64 * ratio).round() as usize;

    debug!(
        "Resampling {} samples: {} Hz -> {} Hz (ratio {:.4})",
        input.len(),
        source_rate,
        TARGET_SAMPLE_RATE,
        ratio
    );

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        CHUNK_SIZE,
        2, // sub_chunks for quality
        1, // mono
    )
    .map_err(|e| AudioError::ResampleError(e.to_string()))?;

    let delay = resampler.output_delay();
    let mut out: Vec<f32> = Vec::with_capacity(expected + delay);

    for chunk in input.chunks(CHUNK_SIZE) {
        let frames = if chunk.len() == CHUNK_SIZE {
            resampler
                .process(&[chunk], None)
                .map_err(|e| AudioError::ResampleError(e.to_string()))?
        } else {
            resampler
                .process_partial(Some(&[chunk]), None)
                .map_err(|e| AudioError::ResampleError(e.to_string()))?
        };
        out.extend_from_slice(&frames[0]);
    }

    // Flush the filter tail until the delay-compensated output is complete
    while out.len() < expected + delay {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        if frames[0].is_empty() {
            break;
        }
        out.extend_from_slice(&frames[0]);
    }

    let start = delay.min(out.len());
    let end = (delay + expected).min(out.len());
    Ok(out[start..end].to_vec())
}
