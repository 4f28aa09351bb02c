//! Fixed-step scalar quantization.

use super::{PASSTHROUGH_BITS, Quantized, levels_for};
use crate::error::Result;

/// Quantize float samples into `2^bits` equal-width cells over `[min_val, max_val]`.
///
/// Center `k` sits at the middle of cell `k`. Samples outside the range land
/// in the first or last cell. When `min_val == max_val` every sample and every
/// center collapses to `min_val`.
pub fn quantize_uniform(
    samples: &[f32],
    bits: u8,
    min_val: f32,
    max_val: f32,
) -> Result<Quantized<f32>> {
    let levels = levels_for(bits)?;
    if bits == PASSTHROUGH_BITS {
        return Ok(Quantized::passthrough(samples));
    }

    let range = max_val - min_val;
    if range == 0.0 {
        return Ok(Quantized {
            values: vec![min_val; samples.len()],
            centers: vec![min_val; levels],
        });
    }

    let step = range / levels as f32;
    let centers: Vec<f32> = (0..levels)
        .map(|k| min_val + (k as f32 + 0.5) * step)
        .collect();

    let last = levels as i64 - 1;
    let values = samples
        .iter()
        .map(|&v| {
            let idx = ((v - min_val) / step).floor() as i64;
            centers[idx.clamp(0, last) as usize]
        })
        .collect();

    Ok(Quantized { values, centers })
}

/// Quantize bytes into `2^bits` equal-width cells over `[0, 256)`.
///
/// Centers are the rounded cell midpoints, so they're integers in [0, 255].
pub fn quantize_uniform_u8(samples: &[u8], bits: u8) -> Result<Quantized<u8>> {
    let levels = levels_for(bits)?;
    if bits == PASSTHROUGH_BITS {
        return Ok(Quantized::passthrough(samples));
    }

    let step = 256.0f32 / levels as f32;
    let centers: Vec<u8> = (0..levels)
        .map(|k| {
            let c = (step * k as f32 + step / 2.0 + 0.5).floor();
            c.clamp(0.0, 255.0) as u8
        })
        .collect();

    let values = samples
        .iter()
        .map(|&v| {
            let idx = (f32::from(v) / step) as usize;
            centers[idx.min(levels - 1)]
        })
        .collect();

    Ok(Quantized { values, centers })
}
