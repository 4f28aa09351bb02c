//! Quality metrics for comparing a reconstruction against its reference.
//!
//! - **MSE**: mean squared error per byte, per channel, or per float component
//! - **PSNR**: peak signal-to-noise ratio, `10 log10(255² / MSE)` (higher is better)
//! - **Absolute error**: sum of `|a - b|` over paired bytes
//! - **DSSIM**: structural dissimilarity via `dssim-core` (feature `dssim`)
//!
//! All reducers are pure. Paired inputs must have equal lengths; empty inputs
//! have an MSE of 0.

#[cfg(feature = "dssim")]
pub mod dssim;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ensure_len};
use crate::pixels::{CHANNELS, buffer_len};

/// PSNR reported for identical inputs (MSE == 0), in place of infinity.
pub const PSNR_SENTINEL: f64 = 1e9;

/// Peak sample value for PSNR.
const PEAK: f64 = 255.0;

/// Mean squared difference over paired bytes.
pub fn mse(a: &[u8], b: &[u8]) -> Result<f64> {
    ensure_len("mse input", a.len(), b.len())?;
    if a.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum();
    Ok(sum / a.len() as f64)
}

/// Mean squared difference over one channel of two interleaved RGB buffers.
///
/// Only bytes at `3 * i + channel` are compared.
pub fn mse_channel(a: &[u8], b: &[u8], channel: usize) -> Result<f64> {
    if channel >= CHANNELS {
        return Err(Error::InvalidChannel(channel));
    }
    ensure_len("mse input", a.len(), b.len())?;

    let pixels = a.len() / CHANNELS;
    if pixels == 0 {
        return Ok(0.0);
    }
    let sum: f64 = a
        .chunks_exact(CHANNELS)
        .zip(b.chunks_exact(CHANNELS))
        .map(|(x, y)| {
            let d = f64::from(x[channel]) - f64::from(y[channel]);
            d * d
        })
        .sum();
    Ok(sum / pixels as f64)
}

/// Mean squared difference over paired float components.
pub fn mse_f32(a: &[f32], b: &[f32]) -> Result<f64> {
    ensure_len("mse input", a.len(), b.len())?;
    if a.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum();
    Ok(sum / a.len() as f64)
}

/// PSNR in dB for a given MSE. Zero MSE yields [`PSNR_SENTINEL`].
#[must_use]
pub fn psnr_from_mse(mse: f64) -> f64 {
    if mse == 0.0 {
        PSNR_SENTINEL
    } else {
        10.0 * (PEAK * PEAK / mse).log10()
    }
}

/// Sum of absolute differences over paired bytes.
pub fn absolute_error(a: &[u8], b: &[u8]) -> Result<u64> {
    ensure_len("absolute error input", a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(&x, &y)| u64::from(x.abs_diff(y))).sum())
}

/// Calculate PSNR between two interleaved RGB images.
///
/// Both buffers must hold exactly `width * height * 3` bytes.
pub fn calculate_psnr(reference: &[u8], test: &[u8], width: usize, height: usize) -> Result<f64> {
    let expected = buffer_len(width, height);
    ensure_len("reference image", expected, reference.len())?;
    ensure_len("test image", expected, test.len())?;
    Ok(psnr_from_mse(mse(reference, test)?))
}

/// Configuration for which metrics to calculate.
///
/// MSE is always computed; it is the input to PSNR.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Calculate PSNR (peak signal-to-noise ratio).
    pub psnr: bool,
    /// Calculate DSSIM (structural dissimilarity). Ignored without the
    /// `dssim` feature.
    pub dssim: bool,
}

impl MetricConfig {
    /// Calculate all available metrics.
    #[must_use]
    pub fn all() -> Self {
        Self {
            psnr: true,
            dssim: true,
        }
    }

    /// Fast metric set (PSNR only).
    #[must_use]
    pub fn fast() -> Self {
        Self {
            psnr: true,
            dssim: false,
        }
    }
}

/// Results from metric calculations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricResult {
    /// Mean squared error per byte.
    pub mse: f64,
    /// PSNR value in dB (higher is better).
    pub psnr: Option<f64>,
    /// DSSIM value (lower is better, 0 = identical).
    pub dssim: Option<f64>,
}

/// Compare two interleaved RGB images with the metrics selected in `config`.
pub fn calculate_metrics(
    reference: &[u8],
    test: &[u8],
    width: usize,
    height: usize,
    config: &MetricConfig,
) -> Result<MetricResult> {
    let expected = buffer_len(width, height);
    ensure_len("reference image", expected, reference.len())?;
    ensure_len("test image", expected, test.len())?;

    let mse = mse(reference, test)?;

    #[cfg(feature = "dssim")]
    let dssim = if config.dssim && width > 0 && height > 0 {
        Some(dssim::calculate_dssim(reference, test, width, height)?)
    } else {
        None
    };
    #[cfg(not(feature = "dssim"))]
    let dssim = None;

    Ok(MetricResult {
        mse,
        psnr: config.psnr.then(|| psnr_from_mse(mse)),
        dssim,
    })
}
