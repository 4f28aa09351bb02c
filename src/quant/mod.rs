//! Scalar quantizers for image channels.
//!
//! Two strategies are provided:
//!
//! - [`uniform`]: fixed-step quantization over a float range or directly on
//!   bytes.
//! - [`adaptive`]: histogram-seeded, Lloyd-refined ("smart") quantization.
//!
//! Both reduce a channel to `2^bits` reconstruction levels and hand back the
//! centers alongside the quantized samples. A bit depth of 8 is a documented
//! passthrough: the input comes back unchanged and the center list is empty.

pub mod adaptive;
pub mod uniform;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use adaptive::{AdaptiveQuantizer, quantize_adaptive};
pub use uniform::{quantize_uniform, quantize_uniform_u8};

/// Bit depth that leaves samples untouched.
pub const PASSTHROUGH_BITS: u8 = 8;

/// Output of a quantizer: reconstructed samples plus the levels they came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantized<T> {
    /// One reconstructed value per input sample.
    pub values: Vec<T>,
    /// Reconstruction levels, ascending. Empty for the 8-bit passthrough.
    pub centers: Vec<T>,
}

impl<T: Clone> Quantized<T> {
    fn passthrough(samples: &[T]) -> Self {
        Self {
            values: samples.to_vec(),
            centers: Vec::new(),
        }
    }
}

/// Which quantizer to run on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantMethod {
    /// Fixed-step quantization.
    #[default]
    Uniform,
    /// Histogram-seeded Lloyd refinement.
    Smart,
}

impl QuantMethod {
    /// Both methods, in sweep order.
    pub const ALL: [Self; 2] = [Self::Uniform, Self::Smart];
}

impl fmt::Display for QuantMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Smart => write!(f, "smart"),
        }
    }
}

impl FromStr for QuantMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "uniform" | "u" => Ok(Self::Uniform),
            "2" | "smart" | "s" => Ok(Self::Smart),
            _ => Err(Error::InvalidOption {
                kind: "quantization method",
                value: s.to_string(),
            }),
        }
    }
}

/// Number of reconstruction levels for `bits`, rejecting depths outside 1..=8.
pub fn levels_for(bits: u8) -> Result<usize> {
    if (1..=PASSTHROUGH_BITS).contains(&bits) {
        Ok(1usize << bits)
    } else {
        Err(Error::InvalidBitDepth(bits))
    }
}

/// Minimum and maximum of a float channel. `None` if it's empty.
#[must_use]
pub fn sample_range(samples: &[f32]) -> Option<(f32, f32)> {
    let first = *samples.first()?;
    Some(
        samples
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Convert float quantizer output to bytes: add 0.5, clamp to [0, 255], truncate.
#[must_use]
pub fn to_bytes(values: &[f32]) -> Vec<u8> {
    values
        .iter()
        .map(|&v| {
            let v = v + 0.5;
            if v.is_nan() { 0 } else { v.clamp(0.0, 255.0) as u8 }
        })
        .collect()
}
