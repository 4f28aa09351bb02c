//! Direct quantization experiments.
//!
//! One experiment takes an RGB image, quantizes each of its three channels
//! (in RGB or YUV) to a chosen bit depth with a chosen quantizer, rebuilds an
//! RGB image and measures the damage.
//!
//! ```
//! use dct_lab::{ColorSpace, QuantConfig, QuantMethod, run_experiment};
//!
//! let config = QuantConfig::builder()
//!     .color_space(ColorSpace::Yuv)
//!     .method(QuantMethod::Smart)
//!     .bits([4, 2, 2])
//!     .build()?;
//!
//! let pixels: Vec<u8> = (0..8 * 8 * 3).map(|i| (i * 5 % 256) as u8).collect();
//! let result = run_experiment(&pixels, 8, 8, &config)?;
//! assert_eq!(result.processed.len(), pixels.len());
//! assert_eq!(result.centers[0].len(), 16);
//! # Ok::<(), dct_lab::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::color::{ColorSpace, YuvPlanes, rgb_to_yuv, yuv_to_rgb};
use crate::error::Result;
use crate::metrics::{absolute_error, mse, mse_channel, mse_f32, psnr_from_mse};
use crate::pixels::{CHANNELS, merge_channels, split_channels};
use crate::quant::{
    PASSTHROUGH_BITS, QuantMethod, Quantized, levels_for, quantize_adaptive, quantize_uniform,
    quantize_uniform_u8, sample_range, to_bytes,
};

/// What to quantize, how, and how hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantConfig {
    /// Domain the channels are quantized in.
    pub color_space: ColorSpace,
    /// Quantizer used on every channel.
    pub method: QuantMethod,
    /// Bit depth per channel (R, G, B or Y, U, V), each in 1..=8.
    pub bits: [u8; CHANNELS],
}

impl QuantConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> QuantConfigBuilder {
        QuantConfigBuilder::default()
    }

    /// Total bits per pixel across the three channels.
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.bits.iter().map(|&b| u32::from(b)).sum()
    }

    /// Check every bit depth.
    pub fn validate(&self) -> Result<()> {
        for &bits in &self.bits {
            levels_for(bits)?;
        }
        Ok(())
    }
}

/// Builder for [`QuantConfig`].
#[derive(Debug, Default)]
pub struct QuantConfigBuilder {
    color_space: Option<ColorSpace>,
    method: Option<QuantMethod>,
    bits: Option<[u8; CHANNELS]>,
}

impl QuantConfigBuilder {
    /// Set the color space. Defaults to RGB.
    #[must_use]
    pub fn color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = Some(color_space);
        self
    }

    /// Set the quantizer. Defaults to uniform.
    #[must_use]
    pub fn method(mut self, method: QuantMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set per-channel bit depths. Defaults to 8 bits everywhere (passthrough).
    #[must_use]
    pub fn bits(mut self, bits: [u8; CHANNELS]) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Build the configuration, rejecting bit depths outside 1..=8.
    pub fn build(self) -> Result<QuantConfig> {
        let config = QuantConfig {
            color_space: self.color_space.unwrap_or_default(),
            method: self.method.unwrap_or_default(),
            bits: self.bits.unwrap_or([PASSTHROUGH_BITS; CHANNELS]),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Everything an experiment produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Configuration that was run.
    pub config: QuantConfig,
    /// Reconstructed interleaved RGB buffer.
    #[serde(skip)]
    pub processed: Vec<u8>,
    /// Reconstruction levels per channel, ascending. Empty for 8-bit channels.
    pub centers: [Vec<f32>; CHANNELS],
    /// MSE per channel: over R, G, B bytes in RGB mode, over the float
    /// Y, U, V components in YUV mode.
    pub channel_mse: [f64; CHANNELS],
    /// MSE over the whole RGB buffer.
    pub mse: f64,
    /// PSNR over the whole RGB buffer.
    pub psnr: f64,
    /// Sum of absolute byte differences over the whole RGB buffer.
    pub abs_error: u64,
}

/// Quantize `buffer` per `config` and measure the result.
pub fn run_experiment(
    buffer: &[u8],
    width: usize,
    height: usize,
    config: &QuantConfig,
) -> Result<ExperimentResult> {
    config.validate()?;
    let channels = split_channels(buffer, width, height)?;

    let (processed, centers, channel_mse) = match config.color_space {
        ColorSpace::Rgb => quantize_rgb(buffer, &channels, config)?,
        ColorSpace::Yuv => quantize_yuv(buffer, config)?,
    };

    let mse = mse(buffer, &processed)?;
    Ok(ExperimentResult {
        config: *config,
        abs_error: absolute_error(buffer, &processed)?,
        processed,
        centers,
        channel_mse,
        mse,
        psnr: psnr_from_mse(mse),
    })
}

type ChannelOutput = (Vec<u8>, [Vec<f32>; CHANNELS], [f64; CHANNELS]);

fn quantize_rgb(
    original: &[u8],
    channels: &[Vec<u8>; CHANNELS],
    config: &QuantConfig,
) -> Result<ChannelOutput> {
    let mut quantized: [Vec<u8>; CHANNELS] = Default::default();
    let mut centers: [Vec<f32>; CHANNELS] = Default::default();

    for (ch, samples) in channels.iter().enumerate() {
        let bits = config.bits[ch];
        match config.method {
            QuantMethod::Uniform => {
                let q = quantize_uniform_u8(samples, bits)?;
                centers[ch] = q.centers.iter().map(|&c| f32::from(c)).collect();
                quantized[ch] = q.values;
            }
            QuantMethod::Smart => {
                let floats: Vec<f32> = samples.iter().map(|&v| f32::from(v)).collect();
                let q = quantize_adaptive(&floats, bits)?;
                quantized[ch] = to_bytes(&q.values);
                centers[ch] = q.centers;
            }
        }
    }

    let processed = merge_channels(&quantized)?;
    let channel_mse = [
        mse_channel(original, &processed, 0)?,
        mse_channel(original, &processed, 1)?,
        mse_channel(original, &processed, 2)?,
    ];
    Ok((processed, centers, channel_mse))
}

fn quantize_yuv(original: &[u8], config: &QuantConfig) -> Result<ChannelOutput> {
    let planes = rgb_to_yuv(original);
    let [y, u, v] = planes.as_array();

    let qy = quantize_component(y, config.bits[0], config.method)?;
    let qu = quantize_component(u, config.bits[1], config.method)?;
    let qv = quantize_component(v, config.bits[2], config.method)?;

    let channel_mse = [
        mse_f32(y, &qy.values)?,
        mse_f32(u, &qu.values)?,
        mse_f32(v, &qv.values)?,
    ];
    let processed = yuv_to_rgb(&YuvPlanes {
        y: qy.values,
        u: qu.values,
        v: qv.values,
    })?;
    Ok((processed, [qy.centers, qu.centers, qv.centers], channel_mse))
}

/// Uniform quantization spans the component's own range.
fn quantize_component(samples: &[f32], bits: u8, method: QuantMethod) -> Result<Quantized<f32>> {
    match method {
        QuantMethod::Uniform => {
            let (lo, hi) = sample_range(samples).unwrap_or((0.0, 0.0));
            quantize_uniform(samples, bits, lo, hi)
        }
        QuantMethod::Smart => quantize_adaptive(samples, bits),
    }
}
