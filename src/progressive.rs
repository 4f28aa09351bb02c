//! Progressive reconstruction from stored coefficients.
//!
//! A [`ProgressiveDecoder`] turns an [`EncodedImage`] back into pixels one
//! step at a time, under one of three delivery disciplines:
//!
//! | Mode | Steps | Step `k` writes |
//! |------|-------|-----------------|
//! | [`DeliveryMode::Baseline`] | block count | block `k` only, on top of earlier steps |
//! | [`DeliveryMode::SpectralSelection`] | 64 | whole frame from coefficients `0..=k` of each block |
//! | [`DeliveryMode::SuccessiveBit`] | 16 | whole frame from the top `k + 1` magnitude bits of every coefficient |
//!
//! The decoder is stepped by the caller (a timer, a loop). It is not meant to
//! be stepped from several threads at once; the coefficients themselves sit
//! behind an `Arc` and can feed any number of decoders.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dct_lab::{DeliveryMode, ProgressiveDecoder, encode_image};
//!
//! let pixels = vec![128u8; 16 * 16 * 3];
//! let encoded = Arc::new(encode_image(&pixels, 16, 16, 0)?);
//! let mut decoder = ProgressiveDecoder::new(encoded, DeliveryMode::Baseline);
//!
//! let mut frame = Vec::new();
//! while decoder.decode_step(&mut frame)? {}
//! assert_eq!(frame, pixels);
//! # Ok::<(), dct_lab::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dct::{BLOCK_LEN, EncodedImage, reconstruct_block, write_block};
use crate::error::{Error, Result, ensure_len};
use crate::pixels::{CHANNELS, buffer_len};

/// Steps in spectral-selection mode: one per coefficient position.
pub const SPECTRAL_STEPS: usize = BLOCK_LEN;

/// Steps in successive-bit mode: one per magnitude bit.
pub const SUCCESSIVE_STEPS: usize = 16;

const MAGNITUDE_WINDOW: u32 = (1 << SUCCESSIVE_STEPS) - 1;

/// How coefficients are delivered to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    /// Sequential, one full-precision block per step.
    Baseline,
    /// DC first, then one more coefficient position per step.
    SpectralSelection,
    /// Every coefficient at once, one more magnitude bit per step.
    SuccessiveBit,
}

impl DeliveryMode {
    /// All modes, in their conventional numbering order (1, 2, 3).
    pub const ALL: [Self; 3] = [Self::Baseline, Self::SpectralSelection, Self::SuccessiveBit];

    /// Number of decode steps for an image with `block_count` blocks per channel.
    #[must_use]
    pub fn total_steps(self, block_count: usize) -> usize {
        match self {
            Self::Baseline => block_count,
            Self::SpectralSelection => SPECTRAL_STEPS,
            Self::SuccessiveBit => SUCCESSIVE_STEPS,
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::SpectralSelection => write!(f, "spectral-selection"),
            Self::SuccessiveBit => write!(f, "successive-bit"),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "baseline" => Ok(Self::Baseline),
            "2" | "spectral" | "spectral-selection" => Ok(Self::SpectralSelection),
            "3" | "successive" | "successive-bit" => Ok(Self::SuccessiveBit),
            _ => Err(Error::InvalidOption {
                kind: "delivery mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Keep the `bits` most significant magnitude bits of `coef`, counted from
/// its own highest set bit. The sign is preserved and zero stays zero.
///
/// Only the low [`SUCCESSIVE_STEPS`] bits of the magnitude are read; anything
/// above them is dropped. Encoded coefficients never reach that high.
///
/// ```
/// use dct_lab::progressive::mask_significant_bits;
///
/// assert_eq!(mask_significant_bits(0b1011, 1), 0b1000);
/// assert_eq!(mask_significant_bits(-0b1011, 2), -0b1000);
/// assert_eq!(mask_significant_bits(0b1011, 3), 0b1010);
/// assert_eq!(mask_significant_bits(0b1011, 10), 0b1011);
/// ```
#[must_use]
pub fn mask_significant_bits(coef: i32, bits: u32) -> i32 {
    let mag = coef.unsigned_abs() & MAGNITUDE_WINDOW;
    if mag == 0 || bits == 0 {
        return 0;
    }
    let width = u32::BITS - mag.leading_zeros();
    let dropped = width.saturating_sub(bits);
    let masked = ((mag >> dropped) << dropped) as i32;
    if coef < 0 { -masked } else { masked }
}

/// Stateful step-by-step decoder over shared, immutable coefficients.
#[derive(Debug, Clone)]
pub struct ProgressiveDecoder {
    image: Arc<EncodedImage>,
    mode: DeliveryMode,
    current_step: usize,
    total_steps: usize,
}

impl ProgressiveDecoder {
    /// Create a decoder positioned at step 0.
    #[must_use]
    pub fn new(image: Arc<EncodedImage>, mode: DeliveryMode) -> Self {
        let total_steps = mode.total_steps(image.block_count());
        Self {
            image,
            mode,
            current_step: 0,
            total_steps,
        }
    }

    /// Delivery mode.
    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Steps taken so far.
    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Steps needed to finish; fixed at construction.
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// True once every step has run.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_step >= self.total_steps
    }

    /// The coefficients being decoded.
    #[must_use]
    pub fn image(&self) -> &Arc<EncodedImage> {
        &self.image
    }

    /// Rewind to step 0. The coefficients are kept.
    pub fn reset(&mut self) {
        self.current_step = 0;
    }

    /// Run the next step, writing into `output`.
    ///
    /// Returns `Ok(true)` while steps remain afterwards. Once complete, further
    /// calls return `Ok(false)` without touching `output`.
    ///
    /// In baseline mode the first step (re)allocates `output` as an all-zero
    /// frame and later steps draw one block each on top of it; a later step
    /// given a buffer of the wrong size fails with
    /// [`Error::LengthMismatch`]. The other modes resize `output` and
    /// overwrite every pixel on every step.
    pub fn decode_step(&mut self, output: &mut Vec<u8>) -> Result<bool> {
        if self.is_complete() {
            return Ok(false);
        }

        let step = self.current_step;
        match self.mode {
            DeliveryMode::Baseline => self.decode_baseline(step, output)?,
            DeliveryMode::SpectralSelection => {
                let visible = step + 1;
                self.render_frame(output, |index, coef| if index < visible { coef } else { 0 })?;
            }
            DeliveryMode::SuccessiveBit => {
                let bits = step as u32 + 1;
                self.render_frame(output, |_, coef| mask_significant_bits(coef, bits))?;
            }
        }

        self.current_step += 1;
        Ok(!self.is_complete())
    }

    /// Step until complete. Returns the number of steps run.
    pub fn decode_to_end(&mut self, output: &mut Vec<u8>) -> Result<usize> {
        let mut steps = 0;
        while !self.is_complete() {
            self.decode_step(output)?;
            steps += 1;
        }
        Ok(steps)
    }

    fn frame_len(&self) -> usize {
        buffer_len(self.image.width(), self.image.height())
    }

    fn decode_baseline(&self, block_index: usize, output: &mut Vec<u8>) -> Result<()> {
        let len = self.frame_len();
        if block_index == 0 {
            output.clear();
            output.resize(len, 0);
        } else {
            ensure_len("decoder output", len, output.len())?;
        }

        let (blocks_x, _) = self.image.grid();
        let bx = block_index % blocks_x;
        let by = block_index / blocks_x;
        let level = self.image.quant_level();

        for (ch, set) in self.image.channels().iter().enumerate() {
            let block = reconstruct_block(set.block(block_index), level)?;
            write_block(
                output,
                CHANNELS,
                ch,
                self.image.width(),
                self.image.height(),
                bx,
                by,
                &block,
            );
        }
        Ok(())
    }

    /// Rebuild the whole frame from scratch, passing each stored coefficient
    /// through `select(coefficient_index, value)` first.
    fn render_frame<F>(&self, output: &mut Vec<u8>, select: F) -> Result<()>
    where
        F: Fn(usize, i32) -> i32,
    {
        output.clear();
        output.resize(self.frame_len(), 0);

        let (blocks_x, _) = self.image.grid();
        let level = self.image.quant_level();
        let mut selected = [0i32; BLOCK_LEN];

        for block_index in 0..self.image.block_count() {
            let bx = block_index % blocks_x;
            let by = block_index / blocks_x;
            for (ch, set) in self.image.channels().iter().enumerate() {
                for (i, (dst, &coef)) in selected.iter_mut().zip(set.block(block_index)).enumerate() {
                    *dst = select(i, coef);
                }
                let block = reconstruct_block(&selected, level)?;
                write_block(
                    output,
                    CHANNELS,
                    ch,
                    self.image.width(),
                    self.image.height(),
                    bx,
                    by,
                    &block,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dct::{CoefficientSet, encode_image, insert_block};
    use crate::metrics::mse;
    use crate::pixels::merge_channels;

    fn gradient(width: usize, height: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                buf.extend_from_slice(&[
                    (x * 255 / width.max(1)) as u8,
                    (y * 255 / height.max(1)) as u8,
                    ((x * 7 + y * 13) % 256) as u8,
                ]);
            }
        }
        buf
    }

    fn decoder(buf: &[u8], w: usize, h: usize, level: u32, mode: DeliveryMode) -> ProgressiveDecoder {
        let image = encode_image(buf, w, h, level).unwrap();
        ProgressiveDecoder::new(Arc::new(image), mode)
    }

    #[test]
    fn test_total_steps() {
        let buf = gradient(20, 13);
        assert_eq!(decoder(&buf, 20, 13, 0, DeliveryMode::Baseline).total_steps(), 3 * 2);
        assert_eq!(decoder(&buf, 20, 13, 0, DeliveryMode::SpectralSelection).total_steps(), 64);
        assert_eq!(decoder(&buf, 20, 13, 0, DeliveryMode::SuccessiveBit).total_steps(), 16);
    }

    #[test]
    fn test_solid_gray_any_step() {
        let buf = vec![128u8; 16 * 16 * 3];
        for mode in DeliveryMode::ALL {
            let mut dec = decoder(&buf, 16, 16, 0, mode);
            let mut out = Vec::new();
            dec.decode_step(&mut out).unwrap();
            if mode == DeliveryMode::Baseline {
                // Only the first block has been drawn; the rest is still zero.
                assert_eq!(out[0], 128);
                assert_eq!(out[(8 * 16 + 8) * 3], 0);
            } else {
                assert_eq!(out, buf);
            }
            dec.decode_to_end(&mut out).unwrap();
            assert_eq!(out, buf, "mode {mode}");
        }
    }

    #[test]
    fn test_near_lossless_at_level_zero() {
        let buf = gradient(19, 11);
        for mode in DeliveryMode::ALL {
            let mut dec = decoder(&buf, 19, 11, 0, mode);
            let mut out = Vec::new();
            dec.decode_to_end(&mut out).unwrap();
            // Integer coefficients plus truncating insertion: off by at most a step or two.
            assert!(mse(&buf, &out).unwrap() < 1.5, "mode {mode}");
            for (a, b) in buf.iter().zip(&out) {
                assert!((i32::from(*a) - i32::from(*b)).abs() <= 2, "mode {mode}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_baseline_coverage() {
        let (w, h) = (24, 16);
        let buf = gradient(w, h);
        let mut dec = decoder(&buf, w, h, 0, DeliveryMode::Baseline);
        let mut out = Vec::new();

        let mut more = true;
        for k in 0..dec.total_steps() {
            assert!(more);
            more = dec.decode_step(&mut out).unwrap();
            assert_eq!(dec.current_step(), k + 1);
            for block in 0..6 {
                let (bx, by) = (block % 3, block / 3);
                let px = ((by * 8 + 1) * w + bx * 8 + 1) * 3 + 2;
                if block <= k {
                    assert!((i32::from(out[px]) - i32::from(buf[px])).abs() <= 2);
                } else {
                    assert_eq!(out[px], 0, "block {block} written early at step {k}");
                }
            }
        }
        assert!(!more);
        assert!(dec.is_complete());
    }

    #[test]
    fn test_exhausted_is_noop() {
        let buf = gradient(8, 8);
        let mut dec = decoder(&buf, 8, 8, 0, DeliveryMode::Baseline);
        let mut out = Vec::new();
        assert!(!dec.decode_step(&mut out).unwrap());

        let mut sentinel = vec![9u8; 5];
        assert!(!dec.decode_step(&mut sentinel).unwrap());
        assert_eq!(sentinel, vec![9u8; 5]);
        assert_eq!(dec.current_step(), 1);
    }

    #[test]
    fn test_baseline_rejects_resized_buffer() {
        let buf = gradient(16, 8);
        let mut dec = decoder(&buf, 16, 8, 0, DeliveryMode::Baseline);
        let mut out = Vec::new();
        dec.decode_step(&mut out).unwrap();
        out.truncate(10);
        assert!(matches!(
            dec.decode_step(&mut out),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_spectral_first_step_is_dc_only() {
        let buf = gradient(16, 16);
        let image = Arc::new(encode_image(&buf, 16, 16, 0).unwrap());
        let mut dec = ProgressiveDecoder::new(Arc::clone(&image), DeliveryMode::SpectralSelection);
        let mut out = Vec::new();
        dec.decode_step(&mut out).unwrap();

        // Every pixel in a block shares the block's DC value.
        for by in 0..2 {
            for bx in 0..2 {
                let first = out[((by * 8) * 16 + bx * 8) * 3];
                for y in 0..8 {
                    for x in 0..8 {
                        assert_eq!(out[((by * 8 + y) * 16 + bx * 8 + x) * 3], first);
                    }
                }
            }
        }
    }

    fn single_coefficient_image(index: usize, value: i32) -> Arc<EncodedImage> {
        let mut coeffs = vec![0i32; BLOCK_LEN];
        coeffs[index] = value;
        let channels = [
            CoefficientSet::from_raw(1, 1, coeffs).unwrap(),
            CoefficientSet::from_raw(1, 1, vec![0; BLOCK_LEN]).unwrap(),
            CoefficientSet::from_raw(1, 1, vec![0; BLOCK_LEN]).unwrap(),
        ];
        Arc::new(EncodedImage::from_channels(8, 8, 0, channels).unwrap())
    }

    fn red(frame: &[u8], x: usize, y: usize) -> u8 {
        frame[(y * 8 + x) * 3]
    }

    fn is_flat(frame: &[u8]) -> bool {
        frame.chunks_exact(3).all(|px| px[0] == frame[0])
    }

    #[test]
    fn test_spectral_uses_row_major_order() {
        // Index 2 is (u = 0, v = 2), a vertical frequency. Row-major order
        // reaches it on step 2.
        let mut dec = ProgressiveDecoder::new(single_coefficient_image(2, 40), DeliveryMode::SpectralSelection);
        let mut out = Vec::new();

        dec.decode_step(&mut out).unwrap();
        assert!(is_flat(&out));
        dec.decode_step(&mut out).unwrap();
        assert!(is_flat(&out), "coefficient 2 visible after step 1");

        dec.decode_step(&mut out).unwrap();
        assert!(!is_flat(&out), "coefficient 2 missing after step 2");
        for y in 0..8 {
            for x in 1..8 {
                assert_eq!(red(&out, x, y), red(&out, 0, y), "row {y} should be constant");
            }
        }
        assert_ne!(red(&out, 0, 0), red(&out, 0, 3));
    }

    #[test]
    fn test_successive_step_matches_masked_reconstruction() {
        let (w, h) = (16, 8);
        let buf = gradient(w, h);
        let image = Arc::new(encode_image(&buf, w, h, 1).unwrap());
        let mut dec = ProgressiveDecoder::new(Arc::clone(&image), DeliveryMode::SuccessiveBit);

        let mut out = Vec::new();
        for k in 0..4u32 {
            dec.decode_step(&mut out).unwrap();

            let mut planes: [Vec<u8>; 3] = Default::default();
            for (plane, set) in planes.iter_mut().zip(image.channels()) {
                *plane = vec![0u8; w * h];
                for block_index in 0..set.block_count() {
                    let mut masked = [0i32; BLOCK_LEN];
                    for (m, &c) in masked.iter_mut().zip(set.block(block_index)) {
                        *m = mask_significant_bits(c, k + 1);
                    }
                    let block = reconstruct_block(&masked, 1).unwrap();
                    insert_block(plane, w, h, block_index % 2, block_index / 2, &block).unwrap();
                }
            }
            assert_eq!(out, merge_channels(&planes).unwrap(), "step {k}");
        }
    }

    #[test]
    fn test_full_frame_modes_converge() {
        let buf = gradient(16, 16);
        for mode in [DeliveryMode::SpectralSelection, DeliveryMode::SuccessiveBit] {
            let mut dec = decoder(&buf, 16, 16, 1, mode);
            let mut out = Vec::new();
            dec.decode_step(&mut out).unwrap();
            let early = mse(&buf, &out).unwrap();
            dec.decode_to_end(&mut out).unwrap();
            let last = mse(&buf, &out).unwrap();
            assert!(last < early, "mode {mode}: {last} !< {early}");
        }
    }

    #[test]
    fn test_reset_replays() {
        let buf = gradient(16, 8);
        let image = Arc::new(encode_image(&buf, 16, 8, 2).unwrap());
        let mut dec = ProgressiveDecoder::new(Arc::clone(&image), DeliveryMode::SuccessiveBit);

        let mut first = Vec::new();
        dec.decode_step(&mut first).unwrap();
        dec.decode_to_end(&mut Vec::new()).unwrap();
        assert!(dec.is_complete());

        dec.reset();
        assert_eq!(dec.current_step(), 0);
        let mut again = Vec::new();
        assert!(dec.decode_step(&mut again).unwrap());
        assert_eq!(first, again);

        // The shared coefficients are untouched.
        assert_eq!(*dec.image().as_ref(), encode_image(&buf, 16, 8, 2).unwrap());
        assert_eq!(Arc::strong_count(&image), 2);
    }

    #[test]
    fn test_empty_image() {
        let image = Arc::new(encode_image(&[], 0, 0, 0).unwrap());
        let mut dec = ProgressiveDecoder::new(image, DeliveryMode::Baseline);
        assert_eq!(dec.total_steps(), 0);
        assert!(dec.is_complete());
        assert!(!dec.decode_step(&mut Vec::new()).unwrap());
    }

    #[test]
    fn test_mask_significant_bits() {
        assert_eq!(mask_significant_bits(0, 3), 0);
        assert_eq!(mask_significant_bits(1, 1), 1);
        assert_eq!(mask_significant_bits(-7, 1), -4);
        assert_eq!(mask_significant_bits(-7, 2), -6);
        assert_eq!(mask_significant_bits(1023, 16), 1023);
        assert_eq!(mask_significant_bits(1023, 0), 0);
    }

    #[test]
    fn test_mask_reads_sixteen_bits() {
        assert_eq!(mask_significant_bits(i32::MIN, 1), 0);
        assert_eq!(mask_significant_bits(i32::MAX, 1), 1 << 15);
        assert_eq!(mask_significant_bits(-(0x1_0005), 16), -5);
        assert_eq!(mask_significant_bits(0xFFFF, 16), 0xFFFF);
    }

    #[test]
    fn test_successive_handles_extreme_coefficients() {
        let mut coeffs = vec![0i32; BLOCK_LEN];
        coeffs[0] = i32::MIN;
        coeffs[1] = i32::MAX;
        let channels = [
            CoefficientSet::from_raw(1, 1, coeffs).unwrap(),
            CoefficientSet::from_raw(1, 1, vec![0; BLOCK_LEN]).unwrap(),
            CoefficientSet::from_raw(1, 1, vec![0; BLOCK_LEN]).unwrap(),
        ];
        let image = Arc::new(EncodedImage::from_channels(8, 8, 0, channels).unwrap());
        let mut dec = ProgressiveDecoder::new(image, DeliveryMode::SuccessiveBit);
        let mut out = Vec::new();
        assert_eq!(dec.decode_to_end(&mut out).unwrap(), SUCCESSIVE_STEPS);
        assert_eq!(out.len(), 8 * 8 * 3);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("1".parse::<DeliveryMode>().unwrap(), DeliveryMode::Baseline);
        assert_eq!("Spectral".parse::<DeliveryMode>().unwrap(), DeliveryMode::SpectralSelection);
        assert_eq!("3".parse::<DeliveryMode>().unwrap(), DeliveryMode::SuccessiveBit);
        assert!("4".parse::<DeliveryMode>().is_err());
        for mode in DeliveryMode::ALL {
            assert_eq!(mode.to_string().parse::<DeliveryMode>().unwrap(), mode);
        }
    }
}
