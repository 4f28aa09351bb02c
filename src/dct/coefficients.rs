//! Quantized coefficient storage.
//!
//! A [`CoefficientSet`] holds one channel's coefficients in a single flat
//! array: `blocks_x * blocks_y * 64` values, block-raster order, 64 row-major
//! `(u, v)` coefficients per block. It is created once by the encoder and is
//! read-only afterwards.

use super::{BLOCK_LEN, blocks_along};
use crate::error::{Error, Result, ensure_len};
use crate::pixels::CHANNELS;

/// Quantized DCT coefficients for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientSet {
    blocks_x: usize,
    blocks_y: usize,
    coeffs: Vec<i32>,
}

impl CoefficientSet {
    /// Zero-filled set for a `blocks_x × blocks_y` grid.
    pub(crate) fn zeroed(blocks_x: usize, blocks_y: usize) -> Self {
        Self {
            blocks_x,
            blocks_y,
            coeffs: vec![0; blocks_x * blocks_y * BLOCK_LEN],
        }
    }

    /// Wrap externally stored coefficients, checking the length against the grid.
    pub fn from_raw(blocks_x: usize, blocks_y: usize, coeffs: Vec<i32>) -> Result<Self> {
        ensure_len("coefficient set", blocks_x * blocks_y * BLOCK_LEN, coeffs.len())?;
        Ok(Self {
            blocks_x,
            blocks_y,
            coeffs,
        })
    }

    /// Blocks per row.
    #[must_use]
    pub fn blocks_x(&self) -> usize {
        self.blocks_x
    }

    /// Blocks per column.
    #[must_use]
    pub fn blocks_y(&self) -> usize {
        self.blocks_y
    }

    /// Grid dimensions `(blocks_x, blocks_y)`.
    #[must_use]
    pub fn grid(&self) -> (usize, usize) {
        (self.blocks_x, self.blocks_y)
    }

    /// Total number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks_x * self.blocks_y
    }

    /// Coefficients of block `index` (raster order).
    ///
    /// # Panics
    ///
    /// Panics if `index >= block_count()`.
    #[must_use]
    pub fn block(&self, index: usize) -> &[i32; BLOCK_LEN] {
        &self.coeffs.as_chunks::<BLOCK_LEN>().0[index]
    }

    /// Coefficients of the block at grid position `(block_x, block_y)`.
    #[must_use]
    pub fn block_at(&self, block_x: usize, block_y: usize) -> &[i32; BLOCK_LEN] {
        debug_assert!(block_x < self.blocks_x && block_y < self.blocks_y);
        self.block(block_y * self.blocks_x + block_x)
    }

    /// One coefficient, keyed by block and coefficient index.
    #[must_use]
    pub fn get(&self, block: usize, coefficient: usize) -> i32 {
        debug_assert!(coefficient < BLOCK_LEN);
        self.coeffs[block * BLOCK_LEN + coefficient]
    }

    /// All coefficients, flat.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.coeffs
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> &mut [i32] {
        let start = index * BLOCK_LEN;
        &mut self.coeffs[start..start + BLOCK_LEN]
    }
}

/// Three channels of coefficients plus what's needed to decode them.
///
/// All three sets share one grid, and that grid covers the image exactly:
/// `blocks_x == ceil(width / 8)`, `blocks_y == ceil(height / 8)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    width: usize,
    height: usize,
    quant_level: u32,
    channels: [CoefficientSet; CHANNELS],
}

impl EncodedImage {
    /// Assemble an encoded image, validating grid dimensions.
    pub fn from_channels(
        width: usize,
        height: usize,
        quant_level: u32,
        channels: [CoefficientSet; CHANNELS],
    ) -> Result<Self> {
        super::quant_divisor(quant_level)?;

        let expected = (blocks_along(width), blocks_along(height));
        for set in &channels {
            if set.grid() != expected {
                return Err(Error::GridMismatch {
                    expected,
                    actual: set.grid(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            quant_level,
            channels,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Quantization level `N` the coefficients were divided by (`2^N`).
    #[must_use]
    pub fn quant_level(&self) -> u32 {
        self.quant_level
    }

    /// Blocks per channel.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.channels[0].block_count()
    }

    /// Grid dimensions shared by all channels.
    #[must_use]
    pub fn grid(&self) -> (usize, usize) {
        self.channels[0].grid()
    }

    /// Coefficients for channel `index` (0 = R, 1 = G, 2 = B).
    pub fn channel(&self, index: usize) -> Result<&CoefficientSet> {
        self.channels.get(index).ok_or(Error::InvalidChannel(index))
    }

    /// All three channels.
    #[must_use]
    pub fn channels(&self) -> &[CoefficientSet; CHANNELS] {
        &self.channels
    }
}
