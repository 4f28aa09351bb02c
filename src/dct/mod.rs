//! 8×8 block DCT codec.
//!
//! Encoding splits an interleaved RGB buffer into channels and, for every
//! 8×8 grid cell of every channel: extracts a level-shifted block (zero
//! padded past the right/bottom edge), applies the forward DCT-II, and
//! quantizes each coefficient by a power-of-two divisor `2^N`.
//!
//! ## Layouts
//!
//! | Data | Index | Meaning |
//! |------|-------|---------|
//! | [`Block`] sample | `x * 8 + y` | `x` horizontal, `y` vertical offset in the block |
//! | coefficient | `u * 8 + v` | `u` horizontal, `v` vertical frequency |
//! | block in a [`CoefficientSet`] | `block_y * blocks_x + block_x` | raster order |
//!
//! Coefficients are kept in this row-major `(u, v)` order, not zig-zag.
//! Spectral-selection decoding depends on it.

mod block;
mod coefficients;
mod encode;
mod transform;

pub use block::{Block, blocks_along, extract_block, insert_block};
pub use coefficients::{CoefficientSet, EncodedImage};
pub use encode::{encode_channel, encode_image};
pub use transform::{
    dequantize_block, forward_dct, inverse_dct, quant_divisor, quantize_block, reconstruct_block,
};

pub(crate) use block::write_block;

/// Width and height of a transform block.
pub const BLOCK_SIZE: usize = 8;

/// Samples (and coefficients) per block.
pub const BLOCK_LEN: usize = BLOCK_SIZE * BLOCK_SIZE;

/// Largest accepted quantization level.
///
/// Unquantized coefficients lie within ±2048 (the DC term within ±1024), so
/// levels 13 and above store nothing but zeros. The cap matches the 16-bit
/// magnitude window read by successive-bit decoding.
pub const MAX_QUANT_LEVEL: u32 = 15;
