//! Forward/inverse DCT and power-of-two coefficient quantization.
//!
//! ```text
//! D[u,v] = 1/4 C(u) C(v) Σx Σy f[x,y] cos((2x+1)uπ/16) cos((2y+1)vπ/16)
//! f[x,y] = 1/4 Σu Σv C(u) C(v) D[u,v] cos((2x+1)uπ/16) cos((2y+1)vπ/16)
//! C(0) = 1/√2, C(k>0) = 1
//! ```
//!
//! Both directions run as two separable 1-D passes over a cached cosine
//! table. Results match the direct quadruple sum to floating-point tolerance.

use std::sync::OnceLock;

use super::{BLOCK_LEN, BLOCK_SIZE, Block, MAX_QUANT_LEVEL};
use crate::error::{Error, Result};

/// `COSINE[k][n] = cos((2n + 1) k π / 16)`
static COSINE: OnceLock<[[f64; BLOCK_SIZE]; BLOCK_SIZE]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; BLOCK_SIZE]; BLOCK_SIZE] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; BLOCK_SIZE]; BLOCK_SIZE];
        for (k, row) in table.iter_mut().enumerate() {
            for (n, cell) in row.iter_mut().enumerate() {
                *cell = ((2 * n + 1) as f64 * k as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

#[inline]
fn scale(k: usize) -> f64 {
    if k == 0 {
        std::f64::consts::FRAC_1_SQRT_2
    } else {
        1.0
    }
}

/// Forward 2-D DCT-II of a level-shifted block.
#[must_use]
pub fn forward_dct(block: &Block) -> [f64; BLOCK_LEN] {
    let cos = cosine_table();

    // Pass 1: along y for every x.
    let mut temp = [0.0f64; BLOCK_LEN];
    for x in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for y in 0..BLOCK_SIZE {
                sum += block[x * BLOCK_SIZE + y] * cos[v][y];
            }
            temp[x * BLOCK_SIZE + v] = sum;
        }
    }

    // Pass 2: along x for every v.
    let mut out = [0.0f64; BLOCK_LEN];
    for u in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for x in 0..BLOCK_SIZE {
                sum += temp[x * BLOCK_SIZE + v] * cos[u][x];
            }
            out[u * BLOCK_SIZE + v] = 0.25 * scale(u) * scale(v) * sum;
        }
    }
    out
}

/// Inverse 2-D DCT back to level-shifted samples.
#[must_use]
pub fn inverse_dct(coeffs: &[f64; BLOCK_LEN]) -> Block {
    let cos = cosine_table();

    // Pass 1: collapse v for every (u, y).
    let mut temp = [0.0f64; BLOCK_LEN];
    for u in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for v in 0..BLOCK_SIZE {
                sum += scale(v) * coeffs[u * BLOCK_SIZE + v] * cos[v][y];
            }
            temp[u * BLOCK_SIZE + y] = sum;
        }
    }

    // Pass 2: collapse u for every (x, y).
    let mut out = [0.0f64; BLOCK_LEN];
    for x in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for u in 0..BLOCK_SIZE {
                sum += scale(u) * temp[u * BLOCK_SIZE + y] * cos[u][x];
            }
            out[x * BLOCK_SIZE + y] = 0.25 * sum;
        }
    }
    out
}

/// Divisor `2^level` for coefficient quantization.
pub fn quant_divisor(level: u32) -> Result<f64> {
    if level > MAX_QUANT_LEVEL {
        return Err(Error::InvalidQuantLevel(level));
    }
    Ok(f64::from(1u32 << level))
}

/// `round(D / 2^level)` for every coefficient; ties round away from zero.
pub fn quantize_block(coeffs: &[f64; BLOCK_LEN], level: u32) -> Result<[i32; BLOCK_LEN]> {
    let divisor = quant_divisor(level)?;
    let mut out = [0i32; BLOCK_LEN];
    for (q, &c) in out.iter_mut().zip(coeffs) {
        *q = (c / divisor).round() as i32;
    }
    Ok(out)
}

/// `coef * 2^level` for every coefficient.
pub fn dequantize_block(quantized: &[i32; BLOCK_LEN], level: u32) -> Result<[f64; BLOCK_LEN]> {
    let multiplier = quant_divisor(level)?;
    let mut out = [0.0f64; BLOCK_LEN];
    for (d, &q) in out.iter_mut().zip(quantized) {
        *d = f64::from(q) * multiplier;
    }
    Ok(out)
}

/// Dequantize and inverse-transform one block of stored coefficients.
pub fn reconstruct_block(quantized: &[i32; BLOCK_LEN], level: u32) -> Result<Block> {
    Ok(inverse_dct(&dequantize_block(quantized, level)?))
}
