//! RGB ↔ YUV conversion.
//!
//! Forward conversion produces unclamped floats (U and V are signed).
//! Inverse conversion clamps each channel to [0, 255] and rounds half-up,
//! so no NaN or out-of-range value ever reaches a pixel buffer.
//!
//! ```text
//! Y =  0.299 R + 0.587 G + 0.114 B
//! U = -0.147 R - 0.289 G + 0.436 B
//! V =  0.615 R - 0.515 G - 0.100 B
//!
//! R = Y + 1.1398 V
//! G = Y - 0.3946 U - 0.5806 V
//! B = Y + 2.0321 U
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ensure_len};
use crate::metrics::{mse, psnr_from_mse};
use crate::pixels::CHANNELS;
use crate::quant::sample_range;

/// Domain a quantization experiment operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Quantize R, G and B bytes directly.
    #[default]
    Rgb,
    /// Convert to YUV, quantize the float components, convert back.
    Yuv,
}

impl ColorSpace {
    /// Both color spaces, in sweep order.
    pub const ALL: [Self; 2] = [Self::Rgb, Self::Yuv];
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb => write!(f, "rgb"),
            Self::Yuv => write!(f, "yuv"),
        }
    }
}

impl FromStr for ColorSpace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "rgb" => Ok(Self::Rgb),
            "2" | "yuv" => Ok(Self::Yuv),
            _ => Err(Error::InvalidOption {
                kind: "color space",
                value: s.to_string(),
            }),
        }
    }
}

/// Y, U and V components of an image, one float per pixel each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YuvPlanes {
    /// Luma.
    pub y: Vec<f32>,
    /// Blue-difference chroma.
    pub u: Vec<f32>,
    /// Red-difference chroma.
    pub v: Vec<f32>,
}

/// Min/max of each YUV component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YuvRanges {
    /// Luma range.
    pub y: (f32, f32),
    /// U range.
    pub u: (f32, f32),
    /// V range.
    pub v: (f32, f32),
}

impl YuvPlanes {
    /// Number of pixels, or an error if the planes disagree.
    pub fn len(&self) -> Result<usize> {
        let n = self.y.len();
        ensure_len("U plane", n, self.u.len())?;
        ensure_len("V plane", n, self.v.len())?;
        Ok(n)
    }

    /// True if the luma plane is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Per-component value ranges. `None` for an empty image.
    #[must_use]
    pub fn ranges(&self) -> Option<YuvRanges> {
        Some(YuvRanges {
            y: sample_range(&self.y)?,
            u: sample_range(&self.u)?,
            v: sample_range(&self.v)?,
        })
    }

    /// Borrow the planes in Y, U, V order.
    #[must_use]
    pub fn as_array(&self) -> [&[f32]; 3] {
        [&self.y, &self.u, &self.v]
    }
}

/// Convert an interleaved RGB buffer to YUV planes.
///
/// Trailing bytes that don't form a full pixel are ignored.
#[must_use]
pub fn rgb_to_yuv(rgb: &[u8]) -> YuvPlanes {
    let n = rgb.len() / CHANNELS;
    let mut planes = YuvPlanes {
        y: Vec::with_capacity(n),
        u: Vec::with_capacity(n),
        v: Vec::with_capacity(n),
    };
    for px in rgb.chunks_exact(CHANNELS) {
        let r = f32::from(px[0]);
        let g = f32::from(px[1]);
        let b = f32::from(px[2]);
        planes.y.push(0.299 * r + 0.587 * g + 0.114 * b);
        planes.u.push(-0.147 * r - 0.289 * g + 0.436 * b);
        planes.v.push(0.615 * r - 0.515 * g - 0.100 * b);
    }
    planes
}

/// Convert YUV planes back to an interleaved RGB buffer.
pub fn yuv_to_rgb(planes: &YuvPlanes) -> Result<Vec<u8>> {
    let n = planes.len()?;
    let mut out = Vec::with_capacity(n * CHANNELS);
    for i in 0..n {
        let y = planes.y[i];
        let u = planes.u[i];
        let v = planes.v[i];
        let r = y + 1.1398 * v;
        let g = y - 0.3946 * u - 0.5806 * v;
        let b = y + 2.0321 * u;
        out.extend_from_slice(&[to_byte(r), to_byte(g), to_byte(b)]);
    }
    Ok(out)
}

/// Clamp to [0, 255], then round half-up.
#[inline]
fn to_byte(value: f32) -> u8 {
    // NaN compares false on both sides and would slip through `clamp`.
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 255.0) };
    (clamped + 0.5) as u8
}

/// Error introduced by an RGB → YUV → RGB round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    /// Mean squared error per byte.
    pub mse: f64,
    /// PSNR in dB.
    pub psnr: f64,
}

/// Measure how much precision the color conversion alone loses.
pub fn round_trip_error(rgb: &[u8]) -> Result<RoundTrip> {
    let back = yuv_to_rgb(&rgb_to_yuv(rgb))?;
    let usable = rgb.len() - rgb.len() % CHANNELS;
    let mse = mse(&rgb[..usable], &back)?;
    Ok(RoundTrip {
        mse,
        psnr: psnr_from_mse(mse),
    })
}
