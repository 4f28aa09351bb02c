//! # dct-lab
//!
//! Block DCT image codec with scalar quantizers and progressive decoding.
//!
//! The library takes flat interleaved RGB buffers from the caller and never
//! holds on to them. It has two pipelines:
//!
//! - **Direct quantization**: buffer → (optional RGB→YUV) → per-channel
//!   uniform or adaptive quantizer → reconstructed buffer → metrics.
//! - **Transform codec**: buffer → channel split → 8×8 DCT + power-of-two
//!   quantization → [`EncodedImage`] → [`ProgressiveDecoder`], stepped by the
//!   caller → reconstructed buffer after every step.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dct_lab::{DeliveryMode, ProgressiveDecoder, encode_image, metrics};
//!
//! let pixels: Vec<u8> = (0..32 * 32 * 3).map(|i| (i % 200) as u8).collect();
//! let encoded = Arc::new(encode_image(&pixels, 32, 32, 2)?);
//!
//! let mut decoder = ProgressiveDecoder::new(Arc::clone(&encoded), DeliveryMode::SpectralSelection);
//! let mut frame = Vec::new();
//! for _ in 0..8 {
//!     decoder.decode_step(&mut frame)?;
//! }
//! let early = metrics::calculate_psnr(&pixels, &frame, 32, 32)?;
//!
//! decoder.decode_to_end(&mut frame)?;
//! let full = metrics::calculate_psnr(&pixels, &frame, 32, 32)?;
//! assert!(full >= early);
//! # Ok::<(), dct_lab::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`pixels`]: Interleaved buffer reshaping and `imgref` conversions
//! - [`color`]: RGB ↔ YUV conversion
//! - [`quant`]: Uniform and adaptive scalar quantizers
//! - [`dct`]: 8×8 block transform codec
//! - [`progressive`]: Step-by-step decoding in three delivery modes
//! - [`metrics`]: MSE, PSNR, absolute error, DSSIM
//! - [`experiment`]: One quantization experiment over an image
//! - [`analysis`]: Bit-allocation sweeps and reports

pub mod analysis;
pub mod color;
pub mod dct;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod pixels;
pub mod progressive;
pub mod quant;

// Re-export commonly used types
pub use analysis::{SweepConfig, SweepReport, SweepRow, bit_partitions, run_sweep};
pub use color::{ColorSpace, YuvPlanes, rgb_to_yuv, yuv_to_rgb};
pub use dct::{CoefficientSet, EncodedImage, encode_image};
pub use error::{Error, Result};
pub use experiment::{ExperimentResult, QuantConfig, run_experiment};
pub use metrics::{MetricConfig, MetricResult, calculate_metrics};
pub use progressive::{DeliveryMode, ProgressiveDecoder};
pub use quant::{AdaptiveQuantizer, QuantMethod, Quantized};
