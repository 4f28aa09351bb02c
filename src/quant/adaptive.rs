//! Histogram-seeded, Lloyd-refined scalar quantization.
//!
//! The input range is binned into a fixed 256-bin histogram. Centers are
//! seeded at population quantiles, then refined by repeatedly moving each
//! center to the population-weighted mean of the bin midpoints nearest to it.
//! Refinement stops after `max_iterations` passes or once no center moves by
//! more than `convergence_threshold`.
//!
//! The result is an approximate 1-D clustering, not a global optimum. Center
//! placement depends on the exact seeding rule, the lower-index tie-break and
//! the convergence threshold.

use super::{PASSTHROUGH_BITS, Quantized, levels_for, sample_range};
use crate::error::Result;

/// Histogram resolution.
pub const HISTOGRAM_BINS: usize = 256;

/// Default refinement pass limit.
pub const DEFAULT_MAX_ITERATIONS: usize = 30;

/// Default per-center movement below which refinement stops.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f32 = 0.25;

/// Lloyd-style quantizer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveQuantizer {
    /// Upper bound on refinement passes.
    pub max_iterations: usize,
    /// Stop once every center moves by at most this much in a pass.
    pub convergence_threshold: f32,
}

impl Default for AdaptiveQuantizer {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

/// Quantize with the default iteration cap and threshold.
pub fn quantize_adaptive(samples: &[f32], bits: u8) -> Result<Quantized<f32>> {
    AdaptiveQuantizer::default().quantize(samples, bits)
}

impl AdaptiveQuantizer {
    /// Set the refinement pass limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Quantize `samples` to `2^bits` levels.
    pub fn quantize(&self, samples: &[f32], bits: u8) -> Result<Quantized<f32>> {
        let levels = levels_for(bits)?;
        if bits == PASSTHROUGH_BITS {
            return Ok(Quantized::passthrough(samples));
        }

        let Some((min_v, max_v)) = sample_range(samples) else {
            return Ok(Quantized {
                values: Vec::new(),
                centers: vec![0.0; levels],
            });
        };
        if min_v == max_v {
            return Ok(Quantized {
                values: vec![min_v; samples.len()],
                centers: vec![min_v; levels],
            });
        }

        let hist = Histogram::build(samples, min_v, max_v);
        let mut centers = hist.seed_centers(levels, samples.len());
        self.refine(&hist, &mut centers);

        let boundaries: Vec<f32> = centers
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) * 0.5)
            .collect();
        let values = samples
            .iter()
            .map(|&v| {
                let mut ci = 0;
                while ci < boundaries.len() && v > boundaries[ci] {
                    ci += 1;
                }
                centers[ci]
            })
            .collect();

        Ok(Quantized { values, centers })
    }

    fn refine(&self, hist: &Histogram, centers: &mut [f32]) {
        let levels = centers.len();
        for _ in 0..self.max_iterations {
            let mut sums = vec![0.0f32; levels];
            let mut counts = vec![0u64; levels];

            for (b, &count) in hist.counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let mid = hist.midpoint(b);
                let mut nearest = 0;
                let mut best = (mid - centers[0]).abs();
                for (j, &c) in centers.iter().enumerate().skip(1) {
                    let d = (mid - c).abs();
                    if d < best {
                        best = d;
                        nearest = j;
                    }
                }
                sums[nearest] += mid * count as f32;
                counts[nearest] += count;
            }

            let mut moved = false;
            for j in 0..levels {
                if counts[j] > 0 {
                    let updated = sums[j] / counts[j] as f32;
                    if (updated - centers[j]).abs() > self.convergence_threshold {
                        moved = true;
                    }
                    centers[j] = updated;
                }
            }
            centers.sort_by(f32::total_cmp);

            if !moved {
                break;
            }
        }
    }
}

/// Fixed-resolution histogram over `[min, max]`.
struct Histogram {
    counts: Vec<u64>,
    min: f32,
    range: f32,
}

impl Histogram {
    fn build(samples: &[f32], min: f32, max: f32) -> Self {
        let range = max - min;
        let mut counts = vec![0u64; HISTOGRAM_BINS];
        // Binning scales by (bins - 1) while midpoints divide by bins; the
        // asymmetry is part of the center placement contract.
        let scale = (HISTOGRAM_BINS - 1) as f32;
        for &v in samples {
            let b = ((v - min) / range * scale).floor() as i64;
            counts[b.clamp(0, HISTOGRAM_BINS as i64 - 1) as usize] += 1;
        }
        Self { counts, min, range }
    }

    fn midpoint(&self, bin: usize) -> f32 {
        self.min + (self.range * (bin as f32 + 0.5)) / HISTOGRAM_BINS as f32
    }

    /// Place center `k` at the first bin where the running population reaches
    /// `(k + 0.5) * total / levels`. At most one center is placed per bin; any
    /// left over get evenly spaced values across the range.
    fn seed_centers(&self, levels: usize, total: usize) -> Vec<f32> {
        let mut centers = vec![0.0f32; levels];
        let target = total as f64 / levels as f64;
        let mut running = 0.0f64;
        let mut k = 0;

        for (b, &count) in self.counts.iter().enumerate() {
            if k >= levels {
                break;
            }
            running += count as f64;
            if running >= (k as f64 + 0.5) * target {
                centers[k] = self.midpoint(b);
                k += 1;
            }
        }
        while k < levels {
            centers[k] = self.min + (self.range * (k as f32 + 0.5)) / levels as f32;
            k += 1;
        }
        centers
    }
}
