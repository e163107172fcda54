//! Affine uint8 quantisation as used by TFLite Micro input/output tensors.
//!
//! A real value maps to `q = clamp(round(value / scale) + zero_point, 0, 255)`
//! and back to `scale * (q - zero_point)`.

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

/// Lowest representable quantised value
pub const QUANT_MIN: i32 = 0;

/// Highest representable quantised value
pub const QUANT_MAX: i32 = 255;

/// Quantisation parameters of a uint8 tensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

impl Default for QuantParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zero_point: 0,
        }
    }
}

impl QuantParams {
    /// Create validated quantisation parameters
    ///
    /// `scale` must be finite and strictly positive.
    pub fn new(scale: f32, zero_point: i32) -> Result<Self> {
        let params = Self { scale, zero_point };
        params.validate()?;
        Ok(params)
    }

    /// Parameters that cover `[min, max]` with the full uint8 range
    ///
    /// The range is widened to include 0 so that zero is exactly
    /// representable. A degenerate range falls back to the defaults.
    pub fn from_range(min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(FeedError::InvalidParameter(format!(
                "invalid value range [{}, {}]",
                min, max
            )));
        }
        let lo = min.min(0.0);
        let hi = max.max(0.0);
        if hi - lo <= f32::EPSILON {
            return Ok(Self::default());
        }
        let scale = (hi - lo) / (QUANT_MAX - QUANT_MIN) as f32;
        let zero_point = (QUANT_MIN as f32 - lo / scale)
            .round()
            .clamp(QUANT_MIN as f32, QUANT_MAX as f32) as i32;
        Self::new(scale, zero_point)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(FeedError::InvalidParameter(format!(
                "quantisation scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Quantise a single real value
    ///
    /// Rounding is half away from zero. The zero point is added after
    /// rounding and the sum is clamped to `[0, 255]`. NaN maps to 0.
    #[inline]
    pub fn quantize(&self, value: f32) -> u8 {
        // Stay in f32 until the clamp so huge inputs saturate instead of wrapping.
        let q = (value / self.scale).round() + self.zero_point as f32;
        q.clamp(QUANT_MIN as f32, QUANT_MAX as f32) as u8
    }

    /// Map a quantised value back to the real domain
    #[inline]
    pub fn dequantize(&self, q: u8) -> f32 {
        self.scale * (i32::from(q) - self.zero_point) as f32
    }

    /// Quantise `src` into `dst` element by element
    ///
    /// Processes `min(src.len(), dst.len())` elements and returns that count.
    pub fn quantize_slice(&self, src: &[f32], dst: &mut [u8]) -> usize {
        let n = src.len().min(dst.len());
        for (out, &value) in dst.iter_mut().zip(src) {
            *out = self.quantize(value);
        }
        n
    }
}
