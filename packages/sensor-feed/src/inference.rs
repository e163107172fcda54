//! Inference engine boundary
//!
//! The feature pipeline only needs tensor shapes, element types and
//! quantisation parameters from the engine, plus a way to run it. Model
//! loading and arena management stay behind this trait.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::quantize::QuantParams;

/// Element type of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Float32,
    UInt8,
}

/// Tensor storage
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(Vec<f32>),
    UInt8(Vec<u8>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::UInt8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Float32(_) => ElementType::Float32,
            Self::UInt8(_) => ElementType::UInt8,
        }
    }
}

/// A tensor with its shape and quantisation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: TensorData,
    pub quantisation: QuantParams,
}

impl Tensor {
    /// Zero-filled float tensor
    pub fn float32(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: TensorData::Float32(vec![0.0; len]),
            quantisation: QuantParams::default(),
        }
    }

    /// Zero-filled uint8 tensor with the given quantisation
    pub fn uint8(shape: Vec<usize>, quantisation: QuantParams) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: TensorData::UInt8(vec![0; len]),
            quantisation,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Copy a tensor into `out` as real values
///
/// Float tensors are copied verbatim; uint8 tensors are dequantized with
/// `scale * (q - zero_point)`. At most `min(out.len(), tensor.len())`
/// values are written, and that count is returned.
pub fn dequantize_output(tensor: &Tensor, out: &mut [f32]) -> usize {
    match &tensor.data {
        TensorData::Float32(src) => {
            let n = out.len().min(src.len());
            out[..n].copy_from_slice(&src[..n]);
            n
        }
        TensorData::UInt8(src) => {
            let n = out.len().min(src.len());
            for (o, &q) in out.iter_mut().zip(src) {
                *o = tensor.quantisation.dequantize(q);
            }
            n
        }
    }
}

/// An inference engine as seen from the feature pipeline
pub trait InferenceEngine {
    /// Input tensor `idx`, if the model has one
    fn input(&mut self, idx: usize) -> Option<&mut Tensor>;

    /// Output tensor `idx`, if the model has one
    fn output(&self, idx: usize) -> Option<&Tensor>;

    /// Run the model on the current input tensors
    fn invoke(&mut self) -> Result<()>;

    /// Quantisation parameters of the first input tensor
    fn input_quantisation(&mut self) -> Option<QuantParams> {
        self.input(0).map(|t| t.quantisation)
    }

    /// Quantisation parameters of the first output tensor
    fn output_quantisation(&self) -> Option<QuantParams> {
        self.output(0).map(|t| t.quantisation)
    }

    /// Dequantized copy of the first output tensor
    ///
    /// Returns the number of values written, 0 if the model has no output.
    fn get_output(&self, out: &mut [f32]) -> usize {
        self.output(0)
            .map(|t| dequantize_output(t, out))
            .unwrap_or(0)
    }
}
