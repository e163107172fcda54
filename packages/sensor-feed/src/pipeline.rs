//! Windowed feature extraction with average pooling
//!
//! storage -> dispenser -> window buffer -> engine -> feature vector -> pool

use crate::dispenser::{InputDispenser, OutputBuffers};
use crate::error::{FeedError, Result};
use crate::inference::{ElementType, InferenceEngine, Tensor, TensorData};
use crate::pooling::AvgPool;
use crate::profile_scope;
use crate::storage::Storage;
use crate::types::{DispenserConfig, PipelineOptions, PooledFeatures};

/// Runs a feature-extraction engine over every full window of a source and
/// average-pools the outputs
pub struct FeaturePipeline<E: InferenceEngine> {
    engine: E,
    options: PipelineOptions,
}

impl<E: InferenceEngine> FeaturePipeline<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Stream `config.path` through the engine and pool the outputs
    ///
    /// The engine's first input tensor must hold exactly one window
    /// (`columns * rows` elements). Its element type decides whether the
    /// window is streamed as float or quantised with the tensor's own
    /// parameters. A trailing partial window is dropped.
    pub fn run<S: Storage>(&mut self, storage: S, config: &DispenserConfig) -> Result<PooledFeatures> {
        let window_len = config.window_len();
        let (input_type, input_len) = {
            let input = self
                .engine
                .input(0)
                .ok_or_else(|| FeedError::Inference("model has no input tensor".to_string()))?;
            (input.element_type(), input.len())
        };
        if input_len != window_len {
            return Err(FeedError::InvalidParameter(format!(
                "input tensor holds {} elements but a window of {} columns x {} rows needs {}",
                input_len, config.columns, config.rows, window_len
            )));
        }

        let feature_dim = self
            .engine
            .output(0)
            .map(Tensor::len)
            .ok_or_else(|| FeedError::Inference("model has no output tensor".to_string()))?;

        let mut float_window = Vec::new();
        let mut quant_window = Vec::new();

        let mut dispenser = InputDispenser::from_config(storage, config)?;
        match input_type {
            ElementType::Float32 => {
                float_window.resize(window_len, 0.0f32);
                dispenser.set_output_buffer(OutputBuffers::Float(&mut float_window))?;
            }
            ElementType::UInt8 => {
                if let Some(q) = self.engine.input_quantisation() {
                    dispenser.set_quantisation(q.scale, q.zero_point)?;
                }
                quant_window.resize(window_len, 0u8);
                dispenser.set_output_buffer(OutputBuffers::Quantized(&mut quant_window))?;
            }
        }
        dispenser.begin()?;

        let mut pool = AvgPool::new(feature_dim);
        let mut features = vec![0.0f32; feature_dim];
        let mut rows_streamed = 0usize;
        let mut rows_skipped = 0usize;

        loop {
            match dispenser.stream_next() {
                Ok(()) => rows_streamed += 1,
                Err(FeedError::EndOfData) => break,
                Err(e @ FeedError::MalformedRow { .. }) if self.options.skip_malformed => {
                    log::warn!("Skipping row: {}", e);
                    rows_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            if dispenser.row_cursor() != 0 {
                continue;
            }

            let input = self
                .engine
                .input(0)
                .ok_or_else(|| FeedError::Inference("model has no input tensor".to_string()))?;
            load_window(input, dispenser.output())?;

            {
                profile_scope!(format!("invoke window {}", pool.count() + 1));
                self.engine.invoke()?;
            }

            let n = self.engine.get_output(&mut features);
            if n != feature_dim {
                return Err(FeedError::Inference(format!(
                    "engine produced {} output values, expected {}",
                    n, feature_dim
                )));
            }
            pool.add(&features);
            log::trace!("Window {} features: {:?}", pool.count(), features);

            if self
                .options
                .max_windows
                .is_some_and(|max| pool.count() as usize >= max)
            {
                break;
            }
        }

        if dispenser.row_cursor() != 0 {
            log::debug!(
                "Dropping partial window of {} rows from {}",
                dispenser.row_cursor(),
                config.path.display()
            );
        }

        let Some(pooled) = pool.mean() else {
            log::warn!(
                "{} holds fewer than {} valid rows, no window was completed",
                config.path.display(),
                config.rows
            );
            return Err(FeedError::EndOfData);
        };

        log::info!(
            "Pooled {} windows ({} rows, {} skipped) from {}",
            pool.count(),
            rows_streamed,
            rows_skipped,
            config.path.display()
        );

        Ok(PooledFeatures::new(
            config.path.display().to_string(),
            pool.count() as usize,
            rows_streamed,
            rows_skipped,
            pooled,
        ))
    }
}

/// Copy the dispenser's current window into an input tensor
fn load_window(input: &mut Tensor, window: &OutputBuffers<'_>) -> Result<()> {
    match (&mut input.data, window.float(), window.quantized()) {
        (TensorData::Float32(dst), Some(src), _) => {
            let n = dst.len();
            dst.copy_from_slice(&src[..n]);
        }
        (TensorData::UInt8(dst), _, Some(src)) => {
            let n = dst.len();
            dst.copy_from_slice(&src[..n]);
        }
        _ => {
            return Err(FeedError::Inference(
                "window buffer does not match the input tensor type".to_string(),
            ))
        }
    }
    Ok(())
}
