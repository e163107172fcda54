pub mod types;
pub mod error;
pub mod quantize;
pub mod storage;
pub mod dispenser;
pub mod pooling;
pub mod inference;
pub mod pipeline;
pub mod inspect;
pub mod profiling;

pub use types::*;
pub use error::{FeedError, Result};
pub use quantize::QuantParams;
pub use storage::{FsStorage, LineReader, MemoryStorage, MmapStorage, Storage};
pub use dispenser::{InputDispenser, OutputBuffers, OutputKind};
pub use pooling::AvgPool;
pub use inference::{dequantize_output, ElementType, InferenceEngine, Tensor, TensorData};
pub use pipeline::FeaturePipeline;
pub use inspect::inspect_source;
