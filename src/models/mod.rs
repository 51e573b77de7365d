//! DT model loading and inference

pub mod inference;
pub mod loader;
pub mod native;
pub mod onnx;
pub mod regressor;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use inference::predict;
pub use loader::{DeserializeStrategy, FileSource, ModelLoader, ModelSource};
pub use native::{JsonStrategy, NativeModel};
pub use onnx::OnnxStrategy;
pub use regressor::{ModelHandle, Regressor};
pub use service::ModelService;
