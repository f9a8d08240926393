pub mod ml_model;
pub mod inference;

pub use ml_model::{ModelConfig, UltrasoundCnn};
pub use inference::{export_model, InferenceEngine};
