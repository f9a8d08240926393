mod cache;
mod error;
mod types;

pub mod app;
pub mod classifier;
pub mod gallery;
pub mod imaging;
pub mod model;
pub mod prediction;
#[cfg(feature = "ml")]
pub mod ml;

pub use app::{DiagnosisApp, Interaction};
pub use cache::OnceCache;
pub use classifier::{load_model, Classifier, ModelHandle};
pub use error::{ClassifierError, Result};
pub use gallery::SampleGallery;
pub use imaging::{load_image, Image, ImageSource, UploadedImage, IMG_SIZE};
pub use prediction::{decode, decode_binary, decode_multiclass, Prediction, RawScore};
pub use types::{Label, ModelVariant, Severity, UnknownLabel};

use tracing_subscriber::EnvFilter;

/// ログ出力を初期化（`RUST_LOG` で上書き可能）
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ultrasound_classifier_lib=debug,wgpu_core=warn,wgpu_hal=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
