pub mod sample_gallery;

pub use sample_gallery::{SampleGallery, SAMPLE_IMG_DIR};
