pub mod source;
pub mod loader;

pub use source::{ImageSource, UploadedImage};
pub use loader::{decode_rgb8, letterbox, load_image, load_image_with_size, Image, IMG_SIZE};
