pub mod decoder;

pub use decoder::{decode, decode_binary, decode_multiclass, Prediction, RawScore, BENIGN_UPPER, NORMAL_UPPER};
