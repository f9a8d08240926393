//! 分類パイプライン共通のエラー型

use std::path::PathBuf;

use thiserror::Error;

/// 画像読み込み・モデル読み込み・推論・デコードで発生するエラー
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// 画像として解釈できないバイト列
    #[error("画像のデコードに失敗しました ({source_name}): {reason}")]
    Decode { source_name: String, reason: String },

    #[error("画像のエンコードに失敗しました: {0}")]
    Encode(String),

    #[error("入力の読み込みに失敗しました ({source_name}): {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("サンプル画像ディレクトリが見つかりません: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("モデルファイルが見つかりません: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// 画像またはモデル出力の形状が期待と異なる
    #[error("形状が一致しません: 期待 {expected}, 実際 {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("モデルの読み込みに失敗しました: {0}")]
    ModelLoad(String),

    #[error("推論に失敗しました: {0}")]
    Inference(String),

    #[error("サンプル画像が1枚もありません")]
    EmptyGallery,

    #[error("機械学習機能が有効化されていません")]
    MlDisabled,

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifierError {
    pub(crate) fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        ClassifierError::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
