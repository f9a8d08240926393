//! モデルメタデータから推論に必要な情報を取り出す

use anyhow::{Context, Result};
use std::path::Path;

use crate::model::model_metadata::ModelMetadata;
use crate::model::model_storage;
use crate::types::{Label, ModelVariant};

/// モデルメタデータから推論用情報を取得
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub variant: ModelVariant,

    /// 出力インデックスに対応するラベル
    pub class_labels: Vec<Label>,

    /// モデル入力解像度
    pub input_size: u32,
}

impl InferenceConfig {
    /// メタデータからInferenceConfigを作成
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            variant: metadata.variant,
            class_labels: metadata.class_labels.clone(),
            input_size: metadata.input_size,
        }
    }

    /// モデルファイルから推論設定を読み込む
    pub fn load_from_model(model_path: &Path) -> Result<Self> {
        let metadata = model_storage::load_metadata(model_path)
            .context("Failed to load model metadata")?;
        metadata.validate()?;
        Ok(Self::from_metadata(&metadata))
    }

    /// 出力ノード数
    pub fn num_outputs(&self) -> usize {
        self.variant.output_len()
    }

    /// 設定情報を表示
    pub fn print_info(&self) {
        println!("\n=== 推論設定 ===");
        println!("出力形式: {}", self.variant);
        let labels: Vec<&str> = self.class_labels.iter().map(|l| l.as_str()).collect();
        println!("出力ラベル: {}", labels.join(", "));
        println!("モデル入力サイズ: {}x{}", self.input_size, self.input_size);
        println!("出力ノード数: {}", self.num_outputs());
        println!("==================");
    }
}
