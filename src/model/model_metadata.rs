//! モデルメタデータの定義
//!
//! tar.gz形式のモデルファイルに同梱され、出力形式とクラス順を記録します。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{Label, ModelVariant};

/// モデルメタデータ
///
/// tar.gz形式で保存される情報：
/// - metadata.json: このメタデータ（JSON形式）
/// - model.bin: モデルの重み（バイナリ）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    /// 出力形式（binary / multiclass）
    pub variant: ModelVariant,

    /// 出力インデックスに対応するラベル
    /// binary: ["malignant"]（陽性クラスの確率）
    /// multiclass: ["benign", "malignant", "normal"]
    pub class_labels: Vec<Label>,

    /// モデル入力サイズ（通常224x224）
    pub input_size: u32,

    /// 書き出し時刻（ISO8601形式）
    pub exported_at: String,
}

impl ModelMetadata {
    /// 新しいメタデータを作成
    pub fn new(variant: ModelVariant, input_size: u32) -> Self {
        let class_labels = match variant {
            ModelVariant::Binary => vec![Label::Malignant],
            ModelVariant::Multiclass => Label::ALL.to_vec(),
        };

        Self {
            variant,
            class_labels,
            input_size,
            exported_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// メタデータの整合性を確認
    pub fn validate(&self) -> Result<()> {
        if self.class_labels.len() != self.variant.output_len() {
            anyhow::bail!(
                "クラスラベル数が出力形式と一致しません: {} ({} 個のラベル)",
                self.variant,
                self.class_labels.len()
            );
        }
        if self.variant == ModelVariant::Multiclass && self.class_labels != Label::ALL {
            anyhow::bail!("多クラスモデルのラベル順が不正です: {:?}", self.class_labels);
        }
        if self.input_size == 0 {
            anyhow::bail!("入力サイズが0です");
        }
        Ok(())
    }

    /// メタデータをJSON文字列に変換
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata to JSON")
    }

    /// JSON文字列からメタデータを生成
    pub fn from_json_string(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize metadata from JSON")
    }
}
