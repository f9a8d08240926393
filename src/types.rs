use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 診断カテゴリ
///
/// 並び順 (benign, malignant, normal) は多クラスモデルの出力順と一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Benign,
    Malignant,
    Normal,
}

impl Label {
    /// モデル出力のインデックス順
    pub const ALL: [Label; 3] = [Label::Benign, Label::Malignant, Label::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Benign => "benign",
            Label::Malignant => "malignant",
            Label::Normal => "normal",
        }
    }

    pub fn from_index(index: usize) -> Option<Label> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            Label::Benign => 0,
            Label::Malignant => 1,
            Label::Normal => 2,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Label::Normal => Severity::Info,
            Label::Benign => Severity::Success,
            Label::Malignant => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl std::fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown label: {}", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "benign" => Ok(Label::Benign),
            "malignant" => Ok(Label::Malignant),
            "normal" => Ok(Label::Normal),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

/// 表示上の重要度（info / success / warning）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Success => write!(f, "OK"),
            Severity::Warning => write!(f, "WARN"),
        }
    }
}

/// モデルの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// シグモイド出力1個 (malignant = 1, benign = 0)
    Binary,
    /// ソフトマックス出力3個 (benign, malignant, normal)
    Multiclass,
}

impl Default for ModelVariant {
    fn default() -> Self {
        ModelVariant::Binary
    }
}

impl ModelVariant {
    pub fn output_len(&self) -> usize {
        match self {
            ModelVariant::Binary => 1,
            ModelVariant::Multiclass => Label::ALL.len(),
        }
    }

    /// 既定のモデルファイル名
    pub fn default_model_file(&self) -> &'static str {
        match self {
            ModelVariant::Binary => "cnn_model.tar.gz",
            ModelVariant::Multiclass => "cnn_model_multiclass.tar.gz",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelVariant::Binary => write!(f, "binary (sigmoid)"),
            ModelVariant::Multiclass => write!(f, "multiclass (softmax)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_order_matches_model_output() {
        for (i, label) in Label::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(Label::from_index(i), Some(*label));
        }
        assert_eq!(Label::from_index(3), None);
    }

    #[test]
    fn test_label_parse_directory_names() {
        assert_eq!("benign".parse::<Label>(), Ok(Label::Benign));
        assert_eq!("Malignant".parse::<Label>(), Ok(Label::Malignant));
        assert_eq!(" normal ".parse::<Label>(), Ok(Label::Normal));
        assert!("others".parse::<Label>().is_err());
    }

    #[test]
    fn test_variant_output_len() {
        assert_eq!(ModelVariant::Binary.output_len(), 1);
        assert_eq!(ModelVariant::Multiclass.output_len(), 3);
    }

    #[test]
    fn test_variant_serde() {
        let json = serde_json::to_string(&ModelVariant::Multiclass).unwrap();
        assert_eq!(json, "\"multiclass\"");
        let label: Label = serde_json::from_str("\"benign\"").unwrap();
        assert_eq!(label, Label::Benign);
    }
}
