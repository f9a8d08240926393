//! モデル出力から診断ラベルへの変換
//!
//! - 2値モデル: シグモイド出力 p (malignant = 1) を 0.3 / 0.6 の閾値で3段階に分ける
//! - 多クラスモデル: (benign, malignant, normal) の確率ベクトルの argmax

use serde::Serialize;

use crate::error::{ClassifierError, Result};
use crate::types::{Label, ModelVariant, Severity};

/// これ未満は normal
pub const NORMAL_UPPER: f32 = 0.3;
/// これ以下は benign（NORMAL_UPPER を含む）
pub const BENIGN_UPPER: f32 = 0.6;

const BINARY_CAPTION: &str = "The model's output node has sigmoid activation, with 'malignant' \
being the positive class (1), and 'benign' being the negative class (0). \
Values close to 1 suggest high chances of malignancy, and vice versa.";

const MULTICLASS_CAPTION: &str = "The model's output layer has softmax activation over \
(benign, malignant, normal); the class with the highest probability is reported.";

/// モデルの生出力
#[derive(Debug, Clone, PartialEq)]
pub enum RawScore {
    /// P(malignant)
    Sigmoid(f32),
    /// (benign, malignant, normal) の確率
    Softmax(Vec<f32>),
}

impl RawScore {
    /// 出力ベクトルを variant に応じた RawScore に変換する
    pub fn from_output(variant: ModelVariant, output: Vec<f32>) -> Result<Self> {
        if output.len() != variant.output_len() {
            return Err(ClassifierError::shape(
                format!("長さ {} の出力", variant.output_len()),
                format!("長さ {} の出力", output.len()),
            ));
        }
        Ok(match variant {
            ModelVariant::Binary => RawScore::Sigmoid(output[0]),
            ModelVariant::Multiclass => RawScore::Softmax(output),
        })
    }
}

/// 予測結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    /// 2値: 生の p、多クラス: 選ばれたクラスの確率
    pub confidence: f32,
    pub severity: Severity,
    /// 多クラスのみ (benign, malignant, normal) の順
    pub probabilities: Option<Vec<(Label, f32)>>,
}

impl Prediction {
    /// 表示用の一行サマリ
    pub fn summary(&self) -> String {
        match &self.probabilities {
            None => format!(
                "[{}] Result: {:.5} -> {} (threshold band {})",
                self.severity,
                self.confidence,
                self.label,
                band_text(self.label)
            ),
            Some(probs) => {
                let probs = probs
                    .iter()
                    .map(|(label, p)| format!("{}: {:.5}", label, p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "[{}] Prediction: {} ({:.2}%) | probabilities: {{{}}}",
                    self.severity,
                    self.label,
                    self.confidence * 100.0,
                    probs
                )
            }
        }
    }

    /// 結果の解釈に関する説明文（表示専用）
    pub fn caption(&self) -> &'static str {
        if self.probabilities.is_some() {
            MULTICLASS_CAPTION
        } else {
            BINARY_CAPTION
        }
    }
}

fn band_text(label: Label) -> &'static str {
    match label {
        Label::Normal => "p < 0.3",
        Label::Benign => "0.3 <= p <= 0.6",
        Label::Malignant => "p > 0.6",
    }
}

/// 2値モデルのシグモイド出力をデコード
///
/// 区間は [-inf, 0.3) / [0.3, 0.6] / (0.6, inf) で重なりなく全域を覆う。
/// NaN はどの比較にも当てはまらず malignant になる。
pub fn decode_binary(p: f32) -> Prediction {
    let label = if p < NORMAL_UPPER {
        Label::Normal
    } else if p <= BENIGN_UPPER {
        Label::Benign
    } else {
        Label::Malignant
    };

    Prediction {
        label,
        confidence: p,
        severity: label.severity(),
        probabilities: None,
    }
}

/// 多クラスモデルの確率ベクトルをデコード
///
/// 最大値が複数ある場合は先頭のインデックスを採用する。
/// NaN を含む場合は numpy の argmax と同じく最初の NaN を採用する。
pub fn decode_multiclass(probs: &[f32]) -> Result<Prediction> {
    if probs.len() != Label::ALL.len() {
        return Err(ClassifierError::shape(
            format!("長さ {} の確率ベクトル", Label::ALL.len()),
            format!("長さ {}", probs.len()),
        ));
    }

    let mut best = 0;
    for (i, &p) in probs.iter().enumerate().skip(1) {
        if probs[best].is_nan() {
            break;
        }
        if p.is_nan() || p > probs[best] {
            best = i;
        }
    }

    let label = Label::ALL[best];
    Ok(Prediction {
        label,
        confidence: probs[best],
        severity: label.severity(),
        probabilities: Some(Label::ALL.iter().copied().zip(probs.iter().copied()).collect()),
    })
}

/// variant に応じてデコード
pub fn decode(variant: ModelVariant, raw: &RawScore) -> Result<Prediction> {
    match (variant, raw) {
        (ModelVariant::Binary, RawScore::Sigmoid(p)) => Ok(decode_binary(*p)),
        (ModelVariant::Multiclass, RawScore::Softmax(probs)) => decode_multiclass(probs),
        (ModelVariant::Binary, RawScore::Softmax(probs)) => {
            Err(ClassifierError::shape("シグモイド出力 1個", format!("確率ベクトル 長さ {}", probs.len())))
        }
        (ModelVariant::Multiclass, RawScore::Sigmoid(_)) => {
            Err(ClassifierError::shape("確率ベクトル 長さ 3", "シグモイド出力 1個"))
        }
    }
}
