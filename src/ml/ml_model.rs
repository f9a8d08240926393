//! 機械学習モデルの共通定義
//!
//! 超音波画像分類用のCNNモデルと関連する設定を提供します。

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    tensor::{activation, backend::Backend, Tensor},
};

use crate::types::ModelVariant;

/// Adaptive pooling 後の特徴マップサイズ
const POOLED_SIZE: usize = 4;
/// 最終畳み込み層のチャネル数
const FEATURE_CHANNELS: usize = 128;
/// 全結合層の隠れユニット数
const HIDDEN_UNITS: usize = 128;

/// モデル設定
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// 出力ノード数（binary: 1, multiclass: 3）
    pub num_outputs: usize,
    /// ドロップアウト率（推論時は0）
    #[config(default = "0.0")]
    pub dropout: f64,
    /// 入力画像サイズ（正方形）
    #[config(default = "224")]
    pub image_size: usize,
}

impl ModelConfig {
    /// 出力形式に合わせた設定
    pub fn for_variant(variant: ModelVariant, image_size: usize) -> Self {
        Self::new(variant.output_len()).with_image_size(image_size)
    }

    /// Conv3 後の特徴マップの一辺
    ///
    /// Conv (3x3, no padding) でサイズが2減り、Pool (2x2, stride 2) で半分になる。
    pub fn feature_map_size(&self) -> usize {
        let after_conv1 = self.image_size.saturating_sub(2);
        let after_pool1 = after_conv1 / 2;
        let after_conv2 = after_pool1.saturating_sub(2);
        let after_pool2 = after_conv2 / 2;
        after_pool2.saturating_sub(2)
    }

    /// 入力サイズが小さすぎないか確認
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feature_map_size() < POOLED_SIZE {
            anyhow::bail!(
                "入力サイズが小さすぎます: {} (Conv3後 {}x{}、最低 {}x{} が必要)",
                self.image_size,
                self.feature_map_size(),
                self.feature_map_size(),
                POOLED_SIZE,
                POOLED_SIZE
            );
        }
        if self.num_outputs == 0 {
            anyhow::bail!("出力ノード数が0です");
        }
        Ok(())
    }

    /// モデルを初期化
    pub fn init<B: Backend>(&self, device: &B::Device) -> UltrasoundCnn<B> {
        let d = FEATURE_CHANNELS * POOLED_SIZE * POOLED_SIZE;

        tracing::debug!(
            image_size = self.image_size,
            feature_map = self.feature_map_size(),
            flatten = d,
            outputs = self.num_outputs,
            "CNNを初期化します"
        );

        UltrasoundCnn {
            conv1: Conv2dConfig::new([3, 32], [3, 3]).init(device),
            pool1: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            conv2: Conv2dConfig::new([32, 64], [3, 3]).init(device),
            pool2: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            conv3: Conv2dConfig::new([64, FEATURE_CHANNELS], [3, 3]).init(device),
            global_pool: AdaptiveAvgPool2dConfig::new([POOLED_SIZE, POOLED_SIZE]).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc1: LinearConfig::new(d, HIDDEN_UNITS).init(device),
            fc2: LinearConfig::new(HIDDEN_UNITS, self.num_outputs).init(device),
            activation: Relu::new(),
        }
    }
}

/// 超音波画像分類用CNNモデル
///
/// # アーキテクチャ
/// - Conv 3x3 + ReLU + MaxPool 2x2 (3 -> 32)
/// - Conv 3x3 + ReLU + MaxPool 2x2 (32 -> 64)
/// - Conv 3x3 + ReLU (64 -> 128)
/// - AdaptiveAvgPool 4x4, Flatten (2048)
/// - FC: 2048 -> 128 + ReLU + Dropout
/// - FC: 128 -> num_outputs
/// - Sigmoid (1出力) / Softmax (複数出力)
#[derive(Module, Debug)]
pub struct UltrasoundCnn<B: Backend> {
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    conv2: Conv2d<B>,
    pool2: MaxPool2d,
    conv3: Conv2d<B>,
    global_pool: AdaptiveAvgPool2d,
    dropout: Dropout,

    // 全結合層
    fc1: Linear<B>,
    fc2: Linear<B>,

    activation: Relu,
}

impl<B: Backend> UltrasoundCnn<B> {
    /// 順伝播
    ///
    /// # 引数
    /// - `images`: バッチ画像 [batch_size, 3, size, size]、値は [0, 1]
    ///
    /// # 戻り値
    /// - ロジット [batch_size, num_outputs]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = self.conv1.forward(images);
        let x = self.activation.forward(x);
        let x = self.pool1.forward(x);

        let x = self.conv2.forward(x);
        let x = self.activation.forward(x);
        let x = self.pool2.forward(x);

        let x = self.conv3.forward(x);
        let x = self.activation.forward(x);
        let x = self.global_pool.forward(x);

        // Flatten
        let [_, c, h, w] = x.dims();
        let x = x.reshape([batch_size, c * h * w]);

        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);

        self.fc2.forward(x)
    }

    /// 出力層の活性化まで適用したスコア
    ///
    /// 出力が1ノードならシグモイド、それ以外はクラス方向のソフトマックス。
    pub fn predict_scores(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(images);
        let [_, num_outputs] = logits.dims();
        if num_outputs == 1 {
            activation::sigmoid(logits)
        } else {
            activation::softmax(logits, 1)
        }
    }
}
