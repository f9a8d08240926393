//! モデル推論機能

use anyhow::Result;
use std::path::Path;
use std::sync::Mutex;

use burn::{
    module::Module,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{backend::Backend, Tensor, TensorData},
};

use crate::classifier::Classifier;
use crate::error::ClassifierError;
use crate::imaging::Image;
use crate::ml::{ModelConfig, UltrasoundCnn};
use crate::model::{load_model_with_metadata, save_model_with_metadata, InferenceConfig, ModelMetadata};
use crate::prediction::RawScore;
use crate::types::ModelVariant;

/// 推論エンジン
///
/// burn のモジュールは Sync とは限らないため、モデルは Mutex で包んで共有する。
pub struct InferenceEngine<B: Backend> {
    model: Mutex<UltrasoundCnn<B>>,
    config: InferenceConfig,
    device: B::Device,
}

impl<B: Backend> InferenceEngine<B> {
    /// モデルを読み込んで推論エンジンを初期化
    pub fn load<P: AsRef<Path>>(model_path: P, device: B::Device) -> Result<Self> {
        // メタデータとモデルバイナリ読み込み
        let (metadata, model_binary) = load_model_with_metadata(model_path.as_ref())?;
        metadata.validate()?;
        let config = InferenceConfig::from_metadata(&metadata);

        // モデル設定（推論時はドロップアウトなし）
        let model_config = ModelConfig::for_variant(config.variant, config.input_size as usize);
        model_config.validate()?;
        let model = model_config.init::<B>(&device);

        // モデルの重みを復元
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let record = Recorder::<B>::load(&recorder, model_binary, &device)
            .map_err(|e| anyhow::anyhow!("モデル重みの読み込みエラー: {:?}", e))?;

        let model = model.load_record(record);

        tracing::info!(
            path = %model_path.as_ref().display(),
            variant = %config.variant,
            input_size = config.input_size,
            "モデルを読み込みました"
        );

        Ok(Self::from_model(model, config, device))
    }

    /// 初期化済みモデルから推論エンジンを作成
    pub fn from_model(model: UltrasoundCnn<B>, config: InferenceConfig, device: B::Device) -> Self {
        Self {
            model: Mutex::new(model),
            config,
            device,
        }
    }

    /// 単一画像のスコア（活性化後の出力ベクトル）を計算
    pub fn score(&self, image: &Image) -> crate::error::Result<Vec<f32>> {
        let size = self.config.input_size as usize;
        if image.shape() != [size, size, 3] {
            return Err(ClassifierError::shape(
                format!("{}x{}x3", size, size),
                format!("{:?}", image.shape()),
            ));
        }

        // Tensorに変換 [1, 3, size, size]
        let tensor = Tensor::<B, 4>::from_data(
            TensorData::new(image.to_chw(), [1, 3, size, size]),
            &self.device,
        );

        let output = {
            let model = self
                .model
                .lock()
                .map_err(|_| ClassifierError::Inference("モデルのロックが破損しています".to_string()))?;
            model.predict_scores(tensor)
        };

        output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("推論結果の取得エラー: {:?}", e)))
    }

    /// InferenceConfigへの参照を取得
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

impl<B: Backend> Classifier for InferenceEngine<B> {
    fn variant(&self) -> ModelVariant {
        self.config.variant
    }

    fn input_size(&self) -> u32 {
        self.config.input_size
    }

    fn predict(&self, image: &Image) -> crate::error::Result<RawScore> {
        let output = self.score(image)?;
        RawScore::from_output(self.config.variant, output)
    }
}

/// モデルの重みをメタデータと共にTar.gz形式で書き出す
pub fn export_model<B: Backend>(
    model: &UltrasoundCnn<B>,
    metadata: &ModelMetadata,
    output_path: &Path,
) -> Result<()> {
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    let model_binary: Vec<u8> = Recorder::<B>::record(&recorder, model.clone().into_record(), ())
        .map_err(|e| anyhow::anyhow!("モデル重みの書き出しエラー: {:?}", e))?;

    save_model_with_metadata(output_path, metadata, &model_binary)
}
