//! 1回のユーザー操作 = 画像読み込み → 推論 → デコード
//!
//! 表示層はこのモジュールの `Interaction` だけを受け取って描画します。

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::cache::OnceCache;
use crate::classifier::{Classifier, ModelHandle};
use crate::error::{ClassifierError, Result};
use crate::gallery::SampleGallery;
use crate::imaging::{load_image_with_size, Image, ImageSource};
use crate::model::AppConfig;
use crate::prediction::{decode, Prediction};
use crate::types::Label;

/// 1回の分類結果（表示用データ）
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    /// 入力元（ファイル名やサンプルのラベル）
    pub source: String,
    #[serde(skip)]
    pub image: Image,
    /// サンプル画像の場合のみ正解ラベル
    pub ground_truth: Option<Label>,
    pub prediction: Prediction,
}

impl Interaction {
    pub fn summary(&self) -> String {
        match self.ground_truth {
            Some(label) => format!("{} sample: {}", label, self.prediction.summary()),
            None => format!("{}: {}", self.source, self.prediction.summary()),
        }
    }

    pub fn caption(&self) -> &'static str {
        self.prediction.caption()
    }

    /// 前処理済み画像の PNG data URL
    pub fn image_data_url(&self) -> Result<String> {
        self.image.to_png_data_url()
    }
}

/// 分類デモ本体
///
/// モデルとサンプル画像はどちらも初回アクセス時に構築してキャッシュする。
pub struct DiagnosisApp {
    config: AppConfig,
    model: ModelHandle,
    samples: OnceCache<SampleGallery>,
}

impl DiagnosisApp {
    pub fn new(config: AppConfig) -> Self {
        let model = ModelHandle::new(
            config.resolved_model_path(),
            config.variant,
            config.device_type,
        );
        Self::with_model(config, model)
    }

    /// 用意済みのモデルハンドルで作成
    pub fn with_model(config: AppConfig, model: ModelHandle) -> Self {
        Self {
            config,
            model,
            samples: OnceCache::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn model_handle(&self) -> &ModelHandle {
        &self.model
    }

    /// キャッシュ済みのモデル
    pub fn model(&self) -> Result<Arc<dyn Classifier>> {
        self.model.get()
    }

    /// キャッシュ済みのサンプル画像（初回のみディレクトリを走査）
    ///
    /// 画像はモデルの入力サイズで前処理する。モデルが差し替わって
    /// サイズが変わった場合は再走査する。
    pub fn samples(&self) -> Result<Arc<SampleGallery>> {
        let input_size = self.model()?.input_size();
        if let Some(gallery) = self.samples.get() {
            if gallery.input_size() == input_size {
                return Ok(gallery);
            }
            self.samples.clear();
        }
        self.samples.get_or_try_init(|| {
            SampleGallery::scan(PathBuf::from(&self.config.sample_dir), input_size).map(Arc::new)
        })
    }

    /// サンプル画像のキャッシュを破棄する（次回アクセス時に再走査）
    pub fn clear_samples(&self) {
        self.samples.clear();
    }

    /// モデルとサンプル画像のキャッシュを破棄する
    pub fn clear_caches(&self) {
        self.model.clear();
        self.clear_samples();
    }

    fn run(&self, source: String, image: Image, ground_truth: Option<Label>) -> Result<Interaction> {
        let model = self.model()?;
        let raw = model.predict(&image)?;
        let prediction = decode(model.variant(), &raw)?;

        tracing::info!(
            source = %source,
            label = %prediction.label,
            confidence = prediction.confidence,
            "推論が完了しました"
        );

        Ok(Interaction {
            source,
            image,
            ground_truth,
            prediction,
        })
    }

    /// アップロード画像（または任意の入力元）を分類
    pub fn classify_upload<S: ImageSource + ?Sized>(&self, source: &S) -> Result<Interaction> {
        // モデルが無ければ画像を読む前に失敗させる
        let model = self.model()?;
        let image = load_image_with_size(source, Some(model.input_size()))?;
        self.run(source.describe(), image, None)
    }

    /// サンプル画像からランダムに1枚選んで分類
    pub fn classify_random_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Interaction> {
        let gallery = self.samples()?;
        let (label, image) = gallery
            .random_sample(rng)
            .ok_or(ClassifierError::EmptyGallery)?;
        self.run(format!("{} sample", label), image.clone(), Some(label))
    }
}
