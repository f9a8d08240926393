//! 学習済み分類モデルのハンドル
//!
//! モデルはプロセス内で一度だけ読み込み、以後は状態を持たない関数として扱います。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::OnceCache;
use crate::error::{ClassifierError, Result};
use crate::imaging::Image;
use crate::model::DeviceType;
use crate::prediction::RawScore;
use crate::types::ModelVariant;

/// 画像からスコアを返す分類器
pub trait Classifier: Send + Sync {
    fn variant(&self) -> ModelVariant;

    /// 期待する入力画像の一辺
    fn input_size(&self) -> u32;

    fn predict(&self, image: &Image) -> Result<RawScore>;
}

/// モデルファイルを読み込む
///
/// ファイルが存在しない場合は読み込みを試みる前に `ModelNotFound` を返す。
/// 読み込んだモデルの出力形式が `variant` と異なる場合は `ModelLoad` を返す。
pub fn load_model(path: &Path, variant: ModelVariant, device: DeviceType) -> Result<Arc<dyn Classifier>> {
    if !path.is_file() {
        return Err(ClassifierError::ModelNotFound(path.to_path_buf()));
    }

    let classifier = load_engine(path, device)?;
    if classifier.variant() != variant {
        return Err(ClassifierError::ModelLoad(format!(
            "モデルの出力形式が一致しません: 期待 {}, ファイル {}",
            variant,
            classifier.variant()
        )));
    }
    Ok(classifier)
}

#[cfg(feature = "ml")]
fn load_engine(path: &Path, device: DeviceType) -> Result<Arc<dyn Classifier>> {
    use crate::ml::InferenceEngine;

    let to_err = |e: anyhow::Error| ClassifierError::ModelLoad(format!("{:#}", e));
    let engine: Arc<dyn Classifier> = match device {
        DeviceType::Wgpu => Arc::new(
            InferenceEngine::<burn::backend::Wgpu>::load(path, burn_wgpu::WgpuDevice::default())
                .map_err(to_err)?,
        ),
        DeviceType::Cpu => Arc::new(
            InferenceEngine::<burn_ndarray::NdArray<f32>>::load(path, Default::default())
                .map_err(to_err)?,
        ),
    };
    Ok(engine)
}

// featureが無効な場合のダミー実装
#[cfg(not(feature = "ml"))]
fn load_engine(_path: &Path, _device: DeviceType) -> Result<Arc<dyn Classifier>> {
    Err(ClassifierError::MlDisabled)
}

/// プロセス全体で共有するモデルハンドル
pub struct ModelHandle {
    path: PathBuf,
    variant: ModelVariant,
    device: DeviceType,
    cache: OnceCache<dyn Classifier>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>, variant: ModelVariant, device: DeviceType) -> Self {
        Self {
            path: path.into(),
            variant,
            device,
            cache: OnceCache::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// 初回呼び出し時に読み込み、以後は同じモデルを返す
    pub fn get(&self) -> Result<Arc<dyn Classifier>> {
        self.cache
            .get_or_try_init(|| load_model(&self.path, self.variant, self.device))
    }

    /// 外部で用意した分類器を登録する
    pub fn with_classifier(path: impl Into<PathBuf>, classifier: Arc<dyn Classifier>) -> Self {
        let handle = Self::new(path, classifier.variant(), DeviceType::Cpu);
        handle.set_classifier(classifier);
        handle
    }

    /// 読み込み済みのモデルを差し替える
    pub fn set_classifier(&self, classifier: Arc<dyn Classifier>) {
        self.cache.set(classifier);
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.is_initialized()
    }

    /// キャッシュを破棄して次回アクセス時に再読み込みする
    pub fn clear(&self) {
        self.cache.clear();
    }
}
