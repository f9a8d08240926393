//! サンプル画像ギャラリー
//!
//! `sample_images/<label>/*.jpg` を走査し、前処理済み画像をラベルごとに保持します。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{ClassifierError, Result};
use crate::imaging::{load_image_with_size, Image};
use crate::types::Label;

/// 既定のサンプル画像ディレクトリ
pub const SAMPLE_IMG_DIR: &str = "sample_images";

/// ラベルごとの前処理済みサンプル画像
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGallery {
    root: PathBuf,
    input_size: u32,
    samples: BTreeMap<Label, Vec<Image>>,
}

fn is_jpeg_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                ext == "jpg" || ext == "jpeg"
            })
            .unwrap_or(false)
}

fn io_error(path: &Path, source: std::io::Error) -> ClassifierError {
    ClassifierError::Io {
        source_name: path.display().to_string(),
        source,
    }
}

impl SampleGallery {
    /// ディレクトリを走査してギャラリーを構築する
    ///
    /// # 引数
    /// - `root`: ラベル名のサブディレクトリを含むディレクトリ
    /// - `input_size`: レターボックスリサイズ後の一辺
    pub fn scan(root: impl AsRef<Path>, input_size: u32) -> Result<Self> {
        let root = root.as_ref();
        if input_size == 0 {
            return Err(ClassifierError::shape("positive input size", "0x0"));
        }
        if !root.is_dir() {
            return Err(ClassifierError::MissingDirectory(root.to_path_buf()));
        }

        let mut samples: BTreeMap<Label, Vec<Image>> = BTreeMap::new();

        for entry in std::fs::read_dir(root).map_err(|e| io_error(root, e))? {
            let dir = entry.map_err(|e| io_error(root, e))?.path();
            if !dir.is_dir() {
                continue;
            }

            let dir_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let label = match dir_name.parse::<Label>() {
                Ok(label) => label,
                Err(_) => {
                    tracing::warn!(dir = %dir.display(), "ラベル名ではないディレクトリをスキップします");
                    continue;
                }
            };

            let mut files = Vec::new();
            for file in std::fs::read_dir(&dir).map_err(|e| io_error(&dir, e))? {
                let path = file.map_err(|e| io_error(&dir, e))?.path();
                if is_jpeg_file(&path) {
                    files.push(path);
                }
            }
            files.sort();

            let images = samples.entry(label).or_default();
            for path in files {
                images.push(load_image_with_size(path.as_path(), Some(input_size))?);
            }
        }

        let total: usize = samples.values().map(Vec::len).sum();
        tracing::info!(
            root = %root.display(),
            labels = samples.len(),
            images = total,
            "サンプル画像を読み込みました"
        );

        Ok(Self {
            root: root.to_path_buf(),
            input_size,
            samples,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 画像の一辺（走査時のレターボックスサイズ）
    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn get(&self, label: Label) -> Option<&[Image]> {
        self.samples.get(&label).map(Vec::as_slice)
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.samples.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, &[Image])> {
        self.samples.iter().map(|(label, images)| (*label, images.as_slice()))
    }

    /// 全ラベルの画像総数
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ランダムにサンプルを1枚選ぶ
    ///
    /// 画像を持つラベルから一様にラベルを選び、その中から一様に画像を選ぶ。
    pub fn random_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Label, &Image)> {
        let candidates: Vec<(&Label, &Vec<Image>)> = self
            .samples
            .iter()
            .filter(|(_, images)| !images.is_empty())
            .collect();
        let (label, images) = *candidates.choose(rng)?;
        let image = images.choose(rng)?;
        Some((*label, image))
    }
}
