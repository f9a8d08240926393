//! アプリケーション設定管理モジュール
//!
//! 計算デバイスやモデルファイル、サンプル画像ディレクトリをJSON形式で保存・読み込みします。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::gallery::SAMPLE_IMG_DIR;
use crate::types::ModelVariant;

/// 計算デバイスの種類
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum DeviceType {
    /// WGPU (GPU) バックエンド
    Wgpu,
    /// NdArray (CPU) バックエンド
    Cpu,
}

impl Default for DeviceType {
    fn default() -> Self {
        DeviceType::Wgpu
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Wgpu => write!(f, "WGPU (GPU)"),
            DeviceType::Cpu => write!(f, "CPU (NdArray)"),
        }
    }
}

fn default_sample_dir() -> String {
    SAMPLE_IMG_DIR.to_string()
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 計算デバイスの種類
    #[serde(default)]
    pub device_type: DeviceType,
    /// モデルの出力形式
    #[serde(default)]
    pub variant: ModelVariant,
    /// モデルファイルのパス（未指定なら variant の既定ファイル名）
    #[serde(default)]
    pub model_path: Option<String>,
    /// サンプル画像ディレクトリ
    #[serde(default = "default_sample_dir")]
    pub sample_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::default(),
            variant: ModelVariant::default(),
            model_path: None,
            sample_dir: default_sample_dir(),
        }
    }
}

impl AppConfig {
    /// 設定ファイルのデフォルトパス
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.json")
    }

    /// 設定を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 指定パスから設定を読み込む、存在しない・壊れている場合はデフォルト設定を返す
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::load(path) {
                Ok(config) => {
                    tracing::info!("設定ファイルを読み込みました: {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "設定ファイルの読み込みに失敗しました ({}): {}。デフォルト設定を使用します",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::info!("設定ファイルが存在しません。デフォルト設定を使用します");
            Self::default()
        }
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::default_path())
    }

    /// 設定を保存する
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 使用するモデルファイルのパス
    pub fn resolved_model_path(&self) -> PathBuf {
        match &self.model_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(self.variant.default_model_file()),
        }
    }

    /// 計算デバイスを設定
    pub fn set_device_type(&mut self, device_type: DeviceType) {
        self.device_type = device_type;
    }

    /// モデルパスを設定
    pub fn set_model_path(&mut self, path: String) {
        self.model_path = Some(path);
    }

    /// 設定情報を表示
    pub fn display(&self) {
        println!("=== アプリケーション設定 ===");
        println!("計算デバイス: {}", self.device_type);
        println!("モデル形式: {}", self.variant);
        println!("モデルパス: {}", self.resolved_model_path().display());
        println!("サンプル画像: {}", self.sample_dir);
        println!("========================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.device_type, DeviceType::Wgpu);
        assert_eq!(config.variant, ModelVariant::Binary);
        assert_eq!(config.sample_dir, "sample_images");
        assert_eq!(config.resolved_model_path(), PathBuf::from("cnn_model.tar.gz"));
    }

    #[test]
    fn test_multiclass_default_model_path() {
        let config = AppConfig {
            variant: ModelVariant::Multiclass,
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolved_model_path(),
            PathBuf::from("cnn_model_multiclass.tar.gz")
        );
    }

    #[test]
    fn test_explicit_model_path_wins() {
        let mut config = AppConfig::default();
        config.set_model_path("models/custom.tar.gz".to_string());
        assert_eq!(config.resolved_model_path(), PathBuf::from("models/custom.tar.gz"));
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.device_type, deserialized.device_type);
        assert_eq!(config.variant, deserialized.variant);
        assert_eq!(config.sample_dir, deserialized.sample_dir);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"variant": "multiclass", "device_type": "Cpu"}"#).unwrap();
        assert_eq!(config.variant, ModelVariant::Multiclass);
        assert_eq!(config.device_type, DeviceType::Cpu);
        assert_eq!(config.sample_dir, "sample_images");
    }

    #[test]
    fn test_legacy_input_size_field_is_ignored() {
        // 入力サイズはモデルのメタデータが決める
        let config: AppConfig =
            serde_json::from_str(r#"{"sample_dir": "imgs", "input_size": 0}"#).unwrap();
        assert_eq!(config.sample_dir, "imgs");
    }

    #[test]
    fn test_load_or_default_with_broken_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_or_default_from(&path);
        assert_eq!(config.variant, ModelVariant::Binary);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        let mut config = AppConfig::default();
        config.set_device_type(DeviceType::Cpu);
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.device_type, DeviceType::Cpu);
    }

    #[test]
    fn test_device_type_display() {
        assert_eq!(format!("{}", DeviceType::Wgpu), "WGPU (GPU)");
        assert_eq!(format!("{}", DeviceType::Cpu), "CPU (NdArray)");
    }
}
