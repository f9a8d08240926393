//! モデルとメタデータの永続化
//!
//! Tar.gz形式でモデルとメタデータを1ファイルに統合して保存・読み込みします。
//!
//! ファイル構成（tar.gz内部）:
//! - metadata.json   - メタデータ（出力形式、クラス順、入力サイズ）
//! - model.bin       - モデルの重み（バイナリ）

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::{Archive, Builder};

use crate::model::model_metadata::ModelMetadata;

const METADATA_ENTRY: &str = "metadata.json";
const MODEL_ENTRY: &str = "model.bin";

fn append_entry<W: std::io::Write>(builder: &mut Builder<W>, name: &str, data: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_path(name)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append(&header, data)
        .with_context(|| format!("Failed to add {} to tar", name))
}

/// メタデータと共にモデルをTar.gz形式で保存
pub fn save_model_with_metadata(
    output_path: &Path,
    metadata: &ModelMetadata,
    model_binary: &[u8],
) -> Result<()> {
    // 親ディレクトリが存在しない場合は作成
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;
        }
    }

    let tar_gz_file = File::create(output_path)
        .with_context(|| format!("Failed to create tar.gz file: {:?}", output_path))?;

    let encoder = GzEncoder::new(tar_gz_file, Compression::default());
    let mut tar_builder = Builder::new(encoder);

    append_entry(&mut tar_builder, METADATA_ENTRY, metadata.to_json_string()?.as_bytes())?;
    append_entry(&mut tar_builder, MODEL_ENTRY, model_binary)?;

    tar_builder
        .into_inner()
        .context("Failed to finalize tar archive")?
        .finish()
        .context("Failed to finalize gzip stream")?;

    tracing::info!(path = %output_path.display(), bytes = model_binary.len(), "モデルを保存しました");
    Ok(())
}

/// Tar.gzから指定名のエントリを読み出す
fn read_entry(tar_gz_path: &Path, name: &str) -> Result<Vec<u8>> {
    let tar_gz_file = File::open(tar_gz_path)
        .with_context(|| format!("Failed to open tar.gz file: {:?}", tar_gz_path))?;

    let mut archive = Archive::new(GzDecoder::new(tar_gz_file));

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.path()?.to_str() == Some(name) {
            let mut buffer = Vec::new();
            entry.read_to_end(&mut buffer)?;
            return Ok(buffer);
        }
    }

    Err(anyhow::anyhow!("{} not found in tar.gz archive", name))
}

/// Tar.gzからモデルメタデータを読み込む
pub fn load_metadata(tar_gz_path: &Path) -> Result<ModelMetadata> {
    let bytes = read_entry(tar_gz_path, METADATA_ENTRY)?;
    let json_str = String::from_utf8(bytes).context("metadata.json is not valid UTF-8")?;
    ModelMetadata::from_json_string(&json_str)
}

/// Tar.gzからモデルバイナリを読み込む
pub fn load_model_binary(tar_gz_path: &Path) -> Result<Vec<u8>> {
    read_entry(tar_gz_path, MODEL_ENTRY)
}

/// メタデータとモデルバイナリを共に読み込む（アーカイブは1回だけ走査）
pub fn load_model_with_metadata(tar_gz_path: &Path) -> Result<(ModelMetadata, Vec<u8>)> {
    let tar_gz_file = File::open(tar_gz_path)
        .with_context(|| format!("Failed to open tar.gz file: {:?}", tar_gz_path))?;

    let mut archive = Archive::new(GzDecoder::new(tar_gz_file));

    let mut metadata_opt: Option<ModelMetadata> = None;
    let mut model_binary_opt: Option<Vec<u8>> = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().to_string();

        match path.as_str() {
            METADATA_ENTRY => {
                let mut json_str = String::new();
                entry.read_to_string(&mut json_str)?;
                metadata_opt = Some(ModelMetadata::from_json_string(&json_str)?);
            }
            MODEL_ENTRY => {
                let mut buffer = Vec::new();
                entry.read_to_end(&mut buffer)?;
                model_binary_opt = Some(buffer);
            }
            _ => {}
        }
    }

    match (metadata_opt, model_binary_opt) {
        (Some(metadata), Some(binary)) => Ok((metadata, binary)),
        (None, _) => Err(anyhow::anyhow!("metadata.json not found in tar.gz archive")),
        (_, None) => Err(anyhow::anyhow!("model.bin not found in tar.gz archive")),
    }
}

/// メタデータをコンソールに表示
pub fn print_metadata_info(metadata: &ModelMetadata) {
    println!("\n=== モデルメタデータ ===");
    println!("出力形式: {}", metadata.variant);
    let labels: Vec<&str> = metadata.class_labels.iter().map(|l| l.as_str()).collect();
    println!("出力ラベル: {}", labels.join(", "));
    println!("モデル入力サイズ: {}x{}", metadata.input_size, metadata.input_size);
    println!("書き出し日時: {}", metadata.exported_at);
    println!("========================");
}
