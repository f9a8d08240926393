//! モデルファイルのメタデータを表示

use std::path::PathBuf;
use ultrasound_classifier_lib::model::{load_metadata, print_metadata_info, AppConfig, InferenceConfig};

fn main() {
    ultrasound_classifier_lib::init_logging();

    // コマンドライン引数を取得
    let args: Vec<String> = std::env::args().collect();
    let model_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        AppConfig::load_or_default().resolved_model_path()
    };

    match load_metadata(&model_path) {
        Ok(metadata) => {
            println!("✓ モデルメタデータ読み込み成功: {}", model_path.display());
            print_metadata_info(&metadata);
            if let Err(e) = metadata.validate() {
                eprintln!("✗ メタデータが不正です: {}", e);
                std::process::exit(1);
            }
            InferenceConfig::from_metadata(&metadata).print_info();
        }
        Err(e) => {
            eprintln!("✗ エラー: {:#}", e);
            std::process::exit(1);
        }
    }
}
