//! 超音波画像の分類
//!
//! 使い方:
//!   classify <画像ファイル>   指定した画像を分類
//!   classify                  サンプル画像からランダムに1枚選んで分類

use anyhow::Context;
use std::path::PathBuf;
use ultrasound_classifier_lib::model::AppConfig;
use ultrasound_classifier_lib::DiagnosisApp;

fn main() -> anyhow::Result<()> {
    ultrasound_classifier_lib::init_logging();

    let config = AppConfig::load_or_default();
    config.display();

    let app = DiagnosisApp::new(config);

    // モデルが無い場合はここで終了
    app.model().context("モデルの読み込みに失敗しました")?;

    let args: Vec<String> = std::env::args().collect();
    let interaction = if args.len() > 1 {
        let path = PathBuf::from(&args[1]);
        app.classify_upload(path.as_path())
            .with_context(|| format!("画像の分類に失敗しました: {}", path.display()))?
    } else {
        let mut rng = rand::thread_rng();
        app.classify_random_sample(&mut rng)
            .context("サンプル画像の分類に失敗しました")?
    };

    println!("{}", interaction.summary());
    println!("{}", interaction.caption());

    Ok(())
}
