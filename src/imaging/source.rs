//! 画像入力元の抽象化
//!
//! ファイルパスでもアップロードされたバイト列でも、バイト列として読めるものは
//! すべて同じローダーに渡せます。

use std::io;
use std::path::{Path, PathBuf};

/// バイト列として読み出せる画像入力元
pub trait ImageSource {
    /// 画像ファイルの中身をすべて読み出す
    fn read_bytes(&self) -> io::Result<Vec<u8>>;

    /// ログとエラーメッセージ用の名前
    fn describe(&self) -> String;
}

impl ImageSource for Path {
    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self)
    }

    fn describe(&self) -> String {
        self.display().to_string()
    }
}

impl ImageSource for PathBuf {
    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        self.as_path().read_bytes()
    }

    fn describe(&self) -> String {
        self.as_path().describe()
    }
}

/// メモリ上にアップロードされた画像
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl ImageSource for UploadedImage {
    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn describe(&self) -> String {
        format!("upload:{}", self.file_name)
    }
}

impl<T: ImageSource + ?Sized> ImageSource for &T {
    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        (**self).read_bytes()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
