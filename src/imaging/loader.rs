//! 画像の読み込みと前処理
//!
//! 入力画像をRGBに変換し、アスペクト比を保ったままパディング付きで
//! 正方形にリサイズ（レターボックス）してから [0, 1] に正規化します。

use base64::Engine as _;
use image::{imageops::FilterType, ImageEncoder, ImageFormat, Rgb, RgbImage};

use crate::error::{ClassifierError, Result};
use crate::imaging::source::ImageSource;

/// モデル入力の一辺のサイズ
pub const IMG_SIZE: u32 = 224;

/// 前処理済み画像
///
/// HWC順（行優先、RGB）の f32 値を [0, 1] の範囲で保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Image {
    /// 生データから作成（長さは width * height * 3 である必要がある）
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ClassifierError::shape(
                format!("{} 要素 ({}x{}x3)", expected, height, width),
                format!("{} 要素", data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// 8bit RGB画像を [0, 1] に正規化して作成
    pub fn from_rgb8(img: &RgbImage) -> Self {
        let data = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self {
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// [H, W, C]
    pub fn shape(&self) -> [usize; 3] {
        [self.height as usize, self.width as usize, 3]
    }

    /// HWC順の画素値
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// (x, y) の RGB 値（範囲外なら None）
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// CHW順に並べ替えた画素値（モデル入力用）
    pub fn to_chw(&self) -> Vec<f32> {
        let num_pixels = self.width as usize * self.height as usize;
        let mut chw = vec![0.0f32; 3 * num_pixels];
        for (i, rgb) in self.data.chunks_exact(3).enumerate() {
            chw[i] = rgb[0];
            chw[num_pixels + i] = rgb[1];
            chw[2 * num_pixels + i] = rgb[2];
        }
        chw
    }

    /// 表示用に 8bit RGB へ戻す
    pub fn to_rgb8(&self) -> RgbImage {
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        let mut rgb = RgbImage::new(self.width, self.height);
        for (dst, src) in rgb.pixels_mut().zip(self.data.chunks_exact(3)) {
            *dst = Rgb([to_u8(src[0]), to_u8(src[1]), to_u8(src[2])]);
        }
        rgb
    }

    /// PNGにエンコードしたdata URL（表示用）
    pub fn to_png_data_url(&self) -> Result<String> {
        let rgb = self.to_rgb8();
        let mut png_data = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png_data)
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| ClassifierError::Encode(e.to_string()))?;

        let base64_data = base64::engine::general_purpose::STANDARD.encode(&png_data);
        Ok(format!("data:image/png;base64,{}", base64_data))
    }
}

/// アスペクト比を保ったまま target x target に収め、余白を黒で埋める
///
/// 切り抜きや引き伸ばしは行いません。縮小後の画像は中央（端数は左上寄り）に配置されます。
pub fn letterbox(img: &RgbImage, target: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut canvas = RgbImage::new(target, target);
    if target == 0 || width == 0 || height == 0 {
        return canvas;
    }

    // 長辺を target に合わせる（整数演算で切り捨て）
    let (new_w, new_h) = if width >= height {
        let h = (height as u64 * target as u64 / width as u64) as u32;
        (target, h.max(1))
    } else {
        let w = (width as u64 * target as u64 / height as u64) as u32;
        (w.max(1), target)
    };

    let resized = if (new_w, new_h) == (width, height) {
        img.clone()
    } else {
        image::imageops::resize(img, new_w, new_h, FilterType::Triangle)
    };

    let x_offset = (target - new_w) / 2;
    let y_offset = (target - new_h) / 2;
    image::imageops::overlay(&mut canvas, &resized, x_offset as i64, y_offset as i64);

    canvas
}

/// バイト列をRGB画像としてデコード（JPEG / PNG のみ）
pub fn decode_rgb8(bytes: &[u8], source_name: &str) -> Result<RgbImage> {
    let decode_err = |reason: String| ClassifierError::Decode {
        source_name: source_name.to_string(),
        reason,
    };

    let format = image::guess_format(bytes).map_err(|e| decode_err(e.to_string()))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(decode_err(format!("未対応の画像形式です: {:?}", format)));
    }

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| decode_err(e.to_string()))?;

    // アルファは破棄、グレースケールは3チャネルに展開
    Ok(img.to_rgb8())
}

/// 入力元から画像を読み込み、モデル入力形式に変換する（サイズ指定版）
///
/// # 引数
/// - `source`: ファイルパスやアップロードなどの入力元
/// - `target`: Some(n) の場合 n x n にレターボックスリサイズ
///
/// # 戻り値
/// - [0, 1] に正規化された RGB 画像
pub fn load_image_with_size<S: ImageSource + ?Sized>(source: &S, target: Option<u32>) -> Result<Image> {
    if target == Some(0) {
        return Err(ClassifierError::shape("positive input size", "0x0"));
    }
    let source_name = source.describe();
    let bytes = source.read_bytes().map_err(|e| ClassifierError::Io {
        source_name: source_name.clone(),
        source: e,
    })?;

    let rgb = decode_rgb8(&bytes, &source_name)?;
    let rgb = match target {
        Some(size) => letterbox(&rgb, size),
        None => rgb,
    };

    tracing::debug!(
        source = %source_name,
        width = rgb.width(),
        height = rgb.height(),
        "画像を読み込みました"
    );

    Ok(Image::from_rgb8(&rgb))
}

/// 入力元から画像を読み込む（`resize` が true なら 224x224）
pub fn load_image<S: ImageSource + ?Sized>(source: &S, resize: bool) -> Result<Image> {
    load_image_with_size(source, resize.then_some(IMG_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::source::UploadedImage;
    use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_letterbox_always_target_square() {
        for (w, h) in [(640, 480), (100, 300), (224, 224), (1, 1), (1000, 3), (50, 50)] {
            let out = letterbox(&white(w, h), IMG_SIZE);
            assert_eq!(out.dimensions(), (IMG_SIZE, IMG_SIZE), "input {}x{}", w, h);
        }
    }

    #[test]
    fn test_letterbox_wide_image_padded_top_and_bottom() {
        // 448x224 -> 224x112、上下に56pxずつ余白
        let out = letterbox(&white(448, 224), IMG_SIZE);
        assert_eq!(out.get_pixel(112, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(112, 55), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(112, 56), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(112, 167), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(112, 168), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(0, 112), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(223, 112), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_letterbox_tall_image_padded_left_and_right() {
        // 100x200 -> 112x224、左右に56pxずつ余白
        let out = letterbox(&white(100, 200), IMG_SIZE);
        assert_eq!(out.get_pixel(55, 112), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(56, 112), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(167, 112), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(168, 112), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_letterbox_square_image_fills_canvas() {
        let out = letterbox(&white(50, 50), IMG_SIZE);
        assert!(out.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_load_image_resize_shape_and_range() {
        let bytes = encode(DynamicImage::ImageRgb8(white(320, 240)), ImageFormat::Png);
        let upload = UploadedImage::new("wide.png", bytes);

        let img = load_image(&upload, true).unwrap();
        assert_eq!(img.shape(), [224, 224, 3]);
        assert!(img.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        // 余白は0、中央は1
        assert_eq!(img.pixel(112, 0), Some([0.0, 0.0, 0.0]));
        assert_eq!(img.pixel(112, 112), Some([1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_load_image_without_resize_keeps_dimensions() {
        let bytes = encode(DynamicImage::ImageRgb8(white(31, 17)), ImageFormat::Png);
        let img = load_image(&UploadedImage::new("small.png", bytes), false).unwrap();
        assert_eq!(img.shape(), [17, 31, 3]);
    }

    #[test]
    fn test_load_image_converts_grayscale_and_alpha_to_rgb() {
        let gray = GrayImage::from_pixel(8, 8, Luma([51]));
        let bytes = encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png);
        let img = load_image(&UploadedImage::new("gray.png", bytes), false).unwrap();
        assert_eq!(img.pixel(3, 3), Some([0.2, 0.2, 0.2]));

        let rgba = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 10]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let img = load_image(&UploadedImage::new("alpha.png", bytes), false).unwrap();
        assert_eq!(img.shape(), [8, 8, 3]);
        assert_eq!(img.pixel(0, 0), Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_load_image_jpeg() {
        let bytes = encode(DynamicImage::ImageRgb8(white(64, 32)), ImageFormat::Jpeg);
        let img = load_image(&UploadedImage::new("scan.jpg", bytes), true).unwrap();
        assert_eq!(img.shape(), [224, 224, 3]);
    }

    #[test]
    fn test_load_image_garbage_is_decode_error() {
        let upload = UploadedImage::new("notes.txt", b"not an image at all".to_vec());
        match load_image(&upload, true) {
            Err(ClassifierError::Decode { source_name, .. }) => {
                assert_eq!(source_name, "upload:notes.txt");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_image_truncated_png_is_decode_error() {
        let mut bytes = encode(DynamicImage::ImageRgb8(white(16, 16)), ImageFormat::Png);
        bytes.truncate(bytes.len() / 2);
        let result = load_image(&UploadedImage::new("broken.png", bytes), false);
        assert!(matches!(result, Err(ClassifierError::Decode { .. })));
    }

    #[test]
    fn test_load_image_rejects_other_formats() {
        let bytes = encode(DynamicImage::ImageRgb8(white(4, 4)), ImageFormat::Bmp);
        let result = load_image(&UploadedImage::new("scan.bmp", bytes), false);
        assert!(matches!(result, Err(ClassifierError::Decode { .. })));
    }

    #[test]
    fn test_load_image_with_custom_size() {
        let bytes = encode(DynamicImage::ImageRgb8(white(30, 10)), ImageFormat::Png);
        let img = load_image_with_size(&UploadedImage::new("s.png", bytes), Some(48)).unwrap();
        assert_eq!(img.shape(), [48, 48, 3]);
    }

    #[test]
    fn test_zero_target_size_is_rejected() {
        assert_eq!(letterbox(&white(30, 10), 0).dimensions(), (0, 0));
        let bytes = encode(DynamicImage::ImageRgb8(white(30, 10)), ImageFormat::Png);
        assert!(matches!(
            load_image_with_size(&UploadedImage::new("s.png", bytes), Some(0)),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_pixel_out_of_range_is_none() {
        let img = Image::new(2, 1, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(img.pixel(1, 0), Some([0.4, 0.5, 0.6]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(0, 1), None);
    }

    #[test]
    fn test_to_chw_layout() {
        let img = Image::new(2, 1, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(img.to_chw(), vec![0.1, 0.4, 0.2, 0.5, 0.3, 0.6]);
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(matches!(
            Image::new(2, 2, vec![0.0; 5]),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_png_data_url() {
        let img = Image::from_rgb8(&white(4, 4));
        assert_eq!(img.to_rgb8(), white(4, 4));
        let url = img.to_png_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
