use crate::config::Config;
use crate::image::{DecodedImage, ImagePayload};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

/// 拡張子から画像のMIMEタイプを推定
pub fn mime_type_from_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// 画像ファイルを読み込んでエンコード対象を作成
pub fn read_image_payload(input_path: &Path, config: &Config) -> Result<ImagePayload> {
    let mime_type = mime_type_from_path(input_path)
        .ok_or_else(|| anyhow!("画像ファイルではありません: {}", input_path.display()))?;

    let metadata = fs::metadata(input_path)
        .with_context(|| format!("ファイル情報の取得に失敗: {}", input_path.display()))?;
    let file_size = metadata.len();

    if file_size > config.large_file_threshold {
        log::warn!(
            "大きなファイルです: {} バイト（目安 {} バイト）。暗号化テキストが非常に長くなります",
            file_size,
            config.large_file_threshold
        );
    }

    let bytes = fs::read(input_path)
        .with_context(|| format!("ファイル読み込みに失敗: {}", input_path.display()))?;

    let file_name = input_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("無効なファイル名"))?;

    log::debug!("画像読み込み完了: {file_name} ({mime_type}, {file_size} バイト)");
    Ok(ImagePayload::new(bytes, mime_type, file_name, file_size))
}

/// 暗号化テキストを読み込み（`-` は標準入力）
pub fn read_frame_text(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("標準入力の読み込みに失敗")?;
        return Ok(text);
    }

    fs::read_to_string(input)
        .with_context(|| format!("暗号化テキストの読み込みに失敗: {}", input.display()))
}

/// 暗号化テキストを書き込み（出力先なしは標準出力）
pub fn write_frame_text(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("出力ファイルの書き込みに失敗: {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}").context("標準出力への書き込みに失敗")?;
            stdout.flush().context("標準出力のフラッシュに失敗")
        }
    }
}

/// 暗号化テキストの出力パスを決定（`-` は標準出力で `None`）
///
/// 省略時は `encrypted-image-YYYY-MM-DD.txt`
pub fn determine_frame_output_path(output: Option<&Path>, date: NaiveDate) -> Option<PathBuf> {
    match output {
        Some(path) if path == Path::new("-") => None,
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(format!(
            "encrypted-image-{}.txt",
            date.format("%Y-%m-%d")
        ))),
    }
}

/// 復号化した画像の出力パスを決定
pub fn determine_output_path(
    output: Option<&Path>,
    image: &DecodedImage,
    date: NaiveDate,
) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(image.suggested_file_name(date)),
    }
}

/// 復号化した画像をファイルに書き込み
pub fn write_decoded_image(output_path: &Path, image: &DecodedImage) -> Result<usize> {
    let bytes = image.to_bytes()?;
    fs::write(output_path, &bytes)
        .with_context(|| format!("画像ファイルの書き込みに失敗: {}", output_path.display()))?;
    Ok(bytes.len())
}
