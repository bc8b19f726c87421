use crate::base64_encode;
use crate::error::{CodecError, CodecResult};
use base64::{Engine as _, engine::general_purpose};
use chrono::NaiveDate;
use std::fmt;

/// 復号化結果が必ず持つ接頭辞
pub const DATA_URL_IMAGE_PREFIX: &str = "data:image";

const FALLBACK_MIME_TYPE: &str = "image/png";

/// エンコード対象の画像（読み込み済み）
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
    file_size: u64,
}

impl ImagePayload {
    pub fn new(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
            file_size,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// `data:<mime>;base64,<payload>` 形式の文字列に変換
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, base64_encode(&self.bytes))
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .field("file_size", &self.file_size)
            .finish()
    }
}

/// 復号化された画像（data URL文字列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage(String);

impl DecodedImage {
    /// `data:image` で始まらない場合は `None`
    pub fn new(data_url: String) -> Option<Self> {
        data_url
            .starts_with(DATA_URL_IMAGE_PREFIX)
            .then_some(Self(data_url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// data URLのヘッダーからMIMEタイプを取り出す（解析できなければ `image/png`）
    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(mime, _)| mime)
            .filter(|mime| is_valid_mime(mime))
            .unwrap_or(FALLBACK_MIME_TYPE)
    }

    /// 保存用の拡張子（MIMEのサブタイプ、`+xml` などの接尾辞は除く）
    pub fn file_extension(&self) -> &str {
        let subtype = self
            .mime_type()
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or("png");
        subtype.split('+').next().unwrap_or(subtype)
    }

    /// `decrypted-image-YYYY-MM-DD.<ext>`
    pub fn suggested_file_name(&self, date: NaiveDate) -> String {
        format!(
            "decrypted-image-{}.{}",
            date.format("%Y-%m-%d"),
            self.file_extension()
        )
    }

    /// base64部分をデコードして画像のバイト列を返す
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        let (_, payload) = self
            .0
            .split_once(";base64,")
            .ok_or_else(|| CodecError::corrupted("data URLにbase64区切りがありません"))?;
        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CodecError::corrupted(format!("画像データのBase64デコードに失敗: {e}")))
    }
}

fn is_valid_mime(mime: &str) -> bool {
    let Some((kind, subtype)) = mime.split_once('/') else {
        return false;
    };
    !kind.is_empty()
        && !subtype.is_empty()
        && kind.chars().all(|c| c.is_ascii_alphanumeric())
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+'))
}
