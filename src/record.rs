use crate::image::ImagePayload;
use serde::{Deserialize, Serialize};

/// 暗号化される1チャンク分のレコード（JSON）
///
/// 単一レコード形式（旧形式）でも同じフィールド名を使うが、
/// その場合 `data` は入れ子の暗号トークンで、チャンク関連のフィールドは無い。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub data: String,
    #[serde(default)]
    pub is_password_protected: bool,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
}

impl ChunkRecord {
    pub fn for_chunk(
        data: &str,
        payload: &ImagePayload,
        is_password_protected: bool,
        chunk_index: usize,
        total_chunks: usize,
    ) -> Self {
        Self {
            data: data.to_string(),
            is_password_protected,
            file_type: payload.mime_type().to_string(),
            file_name: payload.file_name().to_string(),
            file_size: payload.file_size(),
            chunks: Some(total_chunks),
            chunk_index: Some(chunk_index),
            total_chunks: Some(total_chunks),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
