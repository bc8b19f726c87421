use crate::chunk::split_into_chunks;
use crate::config::{BaseSecret, DEFAULT_CHUNK_SIZE};
use crate::crypto::{decrypt_string, encrypt_string};
use crate::error::{CodecError, CodecResult};
use crate::frame::Frame;
use crate::image::{DATA_URL_IMAGE_PREFIX, DecodedImage, ImagePayload};
use crate::key_derivation::{EncryptionKey, derive_key, normalize_password};
use crate::record::ChunkRecord;
use log::{debug, info, warn};

/// 画像を暗号化テキストに変換
pub fn encode(
    payload: &ImagePayload,
    password: Option<&str>,
    secret: &BaseSecret,
) -> CodecResult<String> {
    Encoder::new(secret).encode(payload, password)
}

/// 暗号化テキストを画像のdata URLに戻す
pub fn decode(
    frame_text: &str,
    password: Option<&str>,
    secret: &BaseSecret,
) -> CodecResult<DecodedImage> {
    Decoder::new(secret).decode(frame_text, password)
}

/// 画像 → 暗号化テキスト
#[derive(Debug, Clone)]
pub struct Encoder<'a> {
    secret: &'a BaseSecret,
    chunk_size: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(secret: &'a BaseSecret) -> Self {
        Self {
            secret,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// `chunk_size` が0の場合は `encode` 時に `UnexpectedFailure` になる
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn encode(&self, payload: &ImagePayload, password: Option<&str>) -> CodecResult<String> {
        self.encode_with_progress(payload, password, |_, _| {})
    }

    /// チャンクを1つ暗号化するたびに `on_chunk(完了数, 総数)` を呼ぶ
    pub fn encode_with_progress(
        &self,
        payload: &ImagePayload,
        password: Option<&str>,
        mut on_chunk: impl FnMut(usize, usize),
    ) -> CodecResult<String> {
        let is_password_protected = normalize_password(password).is_some();
        let key = derive_key(self.secret, password);

        let data_url = payload.to_data_url();
        let chunks = split_into_chunks(&data_url, self.chunk_size)?;
        let total = chunks.len();
        debug!(
            "暗号化開始: {} ({} バイト, {} チャンク, パスワード保護: {is_password_protected})",
            payload.file_name(),
            payload.file_size(),
            total
        );

        let mut tokens = Vec::with_capacity(total);
        for (index, chunk) in chunks.iter().enumerate() {
            let record =
                ChunkRecord::for_chunk(chunk, payload, is_password_protected, index, total);
            let json = record.to_json().map_err(|e| {
                CodecError::UnexpectedFailure(format!("レコードのシリアライズに失敗: {e}"))
            })?;
            tokens.push(encrypt_string(&json, &key));
            on_chunk(index + 1, total);
        }

        let text = Frame::new(tokens).to_text();
        info!("暗号化完了: {} チャンク, {} 文字", total, text.len());
        Ok(text)
    }
}

/// 暗号化テキスト → 画像
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    secret: &'a BaseSecret,
}

impl<'a> Decoder<'a> {
    pub fn new(secret: &'a BaseSecret) -> Self {
        Self { secret }
    }

    pub fn decode(&self, frame_text: &str, password: Option<&str>) -> CodecResult<DecodedImage> {
        self.decode_with_progress(frame_text, password, |_, _| {})
    }

    /// チャンクを1つ復号化するたびに `on_chunk(完了数, 総数)` を呼ぶ
    pub fn decode_with_progress(
        &self,
        frame_text: &str,
        password: Option<&str>,
        on_chunk: impl FnMut(usize, usize),
    ) -> CodecResult<DecodedImage> {
        let frame = Frame::parse(frame_text)?;
        debug!(
            "フレーム形式: {:?}, チャンク数: {}",
            frame.version,
            frame.chunk_count()
        );

        let result = if frame.version.is_chunked() {
            self.decode_chunked(&frame.tokens, password, on_chunk)
        } else {
            self.decode_single_record(&frame.tokens[0], password, on_chunk)
        };

        match &result {
            Ok(image) => info!("復号化完了: {} ({} 文字)", image.mime_type(), image.as_str().len()),
            Err(e) => debug!("復号化失敗: {e}"),
        }
        result
    }

    fn decode_chunked(
        &self,
        tokens: &[String],
        password: Option<&str>,
        mut on_chunk: impl FnMut(usize, usize),
    ) -> CodecResult<DecodedImage> {
        let first = tokens
            .first()
            .ok_or_else(|| CodecError::corrupted("チャンクがありません"))?;
        let key = self.select_key(first, password)?;
        let password_supplied = key.is_password_key();

        let total = tokens.len();
        let mut slots: Vec<Option<String>> = vec![None; total];
        for (position, token) in tokens.iter().enumerate() {
            let record = decrypt_record(token, &key).map_err(|reason| {
                if password_supplied {
                    CodecError::IncorrectPassword
                } else {
                    CodecError::corrupted(format!("チャンク {position} の復号化に失敗: {reason}"))
                }
            })?;

            if record.total_chunks.is_some_and(|declared| declared != total) {
                return Err(CodecError::corrupted(format!(
                    "チャンク {position} の総チャンク数が一致しません"
                )));
            }
            let index = record.chunk_index.unwrap_or(position);
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(record.data),
                _ => {
                    return Err(CodecError::corrupted(format!(
                        "チャンク番号が不正です: {index}"
                    )));
                }
            }
            on_chunk(position + 1, total);
        }

        // 全スロットが埋まっている（番号は重複なしで範囲内）
        let combined: String = slots.into_iter().flatten().collect();
        finish(combined, password_supplied)
    }

    fn decode_single_record(
        &self,
        token: &str,
        password: Option<&str>,
        mut on_chunk: impl FnMut(usize, usize),
    ) -> CodecResult<DecodedImage> {
        let base_key = derive_key(self.secret, None);
        let outer = decrypt_record(token, &base_key)
            .map_err(|reason| CodecError::corrupted(format!("レコードの復号化に失敗: {reason}")))?;
        let protected = outer.is_password_protected;

        let key = match (protected, normalize_password(password)) {
            (false, _) => base_key,
            (true, Some(password)) => derive_key(self.secret, Some(password)),
            (true, None) => return Err(CodecError::PasswordRequired),
        };

        // 保護なしのレコードは画像データを直接持つ場合がある
        let data_url = if !protected && outer.data.starts_with(DATA_URL_IMAGE_PREFIX) {
            outer.data
        } else {
            decrypt_string(&outer.data, &key).map_err(|e| {
                if protected {
                    CodecError::IncorrectPassword
                } else {
                    CodecError::corrupted(format!("画像データの復号化に失敗: {e}"))
                }
            })?
        };
        on_chunk(1, 1);

        finish(data_url, protected)
    }

    /// 先頭チャンクをベースキーで試し、使用するキーを決める
    fn select_key(&self, first_token: &str, password: Option<&str>) -> CodecResult<EncryptionKey> {
        let base_key = derive_key(self.secret, None);
        let needs_password = match decrypt_record(first_token, &base_key) {
            Ok(record) => record.is_password_protected,
            Err(reason) => {
                debug!("ベースキーでの復号化に失敗: {reason}");
                true
            }
        };

        match (needs_password, normalize_password(password)) {
            (false, supplied) => {
                if supplied.is_some() {
                    warn!("パスワード保護されていないため、指定されたパスワードは使用しません");
                }
                Ok(base_key)
            }
            (true, Some(password)) => Ok(derive_key(self.secret, Some(password))),
            (true, None) => Err(CodecError::PasswordRequired),
        }
    }
}

/// トークンを復号化してレコードとして解析
fn decrypt_record(token: &str, key: &EncryptionKey) -> Result<ChunkRecord, String> {
    let json = decrypt_string(token, key).map_err(|e| e.to_string())?;
    ChunkRecord::from_json(&json).map_err(|e| format!("レコードの解析に失敗: {e}"))
}

/// 復号結果が画像のdata URLであることを確認
fn finish(data_url: String, password_supplied: bool) -> CodecResult<DecodedImage> {
    DecodedImage::new(data_url).ok_or_else(|| {
        if password_supplied {
            CodecError::IncorrectPassword
        } else {
            CodecError::corrupted("復号結果が画像のdata URLではありません")
        }
    })
}
