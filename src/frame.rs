//! 暗号化テキスト全体（フレーム）の形式
//!
//! 現行形式:
//! ```text
//! CHUNKED_ENCRYPTION_V3|||<総チャンク数>|||<token_0>|||CHUNK_DELIMITER|||<token_1>...
//! ```
//! 旧形式として `CHUNKED_ENCRYPTION_V2`（同じ構造）、`CHUNKED_ENCRYPTION`
//! （チャンク数なし）、および接頭辞なしの単一トークン形式を読み込める。
//! トークンはBase64文字列なので `|` を含まない。

use crate::error::{CodecError, CodecResult};

/// タグ・チャンク数・本体を区切る文字列
pub const FIELD_SEPARATOR: &str = "|||";
/// トークン同士を区切る文字列
pub const CHUNK_DELIMITER: &str = "|||CHUNK_DELIMITER|||";

const TAG_V3: &str = "CHUNKED_ENCRYPTION_V3";
const TAG_V2: &str = "CHUNKED_ENCRYPTION_V2";
const TAG_V1: &str = "CHUNKED_ENCRYPTION";

/// フレームの世代
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVersion {
    V3,
    V2,
    V1,
    /// 接頭辞なし、トークン1つにレコード1つ
    SingleRecord,
}

impl FrameVersion {
    pub fn tag(self) -> Option<&'static str> {
        match self {
            FrameVersion::V3 => Some(TAG_V3),
            FrameVersion::V2 => Some(TAG_V2),
            FrameVersion::V1 => Some(TAG_V1),
            FrameVersion::SingleRecord => None,
        }
    }

    pub fn is_chunked(self) -> bool {
        self != FrameVersion::SingleRecord
    }
}

/// 解析済みのフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: FrameVersion,
    pub tokens: Vec<String>,
}

type FrameParser = fn(&str) -> Option<CodecResult<Frame>>;

/// 新しい世代から順に試す
const CHUNKED_PARSERS: &[FrameParser] = &[parse_v3, parse_v2, parse_v1];

impl Frame {
    /// 現行形式のフレームを作成
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            version: FrameVersion::V3,
            tokens,
        }
    }

    /// フレームの世代を判定して解析
    pub fn parse(text: &str) -> CodecResult<Frame> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CodecError::corrupted("暗号化テキストが空です"));
        }

        for parser in CHUNKED_PARSERS {
            if let Some(result) = parser(text) {
                return result;
            }
        }
        parse_single_record(text)
    }

    /// テキスト形式に変換
    pub fn to_text(&self) -> String {
        let body = self.tokens.join(CHUNK_DELIMITER);
        match self.version {
            FrameVersion::V3 | FrameVersion::V2 => format!(
                "{tag}{FIELD_SEPARATOR}{count}{FIELD_SEPARATOR}{body}",
                tag = self.version.tag().unwrap_or(TAG_V3),
                count = self.tokens.len(),
            ),
            FrameVersion::V1 => format!("{TAG_V1}{FIELD_SEPARATOR}{body}"),
            FrameVersion::SingleRecord => body,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.tokens.len()
    }
}

fn parse_v3(text: &str) -> Option<CodecResult<Frame>> {
    let rest = strip_tag(text, TAG_V3)?;
    Some(parse_counted(rest, FrameVersion::V3))
}

fn parse_v2(text: &str) -> Option<CodecResult<Frame>> {
    let rest = strip_tag(text, TAG_V2)?;
    Some(parse_counted(rest, FrameVersion::V2))
}

fn parse_v1(text: &str) -> Option<CodecResult<Frame>> {
    let rest = strip_tag(text, TAG_V1)?;
    Some(split_tokens(rest).map(|tokens| Frame {
        version: FrameVersion::V1,
        tokens,
    }))
}

fn parse_single_record(text: &str) -> CodecResult<Frame> {
    Ok(Frame {
        version: FrameVersion::SingleRecord,
        tokens: vec![text.to_string()],
    })
}

/// `<tag>|||` を取り除く
fn strip_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    text.strip_prefix(tag)?.strip_prefix(FIELD_SEPARATOR)
}

/// `<count>|||<tokens>` を解析し、チャンク数を検証
fn parse_counted(rest: &str, version: FrameVersion) -> CodecResult<Frame> {
    let (count, body) = rest
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| CodecError::corrupted("チャンク数の区切りがありません"))?;

    let declared: usize = count
        .trim()
        .parse()
        .map_err(|_| CodecError::corrupted(format!("チャンク数が数値ではありません: {count}")))?;

    let tokens = split_tokens(body)?;
    if tokens.len() != declared {
        return Err(CodecError::corrupted(format!(
            "チャンク数が一致しません（宣言: {declared}, 実際: {}）",
            tokens.len()
        )));
    }

    Ok(Frame { version, tokens })
}

fn split_tokens(body: &str) -> CodecResult<Vec<String>> {
    let tokens: Vec<String> = body.split(CHUNK_DELIMITER).map(str::to_string).collect();
    if tokens.iter().any(|token| token.trim().is_empty()) {
        return Err(CodecError::corrupted("空のチャンクがあります"));
    }
    Ok(tokens)
}
