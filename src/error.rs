use thiserror::Error;

/// エンコード・デコード処理の失敗種別
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// パスワード保護されているが、パスワードが指定されていない
    #[error("この暗号化テキストはパスワードで保護されています")]
    PasswordRequired,

    /// 指定されたパスワードでは正しく復号化できない
    #[error("パスワードが正しくありません")]
    IncorrectPassword,

    /// 構造が壊れている（チャンク数の不一致、解析不能なレコードなど）
    #[error("暗号化テキストが壊れています: {0}")]
    CorruptedData(String),

    /// 上記以外の予期しない失敗
    #[error("予期しないエラー: {0}")]
    UnexpectedFailure(String),
}

/// UI側で分岐するためのフィールドなしの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PasswordRequired,
    IncorrectPassword,
    CorruptedData,
    UnexpectedFailure,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::PasswordRequired => ErrorKind::PasswordRequired,
            CodecError::IncorrectPassword => ErrorKind::IncorrectPassword,
            CodecError::CorruptedData(_) => ErrorKind::CorruptedData,
            CodecError::UnexpectedFailure(_) => ErrorKind::UnexpectedFailure,
        }
    }

    pub(crate) fn corrupted(reason: impl Into<String>) -> Self {
        CodecError::CorruptedData(reason.into())
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
