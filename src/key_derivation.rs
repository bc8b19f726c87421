use crate::config::BaseSecret;
use md5::{Digest, Md5};
use std::fmt;

/// ベースシークレットとパスワードの区切り文字
pub const PASSWORD_SEPARATOR: &str = "-";

/// 暗号化キー（文字列）
///
/// 暗号化時と同じ種類のキーで復号化しなければならない。
/// 単純な文字列連結であり、ソルト付きKDFではない点に注意。
#[derive(Clone, PartialEq, Eq)]
pub enum EncryptionKey {
    /// パスワードなし（ベースシークレットそのもの）
    Base(String),
    /// ベースシークレット + "-" + パスワード
    Password(String),
}

impl EncryptionKey {
    pub fn as_str(&self) -> &str {
        match self {
            EncryptionKey::Base(key) | EncryptionKey::Password(key) => key,
        }
    }

    pub fn is_password_key(&self) -> bool {
        matches!(self, EncryptionKey::Password(_))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionKey::Base(_) => f.write_str("EncryptionKey::Base(***)"),
            EncryptionKey::Password(_) => f.write_str("EncryptionKey::Password(***)"),
        }
    }
}

/// 空白のみのパスワードは「パスワードなし」として扱う
pub fn normalize_password(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.trim().is_empty())
}

/// ベースシークレットとパスワードから暗号化キーを導出
pub fn derive_key(base: &BaseSecret, password: Option<&str>) -> EncryptionKey {
    match normalize_password(password) {
        // パスワード自体はトリムせずにそのまま連結する
        Some(password) => EncryptionKey::Password(format!(
            "{}{PASSWORD_SEPARATOR}{password}",
            base.expose()
        )),
        None => EncryptionKey::Base(base.expose().to_string()),
    }
}

/// OpenSSL互換のキー・IV導出（EVP_BytesToKey, MD5, 1回）
///
/// 暗号トークン内部で使用する。パスフレーズとソルトから
/// 32バイトのAES-256キーと16バイトのIVを生成する。
pub fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8]) -> ([u8; 32], [u8; 16]) {
    let mut derived = Vec::with_capacity(48);
    let mut previous: Vec<u8> = Vec::new();

    while derived.len() < 48 {
        let mut hasher = Md5::new();
        hasher.update(&previous);
        hasher.update(passphrase);
        hasher.update(salt);
        previous = hasher.finalize().to_vec();
        derived.extend_from_slice(&previous);
    }

    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    key.copy_from_slice(&derived[..32]);
    iv.copy_from_slice(&derived[32..48]);
    (key, iv)
}
