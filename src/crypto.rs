//! AES-256-CBC によるテキストトークンの暗号化・復号化
//!
//! トークン形式（OpenSSLのパスフレーズ形式と互換）:
//! ```text
//! base64( "Salted__" || salt[8] || AES-256-CBC-PKCS7(plaintext) )
//! ```
//! キーとIVは `EVP_BytesToKey(MD5)` でキー文字列とソルトから導出する。
//! 認証タグ（MAC）は含まれない。

use crate::base64_encode;
use crate::key_derivation::{EncryptionKey, evp_bytes_to_key};
use aes::{
    Aes256,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use thiserror::Error;

const SALT_HEADER: &[u8; 8] = b"Salted__";
const SALT_SIZE: usize = 8;
const BLOCK_SIZE: usize = 16;

/// 暗号トークンの復号化失敗
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("暗号トークンの形式が不正です: {0}")]
    MalformedToken(&'static str),

    #[error("パディングが不正です")]
    BadPadding,

    #[error("復号結果がUTF-8文字列ではありません")]
    InvalidUtf8,
}

/// 文字列を暗号化してトークンを返す
pub fn encrypt_string(text: &str, key: &EncryptionKey) -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    encrypt_with_salt(text.as_bytes(), key.as_str().as_bytes(), &salt)
}

fn encrypt_with_salt(plaintext: &[u8], passphrase: &[u8], salt: &[u8; SALT_SIZE]) -> String {
    let (key, iv) = evp_bytes_to_key(passphrase, salt);
    let cipher = Aes256::new(GenericArray::from_slice(&key));

    // PKCS#7パディング
    let padding_len = BLOCK_SIZE - (plaintext.len() % BLOCK_SIZE);
    let mut buffer = Vec::with_capacity(plaintext.len() + padding_len);
    buffer.extend_from_slice(plaintext);
    buffer.resize(plaintext.len() + padding_len, padding_len as u8);

    // CBCモードで1ブロックずつ暗号化
    let mut previous = iv;
    for block in buffer.chunks_mut(BLOCK_SIZE) {
        for (byte, prev) in block.iter_mut().zip(previous.iter()) {
            *byte ^= prev;
        }
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        previous.copy_from_slice(block);
    }

    let mut output = Vec::with_capacity(SALT_HEADER.len() + SALT_SIZE + buffer.len());
    output.extend_from_slice(SALT_HEADER);
    output.extend_from_slice(salt);
    output.extend_from_slice(&buffer);

    log::trace!("トークン暗号化完了: {} バイト", output.len());
    base64_encode(&output)
}

/// トークンを復号化して文字列を返す
pub fn decrypt_string(token: &str, key: &EncryptionKey) -> Result<String, CipherError> {
    let data = general_purpose::STANDARD
        .decode(token.trim())
        .map_err(|_| CipherError::MalformedToken("Base64デコードに失敗しました"))?;

    if data.len() < SALT_HEADER.len() + SALT_SIZE || !data.starts_with(SALT_HEADER) {
        return Err(CipherError::MalformedToken("ソルトヘッダーがありません"));
    }

    let (salt, ciphertext) = data[SALT_HEADER.len()..].split_at(SALT_SIZE);
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::MalformedToken("暗号文の長さが不正です"));
    }

    let (aes_key, iv) = evp_bytes_to_key(key.as_str().as_bytes(), salt);
    let cipher = Aes256::new(GenericArray::from_slice(&aes_key));

    let mut plaintext = ciphertext.to_vec();
    let mut previous = iv;
    for block in plaintext.chunks_mut(BLOCK_SIZE) {
        let mut current = [0u8; BLOCK_SIZE];
        current.copy_from_slice(block);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        for (byte, prev) in block.iter_mut().zip(previous.iter()) {
            *byte ^= prev;
        }
        previous = current;
    }

    // PKCS#7パディングの検証と除去
    let padding_len = plaintext[plaintext.len() - 1] as usize;
    if padding_len == 0
        || padding_len > BLOCK_SIZE
        || plaintext[plaintext.len() - padding_len..]
            .iter()
            .any(|&b| b as usize != padding_len)
    {
        return Err(CipherError::BadPadding);
    }
    plaintext.truncate(plaintext.len() - padding_len);

    String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
}
