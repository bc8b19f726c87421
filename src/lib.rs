pub mod chunk;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod file_ops;
pub mod frame;
pub mod image;
pub mod key_derivation;
pub mod record;

// 公開API
pub use chunk::{join_chunks, split_into_chunks};
pub use codec::{Decoder, Encoder, decode, encode};
pub use config::{BaseSecret, Config};
pub use crypto::{CipherError, decrypt_string, encrypt_string};
pub use error::{CodecError, CodecResult, ErrorKind};
pub use frame::{Frame, FrameVersion};
pub use image::{DecodedImage, ImagePayload};
pub use key_derivation::{EncryptionKey, derive_key};
pub use record::ChunkRecord;

// 共通ユーティリティ
use base64::{Engine as _, engine::general_purpose};

pub fn base64_encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}
