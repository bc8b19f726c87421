//! 旧形式のフレームの読み込み

use image_text_crypt::{
    BaseSecret, ChunkRecord, CodecError, ErrorKind, Frame, FrameVersion, decode, derive_key,
    encrypt_string, split_into_chunks,
};

const GIF_DATA_URL: &str = "data:image/gif;base64,R0lGODlhAQABAAAAACw=";

fn secret() -> BaseSecret {
    BaseSecret::new("test-secret").unwrap()
}

fn record(data: &str, protected: bool) -> ChunkRecord {
    ChunkRecord {
        data: data.to_string(),
        is_password_protected: protected,
        file_type: "image/gif".to_string(),
        file_name: "dot.gif".to_string(),
        file_size: 14,
        chunks: None,
        chunk_index: None,
        total_chunks: None,
    }
}

/// チャンク関連のフィールドを持たないV1形式のフレーム
fn v1_frame(password: Option<&str>) -> String {
    let secret = secret();
    let key = derive_key(&secret, password);
    let tokens = split_into_chunks(GIF_DATA_URL, 10)
        .unwrap()
        .into_iter()
        .map(|chunk| encrypt_string(&record(chunk, password.is_some()).to_json().unwrap(), &key))
        .collect();
    Frame {
        version: FrameVersion::V1,
        tokens,
    }
    .to_text()
}

/// 外側をベースキー、内側の画像データを（パスワード）キーで暗号化した単一レコード形式
fn single_record_frame(password: Option<&str>) -> String {
    let secret = secret();
    let inner = encrypt_string(GIF_DATA_URL, &derive_key(&secret, password));
    let outer = record(&inner, password.is_some()).to_json().unwrap();
    encrypt_string(&outer, &derive_key(&secret, None))
}

#[test]
fn v2_frame_produced_by_openssl_compatible_tool() {
    // printf '%s' '<record json>' | openssl enc -aes-256-cbc -md md5 -pass pass:test-secret-hunter2 -base64 -A
    let text = "CHUNKED_ENCRYPTION_V2|||1|||U2FsdGVkX19mSyAWpqPqMKA9uELZi3Q1Hg7Whq7dXqQHmO0wFrKwsT2EEihwa4cOxFXls7SWK5uxMm8qDNB6qJ8HUmjC9H+YSF4tTlFXW8emtjIzFK94UAeRjAuN+hmcKh98wYGhKfPd2mx1Sk7g1KilwcHEUtl1P8OS48iweokBVV29WKKiX/WQYMgKnIajWQ8soGX9CgmbNCHRsdkpYKCOFKlb8TCAw4/3p04xDCVpmaQvnFf6hmvej1vlEIXGQdKpGDJMur99jwDZnNzr7w==";
    let secret = secret();

    let image = decode(text, Some("hunter2"), &secret).unwrap();
    assert_eq!(image.as_str(), GIF_DATA_URL);
    assert_eq!(image.to_bytes().unwrap().len(), 14);

    assert_eq!(decode(text, None, &secret), Err(CodecError::PasswordRequired));
    assert_eq!(
        decode(text, Some("hunter3"), &secret).unwrap_err().kind(),
        ErrorKind::IncorrectPassword
    );
}

#[test]
fn v1_frame_without_password() {
    let text = v1_frame(None);
    assert!(text.starts_with("CHUNKED_ENCRYPTION|||"));
    assert_eq!(Frame::parse(&text).unwrap().version, FrameVersion::V1);

    let image = decode(&text, None, &secret()).unwrap();
    assert_eq!(image.as_str(), GIF_DATA_URL);
}

#[test]
fn v1_frame_with_password() {
    let text = v1_frame(Some("pw"));
    let secret = secret();

    assert_eq!(decode(&text, Some("pw"), &secret).unwrap().as_str(), GIF_DATA_URL);
    assert_eq!(decode(&text, None, &secret), Err(CodecError::PasswordRequired));
    assert_eq!(
        decode(&text, Some("nope"), &secret).unwrap_err().kind(),
        ErrorKind::IncorrectPassword
    );
}

#[test]
fn single_record_frame_without_password() {
    let text = single_record_frame(None);
    assert_eq!(Frame::parse(&text).unwrap().version, FrameVersion::SingleRecord);

    let image = decode(&text, None, &secret()).unwrap();
    assert_eq!(image.as_str(), GIF_DATA_URL);
}

#[test]
fn single_record_frame_with_password() {
    let text = single_record_frame(Some("pw"));
    let secret = secret();

    assert_eq!(decode(&text, Some("pw"), &secret).unwrap().as_str(), GIF_DATA_URL);
    assert_eq!(decode(&text, None, &secret), Err(CodecError::PasswordRequired));
    assert_eq!(
        decode(&text, Some("nope"), &secret).unwrap_err().kind(),
        ErrorKind::IncorrectPassword
    );
}

#[test]
fn single_record_with_plain_image_data() {
    let secret = secret();
    let outer = record(GIF_DATA_URL, false).to_json().unwrap();
    let text = encrypt_string(&outer, &derive_key(&secret, None));

    assert_eq!(decode(&text, None, &secret).unwrap().as_str(), GIF_DATA_URL);
}
