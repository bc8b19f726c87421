//! 画像 → 暗号化テキスト → 画像 の往復テスト

use image_text_crypt::{
    BaseSecret, Decoder, Encoder, Frame, FrameVersion, ImagePayload, config::DEFAULT_CHUNK_SIZE,
    decode, encode, frame::CHUNK_DELIMITER,
};
use proptest::prelude::*;

fn secret() -> BaseSecret {
    BaseSecret::new("integration-secret").unwrap()
}

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 13) as u8).collect()
}

#[test]
fn ten_byte_png_without_password() {
    let secret = secret();
    let bytes = sample_bytes(10);
    let payload = ImagePayload::new(bytes.clone(), "image/png", "tiny.png", 10);

    let text = encode(&payload, None, &secret).unwrap();
    assert!(text.starts_with("CHUNKED_ENCRYPTION_V3|||1|||"));

    let image = decode(&text, None, &secret).unwrap();
    assert!(image.as_str().starts_with("data:image/png;base64,"));
    assert_eq!(image.as_str(), payload.to_data_url());
    assert_eq!(image.to_bytes().unwrap(), bytes);
}

#[test]
fn two_hundred_kilobyte_payload_is_chunked() {
    let secret = secret();
    let bytes = sample_bytes(200 * 1024);
    let payload = ImagePayload::new(bytes.clone(), "image/png", "large.png", bytes.len() as u64);

    let text = encode(&payload, None, &secret).unwrap();
    let frame = Frame::parse(&text).unwrap();

    let expected = payload.to_data_url().len().div_ceil(DEFAULT_CHUNK_SIZE);
    assert_eq!(expected, 6);
    assert_eq!(frame.chunk_count(), expected);
    assert!(text.starts_with(&format!("CHUNKED_ENCRYPTION_V3|||{expected}|||")));

    let image = decode(&text, None, &secret).unwrap();
    assert_eq!(image.to_bytes().unwrap(), bytes);
}

#[test]
fn password_roundtrip_keeps_metadata_out_of_the_frame() {
    let secret = secret();
    let payload = ImagePayload::new(sample_bytes(300), "image/jpeg", "secret-photo.jpg", 300);

    let text = Encoder::new(&secret)
        .with_chunk_size(64)
        .encode(&payload, Some("correct horse"))
        .unwrap();
    assert!(!text.contains("secret-photo"));

    let image = Decoder::new(&secret)
        .decode(&text, Some("correct horse"))
        .unwrap();
    assert_eq!(image.mime_type(), "image/jpeg");
    assert_eq!(image.as_str(), payload.to_data_url());
}

#[test]
fn declared_count_matches_token_count() {
    let secret = secret();
    for (len, chunk_size) in [(1, 8), (100, 8), (1000, 100), (5000, 4096)] {
        let payload = ImagePayload::new(sample_bytes(len), "image/gif", "a.gif", len as u64);
        let text = Encoder::new(&secret)
            .with_chunk_size(chunk_size)
            .encode(&payload, None)
            .unwrap();

        let mut fields = text.splitn(3, "|||");
        assert_eq!(fields.next(), Some("CHUNKED_ENCRYPTION_V3"));
        let declared: usize = fields.next().unwrap().parse().unwrap();
        let tokens = fields.next().unwrap().split(CHUNK_DELIMITER).count();
        assert_eq!(declared, tokens);

        let frame = Frame::parse(&text).unwrap();
        assert_eq!(frame.version, FrameVersion::V3);
        assert_eq!(frame.chunk_count(), declared);
    }
}

#[test]
fn different_secrets_do_not_interoperate() {
    let payload = ImagePayload::new(sample_bytes(50), "image/png", "a.png", 50);
    let text = encode(&payload, None, &secret()).unwrap();

    let other = BaseSecret::new("another-secret").unwrap();
    assert!(decode(&text, None, &other).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn roundtrip_without_password(
        bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        mime in prop::sample::select(vec!["image/png", "image/jpeg", "image/gif", "image/webp"]),
        chunk_size in 1usize..512,
    ) {
        let secret = secret();
        let payload = ImagePayload::new(bytes.clone(), mime, "p", bytes.len() as u64);
        let text = Encoder::new(&secret).with_chunk_size(chunk_size).encode(&payload, None).unwrap();
        let image = decode(&text, None, &secret).unwrap();
        prop_assert_eq!(image.as_str(), payload.to_data_url());
        prop_assert_eq!(image.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn roundtrip_with_password(
        bytes in proptest::collection::vec(any::<u8>(), 0..1024),
        password in "[a-zA-Z0-9!@#]{1,24}",
        chunk_size in 16usize..256,
    ) {
        let secret = secret();
        let payload = ImagePayload::new(bytes, "image/png", "p.png", 0);
        let text = Encoder::new(&secret)
            .with_chunk_size(chunk_size)
            .encode(&payload, Some(&password))
            .unwrap();
        let image = decode(&text, Some(&password), &secret).unwrap();
        prop_assert_eq!(image.as_str(), payload.to_data_url());
    }
}
