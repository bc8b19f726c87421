use crate::error::{CodecError, CodecResult};

/// 文字列を `chunk_size` 文字ごとのチャンクに分割
///
/// 各チャンクは空でなく、連結すると元の文字列に戻る。
/// 空文字列からはチャンクが生成されない。`chunk_size` が0の場合はエラー。
pub fn split_into_chunks(text: &str, chunk_size: usize) -> CodecResult<Vec<&str>> {
    if chunk_size == 0 {
        return Err(CodecError::UnexpectedFailure(
            "チャンクサイズは1以上である必要があります".to_string(),
        ));
    }

    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut rest = text;
    while !rest.is_empty() {
        // 文字境界で切る
        let end = rest
            .char_indices()
            .nth(chunk_size)
            .map_or(rest.len(), |(index, _)| index);
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    Ok(chunks)
}

/// `split_into_chunks` の逆変換
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks.iter().map(AsRef::as_ref).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(split_into_chunks("", 4).unwrap().is_empty());
        assert_eq!(join_chunks::<&str>(&[]), "");
    }

    #[test]
    fn splits_at_fixed_size() {
        assert_eq!(split_into_chunks("abcdefghij", 4).unwrap(), vec!["abcd", "efgh", "ij"]);
        assert_eq!(split_into_chunks("abcd", 4).unwrap(), vec!["abcd"]);
        assert_eq!(split_into_chunks("abc", 10).unwrap(), vec!["abc"]);
    }

    #[test]
    fn respects_char_boundaries() {
        let chunks = split_into_chunks("画像テキスト", 4).unwrap();
        assert_eq!(chunks, vec!["画像テキ", "スト"]);
    }

    #[test]
    fn zero_chunk_size_is_an_error() {
        let err = split_into_chunks("abc", 0).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedFailure(_)));
    }

    proptest! {
        #[test]
        fn join_inverts_split(text in ".{0,300}", size in 1usize..64) {
            let chunks = split_into_chunks(&text, size).unwrap();
            prop_assert_eq!(join_chunks(&chunks), text.clone());
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                prop_assert!(chunk.chars().count() <= size);
            }
            let expected = text.chars().count().div_ceil(size);
            prop_assert_eq!(chunks.len(), expected);
        }
    }
}
