//! Message chunking for delivery (§4.8 step 10): split on sentence
//! boundaries so no chunk exceeds the platform's 2000-character limit.

const MAX_CHUNK_LEN: usize = 2000;

/// Split `content` into chunks no longer than `MAX_CHUNK_LEN`, preferring
/// to break after `. `, `! `, or `? ` so sentences stay whole. Falls back
/// to a hard break only when a single sentence itself exceeds the limit.
pub fn split_into_chunks(content: &str) -> Vec<String> {
    if content.len() <= MAX_CHUNK_LEN {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(content) {
        if current.len() + sentence.len() > MAX_CHUNK_LEN && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if sentence.len() > MAX_CHUNK_LEN {
            for hard in sentence.as_bytes().chunks(MAX_CHUNK_LEN) {
                chunks.push(String::from_utf8_lossy(hard).to_string());
            }
            continue;
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_sentences(content: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if (c == b'.' || c == b'!' || c == b'?') && i + 1 < bytes.len() && bytes[i + 1] == b' ' {
            sentences.push(&content[start..=i + 1]);
            start = i + 2;
            i += 2;
            continue;
        }
        i += 1;
    }
    if start < content.len() {
        sentences.push(&content[start..]);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_is_single_chunk() {
        assert_eq!(split_into_chunks("hello there").len(), 1);
    }

    #[test]
    fn long_message_splits_on_sentence_boundaries() {
        let sentence = "This is a sentence. ".repeat(150);
        let chunks = split_into_chunks(&sentence);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 2000);
        }
    }

    #[test]
    fn reassembled_chunks_preserve_content() {
        let sentence = "Part one. Part two. Part three. ".repeat(100);
        let chunks = split_into_chunks(&sentence);
        assert_eq!(chunks.concat(), sentence);
    }
}
