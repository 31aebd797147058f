//! Text preparation for speech synthesis.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Chunks break after sentence punctuation when possible, then on
/// whitespace, and only split inside a word that is longer than
/// `max_chars` on its own.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences_keep_punct(text) {
        if char_len(&current) + char_len(&sentence) + 1 <= max_chars {
            push_with_space(&mut current, &sentence);
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if char_len(&sentence) <= max_chars {
            current = sentence;
            continue;
        }

        for word in sentence.split_whitespace() {
            if char_len(&current) + char_len(word) + 1 <= max_chars {
                push_with_space(&mut current, word);
                continue;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).map(|c| c.iter().collect::<String>()).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current = piece;
                }
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split on `.`, `!`, `?` and `…`, keeping the punctuation on the sentence.
fn split_sentences_keep_punct(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?' | '…') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

fn push_with_space(buf: &mut String, piece: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(piece);
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
