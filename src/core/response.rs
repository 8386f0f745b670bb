//! Reply splitting for chat message limits
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Split by line first so line breaks survive
//! - 1.0.0: Word-based splitting

/// Default per-message limit for chat replies (characters)
pub const MESSAGE_LIMIT: usize = 500;

/// Split a reply into chunks of at most `limit` characters
///
/// Whole lines are kept together where they fit, so line breaks and spacing
/// survive. A line longer than `limit` is broken on whitespace, and a single
/// word longer than `limit` is cut on a character boundary. Blank replies
/// produce no chunks.
pub fn split_reply(text: &str, limit: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || limit == 0 {
        return Vec::new();
    }
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line = line.trim_end();
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            continue;
        }

        push_chunk(&mut chunks, std::mem::take(&mut current));
        current_len = 0;

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            chunks.extend(split_line(line, limit));
        }
    }

    push_chunk(&mut chunks, current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: String) {
    let chunk = chunk.trim_end();
    if !chunk.trim_start().is_empty() {
        chunks.push(chunk.to_string());
    }
}

/// Break one over-long line on whitespace
fn split_line(line: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() { word_len } else { word_len + 1 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if word_len <= limit {
            current.push_str(word);
            current_len = word_len;
        } else {
            let pieces = split_long_word(word, limit);
            let last = pieces.len() - 1;
            for (i, piece) in pieces.into_iter().enumerate() {
                if i == last {
                    current_len = piece.chars().count();
                    current = piece;
                } else {
                    chunks.push(piece);
                }
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long_word(word: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(limit)
        .map(|piece| piece.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reply_single_chunk() {
        assert_eq!(split_reply("hello world", 100), vec!["hello world"]);
    }

    #[test]
    fn test_blank_reply_no_chunks() {
        assert!(split_reply("   ", 100).is_empty());
        assert!(split_reply("", 100).is_empty());
    }

    #[test]
    fn test_splits_on_whitespace() {
        let chunks = split_reply("aaa bbb ccc", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_long_word_is_cut() {
        let chunks = split_reply("abcdefghij xy", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn test_utf8_safe() {
        let text = "ééééé";
        let chunks = split_reply(text, 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
        for chunk in chunks {
            assert!(chunk.chars().count() <= 2);
        }
    }

    #[test]
    fn test_line_breaks_survive_split() {
        let chunks = split_reply("!echo - Repeats\n!ping - none\n!help - Lists", 28);
        assert_eq!(chunks, vec!["!echo - Repeats\n!ping - none", "!help - Lists"]);
    }

    #[test]
    fn test_spacing_within_line_kept() {
        let chunks = split_reply("a  b\ncc", 5);
        assert_eq!(chunks, vec!["a  b", "cc"]);
    }

    #[test]
    fn test_long_line_among_short_ones() {
        let chunks = split_reply("top\naaa bbb ccc\nend", 7);
        assert_eq!(chunks, vec!["top", "aaa bbb", "ccc", "end"]);
    }

    #[test]
    fn test_every_chunk_within_limit() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(40);
        for chunk in split_reply(&text, 50) {
            assert!(chunk.chars().count() <= 50);
            assert!(!chunk.is_empty());
        }
    }
}
