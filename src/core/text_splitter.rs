use std::collections::VecDeque;

pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// 遞迴字元切分器：依序嘗試分隔符，把過長的片段再用下一個分隔符切開，
/// 最後把小片段合併成不超過 `chunk_size` 的塊，並保留 `chunk_overlap` 的重疊。
/// 長度一律以字元數計算；分隔符保留在下一個片段的開頭。
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // 選出第一個出現在文字中的分隔符
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, separator);
        let mut good_splits: Vec<String> = Vec::new();

        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(piece);
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    // 分隔符已留在片段中，合併時不再插入
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_trimmed(&current) {
                        docs.push(doc);
                    }
                    while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }
        docs
    }
}

fn join_trimmed(parts: &VecDeque<&str>) -> Option<String> {
    let joined: String = parts.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 以分隔符切開並把分隔符黏在下一段開頭；空分隔符代表逐字元切分
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(text[last..idx].to_string());
        last = idx;
    }
    pieces.push(text[last..].to_string());

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a\n\nb\n\nc", "\n\n"),
            vec!["a", "\n\nb", "\n\nc"]
        );
        assert_eq!(split_keeping_separator("\n\nb", "\n\n"), vec!["\n\nb"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
        assert_eq!(split_keeping_separator("x. y. ", ". "), vec!["x", ". y", ". "]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveTextSplitter::new(1000, 200);
        let chunks = splitter.split_text("  Short paragraph about substations.  ");
        assert_eq!(chunks, vec!["Short paragraph about substations."]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let splitter = RecursiveTextSplitter::new(1000, 200);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_paragraphs_are_merged_up_to_chunk_size() {
        let splitter = RecursiveTextSplitter::new(10, 0);
        let chunks = splitter.split_text("aaaa\n\nbbbb\n\ncccc");
        // "aaaa" + "\n\nbbbb" = 10 字元 -> 剛好一塊
        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn test_overlap_keeps_trailing_words() {
        let splitter = RecursiveTextSplitter::new(10, 5);
        let chunks = splitter.split_text("a b c d e f g h");
        assert_eq!(chunks, vec!["a b c d e", "d e f g h"]);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = RecursiveTextSplitter::new(4, 0);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunks_never_exceed_size_for_prose() {
        let text = "Energy systems. ".repeat(200) + "\n\n" + &"Grid stability matters. ".repeat(100);
        let splitter = RecursiveTextSplitter::new(1000, 200);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_lengths_are_counted_in_characters() {
        // 每個西里爾字母占 2 bytes，但只算 1 個字元
        let splitter = RecursiveTextSplitter::new(10, 0);
        let chunks = splitter.split_text("энергия сеть");
        assert_eq!(chunks, vec!["энергия", "сеть"]);
    }
}
