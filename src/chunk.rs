/// Finite iterator of overlapping character windows over article text.
///
/// Each window after the first starts `overlap` characters before the
/// previous window's end, so an event description straddling a boundary is
/// seen whole by at least one window. Downstream dedup collapses the
/// near-duplicate extractions the overlap causes. Windows are cut on char
/// boundaries, which matters for the Japanese text this pipeline feeds on.
pub struct Chunks {
    chars: Vec<char>,
    size: usize,
    step: usize,
    pos: usize,
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.size == 0 || self.pos >= self.chars.len() {
            return None;
        }
        let end = (self.pos + self.size).min(self.chars.len());
        let window: String = self.chars[self.pos..end].iter().collect();
        if end == self.chars.len() {
            self.pos = self.chars.len();
        } else {
            self.pos += self.step;
        }
        Some(window)
    }
}

/// Splits `text` into windows of `size` characters overlapping by `overlap`.
/// An overlap at or above the window size degenerates to a one-char step so
/// the iterator always advances.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Chunks {
    Chunks {
        chars: text.chars().collect(),
        size,
        step: size.saturating_sub(overlap).max(1),
        pos: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_overlap_by_exactly_the_requested_amount() {
        let text: String = ('a'..='y').collect(); // 25 chars
        let chunks: Vec<String> = chunk_text(&text, 10, 3).collect();
        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "hijklmnopq");
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(3).collect::<Vec<_>>().into_iter().rev().collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn every_character_is_covered_and_iteration_ends() {
        let text: String = ('a'..='y').collect();
        let chunks: Vec<String> = chunk_text(&text, 10, 3).collect();
        let mut covered = vec![false; 25];
        let mut start = 0usize;
        for chunk in &chunks {
            for (offset, _) in chunk.chars().enumerate() {
                covered[start + offset] = true;
            }
            start += 7; // size - overlap
        }
        assert!(covered.into_iter().all(|seen| seen));
        assert!(chunks.len() < 25);
    }

    #[test]
    fn no_empty_windows_are_produced() {
        assert!(chunk_text("", 10, 3).next().is_none());
        let chunks: Vec<String> = chunk_text("short", 10, 3).collect();
        assert_eq!(chunks, vec!["short".to_string()]);
        assert!(chunk_text("abc", 0, 0).next().is_none());
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let text = "渋谷パルコで開催される展覧会の詳細情報";
        let chunks: Vec<String> = chunk_text(text, 5, 2).collect();
        assert_eq!(chunks[0], "渋谷パルコ");
        assert_eq!(chunks[1], "ルコで開催");
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn pathological_overlap_still_terminates() {
        let chunks: Vec<String> = chunk_text("abcdef", 3, 5).collect();
        assert!(chunks.len() <= 6);
        assert_eq!(chunks[0], "abc");
    }
}
