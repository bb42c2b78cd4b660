//! Long-text segmentation.
//!
//! The remote engine accepts a bounded amount of text per session, so long
//! utterances are split into segments that end on natural boundaries where
//! possible. Lengths are counted in characters, not bytes.

/// Sentence terminators, tried first.
const SENTENCE_DELIMITERS: &[char] = &['.', '。', '!', '！', '?', '？', ';', '；'];

/// Clause separators, tried when no sentence terminator fits.
const CLAUSE_DELIMITERS: &[char] = &[',', '，'];

/// Whitespace fallback.
const SPACE_DELIMITERS: &[char] = &[' '];

/// Boundary classes in priority order.
const DELIMITER_TIERS: &[&[char]] = &[SENTENCE_DELIMITERS, CLAUSE_DELIMITERS, SPACE_DELIMITERS];

/// Default segment bound used by the orchestrator.
pub const DEFAULT_MAX_SEGMENT_CHARS: usize = 80;

/// Split `text` into trimmed segments of at most `max_chars` characters.
///
/// Blank input yields an empty vector. A `max_chars` of zero is treated as one.
///
/// # Example
/// ```
/// use volc_tts_bridge::core::segmenter::segment;
///
/// let parts = segment("First sentence. Second sentence.", 20);
/// assert_eq!(parts, vec!["First sentence.", "Second sentence."]);
/// ```
pub fn segment(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut segments = Vec::new();
    let mut start = 0;

    while start < len {
        if len - start <= max_chars {
            push_trimmed(&mut segments, &chars[start..]);
            break;
        }

        let end = start + max_chars;
        let cut = find_cut(&chars, start, end).unwrap_or(end);
        push_trimmed(&mut segments, &chars[start..cut]);
        start = cut;
    }

    segments
}

/// Find the position right after the closest delimiter before `end`, trying
/// each tier in order. The delimiter must lie strictly after `start`.
fn find_cut(chars: &[char], start: usize, end: usize) -> Option<usize> {
    DELIMITER_TIERS.iter().find_map(|tier| {
        chars[start + 1..end]
            .iter()
            .rposition(|c| tier.contains(c))
            .map(|offset| start + 1 + offset + 1)
    })
}

fn push_trimmed(segments: &mut Vec<String>, window: &[char]) {
    let piece: String = window.iter().collect();
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(segment("", 80).is_empty());
        assert!(segment("   \n\t ", 80).is_empty());
    }

    #[test]
    fn test_short_text_is_single_trimmed_segment() {
        assert_eq!(segment("Hello world.", 80), vec!["Hello world."]);
        assert_eq!(segment("  padded text  ", 80), vec!["padded text"]);
    }

    #[test]
    fn test_exactly_max_length_is_single_segment() {
        let text = "a".repeat(80);
        assert_eq!(segment(&text, 80), vec![text.clone()]);
    }

    #[test]
    fn test_cuts_after_sentence_terminator() {
        let sentence = format!("{}.", "x".repeat(38));
        let text = format!("{sentence} {sentence} {sentence} {sentence} {sentence}");
        assert_eq!(text.chars().count(), 199);

        let parts = segment(&text, 80);
        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert!(part.chars().count() <= 80);
            assert!(part.ends_with('.'));
        }
        assert_eq!(strip_ws(&parts.concat()), strip_ws(&text));
    }

    #[test]
    fn test_sentence_beats_clause() {
        let text = "aaaa. bbbb, cccc dddd";
        let parts = segment(text, 12);
        assert_eq!(parts[0], "aaaa.");
    }

    #[test]
    fn test_clause_beats_space() {
        let text = "aaaa bbbb, cccc dddd eeee";
        let parts = segment(text, 14);
        assert_eq!(parts[0], "aaaa bbbb,");
    }

    #[test]
    fn test_falls_back_to_space() {
        let text = "alpha beta gamma delta epsilon";
        let parts = segment(text, 12);
        assert_eq!(parts, vec!["alpha beta", "gamma delta", "epsilon"]);
    }

    #[test]
    fn test_hard_cut_without_delimiters() {
        let text = "z".repeat(250);
        let parts = segment(&text, 80);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].len(), 80);
        assert_eq!(parts[3].len(), 10);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_delimiter_at_window_start_is_ignored() {
        // The only terminator sits at the window start; cutting there would
        // produce an empty segment, so the hard cut applies.
        let text = format!(".{}", "q".repeat(30));
        let parts = segment(&text, 10);
        assert_eq!(parts[0], ".qqqqqqqqq");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "你好世界。".repeat(30);
        let parts = segment(&text, 80);
        for part in &parts {
            assert!(part.chars().count() <= 80);
            assert!(part.ends_with('。'));
        }
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_fullwidth_delimiters() {
        let text = format!("{}！{}？{}", "甲".repeat(50), "乙".repeat(50), "丙".repeat(40));
        let parts = segment(&text, 80);
        assert_eq!(parts.len(), 3);
        assert!(parts[0].ends_with('！'));
        assert!(parts[1].ends_with('？'));
    }

    /// Check that `parts` appear in `text` in order, separated only by
    /// whitespace.
    fn assert_rebuilds(text: &str, parts: &[String]) {
        let mut rest = text;
        for part in parts {
            let at = rest
                .find(part.as_str())
                .unwrap_or_else(|| panic!("{part:?} missing from {rest:?}"));
            assert!(rest[..at].trim().is_empty(), "lost {:?}", &rest[..at]);
            rest = &rest[at + part.len()..];
        }
        assert!(rest.trim().is_empty(), "lost tail {rest:?}");
    }

    #[test]
    fn test_segment_count_without_delimiters() {
        for (len, max) in [(1, 80), (80, 80), (81, 80), (250, 80), (1000, 7), (13, 1)] {
            let text = "k".repeat(len);
            let parts = segment(&text, max);
            assert_eq!(parts.len(), len.div_ceil(max), "len {len} max {max}");
            assert_eq!(parts.concat(), text);
        }
    }

    #[test]
    fn test_generated_inputs_hold_bounds_and_rebuild() {
        const ALPHABET: &[char] = &[
            'a', 'b', 'c', 'x', '你', '好', ' ', ' ', '\n', '.', ',', '!', '?', ';', '。', '，',
            '！', '？', '；',
        ];
        // Small LCG so the cases are reproducible.
        let mut state: u64 = 0x5EED_0F_5E67;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };

        for _ in 0..2_000 {
            let len = next() % 400;
            let max = 1 + next() % 100;
            let text: String = (0..len).map(|_| ALPHABET[next() % ALPHABET.len()]).collect();

            let parts = segment(&text, max);
            for part in &parts {
                assert!(!part.is_empty());
                assert!(part.chars().count() <= max, "{part:?} over {max}");
            }
            assert!(parts.len() <= text.chars().count());
            assert_rebuilds(&text, &parts);
            if text.trim().is_empty() {
                assert!(parts.is_empty());
            }
        }
    }

    #[test]
    fn test_zero_max_is_clamped() {
        assert_eq!(segment("abc", 0), vec!["a", "b", "c"]);
    }
}
