//! Prompt context assembly

use crate::retrieval::Passage;

/// Default per-passage character cap
pub const DEFAULT_CONTEXT_CHARS: usize = 800;

/// First `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Format passages into labeled `[SOURCE]` blocks separated by blank lines
///
/// Each block carries the title and url followed by the passage text cut to
/// `max_chars` characters. Input order is preserved.
pub fn build_context<'a, I>(passages: I, max_chars: usize) -> String
where
    I: IntoIterator<Item = &'a Passage>,
{
    passages
        .into_iter()
        .map(|passage| {
            format!(
                "[SOURCE] {} ({})\n{}",
                passage.title,
                passage.url,
                truncate_chars(&passage.text, max_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(title: &str, text: &str) -> Passage {
        Passage {
            url: format!("https://mitek.vn/{}", title.to_lowercase()),
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("bảo hành", 3), "bảo");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_block_format_and_order() {
        let passages = vec![passage("Gia", "Giá từ 5 triệu."), passage("Setup", "Cài đặt.")];
        let context = build_context(&passages, DEFAULT_CONTEXT_CHARS);

        assert_eq!(
            context,
            "[SOURCE] Gia (https://mitek.vn/gia)\nGiá từ 5 triệu.\n\n[SOURCE] Setup (https://mitek.vn/setup)\nCài đặt."
        );
    }

    #[test]
    fn test_long_text_is_capped() {
        let long: String = "ơ".repeat(900) + "TAIL";
        let passages = vec![passage("Long", &long)];
        let context = build_context(&passages, 800);

        assert!(!context.contains("TAIL"));
        let body = context.split_once('\n').unwrap().1;
        assert_eq!(body.chars().count(), 800);
        assert_eq!(context, build_context(&passages, 800));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(build_context(&Vec::<Passage>::new(), 800), "");
    }
}
