//! Greeting and thanks detection

pub const GREETING_REPLY: &str = "Xin chào! Tôi là trợ lý AI của Mitek. Tôi có thể giúp bạn tìm hiểu về các giải pháp CNTT, phần mềm, dịch vụ công nghệ và các thông tin khác. Bạn muốn hỏi gì ạ?";

pub const THANKS_REPLY: &str =
    "Rất vui được giúp đỡ bạn! Nếu có câu hỏi gì khác, đừng ngại hỏi nhé.";

const GREETINGS: [&str; 7] = ["hi", "hello", "xin chào", "chào", "hey", "chào bạn", "xin chao"];
const MAX_GREETING_WORDS: usize = 3;

const THANKS: [&str; 5] = ["cảm ơn", "thank", "thanks", "cám ơn", "cam on"];
const MAX_THANKS_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chitchat {
    Greeting,
    Thanks,
}

impl Chitchat {
    pub fn reply(&self) -> &'static str {
        match self {
            Chitchat::Greeting => GREETING_REPLY,
            Chitchat::Thanks => THANKS_REPLY,
        }
    }
}

/// Classify short conversational filler
///
/// Keywords match as substrings of the trimmed, lowercased question. The word
/// ceiling keeps real questions that open with a greeting on the normal path.
/// Greetings are checked first.
pub fn detect_chitchat(question: &str) -> Option<Chitchat> {
    let normalized = question.trim().to_lowercase();
    let words = normalized.split_whitespace().count();

    if words <= MAX_GREETING_WORDS && GREETINGS.iter().any(|g| normalized.contains(g)) {
        return Some(Chitchat::Greeting);
    }
    if words <= MAX_THANKS_WORDS && THANKS.iter().any(|t| normalized.contains(t)) {
        return Some(Chitchat::Thanks);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings() {
        assert_eq!(detect_chitchat("hi"), Some(Chitchat::Greeting));
        assert_eq!(detect_chitchat("  Xin Chào  "), Some(Chitchat::Greeting));
        assert_eq!(detect_chitchat("chào bạn nhé"), Some(Chitchat::Greeting));
    }

    #[test]
    fn test_word_ceiling() {
        assert_eq!(detect_chitchat("xin chào bạn ơi hôm nay"), None);
        assert_eq!(detect_chitchat("hello, cho tôi hỏi về giá phần mềm"), None);
    }

    #[test]
    fn test_thanks() {
        assert_eq!(detect_chitchat("cảm ơn"), Some(Chitchat::Thanks));
        assert_eq!(detect_chitchat("Thanks a lot bro"), Some(Chitchat::Thanks));
        assert_eq!(detect_chitchat("cảm ơn, nhưng giá bảo hành là bao nhiêu"), None);
        assert_eq!(Chitchat::Thanks.reply(), THANKS_REPLY);
    }

    #[test]
    fn test_greeting_wins_over_thanks() {
        assert_eq!(detect_chitchat("hello thanks"), Some(Chitchat::Greeting));
    }

    #[test]
    fn test_substantive_question() {
        assert_eq!(detect_chitchat("Bảng giá phần mềm kế toán năm nay"), None);
        assert_eq!(detect_chitchat(""), None);
    }
}
