use std::fmt::Display;

/// Closed set of commands a subscriber can send over the messaging channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Help,
    Pause,
    Resume,
    Progress,
    Preview,
    Catalog,
    PaymentCheck,
    Fallback,
}

impl Intent {
    /// Maps an inbound text body to an intent. Matching is exact after trimming and
    /// lowercasing; anything unrecognised is `Fallback`.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "help" => Intent::Help,
            "pause" | "stop" => Intent::Pause,
            "resume" | "start" => Intent::Resume,
            "progress" | "stats" => Intent::Progress,
            "next" => Intent::Preview,
            "tracks" | "courses" => Intent::Catalog,
            "paid" => Intent::PaymentCheck,
            _ => Intent::Fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Help => "send_help",
            Intent::Pause => "pause_lessons",
            Intent::Resume => "resume_lessons",
            Intent::Progress => "send_progress",
            Intent::Preview => "send_next_lesson",
            Intent::Catalog => "show_tracks",
            Intent::PaymentCheck => "verify_payment",
            Intent::Fallback => "process_response",
        }
    }
}

impl Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_and_aliases_map_to_intents() {
        let cases = [
            ("help", Intent::Help),
            ("pause", Intent::Pause),
            ("stop", Intent::Pause),
            ("resume", Intent::Resume),
            ("start", Intent::Resume),
            ("progress", Intent::Progress),
            ("stats", Intent::Progress),
            ("next", Intent::Preview),
            ("tracks", Intent::Catalog),
            ("courses", Intent::Catalog),
            ("paid", Intent::PaymentCheck),
        ];

        for (input, expected) in cases {
            assert_eq!(Intent::parse(input), expected, "input: {input}");
        }
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        assert_eq!(Intent::parse("PAUSE "), Intent::Pause);
        assert_eq!(Intent::parse("  Help\n"), Intent::Help);
    }

    #[test]
    fn anything_else_falls_back() {
        assert_eq!(
            Intent::parse("what time do the lessons usually arrive?"),
            Intent::Fallback
        );
        assert_eq!(Intent::parse("pause please"), Intent::Fallback);
        assert_eq!(Intent::parse(""), Intent::Fallback);
    }
}
