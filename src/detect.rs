//! Markdown detection heuristics
//!
//! Callers feeding arbitrary text into the pipeline use this to decide
//! whether the text is worth rendering as Markdown at all. A match on any
//! single pattern is enough; plain prose matches none of them.

use regex::Regex;
use std::sync::OnceLock;

static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn patterns() -> &'static [Regex] {
    PATTERNS.get_or_init(|| {
        [
            r"(?m)^#{1,6}\s",        // headers
            r"\*\*.+?\*\*",          // bold
            r"\*.+?\*",              // italic
            r"`[^`]+`",              // inline code
            r"(?s)```.*```",         // code blocks
            r"(?m)^[-*+]\s",         // lists
            r"(?m)^\d+\.\s",         // numbered lists
            r"!\[[^\]]*\]\([^)]*\)", // images
            r"\[[^\]]*\]\([^)]*\)",  // links
            r"(?m)^>\s",             // blockquotes
            r"(?m)^---",             // horizontal rules
            r"\|\s*\|",              // tables
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("static pattern compiles"))
        .collect()
    })
}

/// Heuristically decide whether `text` looks like Markdown.
pub fn looks_like_markdown(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    patterns().iter().any(|pattern| pattern.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_markdown() {
        assert!(looks_like_markdown("# Title"));
        assert!(looks_like_markdown("intro\n\n## Section"));
    }

    #[test]
    fn inline_markup_is_markdown() {
        assert!(looks_like_markdown("some **bold** words"));
        assert!(looks_like_markdown("call `f(x)` here"));
        assert!(looks_like_markdown("see [docs](https://example.com)"));
    }

    #[test]
    fn block_markup_is_markdown() {
        assert!(looks_like_markdown("- one\n- two"));
        assert!(looks_like_markdown("1. first\n2. second"));
        assert!(looks_like_markdown("> quoted"));
        assert!(looks_like_markdown("```\ncode\n```"));
    }

    #[test]
    fn plain_prose_is_not_markdown() {
        assert!(!looks_like_markdown("Just an ordinary sentence."));
        assert!(!looks_like_markdown("Line one.\nLine two."));
    }

    #[test]
    fn empty_text_is_not_markdown() {
        assert!(!looks_like_markdown(""));
        assert!(!looks_like_markdown("   \n\t"));
    }
}
