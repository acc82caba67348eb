//! Text sanitation for spoken output
//!
//! Transcripts and replies pass through here before synthesis so markup that
//! reads fine in a chat window is not spoken aloud.

use std::sync::OnceLock;

use regex::Regex;

fn fenced_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("static regex"))
}

fn markdown_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("static regex"))
}

fn bare_url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("static regex"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Strip markup and formatting that has no spoken form.
///
/// Fenced code blocks and bare URLs are removed entirely, links keep their
/// label, emphasis and heading markers are dropped, and whitespace is
/// collapsed to single spaces.
#[must_use]
pub fn sanitize_for_speech(text: &str) -> String {
    let text = fenced_code().replace_all(text, " ");
    let text = markdown_link().replace_all(&text, "$1");
    let text = bare_url().replace_all(&text, " ");

    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#' | '~' | '>' | '|'))
        .collect();

    whitespace().replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_blocks_are_removed() {
        let text = "run this:\n```sh\nrm -rf target\n```\nthen rebuild";
        assert_eq!(sanitize_for_speech(text), "run this: then rebuild");
    }

    #[test]
    fn links_keep_their_label() {
        assert_eq!(
            sanitize_for_speech("see [the docs](https://example.com/docs) first"),
            "see the docs first"
        );
    }

    #[test]
    fn bare_urls_are_dropped() {
        assert_eq!(
            sanitize_for_speech("it lives at https://example.com/x?y=1 now"),
            "it lives at now"
        );
    }

    #[test]
    fn emphasis_and_headings_are_stripped() {
        assert_eq!(
            sanitize_for_speech("# Plan\n**bold** and _quiet_ and `code`"),
            "Plan bold and quiet and code"
        );
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(sanitize_for_speech("  a \n\n  b\tc  "), "a b c");
    }

    #[test]
    fn plain_speech_is_untouched() {
        assert_eq!(
            sanitize_for_speech("sure, the meeting is at three"),
            "sure, the meeting is at three"
        );
    }
}
