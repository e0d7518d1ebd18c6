// Social-media text cleaning.
//
// Strips the platform noise that would otherwise leak into keyword
// matching: retweet markers, @mentions, URLs, and hashtag symbols (the tag
// word itself is kept). Case is preserved; classification lower-cases on
// its own.

use std::sync::LazyLock;

use regex_lite::Regex;

static RETWEET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bRT\b[: ]*").expect("retweet pattern is valid"));
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+:?").expect("mention pattern is valid"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url pattern is valid"));
static REPEATED_BANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!{2,}").expect("punctuation pattern is valid"));
static REPEATED_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?{2,}").expect("punctuation pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Clean a raw post for classification.
pub fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let text = RETWEET.replace_all(text, "");
    let text = MENTION.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = text.replace('#', "");
    let text = REPEATED_BANG.replace_all(&text, "!");
    let text = REPEATED_QUESTION.replace_all(&text, "?");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}
