//! Bracket-stream tokenizer.
//!
//! Splits `⟨KEY:value⟩` / `<KEY:value>` notation into a flat token list. ASCII
//! brackets are normalized to their Unicode form first so one scanner serves
//! both notations.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const OPEN: char = '\u{27E8}';
pub const CLOSE: char = '\u{27E9}';

// Keys stop at ':' or the closing bracket; values run to the closing bracket.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{27E8}([^:\u{27E9}]+)(?::([^\u{27E9}]*))?\u{27E9}").expect("valid regex literal")
});

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_]*\n?").expect("valid regex literal"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub key: String,
    /// `None` for marker-only tokens such as `⟨MAP_START⟩`.
    pub value: Option<String>,
}

impl Token {
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

/// True when the text uses the bracket-stream notation.
pub fn is_bracket_stream(text: &str) -> bool {
    text.contains(OPEN) || text.contains('<')
}

/// Rewrite ASCII `<`/`>` to `⟨`/`⟩`.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '<' => OPEN,
            '>' => CLOSE,
            other => other,
        })
        .collect()
}

/// Remove Markdown code-fence delimiters (```` ``` ```` optionally followed by
/// a language tag) and trim the result.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Extract every token in order. Text between tokens is ignored.
pub fn lex(input: &str) -> Vec<Token> {
    let normalized = normalize(input);
    TOKEN_RE
        .captures_iter(&normalized)
        .map(|caps| Token {
            key: caps[1].trim().to_string(),
            value: caps.get(2).map(|m| m.as_str().trim().to_string()),
        })
        .collect()
}
