use once_cell::sync::Lazy;
use regex::Regex;

static FOCUS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("valid regex"));

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Phrase text with its `{{focus}}` markers resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedText {
    /// Text with every marker removed; this is what gets hashed, translated and spoken
    pub text: String,
    /// Term inside the first marked span, if any
    pub focus: Option<String>,
}

impl FocusedText {
    pub fn parse(raw: &str) -> Self {
        let focus = FOCUS_PATTERN
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|term| !term.is_empty());

        let text = raw.replace(OPEN, "").replace(CLOSE, "").trim().to_string();

        Self { text, focus }
    }
}
