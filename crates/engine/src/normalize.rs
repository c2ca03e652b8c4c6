use regex::Regex;
use std::sync::OnceLock;

fn punctuation() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\p{P}+").expect("invalid regex"))
}

/// Canonical text for word-list comparison: punctuation removed, runs of
/// whitespace collapsed to one space, ends trimmed, lower-cased unless the
/// pattern is case-sensitive.
pub fn normalize_text(text: &str, case_sensitive: bool) -> String {
    let stripped = punctuation().replace_all(text, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        collapsed
    } else {
        collapsed.to_lowercase()
    }
}
