//! Output file naming.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that are not allowed in file names on common platforms.
static INVALID_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap());

/// Runs of whitespace collapse to a single underscore.
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const FALLBACK_STEM: &str = "presentation";

fn clean_stem(text: &str) -> String {
    let joined = WHITESPACE_RUNS.replace_all(text.trim(), "_");
    let stem = INVALID_FILENAME_CHARS.replace_all(&joined, "");
    stem.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Turn a topic into a file stem: spaces become underscores, unsafe characters go away.
pub fn sanitize_topic(topic: &str) -> String {
    let stem = clean_stem(topic);
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// Build the output file name for a topic, with an optional descriptive suffix.
pub fn output_file_name(topic: &str, suffix: Option<&str>) -> String {
    let stem = sanitize_topic(topic);
    match suffix.map(clean_stem).filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{}_{}.pptx", stem, suffix),
        None => format!("{}.pptx", stem),
    }
}
