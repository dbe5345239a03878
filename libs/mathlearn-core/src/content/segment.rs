//! Splits a string into plain-text and math segments.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Contiguous run of plain text or delimited math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Math { content: String, block: bool },
}

impl Segment {
    /// The exact source span this segment was cut from.
    pub fn source(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Math { content, block: true } => format!("$${}$$", content),
            Self::Math { content, block: false } => format!("${}$", content),
        }
    }

    pub fn is_math(&self) -> bool {
        matches!(self, Self::Math { .. })
    }
}

// Leftmost-first alternation: at a given position `$$..$$` wins over `$..$`.
fn math_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\$\$(.+?)\$\$|\$(.+?)\$").expect("math pattern is valid")
    })
}

/// Segment `input` into text and math runs, preserving source order.
///
/// Empty input yields no segments. An unterminated `$` or `$$` is text.
pub fn segment(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in math_pattern().captures_iter(input) {
        let whole = caps.get_match();

        if whole.start() > last {
            segments.push(Segment::Text(input[last..whole.start()].to_string()));
        }

        // Exactly one alternative participates in every match.
        let segment = match caps.get(1) {
            Some(block) => Segment::Math {
                content: block.as_str().to_string(),
                block: true,
            },
            None => Segment::Math {
                content: caps[2].to_string(),
                block: false,
            },
        };
        segments.push(segment);
        last = whole.end();
    }

    if last < input.len() {
        segments.push(Segment::Text(input[last..].to_string()));
    }

    segments
}
