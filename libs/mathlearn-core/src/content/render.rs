//! Rendering of segmented content through a math typesetter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::segment::{segment, Segment};

/// CSS class applied to math that failed to typeset.
pub const MATH_ERROR_CLASS: &str = "math-error";

/// Math display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathMode {
    Inline,
    Block,
}

impl MathMode {
    pub fn from_block(block: bool) -> Self {
        if block { Self::Block } else { Self::Inline }
    }

    pub fn is_block(self) -> bool {
        matches!(self, Self::Block)
    }
}

/// Typesetting failure reported by a [`Typesetter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("typesetting failed: {0}")]
pub struct TypesetError(pub String);

/// Turns LaTeX source into display markup.
pub trait Typesetter {
    fn typeset(&self, source: &str, mode: MathMode) -> Result<String, TypesetError>;
}

/// Rendered content run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RenderedSegment {
    /// Plain text, verbatim.
    Text(String),
    /// Typeset math markup.
    Math { html: String, block: bool },
    /// Raw math source shown as text because typesetting failed.
    Fallback {
        source: String,
        block: bool,
        error: String,
    },
}

/// Segment `input` and typeset each math run.
///
/// Typesetting errors never propagate: the affected run degrades to
/// [`RenderedSegment::Fallback`] carrying its raw source.
pub fn render<T: Typesetter + ?Sized>(input: &str, typesetter: &T) -> Vec<RenderedSegment> {
    segment(input)
        .into_iter()
        .map(|seg| match seg {
            Segment::Text(text) => RenderedSegment::Text(text),
            Segment::Math { content, block } => {
                match typesetter.typeset(&content, MathMode::from_block(block)) {
                    Ok(html) => RenderedSegment::Math { html, block },
                    Err(err) => {
                        tracing::warn!(block, error = %err, "math typesetting failed, showing source");
                        let source = Segment::Math { content, block }.source();
                        RenderedSegment::Fallback {
                            source,
                            block,
                            error: err.to_string(),
                        }
                    }
                }
            }
        })
        .collect()
}

/// Render `input` to an HTML fragment.
///
/// The fragment is assembled first and sanitized once, so safe markup that
/// spans a math run stays balanced. Fallback math is escaped and wrapped in a
/// span carrying [`MATH_ERROR_CLASS`].
pub fn render_html<T: Typesetter + ?Sized>(input: &str, typesetter: &T) -> String {
    let mut html = String::new();
    for rendered in render(input, typesetter) {
        match rendered {
            RenderedSegment::Text(text) => html.push_str(&text),
            RenderedSegment::Math { html: markup, .. } => html.push_str(&markup),
            RenderedSegment::Fallback { source, error, .. } => {
                html.push_str(&format!(
                    "<span class=\"{}\" title=\"{}\">{}</span>",
                    MATH_ERROR_CLASS,
                    ammonia::clean_text(&error),
                    ammonia::clean_text(&source)
                ));
            }
        }
    }
    sanitize_html(&html)
}

/// Default ammonia policy plus the `class` attribute on math wrappers.
pub fn sanitize_html(html: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("span", &["class"])
        .add_tag_attributes("div", &["class"])
        .clean(html)
        .to_string()
}

/// Emits markup for client-side auto-render (`\(..\)` and `\[..\]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterTypesetter;

impl Typesetter for DelimiterTypesetter {
    fn typeset(&self, source: &str, mode: MathMode) -> Result<String, TypesetError> {
        let closing = if mode.is_block() { r"\]" } else { r"\)" };
        if source.contains(closing) {
            return Err(TypesetError(format!("source contains closing delimiter {}", closing)));
        }

        let escaped = ammonia::clean_text(source);
        Ok(match mode {
            MathMode::Inline => format!("<span class=\"math-inline\">\\({}\\)</span>", escaped),
            MathMode::Block => format!("<div class=\"math-block\">\\[{}\\]</div>", escaped),
        })
    }
}
