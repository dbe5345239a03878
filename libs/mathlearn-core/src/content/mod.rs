//! Mixed text/LaTeX content handling.
//!
//! # Format
//! ```text
//! The roots of $ax^2 + bx + c = 0$ are
//! $$x = \frac{-b \pm \sqrt{b^2 - 4ac}}{2a}$$
//! ```
//!
//! `$...$` is inline math, `$$...$$` is block math. Escaped (`\$`) and nested
//! dollar signs are not supported: no escaping rule is applied.

pub mod render;
pub mod segment;

pub use render::{
    render, render_html, DelimiterTypesetter, MathMode, RenderedSegment, TypesetError, Typesetter,
};
pub use segment::{segment, Segment};
