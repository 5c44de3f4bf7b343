//! Markdown preview rendering.
//!
//! # Responsibility
//! - Define the renderer seam (`Renderer`) consumed by the registry.
//! - Provide the default pulldown-cmark renderer.
//!
//! # Invariants
//! - Rendering never mutates note state.
//! - Raw HTML in note content is escaped, never passed through.

use pulldown_cmark::{html, Event, Options, Parser};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to render markdown preview: {}", self.message)
    }
}

impl Error for RenderError {}

/// Error surfaced to the user when entering preview mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// Editor buffer is blank.
    Empty,
    Render(RenderError),
}

impl Display for PreviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no content to preview"),
            Self::Render(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PreviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Render(err) => Some(err),
        }
    }
}

impl From<RenderError> for PreviewError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

/// Markdown to HTML conversion.
pub trait Renderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

/// CommonMark renderer with tables, strikethrough and task lists.
///
/// Single newlines become `<br />` and inline/block HTML is emitted as
/// escaped text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::SoftBreak => Event::HardBreak,
            other => other,
        });

        let mut body = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut body, parser);
        Ok(body)
    }
}
