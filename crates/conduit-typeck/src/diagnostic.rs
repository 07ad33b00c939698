//! Source diagnostics for type errors

use std::io;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use conduit_ast::Span;

use crate::error::AssignabilityError;

/// A located type error, ready to be rendered against the document's text
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub title: &'static str,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn type_mismatch(error: &AssignabilityError, span: Span) -> Self {
        Self {
            code: "E0300",
            title: "Type mismatch",
            message: error.to_string(),
            span,
        }
    }

    /// Render the diagnostic with `source` as the text of its document
    pub fn render(&self, filename: &str, source: &str, color: bool) -> io::Result<String> {
        let span = (filename, self.span.start..self.span.end);
        let mut out = Vec::new();
        Report::build(ReportKind::Error, span.clone())
            .with_config(Config::default().with_color(color))
            .with_code(self.code)
            .with_message(self.title)
            .with_label(Label::new(span).with_message(&self.message).with_color(Color::Red))
            .finish()
            .write((filename, Source::from(source)), &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
