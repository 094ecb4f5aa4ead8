//! Rendering of [`CompileError`] through miette.
//!
//! A failed run becomes a list of [`Reportable`]s. Lexical and syntax errors
//! contribute one entry per parser diagnostic, each carrying the source text
//! so miette can draw a snippet. Everything else contributes a single entry
//! without source context.

use std::{error::Error, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceCode};

use imperative_parser::error::{Diagnostic, Label};

use crate::error::CompileError;

/// One entry of an error report.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parser diagnostic and the source it points into.
    Located { diag: &'a Diagnostic, src: &'a str },
    /// A failure with no position in the source.
    Plain(&'a CompileError),
}

impl Reportable<'_> {
    /// Namespaced code for failures outside the lexer and parser.
    fn plain_code(err: &CompileError) -> Option<&'static str> {
        match err {
            CompileError::Io(_) => Some("imperc::io"),
            CompileError::Config(_) => Some("imperc::config"),
            CompileError::InvalidTokens { .. } => Some("imperc::lex"),
            CompileError::Lexical { .. } | CompileError::Parse { .. } => None,
        }
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Located { diag, .. } => f.write_str(diag.message()),
            Reportable::Plain(err) => write!(f, "{err}"),
        }
    }
}

impl Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Reportable::Located { .. } => None,
            Reportable::Plain(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Located { diag, .. } => {
                diag.code().map(|code| Box::new(code) as Box<dyn fmt::Display>)
            }
            Reportable::Plain(err) => {
                Self::plain_code(err).map(|code| Box::new(code) as Box<dyn fmt::Display>)
            }
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            Reportable::Located { diag, .. } => diag.help()?,
            Reportable::Plain(CompileError::Config(_)) => {
                "check the file against the documented [debug] and [diagnostics] sections"
            }
            Reportable::Plain(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Reportable::Located { src, .. } => Some(src as &dyn SourceCode),
            Reportable::Plain(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Reportable::Located { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }
        Some(Box::new(diag.labels().iter().map(labeled_span)))
    }
}

/// Label spans are byte ranges, so multi-line sources highlight correctly.
fn labeled_span(label: &Label) -> LabeledSpan {
    let message = Some(label.message().to_owned());
    let span = label.span().byte_range();
    if label.is_primary() {
        LabeledSpan::new_primary_with_span(message, span)
    } else {
        LabeledSpan::new_with_span(message, span)
    }
}

/// Split a [`CompileError`] into the entries a report should show, in order.
pub fn to_reportables(err: &CompileError) -> Vec<Reportable<'_>> {
    match err {
        CompileError::Lexical { err: parse_err, src }
        | CompileError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Located { diag, src })
            .collect(),
        _ => vec![Reportable::Plain(err)],
    }
}
