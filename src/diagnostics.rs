//! Unified, `miette`-based diagnostics for the reader.
//!
//! Every failure the crate can surface (grammar rejection, a malformed parse tree,
//! a missing rule name, bad configuration, file system trouble) is a variant of
//! [`ParceraError`]. Construction goes through the `err_msg!` / `err_ctx!` macros:
//!
//! - `err_msg!(Config, "unknown flatten policy '{}'", name)` for message-only errors.
//! - `err_ctx!(Parse, "missing closing delimiter", src, span)` when a source and a
//!   span are at hand, optionally followed by a help text.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe classification of [`ParceraError`] variants, used by tests and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The grammar rejected the input.
    Parse,
    /// A parse-tree node is neither a valid terminal nor a valid rule node.
    UnexpectedNodeKind,
    /// A rule index or rule name has no entry in the rule-name table.
    UnknownRule,
    /// Invalid reader configuration.
    Config,
    /// File system failure.
    Io,
    /// Failures that indicate a bug rather than bad input.
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "Parse",
            ErrorType::UnexpectedNodeKind => "UnexpectedNodeKind",
            ErrorType::UnknownRule => "UnknownRule",
            ErrorType::Config => "Config",
            ErrorType::Io => "Io",
            ErrorType::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with only a span.
    pub fn with_span(span: Span) -> Self {
        Self {
            source: None,
            span: Some(span),
            help: None,
        }
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for every failure mode of the reader.
#[derive(Debug, Error)]
pub enum ParceraError {
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Unexpected node kind: {message}")]
    UnexpectedNodeKind {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Unknown rule: {message}")]
    UnknownRule {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl ParceraError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            ParceraError::Parse { ctx, .. }
            | ParceraError::UnexpectedNodeKind { ctx, .. }
            | ParceraError::UnknownRule { ctx, .. }
            | ParceraError::Config { ctx, .. }
            | ParceraError::Io { ctx, .. }
            | ParceraError::Internal { ctx, .. } => ctx,
        }
    }

    /// The message without the category prefix that `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            ParceraError::Parse { message, .. }
            | ParceraError::UnexpectedNodeKind { message, .. }
            | ParceraError::UnknownRule { message, .. }
            | ParceraError::Config { message, .. }
            | ParceraError::Io { message, .. }
            | ParceraError::Internal { message, .. } => message,
        }
    }

    /// The primary span, if the error is tied to a source location.
    pub fn span(&self) -> Option<Span> {
        self.get_ctx().span
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            ParceraError::Parse { .. } => ErrorType::Parse,
            ParceraError::UnexpectedNodeKind { .. } => ErrorType::UnexpectedNodeKind,
            ParceraError::UnknownRule { .. } => ErrorType::UnknownRule,
            ParceraError::Config { .. } => ErrorType::Config,
            ParceraError::Io { .. } => ErrorType::Io,
            ParceraError::Internal { .. } => ErrorType::Internal,
        }
    }

    /// Wraps an I/O failure on `path`.
    pub fn io(path: impl std::fmt::Display, err: std::io::Error) -> Self {
        ParceraError::Io {
            message: format!("cannot read '{}': {}", path, err),
            ctx: ErrorContext::none(),
            source: Some(Box::new(err)),
        }
    }

    /// Attaches a source to an error that was raised without one, keeping its span.
    pub fn with_source(mut self, src: &SourceArc) -> Self {
        let ctx = match &mut self {
            ParceraError::Parse { ctx, .. }
            | ParceraError::UnexpectedNodeKind { ctx, .. }
            | ParceraError::UnknownRule { ctx, .. }
            | ParceraError::Config { ctx, .. }
            | ParceraError::Io { ctx, .. }
            | ParceraError::Internal { ctx, .. } => ctx,
        };
        if ctx.source.is_none() {
            ctx.source = Some(Arc::clone(src));
        }
        self
    }

    fn code_suffix(&self) -> &'static str {
        match self {
            ParceraError::Parse { .. } => "parse",
            ParceraError::UnexpectedNodeKind { .. } => "unexpected_node_kind",
            ParceraError::UnknownRule { .. } => "unknown_rule",
            ParceraError::Config { .. } => "config",
            ParceraError::Io { .. } => "io",
            ParceraError::Internal { .. } => "internal",
        }
    }
}

impl Diagnostic for ParceraError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("parcera::{}", self.code_suffix())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        // A label without source text cannot be rendered.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source(name: impl AsRef<str>, source: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(
        name.as_ref(),
        source.as_ref().to_string(),
    ))
}

/// Prints an error with full miette diagnostics to stderr.
pub fn print_error(error: ParceraError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

/// Constructs a ParceraError variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::ParceraError::$variant {
            message: format!($msg, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::ParceraError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a ParceraError variant with a message, a source, a span and an optional help text.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::ParceraError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::ParceraError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}
