pub use crate::diagnostics::{print_error, to_error_source, ErrorContext, ErrorType, ParceraError};
pub use crate::hiccup::Hiccup;
pub use crate::normalize::{normalize, FlattenPolicy, Normalizer};
pub use crate::reader::ClojureReader;
pub use crate::syntax::rules::{RuleEntry, RuleKind, RuleNames};
pub use crate::syntax::{ParseNode, RuleNode, Span, TerminalNode};

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod hiccup;
pub mod normalize;
pub mod reader;
pub mod syntax;
