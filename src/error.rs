use std::fmt;
use std::io;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::Position;

impl From<Position> for SourceSpan {
    fn from(pos: Position) -> SourceSpan {
        (pos.offset, 1).into()
    }
}

/// An error that may occur while parsing a protobuf source file.
///
/// `Display` renders `<filename>:<line>:<column>: <message>` when the
/// offending token is known, which is stable enough for golden tests.
#[derive(Diagnostic)]
#[diagnostic(forward(kind))]
pub struct ParseError {
    kind: Box<ParseErrorKind>,
    #[source_code]
    source_code: NamedSource,
}

/// The cause of a [`ParseError`].
///
/// Variants fall into three families: lexical errors (malformed tokens),
/// grammar errors (well-formed tokens in the wrong place), and input
/// errors from the underlying reader.
#[derive(Error, Debug, Diagnostic)]
pub enum ParseErrorKind {
    // lexical
    #[error("invalid character {found:?}")]
    UnexpectedRune {
        found: char,
        #[label("found here")]
        pos: Position,
    },
    #[error("invalid numeric literal")]
    InvalidNumber {
        #[label("defined here")]
        pos: Position,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        pos: Position,
    },
    #[error("invalid string escape")]
    InvalidStringEscape {
        #[label("defined here")]
        pos: Position,
    },
    #[error("unterminated block comment")]
    UnterminatedBlockComment {
        #[label("comment starts here")]
        pos: Position,
    },

    // grammar
    #[error("expected {expected}, but found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("found here")]
        pos: Position,
    },
    #[error("expected {expected}, but reached end of file")]
    UnexpectedEof { expected: String },
    #[error("unknown syntax '{found}'")]
    #[diagnostic(help("possible values are 'proto2' and 'proto3'"))]
    UnknownSyntax {
        found: String,
        #[label("defined here")]
        pos: Position,
    },
    #[error("the syntax statement must be the first statement in the file")]
    MisplacedSyntax {
        #[label("found here")]
        pos: Position,
    },
    #[error("multiple syntax statements specified")]
    DuplicateSyntax {
        #[label("defined again here")]
        pos: Position,
    },
    #[error("groups are not allowed in proto3 syntax")]
    Proto3GroupField {
        #[label("defined here")]
        pos: Position,
    },
    #[error("required fields are not allowed in proto3 syntax")]
    Proto3RequiredField {
        #[label("defined here")]
        pos: Position,
    },
    #[error("optional fields are not allowed in proto3 syntax")]
    #[diagnostic(help("enable permissive parsing to accept 'optional' fields"))]
    Proto3OptionalField {
        #[label("defined here")]
        pos: Position,
    },
    #[error("'{found}' is not a valid map key type")]
    #[diagnostic(help("a map key must be an integer, boolean or string type"))]
    InvalidMapKeyType {
        found: String,
        #[label("defined here")]
        pos: Position,
    },
    #[error("file contains no statements")]
    EmptyInput,

    // input
    #[error("failed to read input")]
    Io(#[from] io::Error),
    #[error("input is not valid utf-8")]
    InvalidUtf8,
}

impl ParseErrorKind {
    /// Position of the offending token, if one is known.
    pub fn position(&self) -> Option<&Position> {
        match self {
            ParseErrorKind::UnexpectedRune { pos, .. } => Some(pos),
            ParseErrorKind::InvalidNumber { pos } => Some(pos),
            ParseErrorKind::UnterminatedString { pos } => Some(pos),
            ParseErrorKind::InvalidStringEscape { pos } => Some(pos),
            ParseErrorKind::UnterminatedBlockComment { pos } => Some(pos),
            ParseErrorKind::UnexpectedToken { pos, .. } => Some(pos),
            ParseErrorKind::UnexpectedEof { .. } => None,
            ParseErrorKind::UnknownSyntax { pos, .. } => Some(pos),
            ParseErrorKind::MisplacedSyntax { pos } => Some(pos),
            ParseErrorKind::DuplicateSyntax { pos } => Some(pos),
            ParseErrorKind::Proto3GroupField { pos } => Some(pos),
            ParseErrorKind::Proto3RequiredField { pos } => Some(pos),
            ParseErrorKind::Proto3OptionalField { pos } => Some(pos),
            ParseErrorKind::InvalidMapKeyType { pos, .. } => Some(pos),
            ParseErrorKind::EmptyInput => None,
            ParseErrorKind::Io(_) => None,
            ParseErrorKind::InvalidUtf8 => None,
        }
    }
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, name: &str, source: impl Into<String>) -> Self {
        ParseError {
            kind: Box::new(kind),
            source_code: NamedSource::new(name, source.into()),
        }
    }

    /// The cause of this error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Position of the offending token, if one is known.
    pub fn position(&self) -> Option<&Position> {
        self.kind.position()
    }

    /// Name of the file in which this error occurred, if a position is
    /// known.
    pub fn file(&self) -> Option<&str> {
        self.position().map(|pos| pos.filename.as_str())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.kind.position() {
            if !pos.filename.is_empty() {
                write!(f, "{}:", pos.filename)?;
            }
            write!(f, "{}:{}: ", pos.line, pos.column)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            ParseErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}
