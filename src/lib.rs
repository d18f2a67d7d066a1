//! Parsing of Protocol Buffers schema files into a position-annotated,
//! comment-preserving syntax tree.
//!
//! Both the proto2 and proto3 dialects are supported; the dialect is
//! taken from the `syntax` statement and defaults to proto2. The output
//! tree keeps every comment, every empty statement and the raw text of
//! every literal, which makes it suitable for linters, formatters,
//! documentation extractors and schema diff tools. No semantic checks
//! are performed: type names are not resolved and imports are not
//! followed.
//!
//! # Examples
//!
//! ```
//! use protosyn::ast::ProtoBody;
//!
//! let source = r#"
//! syntax = "proto3";
//!
//! message Greeting {
//!     string text = 1; // shown to the user
//! }
//! "#;
//!
//! let proto = protosyn::parse(source)?;
//! assert_eq!(proto.syntax.as_ref().unwrap().version, "proto3");
//! match &proto.body[0] {
//!     ProtoBody::Message(message) => assert_eq!(message.name, "Greeting"),
//!     other => panic!("unexpected entry: {:?}", other),
//! }
//! # Ok::<(), protosyn::ParseError>(())
//! ```
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Read;

pub mod ast;
mod error;
mod lex;
mod parse;
mod scan;

pub use crate::ast::{Message, Proto};
pub use crate::error::{ParseError, ParseErrorKind};

use crate::parse::Parser;

/// Options controlling a parse.
///
/// The defaults parse strictly with an empty file name. Options are
/// value-like and reusable across parses.
///
/// # Examples
///
/// ```
/// let proto = protosyn::ParseOptions::new()
///     .with_filename("search.proto")
///     .with_permissive(true)
///     .parse("syntax = \"proto3\";")?;
/// assert_eq!(proto.meta.filename, "search.proto");
/// # Ok::<(), protosyn::ParseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    filename: String,
    permissive: bool,
    body_included_double_semicolons: bool,
    debug: bool,
}

impl ParseOptions {
    pub fn new() -> ParseOptions {
        ParseOptions::default()
    }

    /// File name reported verbatim in positions and errors.
    pub fn with_filename(mut self, filename: impl Into<String>) -> ParseOptions {
        self.filename = filename.into();
        self
    }

    /// Tolerates common non-canonical syntax: `optional` fields and
    /// `group` declarations in proto3, and map key types outside the
    /// scalar set.
    pub fn with_permissive(mut self, permissive: bool) -> ParseOptions {
        self.permissive = permissive;
        self
    }

    /// Accepts a stray `;;` inside a message body as a single empty
    /// statement.
    pub fn with_body_included_double_semicolons(mut self, included: bool) -> ParseOptions {
        self.body_included_double_semicolons = included;
        self
    }

    /// Emits `trace`-level log records for scanned tokens and parsed
    /// declarations.
    pub fn with_debug(mut self, debug: bool) -> ParseOptions {
        self.debug = debug;
        self
    }

    /// Parses a whole `.proto` file.
    pub fn parse(&self, source: &str) -> Result<Proto, ParseError> {
        let mut parser = Parser::new(source, self);
        parser
            .parse_proto()
            .map_err(|kind| ParseError::new(kind, &self.filename, source))
    }

    /// Reads `reader` to completion and parses the contents. The reader
    /// is not closed; dropping it remains the caller's responsibility.
    pub fn parse_reader(&self, mut reader: impl Read) -> Result<Proto, ParseError> {
        let mut buf = Vec::new();
        if let Err(err) = reader.read_to_end(&mut buf) {
            return Err(ParseError::new(err.into(), &self.filename, String::new()));
        }
        match String::from_utf8(buf) {
            Ok(source) => self.parse(&source),
            Err(_) => Err(ParseError::new(
                ParseErrorKind::InvalidUtf8,
                &self.filename,
                String::new(),
            )),
        }
    }

    /// Parses a single `message` declaration, for tooling that ingests
    /// fragments rather than whole files.
    pub fn parse_message(&self, source: &str) -> Result<Message, ParseError> {
        let mut parser = Parser::new(source, self);
        parser
            .parse_message_unit()
            .map_err(|kind| ParseError::new(kind, &self.filename, source))
    }
}

/// Parses a whole `.proto` file with default options.
pub fn parse(source: &str) -> Result<Proto, ParseError> {
    ParseOptions::default().parse(source)
}

/// Parses a single `message` declaration with default options.
pub fn parse_message(source: &str) -> Result<Message, ParseError> {
    ParseOptions::default().parse_message(source)
}
