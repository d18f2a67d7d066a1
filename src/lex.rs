//! Token-level façade over the scanner.
//!
//! Adds the single-token peek/pushback the parser needs, access to the
//! scanner's pending-comment queue, checkpoints for the rare productions
//! that need more than one token of lookahead, and the probe that
//! attaches a comment sitting on the same line as a just-consumed
//! terminator.

use crate::ast::{Comment, Position};
use crate::error::ParseErrorKind;
use crate::scan::{Scanner, ScannerState, Token};


pub(crate) struct Lexer<'a> {
    scanner: Scanner<'a>,
    peeked: Option<(Token<'a>, Position)>,
}

/// Everything needed to rewind the lexer: scanner cursor, pending
/// comments and the peek slot.
pub(crate) struct Checkpoint<'a> {
    state: ScannerState,
    peeked: Option<(Token<'a>, Position)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, filename: &str, debug: bool) -> Lexer<'a> {
        Lexer {
            scanner: Scanner::new(source, filename, debug),
            peeked: None,
        }
    }

    pub fn next(&mut self) -> Result<(Token<'a>, Position), ParseErrorKind> {
        match self.peeked.take() {
            Some(entry) => Ok(entry),
            None => self.scanner.scan(),
        }
    }

    pub fn peek(&mut self) -> Result<(Token<'a>, Position), ParseErrorKind> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scanner.scan()?);
        }
        Ok(self.peeked.clone().expect("peek slot was just filled"))
    }

    /// Pushes one token back. The slot must be empty.
    pub fn unread(&mut self, token: Token<'a>, pos: Position) {
        debug_assert!(self.peeked.is_none(), "unread over an unconsumed peek");
        self.peeked = Some((token, pos));
    }

    /// Removes and returns all comments scanned so far, oldest first.
    pub fn consume_comments(&mut self) -> Vec<Comment> {
        self.scanner.drain_comments()
    }

    pub fn checkpoint(&self) -> Checkpoint<'a> {
        Checkpoint {
            state: self.scanner.checkpoint(),
            peeked: self.peeked.clone(),
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint<'a>) {
        self.scanner.restore(checkpoint.state);
        self.peeked = checkpoint.peeked;
    }

    /// Returns the comment attached inline to a just-consumed terminator
    /// at `terminator`: the oldest pending comment, provided it begins
    /// after the terminator with no newline in between. Scans ahead to
    /// the next token so the comment queue is up to date; the probed
    /// token stays available through the peek slot.
    pub fn inline_comment(
        &mut self,
        terminator: &Position,
    ) -> Result<Option<Comment>, ParseErrorKind> {
        self.peek()?;
        Ok(self.scanner.take_inline_comment(terminator))
    }

    /// Captures the raw text of a `{ ... }` message literal whose opening
    /// brace token was just consumed at `open`. Returns the text with
    /// both braces and the closing brace's position.
    pub fn read_message_literal(
        &mut self,
        open: &Position,
    ) -> Result<(&'a str, Position), ParseErrorKind> {
        debug_assert!(self.peeked.is_none(), "message literal after a peek");
        self.scanner.finish_raw_braces(open)
    }
}
