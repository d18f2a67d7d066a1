//! Recursive-descent parser.
//!
//! One method per grammar production, driven by single-token lookahead.
//! The only rewind point is the proto2 ambiguity between a `group`
//! declaration and a field whose type is named `group`; everything else
//! dispatches on one peeked token. Comment attachment happens here:
//! before a statement is parsed, pending comments are split into leading
//! comments (no blank line up to the statement) and free-floating
//! comment nodes, and after each terminator the lexer is probed for a
//! same-line inline comment.

use log::trace;

use crate::ast;
use crate::ast::{Comment, FieldLabel, Meta, Position};
use crate::error::ParseErrorKind;
use crate::lex::Lexer;
use crate::scan::Token;
use crate::ParseOptions;

#[cfg(test)]
mod tests;

const MAP_KEY_TYPES: [&str; 12] = [
    "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32", "fixed64", "sfixed32",
    "sfixed64", "bool", "string",
];

enum FieldOrGroup {
    Field(ast::Field),
    Group(ast::Group),
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    filename: String,
    proto3: bool,
    permissive: bool,
    double_semicolons: bool,
    debug: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: &ParseOptions) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(source, &options.filename, options.debug),
            filename: options.filename.clone(),
            proto3: false,
            permissive: options.permissive,
            double_semicolons: options.body_included_double_semicolons,
            debug: options.debug,
        }
    }

    pub fn parse_proto(&mut self) -> Result<ast::Proto, ParseErrorKind> {
        let mut body = Vec::new();
        let mut syntax = None;

        let (token, pos) = self.lexer.peek()?;
        if token == Token::SYNTAX {
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::ProtoBody::Comment));
            let node = self.parse_syntax(leading)?;
            self.proto3 = node.version == "proto3";
            syntax = Some(node);
        }

        loop {
            let (token, pos) = self.lexer.peek()?;
            if token == Token::Eof {
                body.extend(
                    self.lexer
                        .consume_comments()
                        .into_iter()
                        .map(ast::ProtoBody::Comment),
                );
                break;
            }
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::ProtoBody::Comment));
            let entry = match token {
                Token::Punct(';') => ast::ProtoBody::EmptyStatement(
                    self.parse_empty_statement(leading, false)?,
                ),
                t if t == Token::IMPORT => ast::ProtoBody::Import(self.parse_import(leading)?),
                t if t == Token::PACKAGE => ast::ProtoBody::Package(self.parse_package(leading)?),
                t if t == Token::OPTION => ast::ProtoBody::Option(self.parse_option(leading)?),
                t if t == Token::MESSAGE => ast::ProtoBody::Message(self.parse_message(leading)?),
                t if t == Token::ENUM => ast::ProtoBody::Enum(self.parse_enum(leading)?),
                t if t == Token::SERVICE => ast::ProtoBody::Service(self.parse_service(leading)?),
                t if t == Token::EXTEND => ast::ProtoBody::Extend(self.parse_extend(leading)?),
                t if t == Token::SYNTAX => {
                    return Err(if syntax.is_some() {
                        ParseErrorKind::DuplicateSyntax { pos }
                    } else {
                        ParseErrorKind::MisplacedSyntax { pos }
                    });
                }
                _ => {
                    return self.unexpected(
                        "'import', 'package', 'option', 'message', 'enum', 'service', 'extend' or ';'",
                    )
                }
            };
            body.push(entry);
        }

        if syntax.is_none() && body.is_empty() {
            return Err(ParseErrorKind::EmptyInput);
        }

        Ok(ast::Proto {
            syntax,
            body,
            meta: ast::ProtoMeta {
                filename: self.filename.clone(),
            },
        })
    }

    /// Parses a single `message` declaration followed by end of file, for
    /// tooling that ingests fragments.
    pub fn parse_message_unit(&mut self) -> Result<ast::Message, ParseErrorKind> {
        let (token, pos) = self.lexer.peek()?;
        if token != Token::MESSAGE {
            return self.unexpected("'message'");
        }
        let (_floating, leading) = self.split_comments(pos.line);
        let message = self.parse_message(leading)?;
        match self.lexer.peek()? {
            (Token::Eof, _) => Ok(message),
            _ => self.unexpected("end of file"),
        }
    }

    fn parse_syntax(&mut self, leading: Vec<Comment>) -> Result<ast::Syntax, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        if self.debug {
            trace!("parse_syntax at {}", pos);
        }
        self.expect_punct('=')?;
        let (raw, str_pos) = self.expect_string()?;
        let version = raw[1..raw.len() - 1].to_owned();
        if version != "proto2" && version != "proto3" {
            return Err(ParseErrorKind::UnknownSyntax {
                found: version,
                pos: str_pos,
            });
        }
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Syntax {
            version,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_import(&mut self, leading: Vec<Comment>) -> Result<ast::Import, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let modifier = if self.bump_if_eq(Token::WEAK)? {
            Some(ast::ImportModifier::Weak)
        } else if self.bump_if_eq(Token::PUBLIC)? {
            Some(ast::ImportModifier::Public)
        } else {
            None
        };
        let (location, _) = self.expect_string()?;
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Import {
            modifier,
            location: location.to_owned(),
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_package(&mut self, leading: Vec<Comment>) -> Result<ast::Package, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let (name, _) = self.expect_ident("a package name")?;
        let name = name.to_owned();
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Package {
            name,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_option(&mut self, leading: Vec<Comment>) -> Result<ast::Option, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        self.parse_option_rest(pos, leading)
    }

    fn parse_option_rest(
        &mut self,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::Option, ParseErrorKind> {
        let name = self.parse_option_name()?;
        self.expect_punct('=')?;
        let constant = self.parse_constant()?;
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Option {
            name,
            constant,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    /// Option names keep their surface form: parenthesized extension
    /// segments, leading dots inside parentheses and dotted suffixes all
    /// end up verbatim in one string.
    fn parse_option_name(&mut self) -> Result<String, ParseErrorKind> {
        let mut name = String::new();
        match self.lexer.peek()? {
            (Token::Punct('('), _) => self.parse_option_name_paren(&mut name)?,
            (token, _) => match token.as_ident() {
                Some(value) => {
                    self.lexer.next()?;
                    name.push_str(value);
                }
                None => return self.unexpected("an identifier or '('"),
            },
        }
        while self.bump_if_eq(Token::Punct('.'))? {
            name.push('.');
            if self.lexer.peek()?.0 == Token::Punct('(') {
                self.parse_option_name_paren(&mut name)?;
            } else {
                let (part, _) = self.expect_ident("an identifier")?;
                name.push_str(part);
            }
        }
        Ok(name)
    }

    fn parse_option_name_paren(&mut self, name: &mut String) -> Result<(), ParseErrorKind> {
        self.expect_punct('(')?;
        name.push('(');
        if self.bump_if_eq(Token::Punct('.'))? {
            name.push('.');
        }
        let (part, _) = self.expect_ident("an identifier")?;
        name.push_str(part);
        self.expect_punct(')')?;
        name.push(')');
        Ok(())
    }

    /// A constant is returned as raw text. A `{ ... }` message literal is
    /// captured verbatim without tokenizing its interior.
    fn parse_constant(&mut self) -> Result<String, ParseErrorKind> {
        let (token, _) = self.lexer.peek()?;
        match token {
            Token::Str(value)
            | Token::Int(value)
            | Token::Float(value)
            | Token::Ident(value)
            | Token::Bool(value) => {
                self.lexer.next()?;
                Ok(value.to_owned())
            }
            Token::Punct('{') => {
                let (_, open) = self.lexer.next()?;
                let (raw, _) = self.lexer.read_message_literal(&open)?;
                Ok(raw.to_owned())
            }
            _ => self.unexpected("a constant"),
        }
    }

    fn parse_message(&mut self, leading: Vec<Comment>) -> Result<ast::Message, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        if self.debug {
            trace!("parse_message at {}", pos);
        }
        let (name, _) = self.expect_name("a message name")?;
        let name = name.to_owned();
        let open = self.expect_punct('{')?;
        let inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
        let (body, last_pos) = self.parse_message_body()?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Message {
            name,
            body,
            leading_comments: leading,
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_message_body(
        &mut self,
    ) -> Result<(Vec<ast::MessageBody>, Position), ParseErrorKind> {
        let mut body = Vec::new();
        loop {
            let (token, pos) = self.lexer.peek()?;
            if token == Token::Punct('}') {
                body.extend(
                    self.lexer
                        .consume_comments()
                        .into_iter()
                        .map(ast::MessageBody::Comment),
                );
                self.lexer.next()?;
                return Ok((body, pos));
            }
            if token == Token::Eof {
                return self.unexpected("'}'");
            }
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::MessageBody::Comment));
            body.push(self.parse_message_body_entry(leading)?);
        }
    }

    fn parse_message_body_entry(
        &mut self,
        leading: Vec<Comment>,
    ) -> Result<ast::MessageBody, ParseErrorKind> {
        let (token, pos) = self.lexer.peek()?;
        Ok(match token {
            Token::Punct(';') => {
                ast::MessageBody::EmptyStatement(self.parse_empty_statement(leading, true)?)
            }
            t if t == Token::OPTION => ast::MessageBody::Option(self.parse_option(leading)?),
            t if t == Token::MESSAGE => ast::MessageBody::Message(self.parse_message(leading)?),
            t if t == Token::ENUM => ast::MessageBody::Enum(self.parse_enum(leading)?),
            t if t == Token::ONEOF => ast::MessageBody::Oneof(self.parse_oneof(leading)?),
            t if t == Token::RESERVED => {
                ast::MessageBody::Reserved(self.parse_reserved(leading)?)
            }
            t if t == Token::EXTENSIONS => {
                ast::MessageBody::Extensions(self.parse_extensions(leading)?)
            }
            t if t == Token::EXTEND => ast::MessageBody::Extend(self.parse_extend(leading)?),
            t if t == Token::MAP => {
                self.lexer.next()?;
                if self.lexer.peek()?.0 == Token::Punct('<') {
                    ast::MessageBody::MapField(self.parse_map_field(pos, leading)?)
                } else {
                    // `map` used as an ordinary type name
                    ast::MessageBody::Field(self.parse_field_rest(
                        None,
                        "map".to_owned(),
                        pos,
                        leading,
                    )?)
                }
            }
            t if t == Token::REPEATED || t == Token::OPTIONAL || t == Token::REQUIRED => {
                let label = self.parse_label()?;
                match self.parse_field_or_group(Some(label), leading)? {
                    FieldOrGroup::Field(field) => ast::MessageBody::Field(field),
                    FieldOrGroup::Group(group) => ast::MessageBody::Group(group),
                }
            }
            t if t == Token::GROUP => match self.parse_field_or_group(None, leading)? {
                FieldOrGroup::Field(field) => ast::MessageBody::Field(field),
                FieldOrGroup::Group(group) => ast::MessageBody::Group(group),
            },
            Token::Ident(_) | Token::Bool(_) | Token::Punct('.') => {
                ast::MessageBody::Field(self.parse_field(None, pos, leading)?)
            }
            _ => return self.unexpected("a message body statement"),
        })
    }

    fn parse_label(&mut self) -> Result<(FieldLabel, Position), ParseErrorKind> {
        let (token, pos) = self.lexer.next()?;
        let label = if token == Token::REQUIRED {
            if self.proto3 {
                return Err(ParseErrorKind::Proto3RequiredField { pos });
            }
            FieldLabel::Required
        } else if token == Token::OPTIONAL {
            if self.proto3 && !self.permissive {
                return Err(ParseErrorKind::Proto3OptionalField { pos });
            }
            FieldLabel::Optional
        } else {
            FieldLabel::Repeated
        };
        Ok((label, pos))
    }

    fn parse_field_or_group(
        &mut self,
        label: Option<(FieldLabel, Position)>,
        leading: Vec<Comment>,
    ) -> Result<FieldOrGroup, ParseErrorKind> {
        let (token, pos) = self.lexer.peek()?;
        let start = match &label {
            Some((_, label_pos)) => label_pos.clone(),
            None => pos,
        };
        let label = label.map(|(label, _)| label);
        if token == Token::GROUP {
            if let Some(group) = self.try_parse_group(label, start.clone(), &leading)? {
                return Ok(FieldOrGroup::Group(group));
            }
        }
        Ok(FieldOrGroup::Field(self.parse_field(label, start, leading)?))
    }

    /// Telling a group apart from a field whose type is named `group`
    /// takes four tokens, so this is the one production that rewinds the
    /// lexer on a failed match.
    fn try_parse_group(
        &mut self,
        label: Option<FieldLabel>,
        pos: Position,
        leading: &[Comment],
    ) -> Result<Option<ast::Group>, ParseErrorKind> {
        let checkpoint = self.lexer.checkpoint();
        let (_, group_pos) = self.lexer.next()?;
        let header = (|| -> Result<(String, String), ParseErrorKind> {
            let (name, _) = self.expect_name("a group name")?;
            let name = name.to_owned();
            self.expect_punct('=')?;
            let (number, _) = self.expect_int()?;
            Ok((name, number.to_owned()))
        })();
        let (name, number) = match header {
            Ok(header) => header,
            Err(_) => {
                self.lexer.restore(checkpoint);
                return Ok(None);
            }
        };
        if self.lexer.peek()?.0 != Token::Punct('{') {
            self.lexer.restore(checkpoint);
            return Ok(None);
        }
        if self.proto3 && !self.permissive {
            return Err(ParseErrorKind::Proto3GroupField { pos: group_pos });
        }
        let open = self.expect_punct('{')?;
        let inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
        let (body, last_pos) = self.parse_message_body()?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(Some(ast::Group {
            label,
            name,
            number,
            body,
            leading_comments: leading.to_vec(),
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        }))
    }

    fn parse_field(
        &mut self,
        label: Option<FieldLabel>,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::Field, ParseErrorKind> {
        let ty = self.parse_type_name()?;
        self.parse_field_rest(label, ty, pos, leading)
    }

    fn parse_field_rest(
        &mut self,
        label: Option<FieldLabel>,
        ty: String,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::Field, ParseErrorKind> {
        let (name, _) = self.expect_name("a field name")?;
        let name = name.to_owned();
        self.expect_punct('=')?;
        let (number, _) = self.expect_int()?;
        let options = self.parse_field_options()?;
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Field {
            label,
            ty,
            name,
            number: number.to_owned(),
            options,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_map_field(
        &mut self,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::MapField, ParseErrorKind> {
        self.expect_punct('<')?;
        let (key_ty, key_pos) = self.expect_name("a key type")?;
        if !self.permissive && !MAP_KEY_TYPES.contains(&key_ty) {
            return Err(ParseErrorKind::InvalidMapKeyType {
                found: key_ty.to_owned(),
                pos: key_pos,
            });
        }
        let key_ty = key_ty.to_owned();
        self.expect_punct(',')?;
        let ty = self.parse_type_name()?;
        self.expect_punct('>')?;
        let (name, _) = self.expect_name("a field name")?;
        let name = name.to_owned();
        self.expect_punct('=')?;
        let (number, _) = self.expect_int()?;
        let options = self.parse_field_options()?;
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::MapField {
            key_ty,
            ty,
            name,
            number: number.to_owned(),
            options,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_oneof(&mut self, leading: Vec<Comment>) -> Result<ast::Oneof, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let (name, _) = self.expect_name("a oneof name")?;
        let name = name.to_owned();
        let open = self.expect_punct('{')?;
        let inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
        let mut body = Vec::new();
        let last_pos = loop {
            let (token, pos) = self.lexer.peek()?;
            if token == Token::Punct('}') {
                body.extend(
                    self.lexer
                        .consume_comments()
                        .into_iter()
                        .map(ast::OneofBody::Comment),
                );
                self.lexer.next()?;
                break pos;
            }
            if token == Token::Eof {
                return self.unexpected("'}'");
            }
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::OneofBody::Comment));
            let entry = match token {
                Token::Punct(';') => {
                    ast::OneofBody::EmptyStatement(self.parse_empty_statement(leading, false)?)
                }
                t if t == Token::OPTION => ast::OneofBody::Option(self.parse_option(leading)?),
                t if t == Token::GROUP => {
                    match self.try_parse_group(None, pos.clone(), &leading)? {
                        Some(group) => ast::OneofBody::Group(group),
                        None => ast::OneofBody::Field(self.parse_oneof_field(pos, leading)?),
                    }
                }
                Token::Ident(_) | Token::Bool(_) | Token::Punct('.') => {
                    ast::OneofBody::Field(self.parse_oneof_field(pos, leading)?)
                }
                _ => return self.unexpected("a oneof field, 'option', '}' or ';'"),
            };
            body.push(entry);
        };
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Oneof {
            name,
            body,
            leading_comments: leading,
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_oneof_field(
        &mut self,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::OneofField, ParseErrorKind> {
        let ty = self.parse_type_name()?;
        let (name, _) = self.expect_name("a field name")?;
        let name = name.to_owned();
        self.expect_punct('=')?;
        let (number, _) = self.expect_int()?;
        let options = self.parse_field_options()?;
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::OneofField {
            ty,
            name,
            number: number.to_owned(),
            options,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_reserved(&mut self, leading: Vec<Comment>) -> Result<ast::Reserved, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        self.parse_reserved_rest(pos, leading)
    }

    fn parse_reserved_rest(
        &mut self,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::Reserved, ParseErrorKind> {
        let content = match self.lexer.peek()? {
            (Token::Str(_), _) => {
                let mut names = Vec::new();
                loop {
                    let (value, _) = self.expect_string()?;
                    names.push(value.to_owned());
                    if !self.bump_if_eq(Token::Punct(','))? {
                        break;
                    }
                }
                ast::ReservedContent::FieldNames(names)
            }
            _ => ast::ReservedContent::Ranges(self.parse_ranges()?),
        };
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Reserved {
            content,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_extensions(
        &mut self,
        leading: Vec<Comment>,
    ) -> Result<ast::Extensions, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let ranges = self.parse_ranges()?;
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Extensions {
            ranges,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_ranges(&mut self) -> Result<Vec<ast::ReservedRange>, ParseErrorKind> {
        let mut ranges = Vec::new();
        loop {
            let (begin, _) = self.expect_int()?;
            let begin = begin.to_owned();
            let end = if self.bump_if_eq(Token::TO)? {
                match self.lexer.peek()? {
                    (Token::Int(value), _) => {
                        self.lexer.next()?;
                        Some(value.to_owned())
                    }
                    (t, _) if t == Token::MAX => {
                        self.lexer.next()?;
                        Some("max".to_owned())
                    }
                    _ => return self.unexpected("an integer literal or 'max'"),
                }
            } else {
                None
            };
            ranges.push(ast::ReservedRange { begin, end });
            if !self.bump_if_eq(Token::Punct(','))? {
                break;
            }
        }
        Ok(ranges)
    }

    fn parse_extend(&mut self, leading: Vec<Comment>) -> Result<ast::Extend, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let message_type = self.parse_type_name()?;
        let open = self.expect_punct('{')?;
        let inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
        let mut body = Vec::new();
        let last_pos = loop {
            let (token, pos) = self.lexer.peek()?;
            if token == Token::Punct('}') {
                body.extend(
                    self.lexer
                        .consume_comments()
                        .into_iter()
                        .map(ast::ExtendBody::Comment),
                );
                self.lexer.next()?;
                break pos;
            }
            if token == Token::Eof {
                return self.unexpected("'}'");
            }
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::ExtendBody::Comment));
            let entry = match token {
                Token::Punct(';') => {
                    ast::ExtendBody::EmptyStatement(self.parse_empty_statement(leading, false)?)
                }
                t if t == Token::REPEATED || t == Token::OPTIONAL || t == Token::REQUIRED => {
                    let label = self.parse_label()?;
                    match self.parse_field_or_group(Some(label), leading)? {
                        FieldOrGroup::Field(field) => ast::ExtendBody::Field(field),
                        FieldOrGroup::Group(group) => ast::ExtendBody::Group(group),
                    }
                }
                t if t == Token::GROUP => match self.parse_field_or_group(None, leading)? {
                    FieldOrGroup::Field(field) => ast::ExtendBody::Field(field),
                    FieldOrGroup::Group(group) => ast::ExtendBody::Group(group),
                },
                Token::Ident(_) | Token::Bool(_) | Token::Punct('.') => {
                    ast::ExtendBody::Field(self.parse_field(None, pos, leading)?)
                }
                _ => return self.unexpected("a field, '}' or ';'"),
            };
            body.push(entry);
        };
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Extend {
            message_type,
            body,
            leading_comments: leading,
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_enum(&mut self, leading: Vec<Comment>) -> Result<ast::Enum, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        if self.debug {
            trace!("parse_enum at {}", pos);
        }
        let (name, _) = self.expect_name("an enum name")?;
        let name = name.to_owned();
        let open = self.expect_punct('{')?;
        let inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
        let mut body = Vec::new();
        let last_pos = loop {
            let (token, pos) = self.lexer.peek()?;
            if token == Token::Punct('}') {
                body.extend(
                    self.lexer
                        .consume_comments()
                        .into_iter()
                        .map(ast::EnumBody::Comment),
                );
                self.lexer.next()?;
                break pos;
            }
            if token == Token::Eof {
                return self.unexpected("'}'");
            }
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::EnumBody::Comment));
            let entry = match token {
                Token::Punct(';') => {
                    ast::EnumBody::EmptyStatement(self.parse_empty_statement(leading, false)?)
                }
                t if t == Token::OPTION => {
                    // an enum value may itself be named `option`
                    let (_, keyword_pos) = self.lexer.next()?;
                    if self.lexer.peek()?.0 == Token::Punct('=') {
                        ast::EnumBody::Field(self.parse_enum_field_rest(
                            "option".to_owned(),
                            keyword_pos,
                            leading,
                        )?)
                    } else {
                        ast::EnumBody::Option(self.parse_option_rest(keyword_pos, leading)?)
                    }
                }
                t if t == Token::RESERVED => {
                    let (_, keyword_pos) = self.lexer.next()?;
                    if self.lexer.peek()?.0 == Token::Punct('=') {
                        ast::EnumBody::Field(self.parse_enum_field_rest(
                            "reserved".to_owned(),
                            keyword_pos,
                            leading,
                        )?)
                    } else {
                        ast::EnumBody::Reserved(self.parse_reserved_rest(keyword_pos, leading)?)
                    }
                }
                Token::Ident(_) | Token::Bool(_) => {
                    let (name, pos) = self.expect_name("an enum value name")?;
                    let name = name.to_owned();
                    ast::EnumBody::Field(self.parse_enum_field_rest(name, pos, leading)?)
                }
                _ => {
                    return self.unexpected("an enum value, 'option', 'reserved', '}' or ';'")
                }
            };
            body.push(entry);
        };
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Enum {
            name,
            body,
            leading_comments: leading,
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_enum_field_rest(
        &mut self,
        name: String,
        pos: Position,
        leading: Vec<Comment>,
    ) -> Result<ast::EnumField, ParseErrorKind> {
        self.expect_punct('=')?;
        let (number, _) = self.expect_int()?;
        let number = number.to_owned();
        let options = self
            .parse_bracketed_options()?
            .into_iter()
            .map(|(name, constant)| ast::EnumValueOption { name, constant })
            .collect();
        let last_pos = self.expect_punct(';')?;
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::EnumField {
            name,
            number,
            options,
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_service(&mut self, leading: Vec<Comment>) -> Result<ast::Service, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        if self.debug {
            trace!("parse_service at {}", pos);
        }
        let (name, _) = self.expect_name("a service name")?;
        let name = name.to_owned();
        let open = self.expect_punct('{')?;
        let inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
        let mut body = Vec::new();
        let last_pos = loop {
            let (token, pos) = self.lexer.peek()?;
            if token == Token::Punct('}') {
                body.extend(
                    self.lexer
                        .consume_comments()
                        .into_iter()
                        .map(ast::ServiceBody::Comment),
                );
                self.lexer.next()?;
                break pos;
            }
            if token == Token::Eof {
                return self.unexpected("'}'");
            }
            let (floating, leading) = self.split_comments(pos.line);
            body.extend(floating.into_iter().map(ast::ServiceBody::Comment));
            let entry = match token {
                Token::Punct(';') => {
                    ast::ServiceBody::EmptyStatement(self.parse_empty_statement(leading, false)?)
                }
                t if t == Token::OPTION => ast::ServiceBody::Option(self.parse_option(leading)?),
                t if t == Token::RPC => ast::ServiceBody::Rpc(self.parse_rpc(leading)?),
                _ => return self.unexpected("'rpc', 'option', '}' or ';'"),
            };
            body.push(entry);
        };
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Service {
            name,
            body,
            leading_comments: leading,
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_rpc(&mut self, leading: Vec<Comment>) -> Result<ast::Rpc, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let (name, _) = self.expect_name("an rpc name")?;
        let name = name.to_owned();
        let request = self.parse_rpc_type()?;
        if !self.bump_if_eq(Token::RETURNS)? {
            return self.unexpected("'returns'");
        }
        let response = self.parse_rpc_type()?;

        let mut options = Vec::new();
        let mut inline_comment_behind_left_curly = None;
        let last_pos = match self.lexer.peek()? {
            (Token::Punct(';'), _) => {
                let (_, pos) = self.lexer.next()?;
                pos
            }
            (Token::Punct('{'), _) => {
                let (_, open) = self.lexer.next()?;
                inline_comment_behind_left_curly = self.lexer.inline_comment(&open)?;
                loop {
                    let (token, token_pos) = self.lexer.peek()?;
                    match token {
                        Token::Punct('}') => {
                            self.lexer.consume_comments();
                            self.lexer.next()?;
                            break token_pos;
                        }
                        Token::Punct(';') => {
                            self.lexer.next()?;
                        }
                        t if t == Token::OPTION => {
                            let (_floating, leading) = self.split_comments(token_pos.line);
                            options.push(self.parse_option(leading)?);
                        }
                        Token::Eof => return self.unexpected("'}'"),
                        _ => return self.unexpected("'option', '}' or ';'"),
                    }
                }
            }
            _ => return self.unexpected("';' or '{'"),
        };
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::Rpc {
            name,
            request,
            response,
            options,
            leading_comments: leading,
            inline_comment,
            inline_comment_behind_left_curly,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_rpc_type(&mut self) -> Result<ast::RpcType, ParseErrorKind> {
        let open = self.expect_punct('(')?;
        let mut streaming = false;
        let message_type = if self.bump_if_eq(Token::STREAM)? {
            if self.lexer.peek()?.0 == Token::Punct(')') {
                // a message type actually named `stream`
                "stream".to_owned()
            } else {
                streaming = true;
                self.parse_type_name()?
            }
        } else {
            self.parse_type_name()?
        };
        let close = self.expect_punct(')')?;
        Ok(ast::RpcType {
            streaming,
            message_type,
            meta: Meta {
                pos: open,
                last_pos: close,
            },
        })
    }

    fn parse_empty_statement(
        &mut self,
        leading: Vec<Comment>,
        in_message_body: bool,
    ) -> Result<ast::EmptyStatement, ParseErrorKind> {
        let (_, pos) = self.lexer.next()?;
        let mut last_pos = pos.clone();
        if in_message_body {
            if let (Token::Punct(';'), second) = self.lexer.peek()? {
                if second.offset == pos.offset + 1 {
                    if self.double_semicolons {
                        self.lexer.next()?;
                        last_pos = second;
                    } else {
                        return Err(ParseErrorKind::UnexpectedToken {
                            expected: "a message body statement".to_owned(),
                            found: ";".to_owned(),
                            pos: second,
                        });
                    }
                }
            }
        }
        let inline_comment = self.lexer.inline_comment(&last_pos)?;
        Ok(ast::EmptyStatement {
            leading_comments: leading,
            inline_comment,
            meta: Meta { pos, last_pos },
        })
    }

    fn parse_type_name(&mut self) -> Result<String, ParseErrorKind> {
        let mut name = String::new();
        if self.bump_if_eq(Token::Punct('.'))? {
            name.push('.');
        }
        let (token, _) = self.lexer.peek()?;
        match token.as_ident() {
            Some(value) => {
                self.lexer.next()?;
                name.push_str(value);
                Ok(name)
            }
            None => self.unexpected("a type name"),
        }
    }

    fn parse_field_options(&mut self) -> Result<Vec<ast::FieldOption>, ParseErrorKind> {
        Ok(self
            .parse_bracketed_options()?
            .into_iter()
            .map(|(name, constant)| ast::FieldOption { name, constant })
            .collect())
    }

    /// Parses a trailing `[name = constant, ...]` list if one starts
    /// here, returning raw name/value pairs.
    fn parse_bracketed_options(&mut self) -> Result<Vec<(String, String)>, ParseErrorKind> {
        if !self.bump_if_eq(Token::Punct('['))? {
            return Ok(Vec::new());
        }
        let mut options = Vec::new();
        loop {
            let name = self.parse_option_name()?;
            self.expect_punct('=')?;
            let constant = self.parse_constant()?;
            options.push((name, constant));
            match self.lexer.peek()? {
                (Token::Punct(','), _) => {
                    self.lexer.next()?;
                }
                (Token::Punct(']'), _) => {
                    self.lexer.next()?;
                    break;
                }
                _ => return self.unexpected("',' or ']'"),
            }
        }
        Ok(options)
    }

    /// Splits the pending comments into free-floating comments and the
    /// run that attaches to a statement starting on `node_line`. A
    /// comment joins the run only when no blank line separates it from
    /// what follows it.
    fn split_comments(&mut self, node_line: usize) -> (Vec<Comment>, Vec<Comment>) {
        let mut comments = self.lexer.consume_comments();
        let mut split = comments.len();
        let mut next_line = node_line;
        while split > 0 {
            let comment = &comments[split - 1];
            if comment.meta.last_pos.line + 1 >= next_line {
                next_line = comment.meta.pos.line;
                split -= 1;
            } else {
                break;
            }
        }
        let leading = comments.split_off(split);
        (comments, leading)
    }

    fn bump_if_eq(&mut self, token: Token<'static>) -> Result<bool, ParseErrorKind> {
        let (next, pos) = self.lexer.next()?;
        if next == token {
            Ok(true)
        } else {
            self.lexer.unread(next, pos);
            Ok(false)
        }
    }

    fn expect_punct(&mut self, ch: char) -> Result<Position, ParseErrorKind> {
        match self.lexer.peek()? {
            (Token::Punct(c), _) if c == ch => {
                let (_, pos) = self.lexer.next()?;
                Ok(pos)
            }
            _ => self.unexpected(&format!("'{}'", ch)),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(&'a str, Position), ParseErrorKind> {
        let (token, pos) = self.lexer.peek()?;
        match token.as_ident() {
            Some(value) => {
                self.lexer.next()?;
                Ok((value, pos))
            }
            None => self.unexpected(expected),
        }
    }

    /// Like [`expect_ident`](Self::expect_ident), but rejects dotted
    /// identifiers: names of declarations are single identifiers.
    fn expect_name(&mut self, expected: &str) -> Result<(&'a str, Position), ParseErrorKind> {
        let (token, pos) = self.lexer.peek()?;
        match token.as_ident() {
            Some(value) if !value.contains('.') => {
                self.lexer.next()?;
                Ok((value, pos))
            }
            _ => self.unexpected(expected),
        }
    }

    fn expect_int(&mut self) -> Result<(&'a str, Position), ParseErrorKind> {
        match self.lexer.peek()? {
            (Token::Int(value), pos) => {
                self.lexer.next()?;
                Ok((value, pos))
            }
            _ => self.unexpected("an integer literal"),
        }
    }

    fn expect_string(&mut self) -> Result<(&'a str, Position), ParseErrorKind> {
        match self.lexer.peek()? {
            (Token::Str(value), pos) => {
                self.lexer.next()?;
                Ok((value, pos))
            }
            _ => self.unexpected("a string literal"),
        }
    }

    fn unexpected<T>(&mut self, expected: &str) -> Result<T, ParseErrorKind> {
        let (token, pos) = self.lexer.peek()?;
        Err(match token {
            Token::Eof => ParseErrorKind::UnexpectedEof {
                expected: expected.to_owned(),
            },
            _ => ParseErrorKind::UnexpectedToken {
                expected: expected.to_owned(),
                found: token.to_string(),
                pos,
            },
        })
    }
}
