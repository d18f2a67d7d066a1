//! Syntax tree produced by [`parse`](crate::parse()).
//!
//! Every node owns its children in source order and carries a [`Meta`]
//! recording where the node starts and where its terminator sits. Literal
//! values (field numbers, import locations, option constants) are kept as
//! raw source text so that tools such as formatters and linters can
//! reproduce the input exactly.

use std::fmt;

/// A location in the parsed source.
///
/// `offset` is a 0-based byte offset; `line` and `column` are 1-based and
/// `column` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    /// File name as given in the parse options, verbatim.
    pub filename: String,
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, counted in characters.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Source span common to all nodes.
///
/// `pos` is the position of the node's first token; `last_pos` is the
/// position of its terminator (`;` or `}`), or of the final character for
/// comments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Meta {
    pub pos: Position,
    pub last_pos: Position,
}

/// A single `//` line comment or `/* */` block comment, kept raw.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    /// Comment text including its delimiters, excluding any trailing
    /// newline.
    pub raw: String,
    pub meta: Meta,
}

impl Comment {
    /// Returns true for `/* */` comments.
    pub fn is_block(&self) -> bool {
        self.raw.starts_with("/*")
    }
}

/// A parsed `.proto` file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Proto {
    /// The `syntax` statement, if the file has one. Files without one are
    /// parsed with proto2 rules.
    pub syntax: std::option::Option<Syntax>,
    pub body: Vec<ProtoBody>,
    pub meta: ProtoMeta,
}

/// File-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProtoMeta {
    pub filename: String,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ProtoBody {
    Import(Import),
    Package(Package),
    Option(Option),
    Message(Message),
    Enum(Enum),
    Service(Service),
    Extend(Extend),
    EmptyStatement(EmptyStatement),
    Comment(Comment),
}

/// The `syntax = "proto2";` or `syntax = "proto3";` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Syntax {
    /// Unquoted version, either `proto2` or `proto3`.
    pub version: String,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// An `import` statement. The location keeps its quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Import {
    pub modifier: std::option::Option<ImportModifier>,
    pub location: String,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ImportModifier {
    Weak,
    Public,
}

/// A `package` statement with a dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Package {
    pub name: String,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// An `option` statement. The name keeps any parentheses and dots; the
/// constant is raw source text, including `{ ... }` message literals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Option {
    pub name: String,
    pub constant: String,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// A `message` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Message {
    pub name: String,
    pub body: Vec<MessageBody>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    /// Comment on the same line as the opening `{`.
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

/// A statement inside a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MessageBody {
    Field(Field),
    MapField(MapField),
    Oneof(Oneof),
    Group(Group),
    Reserved(Reserved),
    Extensions(Extensions),
    Enum(Enum),
    Message(Message),
    Option(Option),
    Extend(Extend),
    EmptyStatement(EmptyStatement),
    Comment(Comment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldLabel {
    Required,
    Optional,
    Repeated,
}

/// A normal message field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    pub label: std::option::Option<FieldLabel>,
    /// Type as written, possibly dotted and possibly with a leading dot.
    pub ty: String,
    pub name: String,
    /// Field number as written.
    pub number: String,
    pub options: Vec<FieldOption>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// One `name = constant` pair from a trailing `[ ... ]` option list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldOption {
    pub name: String,
    pub constant: String,
}

/// A `map<K, V>` field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapField {
    pub key_ty: String,
    pub ty: String,
    pub name: String,
    pub number: String,
    pub options: Vec<FieldOption>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// A `oneof` group of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Oneof {
    pub name: String,
    pub body: Vec<OneofBody>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OneofBody {
    Option(Option),
    Field(OneofField),
    Group(Group),
    EmptyStatement(EmptyStatement),
    Comment(Comment),
}

/// A field inside a `oneof`. Oneof fields carry no label.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OneofField {
    pub ty: String,
    pub name: String,
    pub number: String,
    pub options: Vec<FieldOption>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// A proto2 `group` field and its nested message body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Group {
    pub label: std::option::Option<FieldLabel>,
    pub name: String,
    pub number: String,
    pub body: Vec<MessageBody>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

/// A `reserved` statement, holding either ranges or field names but never
/// both.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reserved {
    pub content: ReservedContent,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ReservedContent {
    Ranges(Vec<ReservedRange>),
    /// Quoted field names, kept raw.
    FieldNames(Vec<String>),
}

/// A single `N`, `N to M` or `N to max` range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReservedRange {
    pub begin: String,
    /// Upper bound as written; `max` stays the literal keyword.
    pub end: std::option::Option<String>,
}

/// A proto2 `extensions` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extensions {
    pub ranges: Vec<ReservedRange>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// An `extend` block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extend {
    pub message_type: String,
    pub body: Vec<ExtendBody>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExtendBody {
    Field(Field),
    Group(Group),
    EmptyStatement(EmptyStatement),
    Comment(Comment),
}

/// An `enum` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Enum {
    pub name: String,
    pub body: Vec<EnumBody>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EnumBody {
    Option(Option),
    Field(EnumField),
    Reserved(Reserved),
    EmptyStatement(EmptyStatement),
    Comment(Comment),
}

/// One enum value. The number is raw text and may carry a sign.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnumField {
    pub name: String,
    pub number: String,
    pub options: Vec<EnumValueOption>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}

/// One `name = constant` pair attached to an enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnumValueOption {
    pub name: String,
    pub constant: String,
}

/// A `service` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Service {
    pub name: String,
    pub body: Vec<ServiceBody>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ServiceBody {
    Option(Option),
    Rpc(Rpc),
    EmptyStatement(EmptyStatement),
    Comment(Comment),
}

/// An `rpc` method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rpc {
    pub name: String,
    pub request: RpcType,
    pub response: RpcType,
    /// Options from a trailing `{ option ...; }` block.
    pub options: Vec<Option>,
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub inline_comment_behind_left_curly: std::option::Option<Comment>,
    pub meta: Meta,
}

/// Request or response clause of an [`Rpc`]. Its `meta` spans the
/// parenthesized clause.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RpcType {
    pub streaming: bool,
    pub message_type: String,
    pub meta: Meta,
}

/// A bare `;`, preserved so comments around it keep an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmptyStatement {
    pub leading_comments: Vec<Comment>,
    pub inline_comment: std::option::Option<Comment>,
    pub meta: Meta,
}
