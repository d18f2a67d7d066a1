use super::*;
use crate::ast::{
    EnumBody, ImportModifier, MessageBody, OneofBody, ProtoBody, ReservedContent, ServiceBody,
};

fn options() -> ParseOptions {
    ParseOptions::new().with_filename("test.proto")
}

fn parse(source: &str) -> ast::Proto {
    Parser::new(source, &options()).parse_proto().unwrap()
}

fn parse_with(options: &ParseOptions, source: &str) -> ast::Proto {
    Parser::new(source, options).parse_proto().unwrap()
}

fn parse_err(source: &str) -> ParseErrorKind {
    Parser::new(source, &options()).parse_proto().unwrap_err()
}

fn pos(offset: usize, line: usize, column: usize) -> Position {
    Position {
        filename: "test.proto".to_owned(),
        offset,
        line,
        column,
    }
}

fn only_message(proto: &ast::Proto) -> &ast::Message {
    match &proto.body[0] {
        ProtoBody::Message(message) => message,
        other => panic!("expected a message, got {:?}", other),
    }
}

#[test]
fn minimal_proto3() {
    let proto = parse("syntax = \"proto3\";");
    let syntax = proto.syntax.unwrap();
    assert_eq!(syntax.version, "proto3");
    assert_eq!(syntax.meta.pos, pos(0, 1, 1));
    assert_eq!(syntax.meta.last_pos, pos(17, 1, 18));
    assert!(syntax.leading_comments.is_empty());
    assert!(syntax.inline_comment.is_none());
    assert!(proto.body.is_empty());
    assert_eq!(proto.meta.filename, "test.proto");
}

#[test]
fn missing_syntax_defaults_to_proto2() {
    // required labels only exist in proto2, so this parses
    let proto = parse("message M { required int32 a = 1; }");
    assert!(proto.syntax.is_none());
    match &only_message(&proto).body[0] {
        MessageBody::Field(field) => assert_eq!(field.label, Some(FieldLabel::Required)),
        other => panic!("expected a field, got {:?}", other),
    }
}

#[test]
fn syntax_errors() {
    assert!(matches!(
        parse_err("syntax = \"proto4\";"),
        ParseErrorKind::UnknownSyntax { found, .. } if found == "proto4"
    ));
    assert!(matches!(
        parse_err("syntax = 42;"),
        ParseErrorKind::UnexpectedToken { .. }
    ));
    assert!(matches!(
        parse_err("syntax = \"proto3\";\nsyntax = \"proto3\";"),
        ParseErrorKind::DuplicateSyntax { .. }
    ));
    assert!(matches!(
        parse_err("message M {}\nsyntax = \"proto2\";"),
        ParseErrorKind::MisplacedSyntax { .. }
    ));
}

#[test]
fn empty_input() {
    assert!(matches!(parse_err(""), ParseErrorKind::EmptyInput));
    assert!(matches!(parse_err(" \n\t "), ParseErrorKind::EmptyInput));
}

#[test]
fn comments_only_file() {
    let proto = parse("// hello\n// world\n");
    assert!(proto.syntax.is_none());
    assert_eq!(proto.body.len(), 2);
    assert!(matches!(
        &proto.body[0],
        ProtoBody::Comment(comment) if comment.raw == "// hello"
    ));
}

#[test]
fn imports() {
    let proto = parse(
        "syntax = \"proto3\";\n\
         import public \"other.proto\";\n\
         import weak \"weak.proto\";\n\
         import \"plain.proto\";",
    );
    let imports: Vec<_> = proto
        .body
        .iter()
        .map(|entry| match entry {
            ProtoBody::Import(import) => (import.modifier, import.location.as_str()),
            other => panic!("expected an import, got {:?}", other),
        })
        .collect();
    assert_eq!(
        imports,
        vec![
            (Some(ImportModifier::Public), "\"other.proto\""),
            (Some(ImportModifier::Weak), "\"weak.proto\""),
            (None, "\"plain.proto\""),
        ]
    );

    assert!(matches!(
        parse_err("import foo;"),
        ParseErrorKind::UnexpectedToken { expected, .. } if expected == "a string literal"
    ));
}

#[test]
fn packages() {
    let proto = parse("package foo.bar;");
    match &proto.body[0] {
        ProtoBody::Package(package) => assert_eq!(package.name, "foo.bar"),
        other => panic!("expected a package, got {:?}", other),
    }
}

#[test]
fn option_names_and_constants() {
    let cases = [
        ("option java_package = \"com.example.foo\";", "java_package", "\"com.example.foo\""),
        ("option (my_option).a = true;", "(my_option).a", "true"),
        ("option ext.(.foo.bar) = 42;", "ext.(.foo.bar)", "42"),
        ("option foo.(bar.baz).qux = ident;", "foo.(bar.baz).qux", "ident"),
        ("option foo = -1;", "foo", "-1"),
        ("option foo = 0.5;", "foo", "0.5"),
        ("option optimize_for = google.protobuf.SPEED;", "optimize_for", "google.protobuf.SPEED"),
        ("option (ext) = { foo: 5 };", "(ext)", "{ foo: 5 }"),
        ("option quz.(bar) = { foo: [blah] };", "quz.(bar)", "{ foo: [blah] }"),
    ];
    for (source, name, constant) in cases {
        let proto = parse(source);
        match &proto.body[0] {
            ProtoBody::Option(option) => {
                assert_eq!(option.name, name, "in {}", source);
                assert_eq!(option.constant, constant, "in {}", source);
            }
            other => panic!("expected an option, got {:?}", other),
        }
    }

    assert!(matches!(
        parse_err("option ;"),
        ParseErrorKind::UnexpectedToken { .. }
    ));
    assert!(matches!(
        parse_err("option foo = { x: 1"),
        ParseErrorKind::UnexpectedEof { .. }
    ));
}

#[test]
fn message_fields() {
    let proto = parse(
        "message M {\n\
         \x20 int32 a = 1;\n\
         \x20 repeated .foo.Bar b = 2 [deprecated = true, (ext) = -1];\n\
         }",
    );
    let message = only_message(&proto);
    assert_eq!(message.name, "M");
    assert_eq!(message.body.len(), 2);

    match &message.body[0] {
        MessageBody::Field(field) => {
            assert_eq!(field.label, None);
            assert_eq!(field.ty, "int32");
            assert_eq!(field.name, "a");
            assert_eq!(field.number, "1");
            assert!(field.options.is_empty());
        }
        other => panic!("expected a field, got {:?}", other),
    }
    match &message.body[1] {
        MessageBody::Field(field) => {
            assert_eq!(field.label, Some(FieldLabel::Repeated));
            assert_eq!(field.ty, ".foo.Bar");
            assert_eq!(field.options.len(), 2);
            assert_eq!(field.options[0].name, "deprecated");
            assert_eq!(field.options[0].constant, "true");
            assert_eq!(field.options[1].name, "(ext)");
            assert_eq!(field.options[1].constant, "-1");
        }
        other => panic!("expected a field, got {:?}", other),
    }
}

#[test]
fn keywords_are_valid_names() {
    let proto = parse("message M { string message = 1; bool to = 2; }");
    let message = only_message(&proto);
    match (&message.body[0], &message.body[1]) {
        (MessageBody::Field(first), MessageBody::Field(second)) => {
            assert_eq!(first.name, "message");
            assert_eq!(second.name, "to");
        }
        other => panic!("expected two fields, got {:?}", other),
    }
}

#[test]
fn proto3_label_rules() {
    assert!(matches!(
        parse_err("syntax = \"proto3\"; message M { required int32 a = 1; }"),
        ParseErrorKind::Proto3RequiredField { .. }
    ));
    assert!(matches!(
        parse_err("syntax = \"proto3\"; message M { optional int32 a = 1; }"),
        ParseErrorKind::Proto3OptionalField { .. }
    ));

    let permissive = options().with_permissive(true);
    let proto = parse_with(
        &permissive,
        "syntax = \"proto3\"; message M { optional int32 a = 1; }",
    );
    match &only_message(&proto).body[0] {
        MessageBody::Field(field) => assert_eq!(field.label, Some(FieldLabel::Optional)),
        other => panic!("expected a field, got {:?}", other),
    }

    // required stays an error even in permissive mode
    assert!(matches!(
        Parser::new(
            "syntax = \"proto3\"; message M { required int32 a = 1; }",
            &permissive
        )
        .parse_proto()
        .unwrap_err(),
        ParseErrorKind::Proto3RequiredField { .. }
    ));
}

#[test]
fn map_fields() {
    let proto = parse("message M { map<int32, string> m = 1; }");
    match &only_message(&proto).body[0] {
        MessageBody::MapField(map) => {
            assert_eq!(map.key_ty, "int32");
            assert_eq!(map.ty, "string");
            assert_eq!(map.name, "m");
            assert_eq!(map.number, "1");
        }
        other => panic!("expected a map field, got {:?}", other),
    }

    assert!(matches!(
        parse_err("message M { map<float, string> m = 1; }"),
        ParseErrorKind::InvalidMapKeyType { found, .. } if found == "float"
    ));
    let permissive = options().with_permissive(true);
    parse_with(&permissive, "message M { map<float, string> m = 1; }");
}

#[test]
fn map_as_type_name() {
    let proto = parse("message M { map m = 1; }");
    match &only_message(&proto).body[0] {
        MessageBody::Field(field) => {
            assert_eq!(field.ty, "map");
            assert_eq!(field.name, "m");
        }
        other => panic!("expected a field, got {:?}", other),
    }
}

#[test]
fn groups() {
    let proto = parse("message M { optional group Sub = 1 { int32 a = 2; } }");
    match &only_message(&proto).body[0] {
        MessageBody::Group(group) => {
            assert_eq!(group.label, Some(FieldLabel::Optional));
            assert_eq!(group.name, "Sub");
            assert_eq!(group.number, "1");
            assert_eq!(group.body.len(), 1);
        }
        other => panic!("expected a group, got {:?}", other),
    }
}

#[test]
fn group_as_type_name() {
    // without a brace body this is a field whose type is named `group`
    let proto = parse("message M { group foo = 1; }");
    match &only_message(&proto).body[0] {
        MessageBody::Field(field) => {
            assert_eq!(field.ty, "group");
            assert_eq!(field.name, "foo");
            assert_eq!(field.number, "1");
        }
        other => panic!("expected a field, got {:?}", other),
    }
}

#[test]
fn group_in_proto3() {
    assert!(matches!(
        parse_err("syntax = \"proto3\"; message M { group Sub = 1 {} }"),
        ParseErrorKind::Proto3GroupField { .. }
    ));

    let permissive = options().with_permissive(true);
    let proto = parse_with(&permissive, "syntax = \"proto3\"; message M { group Sub = 1 {} }");
    assert!(matches!(
        &only_message(&proto).body[0],
        MessageBody::Group(group) if group.name == "Sub"
    ));
}

#[test]
fn oneofs() {
    let proto = parse(
        "message M { oneof choice { option opt = true; int32 a = 1; string b = 2 [packed = false]; } }",
    );
    match &only_message(&proto).body[0] {
        MessageBody::Oneof(oneof) => {
            assert_eq!(oneof.name, "choice");
            assert_eq!(oneof.body.len(), 3);
            assert!(matches!(&oneof.body[0], OneofBody::Option(_)));
            match &oneof.body[1] {
                OneofBody::Field(field) => {
                    assert_eq!(field.ty, "int32");
                    assert_eq!(field.name, "a");
                }
                other => panic!("expected a oneof field, got {:?}", other),
            }
            match &oneof.body[2] {
                OneofBody::Field(field) => assert_eq!(field.options.len(), 1),
                other => panic!("expected a oneof field, got {:?}", other),
            }
        }
        other => panic!("expected a oneof, got {:?}", other),
    }
}

#[test]
fn reserved_ranges() {
    let proto = parse("message M { reserved 2, 15, 9 to 11, 40 to max; }");
    match &only_message(&proto).body[0] {
        MessageBody::Reserved(reserved) => match &reserved.content {
            ReservedContent::Ranges(ranges) => {
                let ranges: Vec<_> = ranges
                    .iter()
                    .map(|r| (r.begin.as_str(), r.end.as_deref()))
                    .collect();
                assert_eq!(
                    ranges,
                    vec![
                        ("2", None),
                        ("15", None),
                        ("9", Some("11")),
                        ("40", Some("max")),
                    ]
                );
            }
            other => panic!("expected ranges, got {:?}", other),
        },
        other => panic!("expected reserved, got {:?}", other),
    }
}

#[test]
fn reserved_names() {
    let proto = parse("message M { reserved \"foo\", \"bar\"; }");
    match &only_message(&proto).body[0] {
        MessageBody::Reserved(reserved) => match &reserved.content {
            ReservedContent::FieldNames(names) => {
                assert_eq!(names, &["\"foo\"", "\"bar\""]);
            }
            other => panic!("expected field names, got {:?}", other),
        },
        other => panic!("expected reserved, got {:?}", other),
    }
}

#[test]
fn extensions_statement() {
    let proto = parse("message M { extensions 100 to 199, 300; }");
    match &only_message(&proto).body[0] {
        MessageBody::Extensions(extensions) => {
            assert_eq!(extensions.ranges.len(), 2);
            assert_eq!(extensions.ranges[0].begin, "100");
            assert_eq!(extensions.ranges[0].end.as_deref(), Some("199"));
            assert_eq!(extensions.ranges[1].begin, "300");
            assert_eq!(extensions.ranges[1].end, None);
        }
        other => panic!("expected extensions, got {:?}", other),
    }
}

#[test]
fn extend_blocks() {
    let proto = parse(
        "extend google.protobuf.MessageOptions { optional string my_opt = 51234; }",
    );
    match &proto.body[0] {
        ProtoBody::Extend(extend) => {
            assert_eq!(extend.message_type, "google.protobuf.MessageOptions");
            assert_eq!(extend.body.len(), 1);
            assert!(matches!(
                &extend.body[0],
                crate::ast::ExtendBody::Field(field) if field.name == "my_opt"
            ));
        }
        other => panic!("expected an extend block, got {:?}", other),
    }
}

#[test]
fn enums() {
    let proto = parse(
        "enum E {\n\
         \x20 UNKNOWN = 0;\n\
         \x20 RUNNING = 2 [(custom_option) = \"hello\"];\n\
         \x20 NEG = -1;\n\
         \x20 option allow_alias = true;\n\
         }",
    );
    let body = match &proto.body[0] {
        ProtoBody::Enum(node) => {
            assert_eq!(node.name, "E");
            &node.body
        }
        other => panic!("expected an enum, got {:?}", other),
    };
    assert_eq!(body.len(), 4);
    match &body[1] {
        EnumBody::Field(field) => {
            assert_eq!(field.name, "RUNNING");
            assert_eq!(field.number, "2");
            assert_eq!(field.options.len(), 1);
            assert_eq!(field.options[0].name, "(custom_option)");
            assert_eq!(field.options[0].constant, "\"hello\"");
        }
        other => panic!("expected an enum value, got {:?}", other),
    }
    match &body[2] {
        EnumBody::Field(field) => assert_eq!(field.number, "-1"),
        other => panic!("expected an enum value, got {:?}", other),
    }
    assert!(matches!(&body[3], EnumBody::Option(option) if option.name == "allow_alias"));
}

#[test]
fn enum_value_named_like_keywords() {
    let proto = parse("enum E { message = 1; option = 2; reserved = 3; }");
    let body = match &proto.body[0] {
        ProtoBody::Enum(node) => &node.body,
        other => panic!("expected an enum, got {:?}", other),
    };
    let names: Vec<_> = body
        .iter()
        .map(|entry| match entry {
            EnumBody::Field(field) => field.name.as_str(),
            other => panic!("expected an enum value, got {:?}", other),
        })
        .collect();
    assert_eq!(names, vec!["message", "option", "reserved"]);
}

#[test]
fn enum_reserved() {
    let proto = parse("enum E { A = 0; reserved -1 to 1; }");
    // ranges and names cannot mix
    assert!(matches!(
        Parser::new("enum E { reserved 1, \"B\"; }", &options())
            .parse_proto()
            .unwrap_err(),
        ParseErrorKind::UnexpectedToken { .. }
    ));
    let body = match &proto.body[0] {
        ProtoBody::Enum(node) => &node.body,
        other => panic!("expected an enum, got {:?}", other),
    };
    assert!(matches!(&body[1], EnumBody::Reserved(_)));
}

#[test]
fn services_and_rpcs() {
    let proto = parse(
        "service SearchService {\n\
         \x20 rpc Search (SearchRequest) returns (SearchResponse);\n\
         \x20 rpc Chat (stream Msg) returns (stream Msg) { option (opt).x = 1; ; }\n\
         }",
    );
    let body = match &proto.body[0] {
        ProtoBody::Service(service) => {
            assert_eq!(service.name, "SearchService");
            &service.body
        }
        other => panic!("expected a service, got {:?}", other),
    };

    match &body[0] {
        ServiceBody::Rpc(rpc) => {
            assert_eq!(rpc.name, "Search");
            assert!(!rpc.request.streaming);
            assert_eq!(rpc.request.message_type, "SearchRequest");
            assert!(!rpc.response.streaming);
            assert_eq!(rpc.response.message_type, "SearchResponse");
            assert!(rpc.options.is_empty());
        }
        other => panic!("expected an rpc, got {:?}", other),
    }
    match &body[1] {
        ServiceBody::Rpc(rpc) => {
            assert!(rpc.request.streaming);
            assert!(rpc.response.streaming);
            assert_eq!(rpc.options.len(), 1);
            assert_eq!(rpc.options[0].name, "(opt).x");
        }
        other => panic!("expected an rpc, got {:?}", other),
    }

    assert!(matches!(
        parse_err("service S { rpc F (A) returns (B) }"),
        ParseErrorKind::UnexpectedToken { .. }
    ));
}

#[test]
fn rpc_type_named_stream() {
    let proto = parse("service S { rpc F (stream) returns (stream stream); }");
    match &proto.body[0] {
        ProtoBody::Service(service) => match &service.body[0] {
            ServiceBody::Rpc(rpc) => {
                assert!(!rpc.request.streaming);
                assert_eq!(rpc.request.message_type, "stream");
                assert!(rpc.response.streaming);
                assert_eq!(rpc.response.message_type, "stream");
            }
            other => panic!("expected an rpc, got {:?}", other),
        },
        other => panic!("expected a service, got {:?}", other),
    }
}

#[test]
fn empty_statements() {
    let proto = parse("syntax = \"proto3\";;");
    assert!(matches!(&proto.body[0], ProtoBody::EmptyStatement(_)));

    // spaced semicolons are two separate empty statements
    let proto = parse("message M { ; ; }");
    assert_eq!(only_message(&proto).body.len(), 2);
}

#[test]
fn double_semicolons_in_message_bodies() {
    assert!(matches!(
        parse_err("message M { ;; }"),
        ParseErrorKind::UnexpectedToken { .. }
    ));

    let tolerant = options().with_body_included_double_semicolons(true);
    let proto = parse_with(&tolerant, "message M { ;; }");
    let message = only_message(&proto);
    assert_eq!(message.body.len(), 1);
    match &message.body[0] {
        MessageBody::EmptyStatement(empty) => {
            assert_eq!(empty.meta.last_pos.offset, empty.meta.pos.offset + 1);
        }
        other => panic!("expected an empty statement, got {:?}", other),
    }
}

#[test]
fn inline_comment_attachment() {
    let proto = parse("syntax = \"proto3\"; // hi");
    let syntax = proto.syntax.unwrap();
    let comment = syntax.inline_comment.unwrap();
    assert_eq!(comment.raw, "// hi");
    assert_eq!(comment.meta.pos, pos(19, 1, 20));

    let proto = parse("message M { int32 a = 1; // f\n}");
    match &only_message(&proto).body[0] {
        MessageBody::Field(field) => {
            assert_eq!(field.inline_comment.as_ref().unwrap().raw, "// f");
        }
        other => panic!("expected a field, got {:?}", other),
    }

    let proto = parse("message M {} // done");
    assert_eq!(
        only_message(&proto).inline_comment.as_ref().unwrap().raw,
        "// done"
    );
}

#[test]
fn leading_comments_merge_without_blank_lines() {
    let proto = parse("// x\n/* y */\nmessage M {}");
    assert_eq!(proto.body.len(), 1);
    let message = only_message(&proto);
    let raws: Vec<_> = message
        .leading_comments
        .iter()
        .map(|c| c.raw.as_str())
        .collect();
    assert_eq!(raws, vec!["// x", "/* y */"]);
}

#[test]
fn blank_line_detaches_leading_comments() {
    let proto = parse("// a\n// b\n\n// c\nmessage M {}");
    assert_eq!(proto.body.len(), 3);
    assert!(matches!(
        &proto.body[0],
        ProtoBody::Comment(comment) if comment.raw == "// a"
    ));
    assert!(matches!(
        &proto.body[1],
        ProtoBody::Comment(comment) if comment.raw == "// b"
    ));
    let message = match &proto.body[2] {
        ProtoBody::Message(message) => message,
        other => panic!("expected a message, got {:?}", other),
    };
    assert_eq!(message.leading_comments.len(), 1);
    assert_eq!(message.leading_comments[0].raw, "// c");
}

#[test]
fn comment_behind_left_curly() {
    let proto = parse("message M { // behind\n  int32 a = 1;\n}");
    let message = only_message(&proto);
    assert_eq!(
        message
            .inline_comment_behind_left_curly
            .as_ref()
            .unwrap()
            .raw,
        "// behind"
    );
    assert_eq!(message.body.len(), 1);
    match &message.body[0] {
        MessageBody::Field(field) => assert!(field.leading_comments.is_empty()),
        other => panic!("expected a field, got {:?}", other),
    }
}

#[test]
fn trailing_comments_float_in_bodies() {
    let proto = parse("message M {\n  int32 a = 1;\n  // tail\n}");
    let message = only_message(&proto);
    assert_eq!(message.body.len(), 2);
    assert!(matches!(
        &message.body[1],
        MessageBody::Comment(comment) if comment.raw == "// tail"
    ));
}

#[test]
fn parse_message_fragment() {
    let message = Parser::new("// doc\nmessage M { int32 a = 1; }", &options())
        .parse_message_unit()
        .unwrap();
    assert_eq!(message.name, "M");
    assert_eq!(message.leading_comments.len(), 1);
    assert_eq!(message.body.len(), 1);

    assert!(matches!(
        Parser::new("enum E {}", &options())
            .parse_message_unit()
            .unwrap_err(),
        ParseErrorKind::UnexpectedToken { expected, .. } if expected == "'message'"
    ));
    assert!(matches!(
        Parser::new("message M {} extra", &options())
            .parse_message_unit()
            .unwrap_err(),
        ParseErrorKind::UnexpectedToken { expected, .. } if expected == "end of file"
    ));
}

#[test]
fn nested_messages() {
    let proto = parse("message A { message B { message C { int32 x = 1; } } }");
    let a = only_message(&proto);
    let b = match &a.body[0] {
        MessageBody::Message(b) => b,
        other => panic!("expected a message, got {:?}", other),
    };
    let c = match &b.body[0] {
        MessageBody::Message(c) => c,
        other => panic!("expected a message, got {:?}", other),
    };
    assert_eq!(c.name, "C");
    assert!(a.meta.pos.offset <= b.meta.pos.offset);
    assert!(b.meta.last_pos.offset <= a.meta.last_pos.offset);
}

#[test]
fn unterminated_bodies() {
    assert!(matches!(
        parse_err("message M {"),
        ParseErrorKind::UnexpectedEof { .. }
    ));
    assert!(matches!(
        parse_err("enum E { A = 0;"),
        ParseErrorKind::UnexpectedEof { .. }
    ));
}
