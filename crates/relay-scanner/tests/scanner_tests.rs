use relay_scanner::{ScannerState, SyntaxKind};

fn kinds(source: &str) -> Vec<SyntaxKind> {
    let mut scanner = ScannerState::new(source.to_string());
    let mut out = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == SyntaxKind::EndOfFile {
            break;
        }
        out.push(kind);
    }
    out
}

#[test]
fn event_declaration_is_tokenized() {
    let source = "event ping assume 1 : machine;";
    assert_eq!(
        kinds(source),
        vec![
            SyntaxKind::EventKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::AssumeKeyword,
            SyntaxKind::IntegerLiteral,
            SyntaxKind::ColonToken,
            SyntaxKind::MachineKeyword,
            SyntaxKind::SemicolonToken,
        ]
    );
}

#[test]
fn identifier_value_is_captured() {
    let mut scanner = ScannerState::new("machine Client".to_string());
    assert_eq!(scanner.scan(), SyntaxKind::MachineKeyword);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "Client");
    assert_eq!(scanner.token_span().slice("machine Client"), "Client");
}

#[test]
fn keywords_are_not_identifiers() {
    assert_eq!(
        kinds("goto state group"),
        vec![
            SyntaxKind::GotoKeyword,
            SyntaxKind::StateKeyword,
            SyntaxKind::GroupKeyword,
        ]
    );
}

#[test]
fn comments_are_skipped() {
    let source = "enum // line comment\n/* block\ncomment */ Color";
    assert_eq!(
        kinds(source),
        vec![SyntaxKind::EnumKeyword, SyntaxKind::Identifier]
    );
}

#[test]
fn two_char_operators() {
    assert_eq!(
        kinds("== != <= >= && || ="),
        vec![
            SyntaxKind::EqualsEqualsToken,
            SyntaxKind::ExclamationEqualsToken,
            SyntaxKind::LessThanEqualsToken,
            SyntaxKind::GreaterThanEqualsToken,
            SyntaxKind::AmpersandAmpersandToken,
            SyntaxKind::BarBarToken,
            SyntaxKind::EqualsToken,
        ]
    );
}

#[test]
fn numbers_and_floats() {
    let mut scanner = ScannerState::new("42 3.25".to_string());
    assert_eq!(scanner.scan(), SyntaxKind::IntegerLiteral);
    assert_eq!(scanner.token_value(), "42");
    assert_eq!(scanner.scan(), SyntaxKind::FloatLiteral);
    assert_eq!(scanner.token_value(), "3.25");
}

#[test]
fn string_literal_with_escapes() {
    let mut scanner = ScannerState::new(r#""a\n\"b""#.to_string());
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.token_value(), "a\n\"b");
    assert!(!scanner.is_unterminated());
}

#[test]
fn unterminated_string_is_flagged() {
    let mut scanner = ScannerState::new("\"open".to_string());
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert!(scanner.is_unterminated());
}

#[test]
fn qualified_name_tokens() {
    assert_eq!(
        kinds("G1.G2.T"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
        ]
    );
}
