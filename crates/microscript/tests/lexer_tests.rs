//! Lexer tests over whole programs

use microscript::lexer::KEYWORDS;
use microscript::*;

fn texts(src: &str) -> Vec<String> {
    tokenize(src)
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Token Streams
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_function_definition_tokens() {
    assert_eq!(
        texts("def add(a, b): return a + b"),
        vec!["def", "add", "(", "a", ",", "b", ")", ":", "return", "a", "+", "b", ""]
    );
}

#[test]
fn test_containers_and_indexing() {
    let tokens = tokenize("d = {\"k\": [1, 2]}\nd[\"k\"][0]").unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::LBrace,
            TokenKind::String,
            TokenKind::Colon,
            TokenKind::LBracket,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::RBracket,
            TokenKind::RBrace,
            TokenKind::Identifier,
            TokenKind::LBracket,
            TokenKind::String,
            TokenKind::RBracket,
            TokenKind::LBracket,
            TokenKind::Number,
            TokenKind::RBracket,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_all_keywords() {
    let src = KEYWORDS.join(" ");
    let tokens = tokenize(&src).unwrap();
    assert_eq!(tokens.len(), KEYWORDS.len() + 1);
    assert!(tokens[..KEYWORDS.len()]
        .iter()
        .all(|t| t.kind == TokenKind::Keyword));
}

#[test]
fn test_keyword_prefix_is_an_identifier() {
    let tokens = tokenize("nilly truex define").unwrap();
    assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Identifier));
}

#[test]
fn test_minus_is_never_part_of_a_number() {
    assert_eq!(texts("x-1"), vec!["x", "-", "1", ""]);
    assert_eq!(texts("--2"), vec!["-", "-", "2", ""]);
}

#[test]
fn test_trailing_dot_is_not_a_float() {
    assert!(matches!(
        tokenize("x = 1."),
        Err(LexError::UnexpectedChar { ch: '.', .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Positions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_positions_across_lines() {
    let tokens = tokenize("if x:\n    print(x)\n").unwrap();
    let print = &tokens[3];
    assert_eq!(print.text, "print");
    assert_eq!(print.pos, Position::new(2, 5));
}

#[test]
fn test_columns_count_characters() {
    let tokens = tokenize("s = 'é' + x").unwrap();
    assert_eq!(tokens[3].pos, Position::new(1, 9));
    assert_eq!(tokens[4].pos, Position::new(1, 11));
}

#[test]
fn test_eof_position_is_end_of_input() {
    let tokens = tokenize("x = 1\n").unwrap();
    let eof = tokens.last().unwrap();
    assert_eq!(eof.kind, TokenKind::Eof);
    assert_eq!(eof.pos, Position::new(2, 1));
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unexpected_character() {
    let err = tokenize("x = 1\ny = $").unwrap_err();
    assert_eq!(
        err,
        LexError::UnexpectedChar {
            ch: '$',
            pos: Position::new(2, 5)
        }
    );
    assert_eq!(err.to_string(), "unexpected character '$' (line 2, col 5)");
}

#[test]
fn test_lone_bang_is_rejected() {
    assert!(matches!(
        tokenize("!x"),
        Err(LexError::UnexpectedChar { ch: '!', .. })
    ));
}

#[test]
fn test_unterminated_string() {
    let err = tokenize("s = \"abc").unwrap_err();
    assert_eq!(err.position(), Position::new(1, 5));
    assert!(matches!(err, LexError::UnterminatedString { .. }));
}

#[test]
fn test_lex_error_runs_nothing() {
    assert!(matches!(
        run("print(1)\nprint(2) @"),
        Err(MicroScriptError::Lex(_))
    ));
}
