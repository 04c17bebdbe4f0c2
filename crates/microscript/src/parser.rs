//! Recursive-descent parser
//!
//! Precedence, lowest to highest:
//!
//! | tier           | operators                    | assoc |
//! |----------------|------------------------------|-------|
//! | comparison     | `> < == != >= <=`            | left  |
//! | additive       | `+ -`                        | left  |
//! | multiplicative | `* / // %`                   | left  |
//! | power          | `**`                         | right |
//! | unary          | prefix `+ -`                 |       |
//! | postfix        | `expr[expr]`                 | left  |
//!
//! The token stream has no layout tokens. Statements end at the end of their
//! line, and a block after `:` is either the rest of the header line or the
//! run of following lines that share one column deeper than the header.

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, FunctionDef, IfStmt, Number, Program, Stmt, UnaryOp};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::position::Position;
use crate::stack::ensure_sufficient_stack;

/// Parse a token sequence (as produced by [`tokenize`](crate::tokenize))
/// into a [`Program`].
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered; there is no recovery.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let program = Parser::new(tokens).parse_program()?;
    tracing::debug!(statements = program.len(), "parsed program");
    Ok(program)
}

struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    /// Synthesized terminator used when the slice lacks a trailing `Eof`
    eof: Token,
    /// Nesting depth of `def` bodies being parsed
    function_depth: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let eof_pos = tokens.last().map(|t| t.pos).unwrap_or_default();
        Self {
            tokens,
            cursor: 0,
            eof: Token::new(TokenKind::Eof, "", eof_pos),
            function_depth: 0,
        }
    }

    // ───────────────────────────────────────────────────────────────────
    // Token cursor
    // ───────────────────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&self.eof)
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.peek().is_keyword(word)
    }

    fn check_operator(&self, op: &str) -> bool {
        self.peek().is_operator(op)
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let found = self.peek();
        ParseError::new(
            format!("expected {}, found {}", expected, found.describe()),
            found.pos,
        )
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&kind.to_string()))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Token, ParseError> {
        if self.check_keyword(word) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("'{}'", word)))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<Token, ParseError> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance())
        } else {
            Err(self.error_here(what))
        }
    }

    /// Line of the most recently consumed token.
    fn last_line(&self) -> usize {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.pos.line)
            .unwrap_or(0)
    }

    /// A simple statement must be the last thing on its line.
    fn expect_line_end(&self) -> Result<(), ParseError> {
        let next = self.peek();
        if next.kind == TokenKind::Eof || next.pos.line > self.last_line() {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected end of line, found {}", next.describe()),
                next.pos,
            ))
        }
    }

    // ───────────────────────────────────────────────────────────────────
    // Layout
    // ───────────────────────────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        let column = self.peek().pos.column;
        while !self.at_eof() {
            let next = self.peek();
            if next.pos.column != column {
                return Err(ParseError::new("unexpected indentation", next.pos));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Program::new(statements))
    }

    /// Parse the block that follows a header's `:`.
    fn parse_block(&mut self, header: Position, colon: &Token) -> Result<Vec<Stmt>, ParseError> {
        let first = self.peek();
        if first.kind != TokenKind::Eof && first.pos.line == colon.pos.line {
            return Ok(vec![self.parse_statement()?]);
        }
        if first.kind == TokenKind::Eof || first.pos.column <= header.column {
            return Err(ParseError::new(
                format!("expected an indented block, found {}", first.describe()),
                first.pos,
            ));
        }

        let column = first.pos.column;
        let mut body = Vec::new();
        while !self.at_eof() {
            let next = self.peek();
            if next.pos.column < column {
                break;
            }
            if next.pos.column > column {
                return Err(ParseError::new("unexpected indentation", next.pos));
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    // ───────────────────────────────────────────────────────────────────
    // Statements
    // ───────────────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.check(TokenKind::Keyword) {
            let word = self.peek().text.clone();
            match word.as_str() {
                "print" => return self.parse_print(),
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "for" => return self.parse_for(),
                "def" => return self.parse_def(),
                "return" => return self.parse_return(),
                "elif" | "else" | "in" => {
                    let token = self.peek();
                    return Err(ParseError::new(
                        format!("unexpected {}", token.describe()),
                        token.pos,
                    ));
                }
                _ => {}
            }
        }

        let expr = self.parse_expression()?;
        if self.check_operator("=") {
            self.advance();
            let value = self.parse_expression()?;
            self.expect_line_end()?;
            let pos = expr.pos();
            return Ok(Stmt::Assign {
                target: expr,
                value,
                pos,
            });
        }
        self.expect_line_end()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        self.expect(TokenKind::LParen)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.expect_line_end()?;
        Ok(Stmt::Print {
            value,
            pos: keyword.pos,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let cond = self.parse_expression()?;
        let colon = self.expect(TokenKind::Colon)?;
        let body = self.parse_block(keyword.pos, &colon)?;

        let mut elifs = Vec::new();
        while self.check_keyword("elif") && self.peek().pos.column == keyword.pos.column {
            let elif = self.advance();
            let cond = self.parse_expression()?;
            let colon = self.expect(TokenKind::Colon)?;
            let body = self.parse_block(elif.pos, &colon)?;
            elifs.push((cond, body));
        }

        let mut orelse = Vec::new();
        if self.check_keyword("else") && self.peek().pos.column == keyword.pos.column {
            let else_kw = self.advance();
            let colon = self.expect(TokenKind::Colon)?;
            orelse = self.parse_block(else_kw.pos, &colon)?;
        }

        Ok(Stmt::If(IfStmt {
            cond,
            body,
            elifs,
            orelse,
            pos: keyword.pos,
        }))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let cond = self.parse_expression()?;
        let colon = self.expect(TokenKind::Colon)?;
        let body = self.parse_block(keyword.pos, &colon)?;
        Ok(Stmt::While {
            cond,
            body,
            pos: keyword.pos,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let var = self.expect_identifier("loop variable name")?;
        self.expect_keyword("in")?;
        let iterable = self.parse_expression()?;
        let colon = self.expect(TokenKind::Colon)?;
        let body = self.parse_block(keyword.pos, &colon)?;
        Ok(Stmt::For {
            var: var.text,
            iterable,
            body,
            pos: keyword.pos,
        })
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let name = self.expect_identifier("function name")?;
        self.expect(TokenKind::LParen)?;

        let mut params: Vec<String> = Vec::new();
        while !self.check(TokenKind::RParen) {
            let param = self.expect_identifier("parameter name")?;
            if params.contains(&param.text) {
                return Err(ParseError::new(
                    format!("duplicate parameter '{}'", param.text),
                    param.pos,
                ));
            }
            params.push(param.text);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::RParen)?;
        let colon = self.expect(TokenKind::Colon)?;

        self.function_depth += 1;
        let body = self.parse_block(keyword.pos, &colon);
        self.function_depth -= 1;

        Ok(Stmt::FunctionDef(Rc::new(FunctionDef {
            name: name.text,
            params,
            body: body?,
            pos: keyword.pos,
        })))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        if self.function_depth == 0 {
            return Err(ParseError::new("'return' outside function", keyword.pos));
        }

        let next = self.peek();
        let value = if next.kind == TokenKind::Eof || next.pos.line > keyword.pos.line {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_line_end()?;
        Ok(Stmt::Return {
            value,
            pos: keyword.pos,
        })
    }

    // ───────────────────────────────────────────────────────────────────
    // Expressions
    // ───────────────────────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_comparison())
    }

    /// Consume the next token if it is one of `ops`.
    fn match_binary(&mut self, ops: &[&str]) -> Option<(BinaryOp, Position)> {
        let token = self.peek();
        if token.kind != TokenKind::Operator || !ops.contains(&token.text.as_str()) {
            return None;
        }
        let op = BinaryOp::from_symbol(&token.text)?;
        let pos = token.pos;
        self.advance();
        Some((op, pos))
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr, pos: Position) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            pos,
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some((op, pos)) = self.match_binary(&[">", "<", "==", "!=", ">=", "<="]) {
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right, pos);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while let Some((op, pos)) = self.match_binary(&["+", "-"]) {
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right, pos);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_power()?;
        while let Some((op, pos)) = self.match_binary(&["*", "/", "//", "%"]) {
            let right = self.parse_power()?;
            left = Self::binary(op, left, right, pos);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;
        if let Some((op, pos)) = self.match_binary(&["**"]) {
            let exponent = ensure_sufficient_stack(|| self.parse_power())?;
            return Ok(Self::binary(op, base, exponent, pos));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = if self.check_operator("-") {
            UnaryOp::Neg
        } else if self.check_operator("+") {
            UnaryOp::Plus
        } else {
            return self.parse_postfix();
        };
        let pos = self.advance().pos;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            pos,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        while self.check(TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket)?;
            let pos = expr.pos();
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
                pos,
            };
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let pos = token.pos;
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::NumberLit {
                    value: parse_number(&token)?,
                    pos,
                })
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::StringLit {
                    raw: token.text,
                    pos,
                })
            }
            TokenKind::Keyword => match token.text.as_str() {
                "true" | "false" => {
                    self.advance();
                    Ok(Expr::BoolLit {
                        value: token.text == "true",
                        pos,
                    })
                }
                "nil" => {
                    self.advance();
                    Ok(Expr::NilLit { pos })
                }
                _ => Err(self.error_here("an expression")),
            },
            TokenKind::Identifier => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let args = self.parse_list(TokenKind::RParen, Self::parse_expression)?;
                    Ok(Expr::FunctionCall {
                        name: token.text,
                        args,
                        pos,
                    })
                } else {
                    Ok(Expr::Identifier {
                        name: token.text,
                        pos,
                    })
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_list(TokenKind::RBracket, Self::parse_expression)?;
                Ok(Expr::ArrayLit { elements, pos })
            }
            TokenKind::LBrace => {
                self.advance();
                let entries = self.parse_list(TokenKind::RBrace, Self::parse_dict_entry)?;
                Ok(Expr::DictLit { entries, pos })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.error_here("an expression")),
        }
    }

    fn parse_dict_entry(&mut self) -> Result<(Expr, Expr), ParseError> {
        let key = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_expression()?;
        Ok((key, value))
    }

    /// Comma-separated items up to `close`, which is consumed. A trailing
    /// comma is accepted.
    fn parse_list<T>(
        &mut self,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(item(self)?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(close)?;
        Ok(items)
    }
}

fn parse_number(token: &Token) -> Result<Number, ParseError> {
    if token.text.contains('.') {
        token
            .text
            .parse()
            .map(Number::Float)
            .map_err(|_| ParseError::new(format!("invalid number '{}'", token.text), token.pos))
    } else {
        token.text.parse().map(Number::Int).map_err(|_| {
            ParseError::new(
                format!("integer literal '{}' is too large", token.text),
                token.pos,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_src(source: &str) -> Result<Program, ParseError> {
        parse(&tokenize(source).unwrap())
    }

    fn expr(source: &str) -> Expr {
        match parse_src(source).unwrap().statements.remove(0) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    /// Render an expression with explicit grouping.
    fn shape(expr: &Expr) -> String {
        match expr {
            Expr::NumberLit {
                value: Number::Int(n),
                ..
            } => n.to_string(),
            Expr::NumberLit {
                value: Number::Float(n),
                ..
            } => n.to_string(),
            Expr::Identifier { name, .. } => name.clone(),
            Expr::Unary { op, operand, .. } => format!("({}{})", op.symbol(), shape(operand)),
            Expr::BinaryOp {
                op, left, right, ..
            } => format!("({} {} {})", shape(left), op, shape(right)),
            Expr::Index { target, index, .. } => format!("{}[{}]", shape(target), shape(index)),
            other => other.kind_name().to_string(),
        }
    }

    #[test]
    fn test_precedence_tiers() {
        assert_eq!(shape(&expr("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(shape(&expr("1 < 2 + 3")), "(1 < (2 + 3))");
        assert_eq!(shape(&expr("8 - 4 - 2")), "((8 - 4) - 2)");
        assert_eq!(shape(&expr("a // b % c")), "((a // b) % c)");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(shape(&expr("2 ** 3 ** 2")), "(2 ** (3 ** 2))");
        assert_eq!(shape(&expr("2 * 3 ** 2")), "(2 * (3 ** 2))");
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        assert_eq!(shape(&expr("-2 ** 2")), "((-2) ** 2)");
        assert_eq!(shape(&expr("--x")), "(-(-x))");
    }

    #[test]
    fn test_postfix_indexing_chains() {
        assert_eq!(shape(&expr("m[1][2]")), "m[1][2]");
        assert_eq!(shape(&expr("-m[0]")), "(-m[0])");
    }

    #[test]
    fn test_call_vs_identifier() {
        assert!(matches!(expr("f(1, 2)"), Expr::FunctionCall { ref name, ref args, .. } if name == "f" && args.len() == 2));
        assert!(matches!(expr("f"), Expr::Identifier { .. }));
    }

    #[test]
    fn test_trailing_commas() {
        assert!(matches!(expr("[1, 2,]"), Expr::ArrayLit { ref elements, .. } if elements.len() == 2));
        assert!(matches!(expr("{\"a\": 1,}"), Expr::DictLit { ref entries, .. } if entries.len() == 1));
        assert!(matches!(expr("f(1,)"), Expr::FunctionCall { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn test_string_literal_keeps_quotes() {
        assert!(matches!(expr("\"hi\""), Expr::StringLit { ref raw, .. } if raw == "\"hi\""));
    }

    #[test]
    fn test_assignment_statements() {
        let program = parse_src("x = 1\na[0] = 2\n").unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(&program.statements[1], Stmt::Assign { target: Expr::Index { .. }, .. }));
    }

    #[test]
    fn test_statement_must_end_line() {
        let err = parse_src("x = 1 y = 2").unwrap_err();
        assert_eq!(err.message, "expected end of line, found identifier 'y'");
        assert_eq!(err.pos, Position::new(1, 7));
    }

    #[test]
    fn test_indented_block() {
        let program = parse_src("if x:\n    y = 1\n    z = 2\nw = 3\n").unwrap();
        assert_eq!(program.len(), 2);
        match &program.statements[0] {
            Stmt::If(stmt) => assert_eq!(stmt.body.len(), 2),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_block() {
        let program = parse_src("def add(a, b): return a + b\nprint(add(2, 3))").unwrap();
        assert_eq!(program.len(), 2);
        match &program.statements[0] {
            Stmt::FunctionDef(def) => {
                assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(def.body.len(), 1);
            }
            other => panic!("expected def, got {:?}", other),
        }
    }

    #[test]
    fn test_elif_else_chain() {
        let source = "if a:\n  x = 1\nelif b:\n  x = 2\nelif c:\n  x = 3\nelse:\n  x = 4\n";
        match &parse_src(source).unwrap().statements[0] {
            Stmt::If(stmt) => {
                assert_eq!(stmt.elifs.len(), 2);
                assert_eq!(stmt.orelse.len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_blocks_dedent() {
        let source = "def f(n):\n  while n > 0:\n    n = n - 1\n  return n\nprint(f(3))\n";
        let program = parse_src(source).unwrap();
        assert_eq!(program.len(), 2);
        match &program.statements[0] {
            Stmt::FunctionDef(def) => assert_eq!(def.body.len(), 2),
            other => panic!("expected def, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_indentation() {
        let err = parse_src("x = 1\n  y = 2\n").unwrap_err();
        assert_eq!(err.message, "unexpected indentation");
        assert_eq!(err.pos.line, 2);
    }

    #[test]
    fn test_missing_block() {
        let err = parse_src("while x:\ny = 1\n").unwrap_err();
        assert!(err.message.starts_with("expected an indented block"));
    }

    #[test]
    fn test_return_outside_function() {
        let err = parse_src("return 1").unwrap_err();
        assert_eq!(err.message, "'return' outside function");
    }

    #[test]
    fn test_bare_return() {
        let program = parse_src("def f():\n  return\n").unwrap();
        match &program.statements[0] {
            Stmt::FunctionDef(def) => {
                assert!(matches!(def.body[0], Stmt::Return { value: None, .. }))
            }
            other => panic!("expected def, got {:?}", other),
        }
    }

    #[test]
    fn test_error_names_expected_and_found() {
        let err = parse_src("print(1").unwrap_err();
        assert_eq!(err.message, "expected ')', found end of input");

        let err = parse_src("for 1 in x:\n  y = 1").unwrap_err();
        assert_eq!(err.message, "expected loop variable name, found number '1'");
    }

    #[test]
    fn test_integer_literal_too_large() {
        let err = parse_src("x = 99999999999999999999").unwrap_err();
        assert!(err.message.contains("too large"));
    }

    #[test]
    fn test_multiline_expression() {
        let program = parse_src("xs = [\n  1,\n  2,\n]\nprint(xs)").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_empty_program() {
        assert!(parse_src("# nothing here\n").unwrap().is_empty());
    }
}
