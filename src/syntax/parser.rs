//! Recursive descent parser: token stream → operation trees.

use crate::{Error, Result};
use super::ast::*;
use super::lexer::{Token, TokenKind};

/// Hard cap on form nesting, intent forms included. Independent of the
/// configured gesture depth ceiling, which is checked at run time.
pub const MAX_NESTING: usize = 256;

/// Parser state: wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        let tok = self.peek();
        if tok.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, got {:?} '{}'", kind, tok.kind, tok.text)))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn error(&self, msg: String) -> Error {
        Error::SyntaxError {
            position: self.peek().span.start,
            message: msg,
        }
    }
}

/// Parse a whole program: a sequence of top-level forms.
pub fn parse_program(tokens: &[Token]) -> Result<Vec<Operation>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut p = Parser::new(tokens);
    let mut program = Vec::new();
    while !p.at(TokenKind::Eof) {
        program.push(parse_operation(&mut p, 0)?);
    }
    Ok(program)
}

fn parse_operation(p: &mut Parser, nesting: usize) -> Result<Operation> {
    if nesting >= MAX_NESTING {
        return Err(p.error(format!("Forms nested deeper than {MAX_NESTING}")));
    }
    let position = p.expect(TokenKind::LParen)?.span.start;

    if !p.at(TokenKind::Symbol) {
        let tok = p.peek();
        return Err(p.error(format!("Expected operator symbol, got {:?} '{}'", tok.kind, tok.text)));
    }
    let operator = p.advance().text.clone();

    let mut operands = Vec::new();
    loop {
        match p.peek_kind() {
            TokenKind::RParen => {
                p.advance();
                break;
            }
            TokenKind::LParen => operands.push(Operand::Tree(parse_operation(p, nesting + 1)?)),
            TokenKind::Eof => {
                return Err(Error::SyntaxError {
                    position,
                    message: format!("Unclosed form '{operator}'"),
                });
            }
            _ => operands.push(Operand::Atom(parse_atom(p)?)),
        }
    }

    Ok(Operation { operator, operands, position })
}

fn parse_atom(p: &mut Parser) -> Result<Atom> {
    let tok = p.advance().clone();
    let atom = match tok.kind {
        TokenKind::StringLiteral => Atom::String(tok.text),
        TokenKind::Symbol => Atom::Symbol(tok.text),
        TokenKind::Keyword => Atom::Keyword(tok.text),
        TokenKind::Integer => Atom::Int(tok.text.parse().map_err(|_| Error::SyntaxError {
            position: tok.span.start,
            message: format!("Integer out of range: {}", tok.text),
        })?),
        TokenKind::Float => Atom::Float {
            value: tok.text.parse().map_err(|_| Error::SyntaxError {
                position: tok.span.start,
                message: format!("Invalid decimal: {}", tok.text),
            })?,
            lexeme: tok.text,
        },
        other => {
            return Err(Error::SyntaxError {
                position: tok.span.start,
                message: format!("Unexpected token {other:?}"),
            });
        }
    };
    Ok(atom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;

    fn parse(src: &str) -> Result<Vec<Operation>> {
        parse_program(&tokenize(src)?)
    }

    #[test]
    fn test_parse_sequence() {
        let prog = parse(r#"(collapse "a") (link a "b")"#).unwrap();
        assert_eq!(prog.len(), 2);
        assert_eq!(prog[0].operator, "collapse");
        assert_eq!(prog[1].operands.len(), 2);
        assert_eq!(prog[1].operands[0], Operand::Atom(Atom::Symbol("a".into())));
    }

    #[test]
    fn test_parse_nested_and_keywords() {
        let prog = parse(r#"(Σ (Α "x") "y" :name "xy" (intent "bind" "them"))"#).unwrap();
        let op = &prog[0];
        assert_eq!(op.operator, "Σ");
        assert!(matches!(&op.operands[0], Operand::Tree(t) if t.operator == "Α"));
        assert_eq!(op.operands[2], Operand::Atom(Atom::Keyword("name".into())));
        assert_eq!(op.depth(), 1);
    }

    #[test]
    fn test_top_level_atom_rejected() {
        let err = parse(r#""loose""#).unwrap_err();
        assert!(matches!(err, Error::SyntaxError { position: 0, .. }));
    }

    #[test]
    fn test_unclosed_form() {
        let err = parse("(link a (collapse b)").unwrap_err();
        match err {
            Error::SyntaxError { position, message } => {
                assert_eq!(position, 0);
                assert!(message.contains("link"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_operator_must_be_symbol() {
        assert!(parse(r#"("collapse" a)"#).is_err());
        assert!(parse("()").is_err());
    }

    #[test]
    fn test_numbers() {
        let prog = parse("(collapse 7 -2 3.5)").unwrap();
        assert_eq!(prog[0].operands, vec![
            Operand::Atom(Atom::Int(7)),
            Operand::Atom(Atom::Int(-2)),
            Operand::Atom(Atom::Float { value: 3.5, lexeme: "3.5".into() }),
        ]);
    }

    #[test]
    fn test_nesting_cap() {
        let depth = MAX_NESTING - 1;
        let src = "(collapse ".repeat(depth + 1) + "x" + &")".repeat(depth + 1);
        assert_eq!(parse(&src).unwrap()[0].depth(), depth);

        let src = "(collapse ".repeat(depth + 2) + &")".repeat(depth + 2);
        match parse(&src).unwrap_err() {
            Error::SyntaxError { message, .. } => assert!(message.contains("nested deeper")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_runaway_nesting_is_an_error_on_a_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(|| {
                let src = "(collapse ".repeat(20_000) + &")".repeat(20_000);
                parse(&src).map(|prog| prog.len())
            })
            .unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::SyntaxError);
    }
}
