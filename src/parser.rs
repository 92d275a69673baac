//! # Recursive-Descent Parser
//!
//! Turns a pre-tokenized list into a [`Program`] AST. The parser consumes the
//! token stream with a single cursor and never rewinds more than one token
//! (LL(1) with precedence climbing in expressions), as specified in spec
//! §4.1. This, along with AST→IR→bytecode lowering and the VM, is one of the
//! three "hard core" components this crate implements faithfully: it defines
//! the language grammar and disambiguates operator precedence and block
//! nesting.

use crate::ast::{Expr, Program, Stmt};
use crate::error::Fault;
use crate::token::{Kind, Token};

/// Binary operator precedence table (spec §4.1). Higher binds tighter.
/// All levels are left-associative; the parser achieves this by recursing
/// into the right operand at `prec + 1`.
fn binary_prec(kind: Kind) -> Option<u8> {
    use Kind::*;
    Some(match kind {
        Or => 1,
        And => 2,
        EqEq | NotEq | Lt | Le | Gt | Ge => 3,
        Plus | Minus => 4,
        Star | Slash | Percent => 5,
        Caret => 6,
        _ => return None,
    })
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> Kind {
        self.tokens[self.pos].kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: Kind, what: &str) -> Result<Token, Fault> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            let found = self.peek().clone();
            Err(Fault::Parse {
                line: found.line,
                message: format!("Expected {} but found {:?} '{}'", what, found.kind, found.text),
            })
        }
    }

    /// Skip any run of `NEWLINE` tokens (statements are newline-terminated;
    /// blank lines between them are not meaningful).
    fn skip_newlines(&mut self) {
        while self.peek_kind() == Kind::Newline {
            self.advance();
        }
    }

    /// Entry point: parse an entire token stream into a `Program`.
    pub fn parse_program(tokens: Vec<Token>) -> Result<Program, Fault> {
        let mut parser = Parser::new(tokens);
        let mut stmts = Vec::new();
        parser.skip_newlines();
        while parser.peek_kind() != Kind::Eof {
            stmts.push(parser.parse_stmt()?);
            parser.skip_newlines();
        }
        Ok(Program { stmts })
    }

    /// Parse statements until the next token (without consuming it) matches
    /// one of `terminators`. Used for block bodies (`IF`/`WHILE`/`FOR`/...).
    fn parse_block(&mut self, terminators: &[Kind]) -> Result<Vec<Stmt>, Fault> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !terminators.contains(&self.peek_kind()) && self.peek_kind() != Kind::Eof {
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Fault> {
        let line = self.peek().line;
        match self.peek_kind() {
            Kind::Print => self.parse_print(),
            Kind::Let => self.parse_let(),
            Kind::If => self.parse_if(),
            Kind::While => self.parse_while(),
            Kind::Repeat => self.parse_repeat(),
            Kind::For => self.parse_for(),
            Kind::Input => self.parse_input(),
            Kind::Continue => {
                self.advance();
                Ok(Stmt::Continue { line })
            }
            Kind::Exit => {
                self.advance();
                Ok(Stmt::Exit { line })
            }
            _ => {
                let found = self.peek().clone();
                Err(Fault::Parse {
                    line: found.line,
                    message: format!("Expected statement but found {:?} '{}'", found.kind, found.text),
                })
            }
        }
    }

    fn parse_print(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // PRINT
        let mut exprs = Vec::new();
        // An empty PRINT (no expressions) is legal: "PRINT [ expr (',' expr)* ]".
        if !matches!(self.peek_kind(), Kind::Newline | Kind::Eof) {
            exprs.push(self.parse_expr()?);
            while self.peek_kind() == Kind::Comma {
                self.advance();
                exprs.push(self.parse_expr()?);
            }
        }
        Ok(Stmt::Print { exprs, line })
    }

    fn parse_let(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // LET
        let name_tok = self.expect(Kind::Ident, "identifier")?;
        let name = name_tok.text;
        if self.peek_kind() == Kind::LBracket {
            self.advance();
            let index = self.parse_expr()?;
            self.expect(Kind::RBracket, "']'")?;
            self.expect(Kind::Assign, "'='")?;
            let value = self.parse_expr()?;
            Ok(Stmt::AssignIndex { name, index, value, line })
        } else {
            self.expect(Kind::Assign, "'='")?;
            let expr = self.parse_expr()?;
            Ok(Stmt::Let { name, expr, line })
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // IF
        let cond = self.parse_expr()?;
        self.expect(Kind::Then, "THEN")?;
        let then_branch = self.parse_block(&[Kind::Else, Kind::End])?;
        let else_branch = if self.peek_kind() == Kind::Else {
            self.advance();
            Some(self.parse_block(&[Kind::End])?)
        } else {
            None
        };
        self.expect(Kind::End, "END")?;
        self.expect(Kind::If, "IF")?;
        Ok(Stmt::If { cond, then_branch, else_branch, line })
    }

    fn parse_while(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // WHILE
        let cond = self.parse_expr()?;
        let body = self.parse_block(&[Kind::Wend])?;
        self.expect(Kind::Wend, "WEND")?;
        Ok(Stmt::While { cond, body, line })
    }

    fn parse_repeat(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // REPEAT
        let body = self.parse_block(&[Kind::Until])?;
        self.expect(Kind::Until, "UNTIL")?;
        let cond = self.parse_expr()?;
        Ok(Stmt::Repeat { body, cond, line })
    }

    fn parse_for(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // FOR
        let var = self.expect(Kind::Ident, "identifier")?.text;
        self.expect(Kind::Assign, "'='")?;
        let from = self.parse_expr()?;
        self.expect(Kind::To, "TO")?;
        let to = self.parse_expr()?;
        let step = if self.peek_kind() == Kind::Step {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let body = self.parse_block(&[Kind::Next])?;
        self.expect(Kind::Next, "NEXT")?;
        // Optional trailing loop-variable name: "NEXT id?"
        if self.peek_kind() == Kind::Ident {
            self.advance();
        }
        Ok(Stmt::For { var, from, to, step, body, line })
    }

    fn parse_input(&mut self) -> Result<Stmt, Fault> {
        let line = self.advance().line; // INPUT
        let mut names = vec![self.expect(Kind::Ident, "identifier")?.text];
        while self.peek_kind() == Kind::Comma {
            self.advance();
            names.push(self.expect(Kind::Ident, "identifier")?.text);
        }
        Ok(Stmt::Input { names, line })
    }

    // --- Expressions: precedence climbing -----------------------------------

    fn parse_expr(&mut self) -> Result<Expr, Fault> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, Fault> {
        let mut left = self.parse_unary()?;
        loop {
            let kind = self.peek_kind();
            let prec = match binary_prec(kind) {
                Some(p) if p >= min_prec => p,
                _ => break,
            };
            let op_tok = self.advance();
            let op = op_tok.text.clone();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line: op_tok.line,
            };
        }
        Ok(left)
    }

    /// Unary `-` and `NOT` bind tighter than any binary operator and are
    /// right-recursive, so `-(-x)` is legal.
    fn parse_unary(&mut self) -> Result<Expr, Fault> {
        match self.peek_kind() {
            Kind::Minus => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: "-".to_string(), operand: Box::new(operand), line: tok.line })
            }
            Kind::Not => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: "NOT".to_string(), operand: Box::new(operand), line: tok.line })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Fault> {
        let tok = self.peek().clone();
        match tok.kind {
            Kind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Kind::RParen, "')'")?;
                Ok(inner)
            }
            Kind::Number => {
                self.advance();
                Ok(Expr::Number { text: tok.text, line: tok.line })
            }
            Kind::String => {
                self.advance();
                Ok(Expr::Str { text: tok.text, line: tok.line })
            }
            Kind::Len | Kind::Val | Kind::IsNan => {
                self.advance();
                let builtin = match tok.kind {
                    Kind::Len => "len",
                    Kind::Val => "val",
                    Kind::IsNan => "isnan",
                    _ => unreachable!(),
                }
                .to_string();
                self.expect(Kind::LParen, "'('")?;
                let mut args = Vec::new();
                if self.peek_kind() != Kind::RParen {
                    args.push(self.parse_expr()?);
                    while self.peek_kind() == Kind::Comma {
                        self.advance();
                        args.push(self.parse_expr()?);
                    }
                }
                self.expect(Kind::RParen, "')'")?;
                Ok(Expr::FuncCall { builtin, args, line: tok.line })
            }
            Kind::Array => {
                self.advance();
                self.expect(Kind::LParen, "'('")?;
                let size = self.parse_expr()?;
                self.expect(Kind::RParen, "')'")?;
                Ok(Expr::NewArray { size: Box::new(size), line: tok.line })
            }
            Kind::Ident => {
                self.advance();
                if self.peek_kind() == Kind::LBracket {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Kind::RBracket, "']'")?;
                    Ok(Expr::Index {
                        target: Box::new(Expr::Var { name: tok.text, line: tok.line }),
                        index: Box::new(index),
                        line: tok.line,
                    })
                } else {
                    Ok(Expr::Var { name: tok.text, line: tok.line })
                }
            }
            _ => Err(Fault::Parse {
                line: tok.line,
                message: format!("Expected expression but found {:?} '{}'", tok.kind, tok.text),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn parse(src: &str) -> Program {
        Parser::parse_program(tokenize(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_let_and_print() {
        let prog = parse("LET X = 2 + 3 * 4\nPRINT X\n");
        assert_eq!(prog.stmts.len(), 2);
    }

    #[test]
    fn precedence_climbs_left_associatively() {
        // 2 + 3 * 4 should parse as 2 + (3 * 4), not (2 + 3) * 4.
        let prog = parse("LET X = 2 + 3 * 4\n");
        if let Stmt::Let { expr, .. } = &prog.stmts[0] {
            if let Expr::Binary { op, right, .. } = expr {
                assert_eq!(op, "+");
                if let Expr::Binary { op: inner_op, .. } = right.as_ref() {
                    assert_eq!(inner_op, "*");
                } else {
                    panic!("expected nested multiplication");
                }
            } else {
                panic!("expected top-level addition");
            }
        } else {
            panic!("expected LET statement");
        }
    }

    #[test]
    fn double_unary_negation_is_legal() {
        let prog = parse("LET X = - -5\n");
        if let Stmt::Let { expr, .. } = &prog.stmts[0] {
            assert!(matches!(expr, Expr::Unary { .. }));
        } else {
            panic!("expected LET statement");
        }
    }

    #[test]
    fn unexpected_token_raises_parse_fault() {
        let toks = tokenize("LET X = \n").unwrap();
        let err = Parser::parse_program(toks).unwrap_err();
        assert!(matches!(err, Fault::Parse { .. }));
    }

    #[test]
    fn if_then_else_end_if_nests_blocks() {
        let prog = parse("IF X > 3 THEN\nPRINT \"big\"\nELSE\nPRINT \"small\"\nEND IF\n");
        assert_eq!(prog.stmts.len(), 1);
        assert!(matches!(prog.stmts[0], Stmt::If { .. }));
    }
}
