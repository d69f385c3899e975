// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recursive-descent parser.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | IDENT '(' args ')' | IDENT | '(' expr ')'
//! args    := expr (',' expr)*
//! ```

use super::FormulaError;
use super::builtins::Builtin;
use super::lexer::Token;

/// Nesting limit; deeper input is rejected instead of recursing further.
const MAX_DEPTH: usize = 64;

/// Limit on tree nodes. Operator chains build left-deep trees, so this also
/// bounds the depth seen by evaluation and drop.
const MAX_NODES: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Self>),
    Binary(BinOp, Box<Self>, Box<Self>),
    Call(Builtin, Vec<Self>),
}

pub(crate) fn parse(tokens: &[Token]) -> Result<Expr, FormulaError> {
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nodes: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FormulaError::Unexpected(describe(token))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), FormulaError> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(FormulaError::Unexpected(describe(t))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(FormulaError::TooDeep)
        } else {
            Ok(())
        }
    }

    fn grow(&mut self, expr: Expr) -> Result<Expr, FormulaError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            Err(FormulaError::TooLarge)
        } else {
            Ok(expr)
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        self.descend()?;
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = self.grow(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))?;
        }
        self.depth -= 1;
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = self.grow(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(&Token::Minus) {
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return self.grow(Expr::Neg(Box::new(inner)));
        }
        if self.eat(&Token::Plus) {
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(inner);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let expr = self.operand()?;
        self.grow(expr)
    }

    fn operand(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::Ident(name)) => {
                let name = name.clone();
                if self.eat(&Token::LParen) {
                    let func = Builtin::from_name(&name)
                        .ok_or(FormulaError::UnknownFunction(name))?;
                    let args = self.args()?;
                    func.check_arity(args.len())?;
                    Ok(Expr::Call(func, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(t) => Err(FormulaError::Unexpected(describe(t))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(args);
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {n}"),
        Token::Ident(name) => format!("identifier `{name}`"),
        Token::Plus => "`+`".into(),
        Token::Minus => "`-`".into(),
        Token::Star => "`*`".into(),
        Token::Slash => "`/`".into(),
        Token::Percent => "`%`".into(),
        Token::LParen => "`(`".into(),
        Token::RParen => "`)`".into(),
        Token::Comma => "`,`".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::lexer::tokenize;

    fn parse_str(src: &str) -> Result<Expr, FormulaError> {
        parse(&tokenize(src)?)
    }

    #[test]
    fn precedence_and_associativity() {
        let expr = parse_str("1 - 2 - 3 * 4").unwrap();
        // (1 - 2) - (3 * 4)
        let expected = Expr::Binary(
            BinOp::Sub,
            Box::new(Expr::Binary(
                BinOp::Sub,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Number(2.0)),
            )),
            Box::new(Expr::Binary(
                BinOp::Mul,
                Box::new(Expr::Number(3.0)),
                Box::new(Expr::Number(4.0)),
            )),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn calls_resolve_at_parse_time() {
        assert!(matches!(
            parse_str("round(x)").unwrap(),
            Expr::Call(Builtin::Round, args) if args.len() == 1
        ));
        assert_eq!(
            parse_str("alert(1)"),
            Err(FormulaError::UnknownFunction("alert".into()))
        );
        assert_eq!(
            parse_str("round(1, 2)"),
            Err(FormulaError::Arity {
                name: "round",
                got: 2
            })
        );
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse_str(""), Err(FormulaError::Empty));
        assert_eq!(parse_str("   "), Err(FormulaError::Empty));
        assert_eq!(parse_str("(1 + 2"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(parse_str("1 2"), Err(FormulaError::Unexpected(_))));
        assert!(matches!(parse_str("2x"), Err(FormulaError::Unexpected(_))));
        assert!(matches!(parse_str("1 +"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(parse_str(")"), Err(FormulaError::Unexpected(_))));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let src = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse_str(&src), Err(FormulaError::TooDeep));
        let negs = format!("{}1", "-".repeat(200));
        assert_eq!(parse_str(&negs), Err(FormulaError::TooDeep));
    }

    #[test]
    fn long_operator_chains_are_rejected() {
        let sum = vec!["1"; 10_000].join("+");
        assert_eq!(parse_str(&sum), Err(FormulaError::TooLarge));
        let product = vec!["x"; 10_000].join(" * ");
        assert_eq!(parse_str(&product), Err(FormulaError::TooLarge));
        let short = vec!["1"; 100].join("+");
        assert!(parse_str(&short).is_ok(), "ordinary formulas stay well under the limit");
    }
}
