//! Grammar rules for expression bodies.
//!
//! The body is tokenized first, then parsed by a recursive-descent parser
//! with precedence climbing for binary operators.

use formwork_core::{
    ast::{BinaryOp, Expr, Literal, LogicalOp, Program, UnaryOp},
    format_number, ParseError,
};

use crate::lexer::{tokenize, Punct, SpannedToken, Token};

/// Maximum depth of the expression tree before parsing gives up.
///
/// Every sub-expression, unary operator, infix link and postfix step counts,
/// so long operator chains are bounded the same way as deep parentheses.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse a complete expression body.
pub fn parse(input: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser::new(&tokens);
    parser.parse_program()
}

/// Either kind of infix operator.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl Infix {
    fn precedence(self) -> u8 {
        match self {
            Infix::Binary(op) => op.precedence(),
            Infix::Logical(op) => op.precedence(),
        }
    }

    fn combine(self, left: Expr, right: Expr) -> Expr {
        match self {
            Infix::Binary(op) => Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            Infix::Logical(op) => Expr::Logical {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
        }
    }
}

/// Stateful parser that tracks position in the token list.
struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> Option<&'a SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<&'a SpannedToken> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn at_punct(&self, punct: Punct) -> bool {
        matches!(self.peek_at(0), Some(Token::Punct(p)) if *p == punct)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek_at(0), Some(Token::Ident(name)) if name == keyword)
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.at_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct) -> Result<(), ParseError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(punct.as_str()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) => ParseError::UnexpectedToken {
                found: t.token.describe(),
                expected: expected.to_string(),
                column: t.column,
            },
            None => ParseError::UnexpectedEof,
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Release the depth taken by `links` chained nodes.
    fn unwind(&mut self, links: usize) {
        self.depth -= links;
    }

    /// program := ["return"] expression [";"]
    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let explicit_return = self.at_keyword("return");
        if explicit_return {
            self.advance();
        }

        let body = self.parse_expression()?;
        self.eat(Punct::Semicolon);

        if self.current().is_some() {
            return Err(self.unexpected("end of expression"));
        }

        Ok(Program {
            body,
            explicit_return,
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = if self.at_arrow() {
            self.parse_arrow()
        } else {
            self.parse_conditional()
        };
        self.leave();
        expr
    }

    /// Whether the upcoming tokens start an arrow function.
    fn at_arrow(&self) -> bool {
        match self.peek_at(0) {
            Some(Token::Ident(_)) => matches!(self.peek_at(1), Some(Token::Punct(Punct::Arrow))),
            Some(Token::Punct(Punct::LParen)) => {
                let mut depth = 0usize;
                let mut offset = 0;
                while let Some(token) = self.peek_at(offset) {
                    match token {
                        Token::Punct(Punct::LParen) => depth += 1,
                        Token::Punct(Punct::RParen) => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(
                                    self.peek_at(offset + 1),
                                    Some(Token::Punct(Punct::Arrow))
                                );
                            }
                        }
                        _ => {}
                    }
                    offset += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// arrow := IDENT "=>" expression | "(" [IDENT {"," IDENT}] ")" "=>" expression
    fn parse_arrow(&mut self) -> Result<Expr, ParseError> {
        let mut params = Vec::new();

        if self.eat(Punct::LParen) {
            while !self.eat(Punct::RParen) {
                let column = self.current().map(|t| t.column).unwrap_or_default();
                match self.advance().map(|t| &t.token) {
                    Some(Token::Ident(name)) => params.push(name.clone()),
                    _ => return Err(ParseError::InvalidArrowParams { column }),
                }
                if !self.at_punct(Punct::RParen) {
                    self.expect(Punct::Comma)?;
                }
            }
        } else if let Some(Token::Ident(name)) = self.advance().map(|t| &t.token) {
            params.push(name.clone());
        }

        self.expect(Punct::Arrow)?;
        let body = self.parse_expression()?;

        Ok(Expr::Arrow {
            params,
            body: Box::new(body),
        })
    }

    /// conditional := binary ["?" expression ":" expression]
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_binary(1)?;
        if !self.eat(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.parse_expression()?;
        self.expect(Punct::Colon)?;
        let alternate = self.parse_expression()?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn peek_infix(&self) -> Option<Infix> {
        let Some(Token::Punct(p)) = self.peek_at(0) else {
            return None;
        };
        let infix = match p {
            Punct::Nullish => Infix::Logical(LogicalOp::Nullish),
            Punct::OrOr => Infix::Logical(LogicalOp::Or),
            Punct::AndAnd => Infix::Logical(LogicalOp::And),
            Punct::StrictEq => Infix::Binary(BinaryOp::StrictEq),
            Punct::StrictNe => Infix::Binary(BinaryOp::StrictNe),
            Punct::LooseEq => Infix::Binary(BinaryOp::LooseEq),
            Punct::LooseNe => Infix::Binary(BinaryOp::LooseNe),
            Punct::Lt => Infix::Binary(BinaryOp::Lt),
            Punct::Le => Infix::Binary(BinaryOp::Le),
            Punct::Gt => Infix::Binary(BinaryOp::Gt),
            Punct::Ge => Infix::Binary(BinaryOp::Ge),
            Punct::Plus => Infix::Binary(BinaryOp::Add),
            Punct::Minus => Infix::Binary(BinaryOp::Sub),
            Punct::Star => Infix::Binary(BinaryOp::Mul),
            Punct::Slash => Infix::Binary(BinaryOp::Div),
            Punct::Percent => Infix::Binary(BinaryOp::Rem),
            _ => return None,
        };
        Some(infix)
    }

    /// Precedence climbing over left-associative infix operators.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        let mut links = 0;

        while let Some(op) = self.peek_infix() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            // Each link deepens the left spine.
            self.enter()?;
            links += 1;
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = op.combine(left, right);
        }

        self.unwind(links);
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_at(0) {
            Some(Token::Punct(Punct::Bang)) => Some(UnaryOp::Not),
            Some(Token::Punct(Punct::Minus)) => Some(UnaryOp::Neg),
            Some(Token::Punct(Punct::Plus)) => Some(UnaryOp::Plus),
            Some(Token::Ident(name)) if name == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };

        let Some(op) = op else {
            return self.parse_postfix();
        };

        self.enter()?;
        self.advance();
        let operand = self.parse_unary();
        self.leave();

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    /// postfix := primary { "." IDENT | "[" expression "]" | "(" args ")" }
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut links = 0;

        loop {
            if matches!(
                self.peek_at(0),
                Some(Token::Punct(Punct::Dot | Punct::LBracket | Punct::LParen))
            ) {
                self.enter()?;
                links += 1;
            }

            if self.eat(Punct::Dot) {
                let property = match self.advance().map(|t| &t.token) {
                    Some(Token::Ident(name)) => name.clone(),
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected("property name"));
                    }
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat(Punct::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Punct::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat(Punct::LParen) {
                let args = self.parse_list(Punct::RParen)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                self.unwind(links);
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list(&mut self, close: Punct) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.parse_expression()?);
            if !self.at_punct(close) {
                self.expect(Punct::Comma)?;
            }
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(current) = self.current() else {
            return Err(ParseError::UnexpectedEof);
        };

        match &current.token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(*n)))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s.clone())))
            }
            Token::Ident(name) => {
                let expr = match name.as_str() {
                    "true" => Expr::Literal(Literal::Bool(true)),
                    "false" => Expr::Literal(Literal::Bool(false)),
                    "null" => Expr::Literal(Literal::Null),
                    "undefined" => Expr::Literal(Literal::Undefined),
                    "return" => return Err(self.unexpected("expression")),
                    _ => Expr::Ident(name.clone()),
                };
                self.advance();
                Ok(expr)
            }
            Token::Punct(Punct::LParen) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Punct::RParen)?;
                Ok(expr)
            }
            Token::Punct(Punct::LBracket) => {
                self.advance();
                Ok(Expr::Array(self.parse_list(Punct::RBracket)?))
            }
            Token::Punct(Punct::LBrace) => {
                self.advance();
                self.parse_object()
            }
            Token::Punct(_) => Err(self.unexpected("expression")),
        }
    }

    /// object := "{" [key ":" expression {"," key ":" expression}] [","] "}"
    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();

        while !self.eat(Punct::RBrace) {
            let key = match self.advance().map(|t| &t.token) {
                Some(Token::Ident(name)) => name.clone(),
                Some(Token::Str(s)) => s.clone(),
                Some(Token::Number(n)) => format_number(*n),
                _ => {
                    self.pos -= 1;
                    return Err(self.unexpected("property key"));
                }
            };
            self.expect(Punct::Colon)?;
            entries.push((key, self.parse_expression()?));
            if !self.at_punct(Punct::RBrace) {
                self.expect(Punct::Comma)?;
            }
        }

        Ok(Expr::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(input: &str) -> Expr {
        parse(input).unwrap().body
    }

    #[test]
    fn test_parse_precedence() {
        let expr = body("1 + 2 * 3");
        if let Expr::Binary { op, right, .. } = expr {
            assert_eq!(op, BinaryOp::Add);
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
        } else {
            panic!("Expected binary op");
        }
    }

    #[test]
    fn test_parse_left_associative_subtraction() {
        let expr = body("5 - 2 - 1");
        if let Expr::Binary { left, op, .. } = expr {
            assert_eq!(op, BinaryOp::Sub);
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
        } else {
            panic!("Expected binary op");
        }
    }

    #[test]
    fn test_parse_conditional_with_includes() {
        let expr = body("['toggle','range'].includes('x') ? 'false' : 'true'");
        if let Expr::Conditional { test, .. } = expr {
            assert!(matches!(*test, Expr::Call { .. }));
        } else {
            panic!("Expected conditional");
        }
    }

    #[test]
    fn test_parse_arrow_argument() {
        let expr = body("Object.values(x).map(i => i.toUpperCase())");
        if let Expr::Call { args, .. } = expr {
            assert_eq!(args.len(), 1);
            if let Expr::Arrow { params, .. } = &args[0] {
                assert_eq!(params, &vec!["i".to_string()]);
            } else {
                panic!("Expected arrow");
            }
        } else {
            panic!("Expected call");
        }
    }

    #[test]
    fn test_parse_parenthesized_arrow_params() {
        let expr = body("list.map((item, index) => index)");
        if let Expr::Call { args, .. } = expr {
            assert!(matches!(&args[0], Expr::Arrow { params, .. } if params.len() == 2));
        } else {
            panic!("Expected call");
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(body("(1 + 2) * 3"), Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_parse_json_object() {
        let expr = body(r#"{"category":"food","amount":12,"tags":["a"]}.category"#);
        if let Expr::Member { object, property } = expr {
            assert_eq!(property, "category");
            assert!(matches!(*object, Expr::Object(ref entries) if entries.len() == 3));
        } else {
            panic!("Expected member access");
        }
    }

    #[test]
    fn test_explicit_return() {
        let program = parse("return 1 + 1;").unwrap();
        assert!(program.explicit_return);
        assert!(matches!(program.body, Expr::Binary { .. }));
    }

    #[test]
    fn test_logical_binds_looser_than_equality() {
        let expr = body("a === 'x' || b !== 'y'");
        assert!(matches!(expr, Expr::Logical { op: LogicalOp::Or, .. }));
    }

    #[test]
    fn test_unbalanced_paren_is_error() {
        assert!(matches!(parse("("), Err(ParseError::UnexpectedEof)));
        assert!(parse("(1").is_err());
    }

    #[test]
    fn test_trailing_tokens_are_error() {
        assert!(matches!(
            parse("1 2"),
            Err(ParseError::UnexpectedToken { column: 3, .. })
        ));
    }

    #[test]
    fn test_empty_body() {
        assert!(matches!(parse("   "), Err(ParseError::Empty)));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH + 1), ")".repeat(MAX_NESTING_DEPTH + 1));
        assert!(matches!(parse(&deep), Err(ParseError::NestingTooDeep { .. })));
    }

    #[test]
    fn test_long_operator_chain_is_too_deep() {
        let chain = format!("{}1", "1 + ".repeat(10_000));
        assert!(matches!(parse(&chain), Err(ParseError::NestingTooDeep { .. })));

        let short = format!("{}1", "1 + ".repeat(100));
        assert!(parse(&short).is_ok());
    }

    #[test]
    fn test_long_member_chain_is_too_deep() {
        let chain = format!("x{}", ".length".repeat(10_000));
        assert!(matches!(parse(&chain), Err(ParseError::NestingTooDeep { .. })));

        let calls = format!("f{}", "()".repeat(10_000));
        assert!(matches!(parse(&calls), Err(ParseError::NestingTooDeep { .. })));
    }

    #[test]
    fn test_chains_release_depth() {
        // Many short sibling chains stay within the limit.
        let items = vec!["a.b.c + 1 * 2"; 500].join(", ");
        assert!(parse(&format!("[{}]", items)).is_ok());
    }

    #[test]
    fn test_typeof_and_negation() {
        assert!(matches!(body("typeof x"), Expr::Unary { op: UnaryOp::TypeOf, .. }));
        assert!(matches!(body("!-1"), Expr::Unary { op: UnaryOp::Not, .. }));
    }
}
