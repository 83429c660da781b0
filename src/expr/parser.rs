//! Recursive-descent parser for rule expressions.
//!
//! Precedence, lowest to highest:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | conditional | `a ? b : c` |
//! | coalesce | `??` |
//! | or | `\|\|` |
//! | and | `&&` |
//! | equality | `== != === !==` |
//! | comparison | `< <= > >=` |
//! | additive | `+ -` |
//! | multiplicative | `* / %` |
//! | unary | `! - +` |
//! | postfix | `.name`, `[expr]`, `name(args)` |

use serde_json::Value;

use crate::core::value::number_value;
use crate::expr::lexer::{Punct, Token, TokenKind};
use crate::expr::ExprError;
use crate::utils::validation::{ValidationError, MAX_EXPRESSION_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Identifier(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    Call {
        function: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

/// Parse a token stream into a single expression.
///
/// # Errors
///
/// Returns an `ExprError` if the tokens do not form exactly one expression, or
/// if nesting exceeds [`MAX_EXPRESSION_DEPTH`]. Operator and postfix chains
/// count toward the nesting: `a + b + c` is two levels deep.
pub fn parse(tokens: &[Token]) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            found: token.kind.to_string(),
            expected: "end of expression".to_string(),
            offset: token.offset,
        });
    }
    check_tree_depth(&expr)?;
    Ok(expr)
}

/// Walk the tree without recursion and reject it if any node sits deeper than
/// [`MAX_EXPRESSION_DEPTH`]. Evaluation recurses once per level.
fn check_tree_depth(root: &Expr) -> Result<(), ExprError> {
    let mut pending = vec![(root, 1usize)];
    while let Some((expr, depth)) = pending.pop() {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(ValidationError::ExpressionTooDeep.into());
        }
        let next = depth + 1;
        match expr {
            Expr::Literal(_) | Expr::Identifier(_) => {}
            Expr::Array(items) | Expr::Call { args: items, .. } => {
                pending.extend(items.iter().map(|item| (item, next)));
            }
            Expr::Object(entries) => {
                pending.extend(entries.iter().map(|(_, value)| (value, next)));
            }
            Expr::Unary { operand, .. } => pending.push((&**operand, next)),
            Expr::Member { object, property } => {
                pending.extend([(&**object, next), (&**property, next)]);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                pending.extend([(&**left, next), (&**right, next)]);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                pending.extend([(&**test, next), (&**consequent, next), (&**alternate, next)]);
            }
        }
    }
    Ok(())
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self) -> Option<Punct> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Punct(p),
                ..
            }) => Some(*p),
            _ => None,
        }
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct, expected: &str) -> Result<(), ExprError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        match self.peek() {
            Some(token) => ExprError::UnexpectedToken {
                found: token.kind.to_string(),
                expected: expected.to_string(),
                offset: token.offset,
            },
            None => ExprError::UnexpectedEnd(expected.to_string()),
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(ValidationError::ExpressionTooDeep.into());
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let expr = self.conditional();
        self.depth -= 1;
        expr
    }

    fn conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.coalesce()?;
        if !self.eat(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect(Punct::Colon, "':'")?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn logical_chain(
        &mut self,
        punct: Punct,
        op: LogicalOp,
        next: fn(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        let mut left = next(self)?;
        while self.eat(punct) {
            let right = next(self)?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn coalesce(&mut self) -> Result<Expr, ExprError> {
        self.logical_chain(Punct::Coalesce, LogicalOp::Coalesce, Self::or)
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        self.logical_chain(Punct::Or, LogicalOp::Or, Self::and)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        self.logical_chain(Punct::And, LogicalOp::And, Self::equality)
    }

    fn binary_chain(
        &mut self,
        ops: &[(Punct, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        let mut left = next(self)?;
        loop {
            let Some(op) = self
                .peek_punct()
                .and_then(|p| ops.iter().find(|(q, _)| *q == p).map(|(_, op)| *op))
            else {
                return Ok(left);
            };
            self.pos += 1;
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn equality(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(
            &[
                (Punct::Eq, BinaryOp::Eq),
                (Punct::StrictEq, BinaryOp::Eq),
                (Punct::NotEq, BinaryOp::NotEq),
                (Punct::StrictNotEq, BinaryOp::NotEq),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(
            &[
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Le, BinaryOp::Le),
                (Punct::Gt, BinaryOp::Gt),
                (Punct::Ge, BinaryOp::Ge),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(
            &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek_punct() {
            Some(Punct::Not) => UnaryOp::Not,
            Some(Punct::Minus) => UnaryOp::Neg,
            Some(Punct::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(Punct::Dot) {
                let name = match self.peek() {
                    Some(Token {
                        kind: TokenKind::Ident(name),
                        ..
                    }) => name.clone(),
                    _ => return Err(self.unexpected("a property name")),
                };
                self.pos += 1;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::Literal(Value::String(name))),
                };
            } else if self.eat(Punct::LBracket) {
                let property = self.expression()?;
                self.expect(Punct::RBracket, "']'")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(property),
                };
            } else if self.peek_punct() == Some(Punct::LParen) {
                let Expr::Identifier(function) = expr else {
                    return Err(ExprError::InvalidCall(self.peek().map_or(0, |t| t.offset)));
                };
                self.pos += 1;
                let args = self.list(Punct::RParen, "')'")?;
                expr = Expr::Call { function, args };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`. Trailing commas are allowed.
    fn list(&mut self, close: Punct, expected: &str) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(Punct::Comma) {
                self.expect(close, expected)?;
                break;
            }
        }
        Ok(items)
    }

    fn object(&mut self) -> Result<Expr, ExprError> {
        let mut entries = Vec::new();
        while !self.eat(Punct::RBrace) {
            let key = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Ident(name) | TokenKind::Str(name)) => name.clone(),
                Some(TokenKind::Number(n)) => crate::core::value::format_number(*n),
                _ => return Err(self.unexpected("a property key")),
            };
            self.pos += 1;
            self.expect(Punct::Colon, "':'")?;
            entries.push((key, self.expression()?));
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RBrace, "'}'")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let Some(token) = self.peek() else {
            return Err(ExprError::UnexpectedEnd("an expression".to_string()));
        };
        self.pos += 1;
        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(number_value(*n))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s.clone()))),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Identifier(name.clone()),
            }),
            TokenKind::Punct(Punct::LParen) => {
                let expr = self.expression()?;
                self.expect(Punct::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => {
                self.enter()?;
                let items = self.list(Punct::RBracket, "']'");
                self.depth -= 1;
                Ok(Expr::Array(items?))
            }
            TokenKind::Punct(Punct::LBrace) => {
                self.enter()?;
                let object = self.object();
                self.depth -= 1;
                object
            }
            TokenKind::Punct(_) => {
                self.pos -= 1;
                Err(self.unexpected("an expression"))
            }
        }
    }
}
