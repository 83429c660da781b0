use std::fmt;

use crate::expr::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Question,
    Colon,
    Coalesce,
    Not,
    NotEq,
    StrictNotEq,
    Eq,
    StrictEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    And,
    Or,
}

impl Punct {
    fn as_str(self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::Comma => ",",
            Punct::Dot => ".",
            Punct::Question => "?",
            Punct::Colon => ":",
            Punct::Coalesce => "??",
            Punct::Not => "!",
            Punct::NotEq => "!=",
            Punct::StrictNotEq => "!==",
            Punct::Eq => "==",
            Punct::StrictEq => "===",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::And => "&&",
            Punct::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(Punct),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Str(s) => write!(f, "string {s:?}"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Punct(p) => write!(f, "'{}'", p.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset in the source
    pub offset: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Split an expression source into tokens.
///
/// # Errors
///
/// Returns an `ExprError` for characters outside the grammar, unterminated
/// strings, or malformed numbers.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = if c.is_ascii_digit() {
            let mut end = offset;
            let mut seen_dot = false;
            let mut seen_exp = false;
            let mut prev = c;
            while let Some(&(i, d)) = chars.peek() {
                let accept = d.is_ascii_digit()
                    || (d == '.' && !seen_dot && !seen_exp)
                    || ((d == 'e' || d == 'E') && !seen_exp)
                    || ((d == '+' || d == '-') && (prev == 'e' || prev == 'E'));
                if !accept {
                    break;
                }
                seen_dot |= d == '.';
                seen_exp |= d == 'e' || d == 'E';
                prev = d;
                end = i + d.len_utf8();
                chars.next();
            }
            let text = &source[offset..end];
            let n = text
                .parse::<f64>()
                .map_err(|_| ExprError::InvalidNumber(text.to_string()))?;
            TokenKind::Number(n)
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, d)) = chars.next() {
                match d {
                    _ if d == c => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        let (_, escaped) = chars
                            .next()
                            .ok_or(ExprError::UnterminatedString(offset))?;
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                    }
                    other => value.push(other),
                }
            }
            if !closed {
                return Err(ExprError::UnterminatedString(offset));
            }
            TokenKind::Str(value)
        } else if is_ident_start(c) {
            let mut end = offset;
            while let Some(&(i, d)) = chars.peek() {
                if !is_ident_continue(d) {
                    break;
                }
                end = i + d.len_utf8();
                chars.next();
            }
            TokenKind::Ident(source[offset..end].to_string())
        } else {
            chars.next();
            let next = chars.peek().map(|&(_, d)| d);
            let (punct, extra) = match (c, next) {
                ('(', _) => (Punct::LParen, 0),
                (')', _) => (Punct::RParen, 0),
                ('[', _) => (Punct::LBracket, 0),
                (']', _) => (Punct::RBracket, 0),
                ('{', _) => (Punct::LBrace, 0),
                ('}', _) => (Punct::RBrace, 0),
                (',', _) => (Punct::Comma, 0),
                ('.', _) => (Punct::Dot, 0),
                (':', _) => (Punct::Colon, 0),
                ('?', Some('?')) => (Punct::Coalesce, 1),
                ('?', _) => (Punct::Question, 0),
                ('!', Some('=')) => (Punct::NotEq, 1),
                ('!', _) => (Punct::Not, 0),
                ('=', Some('=')) => (Punct::Eq, 1),
                ('<', Some('=')) => (Punct::Le, 1),
                ('<', _) => (Punct::Lt, 0),
                ('>', Some('=')) => (Punct::Ge, 1),
                ('>', _) => (Punct::Gt, 0),
                ('+', _) => (Punct::Plus, 0),
                ('-', _) => (Punct::Minus, 0),
                ('*', _) => (Punct::Star, 0),
                ('/', _) => (Punct::Slash, 0),
                ('%', _) => (Punct::Percent, 0),
                ('&', Some('&')) => (Punct::And, 1),
                ('|', Some('|')) => (Punct::Or, 1),
                _ => return Err(ExprError::UnexpectedChar { ch: c, offset }),
            };
            for _ in 0..extra {
                chars.next();
            }
            // `==` and `!=` take an optional third `=`
            let punct = match (punct, chars.peek().map(|&(_, d)| d)) {
                (Punct::Eq, Some('=')) => {
                    chars.next();
                    Punct::StrictEq
                }
                (Punct::NotEq, Some('=')) => {
                    chars.next();
                    Punct::StrictNotEq
                }
                (punct, _) => punct,
            };
            TokenKind::Punct(punct)
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("a === b !== c ?? d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct(Punct::StrictEq),
                TokenKind::Ident("b".into()),
                TokenKind::Punct(Punct::StrictNotEq),
                TokenKind::Ident("c".into()),
                TokenKind::Punct(Punct::Coalesce),
                TokenKind::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers_and_strings() {
        assert_eq!(
            kinds("1.5e2 'it\\'s' \"x\""),
            vec![
                TokenKind::Number(150.0),
                TokenKind::Str("it's".into()),
                TokenKind::Str("x".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_member_access() {
        assert_eq!(
            kinds("_.length"),
            vec![
                TokenKind::Ident("_".into()),
                TokenKind::Punct(Punct::Dot),
                TokenKind::Ident("length".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(matches!(
            tokenize("a = 1"),
            Err(ExprError::UnexpectedChar { ch: '=', .. })
        ));
        assert!(matches!(
            tokenize("'open"),
            Err(ExprError::UnterminatedString(0))
        ));
        assert!(matches!(tokenize("a # b"), Err(ExprError::UnexpectedChar { .. })));
    }
}
