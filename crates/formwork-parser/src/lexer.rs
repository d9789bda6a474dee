//! Lexer/tokenizer for expression bodies.

use formwork_core::ParseError;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, map_res, opt, recognize, value},
    sequence::{pair, tuple},
    IResult,
};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(Punct),
}

/// Punctuation and operators.
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
    Colon,
    Semicolon,
    Question,
    Nullish,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

/// A token with the 1-based column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub column: usize,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => formwork_core::format_number(*n),
            Token::Str(s) => format!("'{}'", s),
            Token::Ident(name) => name.clone(),
            Token::Punct(p) => p.as_str().to_string(),
        }
    }
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::Comma => ",",
            Punct::Dot => ".",
            Punct::Colon => ":",
            Punct::Semicolon => ";",
            Punct::Question => "?",
            Punct::Nullish => "??",
            Punct::Arrow => "=>",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Bang => "!",
            Punct::StrictEq => "===",
            Punct::StrictNe => "!==",
            Punct::LooseEq => "==",
            Punct::LooseNe => "!=",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
        }
    }
}

/// Split an expression body into tokens.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let column = input.len() - rest.len() + 1;
        let first = rest.chars().next().unwrap_or_default();

        let (remaining, token) = if first == '\'' || first == '"' {
            let (remaining, s) = string_literal(rest, column)?;
            (remaining, Token::Str(s))
        } else if let Ok((remaining, n)) = number(rest) {
            (remaining, Token::Number(n))
        } else if let Ok((remaining, name)) = identifier(rest) {
            (remaining, Token::Ident(name.to_string()))
        } else if let Ok((remaining, p)) = punct(rest) {
            (remaining, Token::Punct(p))
        } else {
            return Err(ParseError::UnexpectedChar { found: first, column });
        };

        tokens.push(SpannedToken { token, column });
        rest = remaining.trim_start();
    }

    Ok(tokens)
}

/// Parse an identifier (starts with letter/underscore, followed by alphanumeric/underscore).
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse an unsigned number (integer, decimal, optional exponent).
pub fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse an operator or punctuation mark, longest match first.
pub fn punct(input: &str) -> IResult<&str, Punct> {
    alt((
        alt((
            value(Punct::StrictEq, tag("===")),
            value(Punct::StrictNe, tag("!==")),
            value(Punct::LooseEq, tag("==")),
            value(Punct::LooseNe, tag("!=")),
            value(Punct::Le, tag("<=")),
            value(Punct::Ge, tag(">=")),
            value(Punct::Arrow, tag("=>")),
            value(Punct::AndAnd, tag("&&")),
            value(Punct::OrOr, tag("||")),
            value(Punct::Nullish, tag("??")),
        )),
        map(one_of("()[]{},.:;?+-*/%!<>"), |c| match c {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            ',' => Punct::Comma,
            '.' => Punct::Dot,
            ':' => Punct::Colon,
            ';' => Punct::Semicolon,
            '?' => Punct::Question,
            '+' => Punct::Plus,
            '-' => Punct::Minus,
            '*' => Punct::Star,
            '/' => Punct::Slash,
            '%' => Punct::Percent,
            '!' => Punct::Bang,
            '<' => Punct::Lt,
            _ => Punct::Gt,
        }),
    ))(input)
}

/// Parse a single- or double-quoted string with JSON/JS escapes.
fn string_literal(input: &str, column: usize) -> Result<(&str, String), ParseError> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(ParseError::UnexpectedEof),
    };
    let mut out = String::new();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&input[i + c.len_utf8()..], out)),
            '\\' => {
                let escape_column = column + i;
                let Some((_, escaped)) = chars.next() else {
                    return Err(ParseError::UnterminatedString { column });
                };
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    '0' => out.push('\0'),
                    'u' => {
                        let unit = hex_unit(&mut chars, escape_column)?;
                        out.push(decode_utf16_escape(unit, &mut chars, escape_column)?);
                    }
                    '\\' | '\'' | '"' | '/' | '`' => out.push(escaped),
                    _ => return Err(ParseError::InvalidEscape { column: escape_column }),
                }
            }
            '\n' => return Err(ParseError::UnterminatedString { column }),
            _ => out.push(c),
        }
    }

    Err(ParseError::UnterminatedString { column })
}

fn hex_unit(chars: &mut std::str::CharIndices<'_>, column: usize) -> Result<u32, ParseError> {
    let mut unit = 0u32;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|(_, c)| c.to_digit(16))
            .ok_or(ParseError::InvalidEscape { column })?;
        unit = unit * 16 + digit;
    }
    Ok(unit)
}

/// Combine a `\uXXXX` escape with a following low surrogate when needed.
fn decode_utf16_escape(
    unit: u32,
    chars: &mut std::str::CharIndices<'_>,
    column: usize,
) -> Result<char, ParseError> {
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(unit).ok_or(ParseError::InvalidEscape { column });
    }
    let mut lookahead = chars.clone();
    if let (Some((_, '\\')), Some((_, 'u'))) = (lookahead.next(), lookahead.next()) {
        let low = hex_unit(&mut lookahead, column)?;
        if (0xDC00..0xE000).contains(&low) {
            *chars = lookahead;
            let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(combined).ok_or(ParseError::InvalidEscape { column });
        }
    }
    Err(ParseError::InvalidEscape { column })
}
