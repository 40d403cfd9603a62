//! Tokenizer for filter expressions.

use super::QueryError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Ident(String),
    /// A backtick-quoted column name.
    Quoted(String),
    Str(String),
    Num(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    At,
    Assign,
    Amp,
    Pipe,
    Tilde,
    Minus,
    Cmp(CmpOp),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CmpOp {
    pub(super) fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(super) fn tokenize(src: &str) -> Result<Vec<Spanned>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match ch {
            '(' => single(&mut chars, Token::LParen),
            ')' => single(&mut chars, Token::RParen),
            '[' => single(&mut chars, Token::LBracket),
            ']' => single(&mut chars, Token::RBracket),
            ',' => single(&mut chars, Token::Comma),
            '.' if !next_is_digit(src, offset) => single(&mut chars, Token::Dot),
            ':' => single(&mut chars, Token::Colon),
            '@' => single(&mut chars, Token::At),
            '&' => single(&mut chars, Token::Amp),
            '|' => single(&mut chars, Token::Pipe),
            '~' => single(&mut chars, Token::Tilde),
            '-' => single(&mut chars, Token::Minus),
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = matches!(chars.peek(), Some(&(_, '=')));
                if followed_by_eq {
                    chars.next();
                }
                match (ch, followed_by_eq) {
                    ('=', true) => Token::Cmp(CmpOp::Eq),
                    ('=', false) => Token::Assign,
                    ('!', true) => Token::Cmp(CmpOp::Ne),
                    ('<', true) => Token::Cmp(CmpOp::Le),
                    ('<', false) => Token::Cmp(CmpOp::Lt),
                    ('>', true) => Token::Cmp(CmpOp::Ge),
                    ('>', false) => Token::Cmp(CmpOp::Gt),
                    _ => return Err(QueryError::UnexpectedChar { ch, offset }),
                }
            }
            '\'' | '"' => {
                chars.next();
                Token::Str(read_string(&mut chars, ch, offset)?)
            }
            '`' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '`')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(QueryError::UnterminatedString(offset)),
                    }
                }
                Token::Quoted(name)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut text = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' || c == '_' {
                        if c != '_' {
                            text.push(c);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = text.parse::<f64>().map_err(|_| QueryError::Syntax {
                    offset,
                    message: format!("invalid number '{}'", text),
                })?;
                Token::Num(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(ident)
            }
            _ => return Err(QueryError::UnexpectedChar { ch, offset }),
        };
        tokens.push(Spanned { token, offset });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: src.len(),
    });
    Ok(tokens)
}

fn single(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, token: Token) -> Token {
    chars.next();
    token
}

fn next_is_digit(src: &str, offset: usize) -> bool {
    src[offset + 1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, QueryError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            Some((_, c)) if c == quote => return Ok(out),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, c)) => out.push(c),
                None => return Err(QueryError::UnterminatedString(start)),
            },
            Some((_, c)) => out.push(c),
            None => return Err(QueryError::UnterminatedString(start)),
        }
    }
}
