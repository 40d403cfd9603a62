//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Precedence, loosest first: `or`/`|`, `and`/`&`, `not`/`~`, comparisons
//! (chainable), postfix accessors and method calls, primaries.

use super::lexer::{tokenize, CmpOp, Spanned, Token};
use super::{QueryError, Value};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Expr {
    Literal(Value),
    /// Bare or backtick-quoted name: a column, falling back to a variable.
    Name(String),
    /// `@name`: a variable only.
    Var(String),
    List(Vec<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
    /// Series method such as `.isin(...)` or `.notna()`.
    Method {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    /// `.str.<name>(...)`, or `.str.<name>` without a call.
    StrMethod {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    StrIndex {
        target: Box<Expr>,
        index: i64,
    },
    StrSlice {
        target: Box<Expr>,
        start: Option<i64>,
        end: Option<i64>,
    },
}

/// Deepest bracket or `not` nesting accepted.
const MAX_DEPTH: usize = 64;

/// Most boolean operators and accessor calls accepted in one expression.
/// Keeps the left-leaning trees shallow enough to evaluate recursively.
const MAX_OPERATORS: usize = 256;

pub(super) fn parse(src: &str) -> Result<Expr, QueryError> {
    let tokens = tokenize(src)?;
    if tokens.len() == 1 {
        return Err(QueryError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        _ => Err(parser.error("unexpected trailing input")),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        let idx = self.pos.min(self.tokens.len() - 1);
        QueryError::Syntax {
            offset: self.tokens[idx].offset,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), QueryError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn descend(&mut self) -> Result<(), QueryError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn count_operator(&mut self) -> Result<(), QueryError> {
        if self.operators >= MAX_OPERATORS {
            return Err(self.error("expression too long"));
        }
        self.operators += 1;
        Ok(())
    }

    fn at_keyword(&self, ahead: usize, keyword: &str) -> bool {
        matches!(self.peek_at(ahead), Token::Ident(name) if name == keyword)
    }

    fn parse_or(&mut self) -> Result<Expr, QueryError> {
        self.descend()?;
        let expr = self.parse_or_chain();
        self.depth -= 1;
        expr
    }

    fn parse_or_chain(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_and()?;
        while self.at_keyword(0, "or") || *self.peek() == Token::Pipe {
            self.count_operator()?;
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_not()?;
        while self.at_keyword(0, "and") || *self.peek() == Token::Amp {
            self.count_operator()?;
            self.advance();
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, QueryError> {
        if self.at_keyword(0, "not") || *self.peek() == Token::Tilde {
            self.descend()?;
            self.advance();
            let inner = self.parse_not();
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner?)));
        }
        self.parse_comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek().clone() {
            Token::Cmp(op) => op,
            _ if self.at_keyword(0, "in") => CmpOp::In,
            _ if self.at_keyword(0, "not") && self.at_keyword(1, "in") => {
                self.advance();
                CmpOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<Expr, QueryError> {
        let first = self.parse_postfix()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            rest.push((op, self.parse_postfix()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, QueryError> {
        let mut expr = self.parse_primary()?;
        while *self.peek() == Token::Dot {
            self.count_operator()?;
            self.advance();
            let name = self.ident("attribute name after '.'")?;
            if name == "str" {
                expr = self.parse_str_accessor(expr)?;
                continue;
            }
            if *self.peek() != Token::LParen {
                return Err(self.error(format!("unsupported attribute '{}'", name)));
            }
            let (args, kwargs) = self.parse_call_args()?;
            expr = Expr::Method {
                target: Box::new(expr),
                name,
                args,
                kwargs,
            };
        }
        Ok(expr)
    }

    fn parse_str_accessor(&mut self, target: Expr) -> Result<Expr, QueryError> {
        let target = Box::new(target);
        match self.peek().clone() {
            Token::LBracket => {
                self.advance();
                let start = self.optional_int()?;
                if *self.peek() == Token::Colon {
                    self.advance();
                    let end = self.optional_int()?;
                    self.expect(Token::RBracket, "']'")?;
                    return Ok(Expr::StrSlice { target, start, end });
                }
                let index = start.ok_or_else(|| self.error("expected an index"))?;
                self.expect(Token::RBracket, "']'")?;
                Ok(Expr::StrIndex { target, index })
            }
            Token::Dot => {
                self.advance();
                let name = self.ident("string method name")?;
                let (args, kwargs) = if *self.peek() == Token::LParen {
                    self.parse_call_args()?
                } else {
                    (Vec::new(), Vec::new())
                };
                Ok(Expr::StrMethod {
                    target,
                    name,
                    args,
                    kwargs,
                })
            }
            _ => Err(self.error("expected '.' or '[' after .str")),
        }
    }

    fn optional_int(&mut self) -> Result<Option<i64>, QueryError> {
        let negative = if *self.peek() == Token::Minus {
            self.advance();
            true
        } else {
            false
        };
        match self.peek().clone() {
            Token::Num(n) if n.fract() == 0.0 => {
                self.advance();
                let n = n as i64;
                Ok(Some(if negative { -n } else { n }))
            }
            _ if negative => Err(self.error("expected an integer")),
            _ => Ok(None),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, QueryError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    #[allow(clippy::type_complexity)]
    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), QueryError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        while *self.peek() != Token::RParen {
            let is_kwarg =
                matches!(self.peek(), Token::Ident(_)) && *self.peek_at(1) == Token::Assign;
            if is_kwarg {
                let name = self.ident("keyword argument")?;
                self.advance();
                kwargs.push((name, self.parse_or()?));
            } else if kwargs.is_empty() {
                args.push(self.parse_or()?);
            } else {
                return Err(self.error("positional argument follows keyword argument"));
            }
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok((args, kwargs))
    }

    /// Comma-separated items up to `close`. The flag reports a trailing comma,
    /// which turns `(x,)` into a one-element tuple.
    fn parse_sequence(
        &mut self,
        close: Token,
        what: &str,
    ) -> Result<(Vec<Expr>, bool), QueryError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        while *self.peek() != close {
            items.push(self.parse_or()?);
            trailing_comma = *self.peek() == Token::Comma;
            if trailing_comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(close, what)?;
        Ok((items, trailing_comma))
    }

    fn parse_primary(&mut self) -> Result<Expr, QueryError> {
        match self.advance() {
            Token::Ident(name) => Ok(match name.as_str() {
                "True" | "true" => Expr::Literal(Value::Bool(true)),
                "False" | "false" => Expr::Literal(Value::Bool(false)),
                "None" => Expr::Literal(Value::Null),
                "and" | "or" | "not" | "in" => {
                    self.pos -= 1;
                    return Err(self.error(format!("unexpected keyword '{}'", name)));
                }
                _ => Expr::Name(name),
            }),
            Token::Quoted(name) => Ok(Expr::Name(name)),
            Token::At => Ok(Expr::Var(self.ident("variable name after '@'")?)),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Num(n) => Ok(Expr::Literal(Value::Num(n))),
            Token::Minus => match self.advance() {
                Token::Num(n) => Ok(Expr::Literal(Value::Num(-n))),
                _ => {
                    self.pos -= 1;
                    Err(self.error("expected a number after '-'"))
                }
            },
            Token::LParen => {
                let (mut items, trailing_comma) = self.parse_sequence(Token::RParen, "')'")?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Expr::List(items))
                }
            }
            Token::LBracket => Ok(Expr::List(self.parse_sequence(Token::RBracket, "']'")?.0)),
            Token::Eof => Err(self.error("unexpected end of expression")),
            _ => {
                self.pos -= 1;
                Err(self.error("unexpected token"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.into()))
    }

    fn string(s: &str) -> Expr {
        Expr::Literal(Value::Str(s.into()))
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("a == 'x' or b == 'y' and c == 'z'").unwrap();
        match expr {
            Expr::Or(_, right) => assert!(matches!(*right, Expr::And(_, _))),
            other => panic!("expected Or, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison() {
        let expr = parse("'a' < Start <= 'z'").unwrap();
        match expr {
            Expr::Compare { rest, .. } => {
                assert_eq!(rest.len(), 2);
                assert_eq!(rest[0].0, CmpOp::Lt);
                assert_eq!(rest[1].0, CmpOp::Le);
            }
            other => panic!("expected Compare, got {:?}", other),
        }
    }

    #[test]
    fn test_not_in() {
        let expr = parse("Sport not in ['Boxing', 'Football']").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                first: name("Sport"),
                rest: vec![(
                    CmpOp::NotIn,
                    Expr::List(vec![string("Boxing"), string("Football")])
                )],
            }
        );
    }

    #[test]
    fn test_str_method_with_kwargs() {
        let expr = parse("Title.str.contains('ksi', case=False)").unwrap();
        assert_eq!(
            expr,
            Expr::StrMethod {
                target: name("Title"),
                name: "contains".into(),
                args: vec![string("ksi")],
                kwargs: vec![("case".into(), Expr::Literal(Value::Bool(false)))],
            }
        );
    }

    #[test]
    fn test_str_slice_and_variable() {
        let expr = parse("Start.str[:10] == @current_date").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                first: Box::new(Expr::StrSlice {
                    target: name("Start"),
                    start: None,
                    end: Some(10),
                }),
                rest: vec![(CmpOp::Eq, Expr::Var("current_date".into()))],
            }
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse("   ").unwrap_err(), QueryError::Empty);
    }

    #[test]
    fn test_trailing_input_is_error() {
        assert!(matches!(
            parse("Sport == 'Boxing' Title").unwrap_err(),
            QueryError::Syntax { offset: 18, .. }
        ));
    }

    #[test]
    fn test_one_element_tuple() {
        assert_eq!(parse("('Boxing',)").unwrap(), Expr::List(vec![string("Boxing")]));
        assert_eq!(parse("('Boxing')").unwrap(), string("Boxing"));
        assert_eq!(parse("()").unwrap(), Expr::List(Vec::new()));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let src = format!("{}Sport == 'Boxing'{}", "(".repeat(20_000), ")".repeat(20_000));
        match parse(&src).unwrap_err() {
            QueryError::Syntax { message, .. } => assert_eq!(message, "expression nested too deeply"),
            other => panic!("expected Syntax, got {:?}", other),
        }
        let src = format!("{}Sport == 'Boxing'", "not ".repeat(20_000));
        assert!(matches!(parse(&src).unwrap_err(), QueryError::Syntax { .. }));

        let src = format!("{}Sport == 'Boxing'{}", "(".repeat(30), ")".repeat(30));
        assert!(parse(&src).is_ok());
    }

    #[test]
    fn test_long_boolean_chain_is_an_error() {
        let src = vec!["Sport == 'Boxing'"; 5_000].join(" or ");
        match parse(&src).unwrap_err() {
            QueryError::Syntax { message, .. } => assert_eq!(message, "expression too long"),
            other => panic!("expected Syntax, got {:?}", other),
        }
        let src = vec!["Sport == 'Boxing'"; 20].join(" or ");
        assert!(parse(&src).is_ok());
    }

    #[test]
    fn test_attribute_without_call_rejected() {
        assert!(matches!(
            parse("Start.dt").unwrap_err(),
            QueryError::Syntax { .. }
        ));
    }
}
