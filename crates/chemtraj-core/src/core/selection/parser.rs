use super::SelectionError;
use super::expr::{Comparison, Expr, NumericField, TextField};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Compare(Comparison),
    Word(String),
    Quoted(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    pos: usize,
}

fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | '"' | '=' | '!' | '<' | '>')
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, SelectionError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (pos, ch) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let (token, width) = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '=' if next == Some('=') => (Token::Compare(Comparison::Equal), 2),
            '!' if next == Some('=') => (Token::Compare(Comparison::NotEqual), 2),
            '<' if next == Some('=') => (Token::Compare(Comparison::LessEqual), 2),
            '>' if next == Some('=') => (Token::Compare(Comparison::GreaterEqual), 2),
            '<' => (Token::Compare(Comparison::Less), 1),
            '>' => (Token::Compare(Comparison::Greater), 1),
            '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&(_, c)| c == '"')
                    .ok_or(SelectionError::UnclosedQuote { pos })?;
                let value: String = chars[i + 1..i + 1 + end].iter().map(|&(_, c)| c).collect();
                (Token::Quoted(value), end + 2)
            }
            c if is_word_char(c) => {
                let length = chars[i..]
                    .iter()
                    .take_while(|&&(_, c)| is_word_char(c))
                    .count();
                let word: String = chars[i..i + length].iter().map(|&(_, c)| c).collect();
                (Token::Word(word), length)
            }
            c => return Err(SelectionError::UnexpectedChar { pos, ch: c }),
        };
        tokens.push(Spanned { token, pos });
        i += width;
    }
    Ok(tokens)
}

/// Recursive descent over `or` < `and` < `not` < primaries.
struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |spanned| spanned.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(word)) if word == keyword)
    }

    fn expected(&self, what: &str) -> SelectionError {
        SelectionError::Expected {
            pos: self.position(),
            what: what.to_string(),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.parse_and()?;
        while self.at_keyword("or") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.parse_not()?;
        while self.at_keyword("and") {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, SelectionError> {
        if self.at_keyword("not") {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SelectionError> {
        let pos = self.position();
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(SelectionError::UnmatchedParen { pos }),
                }
            }
            Some(Token::Word(word)) => match word.as_str() {
                "all" => Ok(Expr::All),
                "none" => Ok(Expr::None),
                other => {
                    if let Some(field) = TextField::from_keyword(other) {
                        self.parse_text(field)
                    } else if let Some(field) = NumericField::from_keyword(other) {
                        self.parse_numeric(field)
                    } else {
                        Err(SelectionError::UnknownSelector {
                            pos,
                            name: other.to_string(),
                        })
                    }
                }
            },
            Some(Token::RParen) => Err(SelectionError::UnmatchedParen { pos }),
            _ => Err(SelectionError::Expected {
                pos,
                what: "a selector".to_string(),
            }),
        }
    }

    /// `name H1 H2`, `name == H1` or `name != H1`.
    fn parse_text(&mut self, field: TextField) -> Result<Expr, SelectionError> {
        let equal = match self.peek() {
            Some(Token::Compare(Comparison::Equal)) => {
                self.pos += 1;
                Some(true)
            }
            Some(Token::Compare(Comparison::NotEqual)) => {
                self.pos += 1;
                Some(false)
            }
            Some(Token::Compare(_)) => {
                return Err(self.expected("'==' or '!=' after a string selector"));
            }
            _ => None,
        };

        let mut values = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Quoted(value)) => values.push(value.clone()),
                Some(Token::Word(word)) if !is_keyword(word) => values.push(word.clone()),
                _ => break,
            }
            self.pos += 1;
            if equal.is_some() {
                break;
            }
        }
        if values.is_empty() {
            return Err(self.expected("a value"));
        }
        Ok(Expr::Text {
            field,
            equal: equal.unwrap_or(true),
            values,
        })
    }

    /// `mass > 12`, or `index 3` as a shorthand for `index == 3`.
    fn parse_numeric(&mut self, field: NumericField) -> Result<Expr, SelectionError> {
        let comparison = match self.peek() {
            Some(Token::Compare(comparison)) => {
                let comparison = *comparison;
                self.pos += 1;
                comparison
            }
            _ => Comparison::Equal,
        };
        let pos = self.position();
        let value = match self.advance() {
            Some(Token::Word(word)) => word
                .parse::<f64>()
                .map_err(|_| SelectionError::InvalidNumber { pos, value: word })?,
            _ => return Err(SelectionError::Expected {
                pos,
                what: "a number".to_string(),
            }),
        };
        Ok(Expr::Numeric {
            field,
            comparison,
            value,
        })
    }
}

fn is_keyword(word: &str) -> bool {
    matches!(word, "and" | "or" | "not")
}

pub(super) fn parse(input: &str) -> Result<Expr, SelectionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SelectionError::EmptyInput);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.expected("'and', 'or' or the end of the selection"));
    }
    Ok(expr)
}
