use super::ast::{CompareOp, DatetimeLiteral, DatetimePrecision};
use super::error::FilterError;
use chrono::{NaiveDate, NaiveTime};

const KIB: i64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Regex(String),
    Int(i64),
    /// Byte count after `KB`/`MB`/`GB` expansion
    Size(i64),
    Datetime(DatetimeLiteral),
    Compare(CompareOp),
    And,
    Or,
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

/// A lexed token with the text reported in diagnostics and its byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text, except string literals which carry their unquoted content
    pub text: String,
    pub position: usize,
}

/// On-demand tokenizer; the parser pulls one token at a time
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Result<Token, FilterError> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(c) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        match c {
            '\'' | '"' => self.lex_string(start, false),
            c if is_ident_start(c) => {
                let word = self.take_while(is_ident_continue);
                if word == "r" && matches!(self.peek(), Some('\'' | '"')) {
                    return self.lex_string(start, true);
                }
                let kind = match word {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    _ => TokenKind::Ident(word.to_string()),
                };
                Ok(self.token(kind, start))
            }
            c if c.is_ascii_digit() => self.lex_number(start),
            '.' => {
                self.bump();
                Err(self.incomplete())
            }
            '=' => {
                self.bump();
                self.eat('=');
                Ok(self.token(TokenKind::Compare(CompareOp::Eq), start))
            }
            '!' => {
                self.bump();
                if !self.eat('=') {
                    return Err(FilterError::unexpected("!", start));
                }
                Ok(self.token(TokenKind::Compare(CompareOp::Ne), start))
            }
            '>' | '<' => {
                self.bump();
                let op = match (c, self.eat('=')) {
                    ('>', true) => CompareOp::Ge,
                    ('>', false) => CompareOp::Gt,
                    (_, true) => CompareOp::Le,
                    (_, false) => CompareOp::Lt,
                };
                Ok(self.token(TokenKind::Compare(op), start))
            }
            '&' | '|' => {
                self.bump();
                if !self.eat(c) {
                    return Err(FilterError::unexpected(c.to_string(), start));
                }
                let kind = if c == '&' {
                    TokenKind::And
                } else {
                    TokenKind::Or
                };
                Ok(self.token(kind, start))
            }
            '+' | '-' | '*' | '/' => {
                self.bump();
                let kind = match c {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    _ => TokenKind::Slash,
                };
                Ok(self.token(kind, start))
            }
            other => Err(FilterError::unexpected(other.to_string(), start)),
        }
    }

    fn lex_string(&mut self, start: usize, regex: bool) -> Result<Token, FilterError> {
        let Some(quote) = self.bump() else {
            return Err(FilterError::eof(self.pos));
        };
        let mut content = String::new();

        loop {
            match self.bump() {
                None => return Err(FilterError::eof(self.pos)),
                Some('\\') => match self.peek() {
                    Some(next) if next == quote => {
                        self.bump();
                        content.push(quote);
                    }
                    Some('\\') => {
                        self.bump();
                        content.push_str("\\\\");
                    }
                    _ => content.push('\\'),
                },
                Some(c) if c == quote => break,
                Some(c) => content.push(c),
            }
        }

        let kind = if regex {
            TokenKind::Regex(content.clone())
        } else {
            TokenKind::Str(content.clone())
        };
        Ok(Token {
            kind,
            text: content,
            position: start,
        })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, FilterError> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        let value: i64 = digits
            .parse()
            .map_err(|_| FilterError::Arithmetic(format!("integer {} is out of range", digits)))?;

        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            return self.lex_datetime(start, value);
        }

        if self.peek().is_some_and(is_ident_start) {
            let suffix_start = self.pos;
            let suffix = self.take_while(is_ident_continue);
            let multiplier = match suffix {
                "KB" => KIB,
                "MB" => KIB * KIB,
                "GB" => KIB * KIB * KIB,
                _ => return Err(FilterError::unexpected(suffix, suffix_start)),
            };
            let bytes = value.checked_mul(multiplier).ok_or_else(|| {
                FilterError::Arithmetic(format!("{}{} overflows", value, suffix))
            })?;
            return Ok(self.token(TokenKind::Size(bytes), start));
        }

        Ok(self.token(TokenKind::Int(value), start))
    }

    /// `YYYY.MM`, `YYYY.MM.DD`, `YYYY.MM.DD HH:MM` or `YYYY.MM.DD HH:MM:SS`
    fn lex_datetime(&mut self, start: usize, year: i64) -> Result<Token, FilterError> {
        self.bump();
        let month = self.component()?;
        let mut day = 1;
        let (mut hour, mut minute, mut second) = (0, 0, 0);
        let mut precision = DatetimePrecision::Month;

        if self.eat('.') {
            day = self.component()?;
            precision = DatetimePrecision::Day;

            if self.time_follows() {
                self.skip_whitespace();
                hour = self.component()?;
                self.bump();
                minute = self.component()?;
                precision = DatetimePrecision::Minute;
                if self.eat(':') {
                    second = self.component()?;
                    precision = DatetimePrecision::Second;
                }
            }
        }

        let text = &self.input[start..self.pos];
        let instant = i32::try_from(year)
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, month, day))
            .zip(NaiveTime::from_hms_opt(hour, minute, second))
            .map(|(date, time)| date.and_time(time))
            .ok_or_else(|| FilterError::unexpected(text, start))?;

        let literal = DatetimeLiteral {
            instant,
            precision,
            text: text.to_string(),
        };
        Ok(self.token(TokenKind::Datetime(literal), start))
    }

    /// Digits of one datetime component; anything else is an incomplete token
    fn component(&mut self) -> Result<u32, FilterError> {
        let start = self.pos;
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.incomplete());
        }
        digits
            .parse()
            .map_err(|_| FilterError::unexpected(digits, start))
    }

    /// Whitespace followed by `HH:` after a full date
    fn time_follows(&self) -> bool {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() {
            return false;
        }
        let hour_len = trimmed
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .count();
        hour_len > 0 && trimmed[hour_len..].starts_with(':')
    }

    /// Error for a token cut short: names the character that broke it, or EOF
    fn incomplete(&self) -> FilterError {
        match self.peek() {
            Some(c) => FilterError::unexpected(c.to_string(), self.pos),
            None => FilterError::eof(self.pos),
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            text: self.input[start..self.pos].to_string(),
            position: start,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize a whole expression; the last token is always `Eof`
pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("valid input")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn error(input: &str) -> String {
        tokenize(input).expect_err("invalid input").to_string()
    }

    #[test]
    fn test_operators_and_connectives() {
        assert_eq!(
            kinds("a == b = c != d >= e <= f > g < h and i && j or k || l"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Compare(CompareOp::Eq),
                TokenKind::Ident("b".into()),
                TokenKind::Compare(CompareOp::Eq),
                TokenKind::Ident("c".into()),
                TokenKind::Compare(CompareOp::Ne),
                TokenKind::Ident("d".into()),
                TokenKind::Compare(CompareOp::Ge),
                TokenKind::Ident("e".into()),
                TokenKind::Compare(CompareOp::Le),
                TokenKind::Ident("f".into()),
                TokenKind::Compare(CompareOp::Gt),
                TokenKind::Ident("g".into()),
                TokenKind::Compare(CompareOp::Lt),
                TokenKind::Ident("h".into()),
                TokenKind::And,
                TokenKind::Ident("i".into()),
                TokenKind::And,
                TokenKind::Ident("j".into()),
                TokenKind::Or,
                TokenKind::Ident("k".into()),
                TokenKind::Or,
                TokenKind::Ident("l".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_size_suffixes_expand_at_lex_time() {
        assert_eq!(
            kinds("3KB 10MB 11GB"),
            vec![
                TokenKind::Size(3 * 1024),
                TokenKind::Size(10 * 1024 * 1024),
                TokenKind::Size(11 * 1024 * 1024 * 1024),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_size_suffix_is_case_sensitive() {
        assert_eq!(error("3kb"), "Syntax error at 'kb'");
        assert_eq!(error("3Mb"), "Syntax error at 'Mb'");
        assert_eq!(error("0b"), "Syntax error at 'b'");
    }

    #[test]
    fn test_regex_prefix() {
        assert_eq!(
            kinds(r"r'test\.*mp4' 'plain'"),
            vec![
                TokenKind::Regex(r"test\.*mp4".into()),
                TokenKind::Str("plain".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("rr'x'"),
            vec![
                TokenKind::Ident("rr".into()),
                TokenKind::Str("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        assert_eq!(
            kinds(r"'it\'s' 'a\\b'"),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str(r"a\\b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unicode_string_content() {
        assert_eq!(
            kinds("r'.*#中文.*'"),
            vec![TokenKind::Regex(".*#中文.*".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_is_eof() {
        assert_eq!(error("'abc"), "Syntax error at EOF");
    }

    #[test]
    fn test_datetime_precisions() {
        let tokens = tokenize("2022.03 2022.03.04 2022.03.04 14:50 2022.03.04 14:50:15")
            .expect("valid datetimes");
        let literals: Vec<(String, DatetimePrecision)> = tokens
            .into_iter()
            .filter_map(|t| match t.kind {
                TokenKind::Datetime(dt) => Some((dt.instant.to_string(), dt.precision)),
                _ => None,
            })
            .collect();
        assert_eq!(
            literals,
            vec![
                ("2022-03-01 00:00:00".to_string(), DatetimePrecision::Month),
                ("2022-03-04 00:00:00".to_string(), DatetimePrecision::Day),
                ("2022-03-04 14:50:00".to_string(), DatetimePrecision::Minute),
                ("2022-03-04 14:50:15".to_string(), DatetimePrecision::Second),
            ]
        );
    }

    #[test]
    fn test_datetime_does_not_swallow_following_connective() {
        let tokens = tokenize("2022.03.04 and x").expect("valid");
        assert!(matches!(tokens[0].kind, TokenKind::Datetime(_)));
        assert_eq!(tokens[0].text, "2022.03.04");
        assert_eq!(tokens[1].kind, TokenKind::And);
    }

    #[test]
    fn test_impossible_calendar_date() {
        assert_eq!(error("2022.13"), "Syntax error at '2022.13'");
        assert_eq!(error("2022.02.30"), "Syntax error at '2022.02.30'");
        assert_eq!(error("2022.02.03 25:00"), "Syntax error at '2022.02.03 25:00'");
    }

    #[test]
    fn test_stray_dot() {
        assert_eq!(error("."), "Syntax error at EOF");
        assert_eq!(error(".*"), "Syntax error at '*'");
        assert_eq!(error("2022.03."), "Syntax error at EOF");
    }

    #[test]
    fn test_unexpected_characters() {
        assert_eq!(error("a # b"), "Syntax error at '#'");
        assert_eq!(error("a & b"), "Syntax error at '&'");
        assert_eq!(error("!a"), "Syntax error at '!'");
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = tokenize("caption  == 'x'").expect("valid");
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 9, 12, 15]);
    }
}
