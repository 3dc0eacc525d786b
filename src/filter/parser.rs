use super::ast::{AndExpr, Comparison, Literal, Operand, OrExpr};
use super::error::FilterError;
use super::lexer::{Lexer, Token, TokenKind};
use crate::metadata::Field;

/// Recursive-descent parser with one token of lookahead
///
/// ```text
/// or         := and (('or' | '||') and)*
/// and        := comparison (('and' | '&&') comparison)*
/// comparison := operand compare_op operand
/// operand    := identifier | sum
/// sum        := product (('+' | '-') product)*
/// product    := unary (('*' | '/') unary)*
/// unary      := '-' unary | literal
/// ```
///
/// Arithmetic is folded while parsing, so `1024 * 1024` reaches the AST as a
/// single integer literal.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, FilterError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    pub fn parse(mut self) -> Result<OrExpr, FilterError> {
        let expr = self.parse_or()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<OrExpr, FilterError> {
        let mut clauses = vec![self.parse_and()?];
        while self.current.kind == TokenKind::Or {
            self.advance()?;
            clauses.push(self.parse_and()?);
        }
        Ok(OrExpr(clauses))
    }

    fn parse_and(&mut self) -> Result<AndExpr, FilterError> {
        let mut comparisons = vec![self.parse_comparison()?];
        while self.current.kind == TokenKind::And {
            self.advance()?;
            comparisons.push(self.parse_comparison()?);
        }
        Ok(AndExpr(comparisons))
    }

    fn parse_comparison(&mut self) -> Result<Comparison, FilterError> {
        let left = self.parse_operand()?;
        let TokenKind::Compare(op) = self.current.kind else {
            return Err(self.unexpected());
        };
        self.advance()?;
        let right = self.parse_operand()?;
        Ok(Comparison { left, op, right })
    }

    /// Identifiers resolve only once the token after them is a legal follower,
    /// so a misplaced token is reported before an unknown name.
    fn parse_operand(&mut self) -> Result<Operand, FilterError> {
        if !matches!(self.current.kind, TokenKind::Ident(_)) {
            return self.parse_sum().map(Operand::Literal);
        }
        let name = self.advance()?.text;

        if !matches!(
            self.current.kind,
            TokenKind::Compare(_) | TokenKind::And | TokenKind::Or | TokenKind::Eof
        ) {
            return Err(self.unexpected());
        }

        match Field::from_name(&name) {
            Some(field) => Ok(Operand::Field { field, name }),
            None => Err(FilterError::UndefinedName(name)),
        }
    }

    fn parse_sum(&mut self) -> Result<Literal, FilterError> {
        let mut acc = self.parse_product()?;
        while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.advance()?;
            let rhs = self.parse_product()?;
            acc = fold(&op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn parse_product(&mut self) -> Result<Literal, FilterError> {
        let mut acc = self.parse_unary()?;
        while matches!(self.current.kind, TokenKind::Star | TokenKind::Slash) {
            let op = self.advance()?;
            let rhs = self.parse_unary()?;
            acc = fold(&op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn parse_unary(&mut self) -> Result<Literal, FilterError> {
        if self.current.kind != TokenKind::Minus {
            return self.parse_literal();
        }
        let op = self.advance()?;
        let operand = self.parse_unary()?;
        let value = operand
            .as_integer()
            .ok_or_else(|| FilterError::unexpected(op.text.clone(), op.position))?;
        value
            .checked_neg()
            .map(Literal::Int)
            .ok_or_else(|| FilterError::Arithmetic(format!("-{} overflows", value)))
    }

    fn parse_literal(&mut self) -> Result<Literal, FilterError> {
        let literal = match &self.current.kind {
            TokenKind::Str(text) => Literal::Str(text.clone()),
            TokenKind::Regex(text) => Literal::Regex(text.clone()),
            TokenKind::Int(n) => Literal::Int(*n),
            TokenKind::Size(n) => Literal::Size(*n),
            TokenKind::Datetime(dt) => Literal::Datetime(dt.clone()),
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(literal)
    }

    /// Move to the next token, returning the one just consumed
    fn advance(&mut self) -> Result<Token, FilterError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn unexpected(&self) -> FilterError {
        match self.current.kind {
            TokenKind::Eof => FilterError::eof(self.current.position),
            _ => FilterError::unexpected(self.current.text.clone(), self.current.position),
        }
    }
}

/// Fold one arithmetic step; both sides must be integer or size literals
fn fold(op: &Token, lhs: Literal, rhs: Literal) -> Result<Literal, FilterError> {
    let (Some(a), Some(b)) = (lhs.as_integer(), rhs.as_integer()) else {
        return Err(FilterError::unexpected(op.text.clone(), op.position));
    };
    let result = match op.kind {
        TokenKind::Plus => a.checked_add(b),
        TokenKind::Minus => a.checked_sub(b),
        TokenKind::Star => a.checked_mul(b),
        TokenKind::Slash if b == 0 => {
            return Err(FilterError::Arithmetic(format!("{} / 0 divides by zero", a)));
        }
        TokenKind::Slash => a.checked_div(b),
        _ => None,
    };
    result
        .map(Literal::Int)
        .ok_or_else(|| FilterError::Arithmetic(format!("{} {} {} overflows", a, op.text, b)))
}

/// Parse a filter expression into its AST
pub fn parse(input: &str) -> Result<OrExpr, FilterError> {
    Parser::new(input)?.parse()
}
