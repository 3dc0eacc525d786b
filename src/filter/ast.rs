use crate::metadata::{Field, FieldType};
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators; `=` is accepted as an alias of `==`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    /// Apply the operator to the ordering of `left` relative to `right`
    pub fn test(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// How many trailing components a datetime literal spelled out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatetimePrecision {
    Month,
    Day,
    Minute,
    Second,
}

/// A dotted datetime literal such as `2022.08` or `2022.08.05 14:35`
///
/// Omitted components take their minimum value, so the literal always denotes
/// the instant at the start of the period it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatetimeLiteral {
    pub instant: NaiveDateTime,
    pub precision: DatetimePrecision,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    /// `r'...'`, matched against the whole subject
    Regex(String),
    Int(i64),
    /// Size literal already expanded to bytes
    Size(i64),
    Datetime(DatetimeLiteral),
}

impl Literal {
    pub fn value_type(&self) -> FieldType {
        match self {
            Literal::Str(_) | Literal::Regex(_) => FieldType::Str,
            Literal::Int(_) | Literal::Size(_) => FieldType::Int,
            Literal::Datetime(_) => FieldType::Datetime,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Int(n) | Literal::Size(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(text) | Literal::Regex(text) => f.write_str(text),
            Literal::Int(n) | Literal::Size(n) => write!(f, "{}", n),
            Literal::Datetime(dt) => f.write_str(&dt.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A resolved identifier; `name` keeps the spelling used in the expression
    Field { field: Field, name: String },
    Literal(Literal),
}

impl Operand {
    pub fn value_type(&self) -> FieldType {
        match self {
            Operand::Field { field, .. } => field.field_type(),
            Operand::Literal(literal) => literal.value_type(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field { name, .. } => f.write_str(name),
            Operand::Literal(Literal::Str(text)) => write!(f, "'{}'", text),
            Operand::Literal(Literal::Regex(text)) => write!(f, "r'{}'", text),
            Operand::Literal(literal) => write!(f, "{}", literal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.symbol(), self.right)
    }
}

/// Comparisons joined by `and` / `&&`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndExpr(pub Vec<Comparison>);

/// Conjunctions joined by `or` / `||`; the root of every parsed expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrExpr(pub Vec<AndExpr>);

impl OrExpr {
    pub fn comparisons(&self) -> impl Iterator<Item = &Comparison> {
        self.0.iter().flat_map(|clause| clause.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_truth_table() {
        use Ordering::*;
        let cases = [
            (CompareOp::Eq, [false, true, false]),
            (CompareOp::Ne, [true, false, true]),
            (CompareOp::Lt, [true, false, false]),
            (CompareOp::Le, [true, true, false]),
            (CompareOp::Gt, [false, false, true]),
            (CompareOp::Ge, [false, true, true]),
        ];
        for (op, expected) in cases {
            assert_eq!(
                [op.test(Less), op.test(Equal), op.test(Greater)],
                expected,
                "{}",
                op.symbol()
            );
        }
    }

    #[test]
    fn test_comparison_display() {
        let comparison = Comparison {
            left: Operand::Field {
                field: Field::FileName,
                name: "media_file_name".to_string(),
            },
            op: CompareOp::Ne,
            right: Operand::Literal(Literal::Regex("test.*mp4".to_string())),
        };
        assert_eq!(comparison.to_string(), "media_file_name != r'test.*mp4'");
    }
}
