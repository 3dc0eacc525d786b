use super::ast::{CompareOp, Comparison, Literal, Operand};
use super::error::FilterError;
use super::parser::parse;
use crate::metadata::{DATETIME_FORMAT, FieldType, FieldValue, MetaData};
use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

/// Evaluates filter expressions against one bound [`MetaData`]
///
/// `exec` raises on malformed or ill-typed expressions; `check_filter` runs
/// the same parse and type check and reports the first fault as a diagnostic
/// instead.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    meta: MetaData,
    debug: bool,
}

/// A comparison that passed type checking
struct CheckedComparison<'e> {
    comparison: &'e Comparison,
    matcher: Matcher,
}

enum Matcher {
    /// Integer or datetime operands
    Ordered,
    /// Plain string equality
    Text,
    /// Full-match regex; `subject_left` says which operand is matched
    Pattern { regex: Regex, subject_left: bool },
}

/// An operand read from the bound metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value<'a> {
    Str(&'a str),
    Int(Option<i64>),
    Datetime(NaiveDateTime),
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meta_data(meta: MetaData) -> Self {
        Self { meta, debug: false }
    }

    /// Rebind the metadata the next evaluation reads
    pub fn set_meta_data(&mut self, meta: MetaData) {
        self.meta = meta;
    }

    pub fn meta_data(&self) -> &MetaData {
        &self.meta
    }

    /// Trace the evaluation path of this instance; never changes results
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Evaluate `expr` against the bound metadata
    ///
    /// Every comparison is type-checked before any is evaluated, so a fault
    /// in a clause that short-circuiting would skip still raises.
    pub fn exec(&self, expr: &str) -> Result<bool, FilterError> {
        let ast = parse(expr)?;
        let clauses = ast
            .0
            .iter()
            .map(|clause| {
                clause
                    .0
                    .iter()
                    .map(|comparison| self.check(comparison))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.debug {
            debug!(expr, clauses = clauses.len(), "evaluating filter");
        }

        for (index, clause) in clauses.iter().enumerate() {
            if clause.iter().all(|checked| self.evaluate(checked, index)) {
                if self.debug {
                    debug!(clause = index, "filter matched");
                }
                return Ok(true);
            }
        }

        if self.debug {
            debug!("no clause matched");
        }
        Ok(false)
    }

    /// Validate `expr` without evaluating it
    ///
    /// Returns `(true, None)` when the expression is well formed and every
    /// comparison is type compatible; otherwise `(false, Some(diagnostic))`.
    pub fn check_filter(&self, expr: &str) -> (bool, Option<String>) {
        match self.compile(expr) {
            Ok(()) => (true, None),
            Err(err) => {
                if self.debug {
                    debug!(expr, error = %err, "filter rejected");
                }
                (false, Some(err.to_string()))
            }
        }
    }

    /// Parse and type-check without evaluating
    pub fn compile(&self, expr: &str) -> Result<(), FilterError> {
        let ast = parse(expr)?;
        for comparison in ast.comparisons() {
            self.check(comparison)?;
        }
        Ok(())
    }

    fn check<'e>(&self, comparison: &'e Comparison) -> Result<CheckedComparison<'e>, FilterError> {
        let left_type = comparison.left.value_type();
        let right_type = comparison.right.value_type();

        if left_type != right_type {
            return Err(FilterError::TypeMismatch {
                value: self.describe(&comparison.left),
                expected: left_type.name(),
                literal: describe_expected(&comparison.right),
            });
        }

        let matcher = match left_type {
            FieldType::Str if !comparison.op.is_equality() => {
                return Err(FilterError::UnsupportedOperator {
                    op: comparison.op.symbol(),
                    ty: FieldType::Str.name(),
                });
            }
            FieldType::Str => match (&comparison.left, &comparison.right) {
                (_, Operand::Literal(Literal::Regex(pattern))) => Matcher::Pattern {
                    regex: compile_pattern(pattern)?,
                    subject_left: true,
                },
                (Operand::Literal(Literal::Regex(pattern)), _) => Matcher::Pattern {
                    regex: compile_pattern(pattern)?,
                    subject_left: false,
                },
                _ => Matcher::Text,
            },
            FieldType::Int | FieldType::Datetime => Matcher::Ordered,
        };

        Ok(CheckedComparison {
            comparison,
            matcher,
        })
    }

    fn evaluate(&self, checked: &CheckedComparison<'_>, clause: usize) -> bool {
        let comparison = checked.comparison;
        let left = self.read(&comparison.left);
        let right = self.read(&comparison.right);
        let op = comparison.op;

        let result = match (&checked.matcher, left, right) {
            (
                Matcher::Pattern {
                    regex,
                    subject_left,
                },
                Value::Str(l),
                Value::Str(r),
            ) => {
                let subject = if *subject_left { l } else { r };
                regex.is_match(subject) == (op == CompareOp::Eq)
            }
            (Matcher::Text, Value::Str(l), Value::Str(r)) => op.test(l.cmp(r)),
            (Matcher::Ordered, Value::Int(Some(l)), Value::Int(Some(r))) => op.test(l.cmp(&r)),
            (Matcher::Ordered, Value::Datetime(l), Value::Datetime(r)) => op.test(l.cmp(&r)),
            // unset nullable fields never satisfy a comparison
            _ => false,
        };

        if self.debug {
            debug!(
                clause,
                comparison = %comparison,
                left = ?left,
                right = ?right,
                result,
                "comparison evaluated"
            );
        }
        result
    }

    fn read<'a>(&'a self, operand: &'a Operand) -> Value<'a> {
        match operand {
            Operand::Field { field, .. } => match self.meta.get(*field) {
                FieldValue::Str(s) => Value::Str(s),
                FieldValue::Int(n) => Value::Int(n),
                FieldValue::Datetime(dt) => Value::Datetime(dt),
            },
            Operand::Literal(Literal::Str(s) | Literal::Regex(s)) => Value::Str(s),
            Operand::Literal(Literal::Int(n) | Literal::Size(n)) => Value::Int(Some(*n)),
            Operand::Literal(Literal::Datetime(dt)) => Value::Datetime(dt.instant),
        }
    }

    /// Left side of a type mismatch: string fields by name, other fields by value
    fn describe(&self, operand: &Operand) -> String {
        match operand {
            Operand::Field { field, name } => match self.meta.get(*field) {
                FieldValue::Str(_) | FieldValue::Int(None) => name.clone(),
                FieldValue::Int(Some(n)) => n.to_string(),
                FieldValue::Datetime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            },
            Operand::Literal(literal) => literal.to_string(),
        }
    }
}

fn describe_expected(operand: &Operand) -> String {
    match operand {
        Operand::Field { name, .. } => name.clone(),
        Operand::Literal(literal) => literal.to_string(),
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, FilterError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| FilterError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}
