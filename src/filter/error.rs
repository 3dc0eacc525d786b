use thiserror::Error;

/// Errors raised while lexing, parsing, type-checking or evaluating a filter expression
///
/// The `Display` output of every variant is the diagnostic surfaced to users
/// by [`crate::filter::Filter::check_filter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Unexpected token, or `token == None` when the input ended early
    #[error("Syntax error at {}", display_token(.token))]
    Syntax {
        token: Option<String>,
        position: usize,
    },

    #[error("Undefined name {0}")]
    UndefinedName(String),

    #[error("{value} is {expected} but {literal} is not")]
    TypeMismatch {
        value: String,
        expected: &'static str,
        literal: String,
    },

    #[error("Operator '{op}' is not supported for {ty}")]
    UnsupportedOperator { op: &'static str, ty: &'static str },

    #[error("Invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
}

impl FilterError {
    pub(crate) fn unexpected(token: impl Into<String>, position: usize) -> Self {
        FilterError::Syntax {
            token: Some(token.into()),
            position,
        }
    }

    pub(crate) fn eof(position: usize) -> Self {
        FilterError::Syntax {
            token: None,
            position,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, FilterError::Syntax { .. })
    }
}

fn display_token(token: &Option<String>) -> String {
    match token {
        Some(text) => format!("'{}'", text),
        None => "EOF".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_wording() {
        assert_eq!(
            FilterError::unexpected("tis", 8).to_string(),
            "Syntax error at 'tis'"
        );
        assert_eq!(FilterError::eof(7).to_string(), "Syntax error at EOF");
        assert_eq!(
            FilterError::UndefinedName("caption2".to_string()).to_string(),
            "Undefined name caption2"
        );
        assert_eq!(
            FilterError::TypeMismatch {
                value: "5".to_string(),
                expected: "int",
                literal: ".*".to_string(),
            }
            .to_string(),
            "5 is int but .* is not"
        );
    }
}
