//! Filter expression parsing and evaluation
//!
//! A filter decides, per message, whether its media should be downloaded.
//! Expressions compare metadata fields against literals and combine the
//! comparisons with `and` / `or`.
//!
//! # Syntax
//!
//! ```text
//! field op literal                 Comparison (either side may be the literal)
//! a and b, a && b                  Both must hold; binds tighter than or
//! a or b, a || b                   Either may hold
//! ```
//!
//! Operators: `==` (or `=`), `!=`, `>`, `>=`, `<`, `<=`. String fields only
//! support `==` and `!=`.
//!
//! # Literals
//!
//! - `'text'` / `"text"` - exact string match
//! - `r'pattern'` - regular expression, matched against the whole value
//! - `42`, `3 * 1024` - integers; arithmetic is folded while parsing
//! - `10MB` - sizes with a case-sensitive `KB`, `MB` or `GB` suffix
//! - `2022.08`, `2022.08.05`, `2022.08.05 14:35`, `2022.08.05 14:35:12` -
//!   datetimes; missing components default to the start of the period
//!
//! # Examples
//!
//! ```text
//! media_type == 'video' and file_size <= 100MB
//! media_file_name == r'.*\.(mp4|mkv)'
//! message_date >= 2022.03 and message_date < 2022.09
//! media_width >= 2560 && media_height >= 1440 || caption == r'.*#keep.*'
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;

pub use ast::{
    AndExpr, CompareOp, Comparison, DatetimeLiteral, DatetimePrecision, Literal, Operand, OrExpr,
};
pub use error::FilterError;
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use matcher::Filter;
pub use parser::{Parser, parse};
