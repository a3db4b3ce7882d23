use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Numeric problems that are only reported in [`NumericMode::Strict`](crate::NumericMode::Strict).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum NumericErrorKind {
    DivideByZero,
    Invalid,
    Overflow,
}

impl Display for NumericErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            NumericErrorKind::DivideByZero => "divide by zero",
            NumericErrorKind::Invalid => "invalid value",
            NumericErrorKind::Overflow => "overflow",
        };
        write!(f, "{s}")
    }
}

/// Categories of [`ExError`](ExError).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ExErrorKind {
    /// The string could not be parsed. The column refers to the character position
    /// where parsing stopped.
    Parse { column: usize },
    /// A variable of the expression has no binding.
    UndefinedVariable(String),
    /// The callee of a function call is not callable. Contains the debug representation
    /// of the value.
    NotAFunction(String),
    /// The postfix stream of an expression is inconsistent, e.g., an operator lacks operands.
    InvalidExpression,
    /// The expression is parseable but violates the restrictions of the vector calculator.
    Whitelist,
    /// Division by zero and friends.
    NumericDomain(NumericErrorKind),
    /// Operand shapes that cannot be broadcast against each other or values that
    /// cannot be used as operands.
    Operand,
    /// Anything else.
    Other,
}

/// This will be thrown at you if something within veccalc went wrong. Ok, obviously it is not an
/// exception, so thrown needs to be understood figuratively.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct ExError {
    kind: ExErrorKind,
    msg: String,
}
impl ExError {
    pub fn new(msg: &str) -> ExError {
        ExError {
            kind: ExErrorKind::Other,
            msg: msg.to_string(),
        }
    }
    pub fn with_kind(kind: ExErrorKind, msg: String) -> ExError {
        ExError { kind, msg }
    }
    pub(crate) fn parse(column: usize, msg: &str, expression: &str) -> ExError {
        ExError {
            kind: ExErrorKind::Parse { column },
            msg: format!("parse error [column {column}]: {msg}, expression: {expression}"),
        }
    }
    pub(crate) fn whitelist(msg: String) -> ExError {
        ExError {
            kind: ExErrorKind::Whitelist,
            msg,
        }
    }
    pub(crate) fn numeric(kind: NumericErrorKind, context: &str) -> ExError {
        ExError {
            kind: ExErrorKind::NumericDomain(kind),
            msg: format!("{kind} encountered in {context}"),
        }
    }
    pub fn kind(&self) -> &ExErrorKind {
        &self.kind
    }
    pub fn msg(&self) -> &str {
        &self.msg
    }
    /// Column of a parse error, `None` for all other kinds.
    pub fn column(&self) -> Option<usize> {
        match self.kind {
            ExErrorKind::Parse { column } => Some(column),
            _ => None,
        }
    }
}
impl Display for ExError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}
impl Error for ExError {}

/// Creates an [`ExError`](ExError) of kind [`ExErrorKind::Other`](ExErrorKind::Other)
/// from a format string.
#[macro_export]
macro_rules! format_exerr {
    ($s:literal, $( $exps:expr ),*) => {
        $crate::ExError::new(format!($s, $($exps),*).as_str())
    }
}

#[macro_export]
macro_rules! exerr {
    ($s:literal, $( $exps:expr ),*) => {
        $crate::format_exerr!($s, $($exps),*)
    };
    ($kind:expr, $s:literal, $( $exps:expr ),*) => {
        $crate::ExError::with_kind($kind, format!($s, $($exps),*))
    };
}

/// Result type of veccalc with [`ExError`](ExError) as error type.
pub type ExResult<U> = Result<U, ExError>;

#[cfg(test)]
use crate::ExErrorKind as Kind;
#[test]
fn test_exerr_macros() {
    let e = format_exerr!("{} is {}", "x", 1);
    assert_eq!(e.msg(), "x is 1");
    assert_eq!(e.kind(), &Kind::Other);
    let e = exerr!(Kind::UndefinedVariable("x".to_string()), "undefined variable: {}", "x");
    assert_eq!(e.msg(), "undefined variable: x");
    assert_eq!(e.column(), None);
    let e = ExError::parse(3, "unexpected number", "x 2");
    assert_eq!(e.column(), Some(3));
    assert_eq!(
        format!("{e}"),
        "parse error [column 3]: unexpected number, expression: x 2"
    );
}
