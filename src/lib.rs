#![doc(html_root_url = "https://docs.rs/veccalc/0.3.0")]
//! Veccalc is the expression engine of a vector calculator. End users define derived data
//! series with small formulas such as `a-b/100` or `sqrt(x)+log10(y)` that are evaluated over
//! array-valued variables.
//!
//! # Parse and evaluate
//!
//! ```rust
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! #
//! use std::collections::HashMap;
//! use veccalc::prelude::*;
//! let expr = veccalc::parse::<f64>("2*x^2 - y/4")?;
//! assert_eq!(expr.variables(), ["x", "y"]);
//! let bindings = HashMap::from([("x", Val::Scalar(3.0)), ("y", Val::from(vec![4.0, 8.0]))]);
//! assert_eq!(expr.eval(&bindings)?, Val::Array(vec![17.0, 16.0]));
//! #
//! #     Ok(())
//! # }
//! ```
//! Arrays are combined element-wise. Arrays of different lengths are only compatible if one of
//! them has length 1. Scalars are compatible with everything.
//!
//! # Operators
//!
//! The default [`Parser`](Parser) knows the operators of
//! [`VectorCalcOpsFactory`](VectorCalcOpsFactory). Priorities from high to low are
//!
//! |operators|priority|
//! |---------|--------|
//! | `sqrt`, `abs`, `ln`, `log10` | 9 |
//! | `^`, `**` | 8 |
//! | `%`, `/` | 6 |
//! | `*`, `∙`, `•`, sign `-` | 5 |
//! | `+`, `-` | 4 |
//!
//! Operators of equal priority are evaluated from left to right. Hence, `2^3^2` is `64`.
//! A sign binds less tight than a power, i.e., `-3^2` is `-9`. Further operators can be
//! plugged in by implementing [`MakeOperators`](MakeOperators), see also
//! [`FloatOpsFactory`](FloatOpsFactory).
//!
//! # Whitelist
//!
//! Expressions of end users should pass the [`Whitelist`](Whitelist) that only accepts
//! single-letter variables and rejects calls of anything but registered functions.
//! [`VectorCalculator`](VectorCalculator) wraps the whitelist and works on the data types of the
//! user interface.
//!
//! ```rust
//! use veccalc::{ExpressionInfo, VectorCalculator};
//! let calculator = VectorCalculator::<f64>::default();
//! let mut info = ExpressionInfo::default_expression("7");
//! info.expression = "sin(x)".to_string();
//! let parse_data = calculator.external_parse_data(&info);
//! assert!(!parse_data.is_valid);
//! assert_eq!(parse_data.message, "Unsupported function: sin()");
//! ```
//!
//! # Numeric mode
//!
//! By default, results follow IEEE semantics, i.e., `1/0` is infinite. With
//! [`NumericMode::Strict`](NumericMode::Strict) division by zero, invalid values, and
//! overflows are errors.
//!
//! # Serialization
//!
//! With the feature `serde`, the data types of the user interface as well as
//! [`Expression`](Expression)s can be serialized and deserialized. Expressions are
//! represented by their string.

mod data_type;
mod expression;
mod external;
mod operators;
mod parse;
mod parser;
mod result;
pub mod statements;
#[cfg(test)]
mod util;
mod value;
mod whitelist;

pub use {
    data_type::FloatType,
    expression::{Bindings, Expression, Token},
    external::{
        available_name, detailed_expression, expression_name_validation_message,
        is_name_occupied_by_vectors, is_valid_and_unoccupied_expression_name,
        is_valid_expression_name, variable_vector_dict, ExpressionInfo, ExternalParseData,
        VariableVectorMapInfo, VectorCalculator, VectorTreeNode, MAX_NAME_LENGTH,
    },
    operators::{
        floored_mod, BinOp, FloatOpsFactory, MakeOperators, Operator, VectorCalcOpsFactory,
    },
    parse::{Parser, ParserConfig},
    result::{ExError, ExErrorKind, ExResult, NumericErrorKind},
    statements::{Statement, Statements},
    value::{Callable, NumericMode, Val},
    whitelist::{Verdict, Whitelist, DEFAULT_BLACKLIST},
};

/// Parses a string with the operators of [`VectorCalcOpsFactory`](VectorCalcOpsFactory)
/// and without whitelist checks.
pub fn parse<F: FloatType>(text: &str) -> ExResult<Expression<F>> {
    Parser::vector_calculator().parse(text)
}

/// Parses and evaluates a string that contains no variables.
///
/// ```rust
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// #
/// assert_eq!(veccalc::eval_str::<f64>("1E2 + .5")?, veccalc::Val::Scalar(100.5));
/// #
/// #     Ok(())
/// # }
/// ```
pub fn eval_str<F: FloatType>(text: &str) -> ExResult<Val<F>> {
    let expr = parse::<F>(text)?;
    let bindings: std::collections::HashMap<&str, Val<F>> = std::collections::HashMap::new();
    expr.eval(&bindings)
}

/// Exports everything needed to parse and evaluate.
pub mod prelude {
    pub use super::{Bindings, ExError, ExResult, Expression, NumericMode, Parser, Val};
}

#[cfg(test)]
mod tests {
    use crate::{eval_str, parse, util::assert_float_eq_f64, ExErrorKind, Val};

    #[test]
    fn test_eval_str() {
        let test = |text: &str, reference: f64| {
            let res = eval_str::<f64>(text).unwrap();
            assert_float_eq_f64(res.to_scalar().unwrap(), reference);
        };
        test("2 + 3 * 4", 14.0);
        test("(2 + 3) * 4", 20.0);
        test("2^3^2", 64.0);
        test("2**3", 8.0);
        test("2^-1", 0.5);
        test("-2^2", -4.0);
        test("(-2)^2", 4.0);
        test("10 - 4 - 3", 3.0);
        test("8 / 4 / 2", 1.0);
        test("(-7) % 3", 2.0);
        test("-7 % 3", -1.0);
        test("7 % -3", -2.0);
        test("1E2", 100.0);
        test("1.E2", 100.0);
        test(".5", 0.5);
        test("2.0E-1", 0.2);
        test("2\u{2219}3\u{2022}4", 24.0);
        test("sqrt(16) + abs(-2)", 6.0);
        test("ln(E)", 1.0);
        test("log10(1000)", 3.0);
        test("2*PI", 2.0 * std::f64::consts::PI);
        test("-1.E2 ** 1 + 2.0E2", 100.0);
        test("((((1))))", 1.0);
    }

    #[test]
    fn test_eval_str_errors() {
        let err = eval_str::<f64>("x + 1").unwrap_err();
        assert_eq!(err.kind(), &ExErrorKind::UndefinedVariable("x".to_string()));
        assert_eq!(err.msg(), "undefined variable: x");
        assert!(eval_str::<f64>("1 +* 2").unwrap_err().column().is_some());
    }

    #[test]
    fn test_f32() {
        let expr = parse::<f32>("x/(x+y)").unwrap();
        let bindings = std::collections::HashMap::from([
            ("x", Val::from(vec![6.0f32, 7.0, 10.0])),
            ("y", Val::from(vec![2.0f32, 3.0, 6.0])),
        ]);
        let res = expr.eval(&bindings).unwrap().to_array().unwrap();
        crate::util::assert_float_eq_f32(res[1], 0.7);
    }
}
