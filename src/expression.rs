use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    fmt::{self, Display, Formatter},
    hash::{BuildHasher, Hash},
};

use smallvec::SmallVec;

#[cfg(feature = "serde")]
mod serde;

use crate::{
    data_type::FloatType,
    exerr,
    result::ExErrorKind,
    value::{apply_binary, apply_unary},
    ExResult, NumericMode, Val,
};

/// Element of the postfix representation of an expression.
#[derive(Clone, Debug)]
pub enum Token<F: FloatType> {
    /// Literal value, i.e., numbers, constants, and the empty argument list of `f()`.
    Num(Val<F>),
    UnaryOp {
        repr: &'static str,
        apply: fn(F) -> F,
    },
    BinaryOp {
        repr: &'static str,
        apply: fn(F, F) -> F,
    },
    Var(String),
    /// Calls the second to last value of the stack with the last one as argument.
    Call,
}

impl<F: FloatType> Display for Token<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "{v}"),
            Token::UnaryOp { repr, .. } | Token::BinaryOp { repr, .. } => write!(f, "{repr}"),
            Token::Var(name) => write!(f, "{name}"),
            Token::Call => write!(f, "CALL"),
        }
    }
}

/// Anything that maps variable names to values can be used to evaluate an expression.
/// Implementations are provided for `HashMap` and `BTreeMap` with string-like keys.
pub trait Bindings<F: FloatType> {
    fn lookup(&self, name: &str) -> Option<&Val<F>>;
}

impl<F, K, S> Bindings<F> for HashMap<K, Val<F>, S>
where
    F: FloatType,
    K: Borrow<str> + Hash + Eq,
    S: BuildHasher,
{
    fn lookup(&self, name: &str) -> Option<&Val<F>> {
        self.get(name)
    }
}

impl<F, K> Bindings<F> for BTreeMap<K, Val<F>>
where
    F: FloatType,
    K: Borrow<str> + Ord,
{
    fn lookup(&self, name: &str) -> Option<&Val<F>> {
        self.get(name)
    }
}

fn pop<F: FloatType>(stack: &mut SmallVec<[Val<F>; 16]>) -> ExResult<Val<F>> {
    stack
        .pop()
        .ok_or_else(|| exerr!(ExErrorKind::InvalidExpression, "invalid Expression",))
}

/// This is the result of parsing a string, a sequence of tokens in postfix order.
/// Expressions are immutable and can be evaluated repeatedly with different bindings.
///
/// ```rust
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// #
/// use std::collections::HashMap;
/// use veccalc::{Parser, Val};
/// let parser = Parser::<f64>::vector_calculator();
/// let expr = parser.parse("x/(x+y)")?;
/// assert_eq!(expr.variables(), ["x", "y"]);
/// let bindings = HashMap::from([
///     ("x", Val::from(vec![6.0, 7.0, 10.0])),
///     ("y", Val::from(vec![2.0, 3.0, 6.0])),
/// ]);
/// assert_eq!(expr.eval(&bindings)?, Val::Array(vec![0.75, 0.7, 0.625]));
/// #
/// #     Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Expression<F: FloatType = f64> {
    text: String,
    tokens: Vec<Token<F>>,
    numeric_mode: NumericMode,
}

impl<F: FloatType> Expression<F> {
    pub(crate) fn new(text: &str, tokens: Vec<Token<F>>, numeric_mode: NumericMode) -> Self {
        Expression {
            text: text.to_string(),
            tokens,
            numeric_mode,
        }
    }

    /// Evaluates the expression with the numeric mode of the parser that created it.
    ///
    /// # Errors
    ///
    /// * A variable has no binding.
    /// * A callee is not a function.
    /// * The token stream is inconsistent.
    /// * Array operands cannot be broadcast.
    /// * Numeric problems in [`NumericMode::Strict`](NumericMode::Strict).
    pub fn eval<B: Bindings<F> + ?Sized>(&self, bindings: &B) -> ExResult<Val<F>> {
        self.eval_with_mode(bindings, self.numeric_mode)
    }

    /// Evaluates the expression with the passed numeric mode.
    pub fn eval_with_mode<B: Bindings<F> + ?Sized>(
        &self,
        bindings: &B,
        mode: NumericMode,
    ) -> ExResult<Val<F>> {
        let mut stack: SmallVec<[Val<F>; 16]> = SmallVec::new();
        for token in &self.tokens {
            match token {
                Token::Num(v) => stack.push(v.clone()),
                Token::BinaryOp { repr, apply } => {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    stack.push(apply_binary(*apply, left, right, mode, repr)?);
                }
                Token::UnaryOp { repr, apply } => {
                    let operand = pop(&mut stack)?;
                    stack.push(apply_unary(*apply, operand, mode, repr)?);
                }
                Token::Var(name) => match bindings.lookup(name) {
                    Some(v) => stack.push(v.clone()),
                    None => {
                        return Err(exerr!(
                            ExErrorKind::UndefinedVariable(name.clone()),
                            "undefined variable: {}",
                            name
                        ))
                    }
                },
                Token::Call => {
                    let arg = pop(&mut stack)?;
                    let callee = pop(&mut stack)?;
                    let res = match callee {
                        Val::Func(f) => match arg {
                            Val::List(args) => f(&args)?,
                            arg => f(&[arg])?,
                        },
                        other => {
                            return Err(exerr!(
                                ExErrorKind::NotAFunction(other.to_string()),
                                "{} is not a function",
                                other
                            ))
                        }
                    };
                    stack.push(res);
                }
            }
        }
        if stack.len() > 1 {
            return Err(exerr!(
                ExErrorKind::InvalidExpression,
                "invalid Expression (parity)",
            ));
        }
        pop(&mut stack)
    }

    /// Returns the distinct variable names in the order of their first occurrence.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = vec![];
        for token in &self.tokens {
            if let Token::Var(name) = token {
                if !vars.contains(&name.as_str()) {
                    vars.push(name.as_str());
                }
            }
        }
        vars
    }

    /// The postfix token stream.
    pub fn tokens(&self) -> &[Token<F>] {
        &self.tokens
    }

    /// The string this expression has been parsed from.
    pub fn unparse(&self) -> &str {
        &self.text
    }

    pub fn numeric_mode(&self) -> NumericMode {
        self.numeric_mode
    }

    /// Postfix notation with tokens separated by spaces, e.g., `a b c * +` for `a+b*c`.
    pub fn to_postfix_string(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The expression is displayed as the string it has been parsed from.
impl<F: FloatType> Display for Expression<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl<F: FloatType> Expression<F> {
    /// Creates an expression directly from tokens. There is no guarantee that the token stream
    /// is valid, evaluation reports inconsistencies as errors.
    pub fn from_tokens(tokens: Vec<Token<F>>) -> Self {
        let text = tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Expression::new(&text, tokens, NumericMode::default())
    }
}

#[cfg(test)]
use crate::util::assert_float_eq_f64;

#[test]
fn test_eval_tokens() {
    // a - b / 4
    let tokens = vec![
        Token::Var("a".to_string()),
        Token::Var("b".to_string()),
        Token::Num(Val::Scalar(4.0)),
        Token::BinaryOp {
            repr: "/",
            apply: |a: f64, b| a / b,
        },
        Token::BinaryOp {
            repr: "-",
            apply: |a: f64, b| a - b,
        },
    ];
    let expr = Expression::<f64>::from_tokens(tokens);
    assert_eq!(expr.to_postfix_string(), "a b 4 / -");
    let bindings = HashMap::from([("a", Val::Scalar(1.0)), ("b", Val::Scalar(2.0))]);
    assert_float_eq_f64(expr.eval(&bindings).unwrap().to_scalar().unwrap(), 0.5);
    let bindings = BTreeMap::from([
        ("a".to_string(), Val::Scalar(1.0)),
        ("b".to_string(), Val::from(vec![2.0, 4.0])),
    ]);
    assert_eq!(expr.eval(&bindings).unwrap(), Val::Array(vec![0.5, 0.0]));
    assert_eq!(expr.variables(), ["a", "b"]);
}

#[test]
fn test_eval_invalid_streams() {
    let minus = Token::BinaryOp {
        repr: "-",
        apply: |a: f64, b| a - b,
    };
    let bindings: HashMap<&str, Val<f64>> = HashMap::new();
    let expr = Expression::from_tokens(vec![Token::Num(Val::Scalar(1.0)), minus.clone()]);
    let err = expr.eval(&bindings).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::InvalidExpression);
    assert_eq!(err.msg(), "invalid Expression");

    let expr = Expression::from_tokens(vec![
        Token::Num(Val::Scalar(1.0)),
        Token::Num(Val::Scalar(2.0)),
    ]);
    let err = expr.eval(&bindings).unwrap_err();
    assert_eq!(err.msg(), "invalid Expression (parity)");

    let expr = Expression::<f64>::from_tokens(vec![]);
    assert!(expr.eval(&bindings).is_err());
}

#[test]
fn test_eval_call() {
    fn sum(args: &[Val<f64>]) -> ExResult<Val<f64>> {
        let mut res = 0.0;
        for a in args {
            res += a.to_scalar()?;
        }
        Ok(Val::Scalar(res))
    }
    let bindings = HashMap::from([
        ("f", Val::Func(sum)),
        ("x", Val::Scalar(2.0)),
    ]);
    let call = |arg: Token<f64>| {
        Expression::from_tokens(vec![Token::Var("f".to_string()), arg, Token::Call])
    };
    let res = call(Token::Var("x".to_string())).eval(&bindings).unwrap();
    assert_eq!(res, Val::Scalar(2.0));
    let res = call(Token::Num(Val::List(vec![]))).eval(&bindings).unwrap();
    assert_eq!(res, Val::Scalar(0.0));
    let args = Val::List(vec![Val::Scalar(1.0), Val::Scalar(2.5)]);
    let res = call(Token::Num(args)).eval(&bindings).unwrap();
    assert_eq!(res, Val::Scalar(3.5));

    let expr = Expression::from_tokens(vec![
        Token::Var("x".to_string()),
        Token::Num(Val::Scalar(1.0)),
        Token::Call,
    ]);
    let err = expr.eval(&bindings).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NotAFunction("2".to_string()));
    assert_eq!(err.msg(), "2 is not a function");
}
