use std::fmt::{self, Display, Formatter};

use crate::{
    data_type::FloatType,
    exerr,
    result::{ExErrorKind, NumericErrorKind},
    ExError, ExResult,
};

/// Signature of values that can be called from within an expression, e.g., `f(x)` where `f` is
/// bound to a [`Val::Func`](Val::Func). Argument lists are spread, i.e., `f(x, y)` would receive
/// a slice of length 2 and `f()` an empty slice.
pub type Callable<F> = fn(&[Val<F>]) -> ExResult<Val<F>>;

/// Decides what happens if an operator produces `NaN` or an infinite number from finite inputs.
///
/// With [`Propagate`](NumericMode::Propagate) results follow IEEE 754, e.g., `1/0` is infinite and
/// `ln(-1)` is `NaN`. With [`Strict`](NumericMode::Strict) such results are reported as
/// [`ExErrorKind::NumericDomain`](crate::ExErrorKind::NumericDomain) errors, which is what an
/// interactive validation usually wants.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Default)]
pub enum NumericMode {
    #[default]
    Propagate,
    Strict,
}

/// The value type of expressions. Variables can be bound to scalars or arrays, operators broadcast
/// element-wise over arrays.
///
/// ```rust
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// #
/// use std::collections::HashMap;
/// use veccalc::{Parser, Val};
/// let parser = Parser::<f64>::vector_calculator();
/// let expr = parser.parse("a*3")?;
/// let bindings = HashMap::from([("a", Val::from(vec![2.0, 3.0, 4.0]))]);
/// assert_eq!(expr.eval(&bindings)?, Val::Array(vec![6.0, 9.0, 12.0]));
/// #
/// #     Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub enum Val<F: FloatType = f64> {
    Scalar(F),
    Array(Vec<F>),
    /// Argument list of a call, e.g., the empty list of `f()`.
    List(Vec<Val<F>>),
    Func(Callable<F>),
}

impl<F: FloatType> Val<F> {
    pub fn to_scalar(&self) -> ExResult<F> {
        match self {
            Val::Scalar(x) => Ok(*x),
            Val::Array(a) if a.len() == 1 => Ok(a[0]),
            _ => Err(exerr!(ExErrorKind::Operand, "value {} is not a scalar", self)),
        }
    }
    pub fn to_array(&self) -> ExResult<Vec<F>> {
        match self {
            Val::Scalar(x) => Ok(vec![*x]),
            Val::Array(a) => Ok(a.clone()),
            _ => Err(exerr!(ExErrorKind::Operand, "value {} is not numeric", self)),
        }
    }
    pub fn is_callable(&self) -> bool {
        matches!(self, Val::Func(_))
    }
    pub fn is_numeric(&self) -> bool {
        matches!(self, Val::Scalar(_) | Val::Array(_))
    }
}

impl<F: FloatType> PartialEq for Val<F> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Scalar(x), Val::Scalar(y)) => x == y,
            (Val::Array(x), Val::Array(y)) => x == y,
            (Val::List(x), Val::List(y)) => x == y,
            _ => false,
        }
    }
}

impl<F: FloatType> From<F> for Val<F> {
    fn from(x: F) -> Self {
        Val::Scalar(x)
    }
}
impl<F: FloatType> From<Vec<F>> for Val<F> {
    fn from(a: Vec<F>) -> Self {
        Val::Array(a)
    }
}
impl<F: FloatType> From<&[F]> for Val<F> {
    fn from(a: &[F]) -> Self {
        Val::Array(a.to_vec())
    }
}

fn write_joined<T: Display>(f: &mut Formatter, items: &[T]) -> fmt::Result {
    for (i, x) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{x}")?;
    }
    Ok(())
}

impl<F: FloatType> Display for Val<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Val::Scalar(x) => write!(f, "{x}"),
            Val::Array(a) => {
                write!(f, "[")?;
                write_joined(f, a)?;
                write!(f, "]")
            }
            Val::List(l) => {
                write!(f, "(")?;
                write_joined(f, l)?;
                write!(f, ")")
            }
            Val::Func(_) => write!(f, "<function>"),
        }
    }
}

fn check_unary<F: FloatType>(x: F, y: F, repr: &str) -> ExResult<()> {
    if y.is_finite() || !x.is_finite() {
        Ok(())
    } else if y.is_nan() {
        Err(ExError::numeric(NumericErrorKind::Invalid, repr))
    } else if x == F::zero() {
        Err(ExError::numeric(NumericErrorKind::DivideByZero, repr))
    } else {
        Err(ExError::numeric(NumericErrorKind::Overflow, repr))
    }
}

fn check_binary<F: FloatType>(a: F, b: F, y: F, repr: &str) -> ExResult<()> {
    if y.is_finite() || !a.is_finite() || !b.is_finite() {
        Ok(())
    } else if (y.is_infinite() && (a == F::zero() || b == F::zero()))
        || (b == F::zero() && a != F::zero())
    {
        Err(ExError::numeric(NumericErrorKind::DivideByZero, repr))
    } else if y.is_nan() {
        Err(ExError::numeric(NumericErrorKind::Invalid, repr))
    } else {
        Err(ExError::numeric(NumericErrorKind::Overflow, repr))
    }
}

/// Applies a unary function element-wise.
pub(crate) fn apply_unary<F: FloatType>(
    f: fn(F) -> F,
    x: Val<F>,
    mode: NumericMode,
    repr: &str,
) -> ExResult<Val<F>> {
    let apply = |x: F| -> ExResult<F> {
        let y = f(x);
        if mode == NumericMode::Strict {
            check_unary(x, y, repr)?;
        }
        Ok(y)
    };
    match x {
        Val::Scalar(x) => Ok(Val::Scalar(apply(x)?)),
        Val::Array(a) => Ok(Val::Array(
            a.into_iter().map(apply).collect::<ExResult<Vec<_>>>()?,
        )),
        _ => Err(exerr!(ExErrorKind::Operand, "cannot apply {} to {}", repr, x)),
    }
}

/// Applies a binary function element-wise. Arrays need to have the same length or one of
/// the operands has exactly one element.
pub(crate) fn apply_binary<F: FloatType>(
    f: fn(F, F) -> F,
    a: Val<F>,
    b: Val<F>,
    mode: NumericMode,
    repr: &str,
) -> ExResult<Val<F>> {
    let apply = |x: F, y: F| -> ExResult<F> {
        let res = f(x, y);
        if mode == NumericMode::Strict {
            check_binary(x, y, res, repr)?;
        }
        Ok(res)
    };
    match (a, b) {
        (Val::Scalar(x), Val::Scalar(y)) => Ok(Val::Scalar(apply(x, y)?)),
        (Val::Array(xs), Val::Scalar(y)) => Ok(Val::Array(
            xs.into_iter()
                .map(|x| apply(x, y))
                .collect::<ExResult<Vec<_>>>()?,
        )),
        (Val::Scalar(x), Val::Array(ys)) => Ok(Val::Array(
            ys.into_iter()
                .map(|y| apply(x, y))
                .collect::<ExResult<Vec<_>>>()?,
        )),
        (Val::Array(xs), Val::Array(ys)) => {
            let res = if xs.len() == ys.len() {
                xs.into_iter()
                    .zip(ys)
                    .map(|(x, y)| apply(x, y))
                    .collect::<ExResult<Vec<_>>>()?
            } else if xs.len() == 1 {
                ys.into_iter()
                    .map(|y| apply(xs[0], y))
                    .collect::<ExResult<Vec<_>>>()?
            } else if ys.len() == 1 {
                xs.into_iter()
                    .map(|x| apply(x, ys[0]))
                    .collect::<ExResult<Vec<_>>>()?
            } else {
                return Err(exerr!(
                    ExErrorKind::Operand,
                    "operands could not be broadcast together with shapes ({},) ({},)",
                    xs.len(),
                    ys.len()
                ));
            };
            Ok(Val::Array(res))
        }
        (a, b) => Err(exerr!(
            ExErrorKind::Operand,
            "cannot apply {} to {} and {}",
            repr,
            a,
            b
        )),
    }
}

#[cfg(test)]
use crate::util::assert_float_eq_f64;

#[test]
fn test_broadcast() {
    let add = |a: f64, b: f64| a + b;
    let m = NumericMode::Propagate;
    let res = apply_binary(add, Val::from(vec![1.0, 2.0]), Val::Scalar(1.0), m, "+").unwrap();
    assert_eq!(res, Val::Array(vec![2.0, 3.0]));
    let res = apply_binary(add, Val::Scalar(1.0), Val::from(vec![1.0, 2.0]), m, "+").unwrap();
    assert_eq!(res, Val::Array(vec![2.0, 3.0]));
    let res = apply_binary(add, Val::from(vec![1.0]), Val::from(vec![1.0, 2.0]), m, "+").unwrap();
    assert_eq!(res, Val::Array(vec![2.0, 3.0]));
    let err = apply_binary(
        add,
        Val::from(vec![1.0, 2.0, 3.0]),
        Val::from(vec![1.0, 2.0]),
        m,
        "+",
    )
    .unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::Operand);
    assert!(err.msg().contains("(3,) (2,)"));
    let err = apply_binary(add, Val::List(vec![]), Val::Scalar(1.0), m, "+").unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::Operand);
}

#[test]
fn test_numeric_mode() {
    let div = |a: f64, b: f64| a / b;
    let res = apply_binary(div, Val::Scalar(1.0), Val::Scalar(0.0), NumericMode::Propagate, "/");
    assert!(res.unwrap().to_scalar().unwrap().is_infinite());
    let err = apply_binary(div, Val::Scalar(1.0), Val::Scalar(0.0), NumericMode::Strict, "/")
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ExErrorKind::NumericDomain(NumericErrorKind::DivideByZero)
    );
    let err = apply_binary(div, Val::Scalar(0.0), Val::Scalar(0.0), NumericMode::Strict, "/")
        .unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Invalid));
    let pow = |a: f64, b: f64| a.powf(b);
    let err = apply_binary(pow, Val::Scalar(0.0), Val::Scalar(-1.0), NumericMode::Strict, "^")
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ExErrorKind::NumericDomain(NumericErrorKind::DivideByZero)
    );
    let err = apply_binary(pow, Val::Scalar(10.0), Val::Scalar(400.0), NumericMode::Strict, "^")
        .unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Overflow));
    let err = apply_unary(f64::ln, Val::from(vec![1.0, -1.0]), NumericMode::Strict, "ln")
        .unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Invalid));
    assert_eq!(err.msg(), "invalid value encountered in ln");
    let err = apply_unary(f64::ln, Val::Scalar(0.0), NumericMode::Strict, "ln").unwrap_err();
    assert_eq!(
        err.kind(),
        &ExErrorKind::NumericDomain(NumericErrorKind::DivideByZero)
    );
    let err = apply_unary(f64::exp, Val::Scalar(1e5), NumericMode::Strict, "exp").unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Overflow));
    // non-finite inputs are not blamed on the operator
    let res = apply_unary(f64::ln, Val::Scalar(f64::NAN), NumericMode::Strict, "ln").unwrap();
    assert!(res.to_scalar().unwrap().is_nan());
    let res = apply_unary(f64::sqrt, Val::Scalar(16.0), NumericMode::Strict, "sqrt").unwrap();
    assert_float_eq_f64(res.to_scalar().unwrap(), 4.0);
}

#[test]
fn test_display() {
    assert_eq!(format!("{}", Val::Scalar(1.5)), "1.5");
    assert_eq!(format!("{}", Val::from(vec![1.0, 2.5])), "[1, 2.5]");
    assert_eq!(
        format!("{}", Val::<f64>::List(vec![Val::Scalar(1.0), Val::Scalar(2.0)])),
        "(1, 2)"
    );
    fn f(_: &[Val<f64>]) -> ExResult<Val<f64>> {
        Ok(Val::Scalar(0.0))
    }
    assert_eq!(format!("{}", Val::Func(f)), "<function>");
    assert!(Val::<f64>::Func(f).is_callable());
    assert!(!Val::Scalar(1.0).is_callable());
}
