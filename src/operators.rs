use crate::data_type::{from_f64, FloatType};
use std::{fmt::Debug, marker::PhantomData};

/// Operators can be custom-defined by the library-user in terms of this struct. An operator
/// can be binary, unary, both, or a named constant.
#[derive(Copy, Clone, Debug)]
pub struct Operator<'a, T: Copy> {
    /// Representation of the operator in the string to be parsed, e.g., `-` or `sqrt`.
    repr: &'a str,
    /// Binary operator that contains a priority besides a function pointer, if available.
    bin_op: Option<BinOp<T>>,
    /// Unary operator that does not have an explicit priority. Named unary operators such as
    /// `sqrt` bind tighter than any binary operator, the sign `-` binds like `*`, e.g.,
    /// `-3^2 == -9`.
    unary_op: Option<fn(T) -> T>,
    /// Named constant such as `PI`.
    constant: Option<T>,
}

impl<'a, T: Copy> Operator<'a, T> {
    fn new(
        repr: &'a str,
        bin_op: Option<BinOp<T>>,
        unary_op: Option<fn(T) -> T>,
        constant: Option<T>,
    ) -> Operator<'a, T> {
        Operator {
            repr,
            bin_op,
            unary_op,
            constant,
        }
    }
    pub fn make_bin(repr: &'a str, bin_op: BinOp<T>) -> Operator<'a, T> {
        Operator::new(repr, Some(bin_op), None, None)
    }
    pub fn make_unary(repr: &'a str, unary_op: fn(T) -> T) -> Operator<'a, T> {
        Operator::new(repr, None, Some(unary_op), None)
    }
    pub fn make_bin_unary(
        repr: &'a str,
        bin_op: BinOp<T>,
        unary_op: fn(T) -> T,
    ) -> Operator<'a, T> {
        Operator::new(repr, Some(bin_op), Some(unary_op), None)
    }
    pub fn make_constant(repr: &'a str, constant: T) -> Operator<'a, T> {
        Operator::new(repr, None, None, Some(constant))
    }

    pub fn bin(&self) -> Option<BinOp<T>> {
        self.bin_op
    }
    pub fn unary(&self) -> Option<fn(T) -> T> {
        self.unary_op
    }
    pub fn constant(&self) -> Option<T> {
        self.constant
    }
    pub fn repr(&self) -> &'a str {
        self.repr
    }
    pub fn has_bin(&self) -> bool {
        self.bin_op.is_some()
    }
    pub fn has_unary(&self) -> bool {
        self.unary_op.is_some()
    }
    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

/// A binary operator that consists of a function pointer and a priority.
#[derive(Copy, Clone, Debug)]
pub struct BinOp<T> {
    /// Implementation of the binary operation, e.g., `|a, b| a * b` for multiplication.
    pub apply: fn(T, T) -> T,
    /// Priority of the binary operation. A binary operation with a higher number will be
    /// executed first. Operators of equal priority are evaluated from left to right.
    pub prio: i32,
}

/// To use custom operators one needs to create a factory that implements this trait.
/// In this way, the available operators are part of the parser's type.
///
/// # Example
///
/// ```rust
/// use veccalc::{BinOp, MakeOperators, Operator};
/// #[derive(Clone)]
/// struct SomeOpsFactory;
/// impl MakeOperators<f32> for SomeOpsFactory {
///     fn make<'a>() -> Vec<Operator<'a, f32>> {
///         vec![
///             Operator::make_bin_unary(
///                 "-",
///                 BinOp {
///                     apply: |a, b| a - b,
///                     prio: 4,
///                 },
///                 |a| -a,
///             ),
///             Operator::make_unary("sin", |a| a.sin()),
///         ]
///     }
/// }
/// ```
pub trait MakeOperators<T: Copy>: Clone {
    /// Function that creates a vector of operators.
    fn make<'a>() -> Vec<Operator<'a, T>>;
}

/// Floored modulo with the sign of the divisor, e.g., `-7 % 3 == 2`.
pub fn floored_mod<T: FloatType>(a: T, b: T) -> T {
    let r = a % b;
    if r != T::zero() && (r < T::zero()) != (b < T::zero()) {
        r + b
    } else {
        r
    }
}

fn arithmetic_ops<'a, T: FloatType>() -> Vec<Operator<'a, T>> {
    vec![
        Operator::make_bin(
            "^",
            BinOp {
                apply: |a: T, b| a.powf(b),
                prio: 8,
            },
        ),
        Operator::make_bin(
            "**",
            BinOp {
                apply: |a: T, b| a.powf(b),
                prio: 8,
            },
        ),
        Operator::make_bin(
            "%",
            BinOp {
                apply: floored_mod,
                prio: 6,
            },
        ),
        Operator::make_bin(
            "/",
            BinOp {
                apply: |a, b| a / b,
                prio: 6,
            },
        ),
        Operator::make_bin(
            "*",
            BinOp {
                apply: |a, b| a * b,
                prio: 5,
            },
        ),
        Operator::make_bin_unary(
            "+",
            BinOp {
                apply: |a, b| a + b,
                prio: 4,
            },
            |a| a,
        ),
        Operator::make_bin_unary(
            "-",
            BinOp {
                apply: |a, b| a - b,
                prio: 4,
            },
            |a: T| -a,
        ),
        Operator::make_constant("E", from_f64(std::f64::consts::E)),
        Operator::make_constant("PI", from_f64(std::f64::consts::PI)),
    ]
}

/// Factory of the operators that are available in the vector calculator. Only these are
/// considered safe for user input.
///
/// |representation|description|
/// |--------------|-----------|
/// | `+`, `-`, `*`, `/` | arithmetics, `-` also as sign|
/// | `%` | modulo with the sign of the divisor |
/// | `^`, `**` | power |
/// | `sqrt`, `abs` | square root and absolute value |
/// | `ln`, `log10` | natural and base-10 logarithm |
/// | `E`, `PI` | constants |
///
/// The bullet glyphs `∙` and `•` are read as `*`.
#[derive(Clone, Debug)]
pub struct VectorCalcOpsFactory<T: FloatType> {
    dummy: PhantomData<T>,
}

impl<T: FloatType> MakeOperators<T> for VectorCalcOpsFactory<T> {
    fn make<'a>() -> Vec<Operator<'a, T>> {
        let mut ops = arithmetic_ops();
        ops.extend([
            Operator::make_unary("sqrt", |a: T| a.sqrt()),
            Operator::make_unary("abs", |a: T| a.abs()),
            Operator::make_unary("ln", |a: T| a.ln()),
            Operator::make_unary("log10", |a: T| a.log10()),
        ]);
        ops
    }
}

/// Factory of a larger set of operators for floating point values. It contains everything of
/// [`VectorCalcOpsFactory`](VectorCalcOpsFactory) and in addition
/// `exp`, `log2`, `sin`, `cos`, `tan`, `sinh`, `cosh`, `tanh`, `floor`, `ceil`, and `signum`.
#[derive(Clone, Debug)]
pub struct FloatOpsFactory<T: FloatType> {
    dummy: PhantomData<T>,
}

impl<T: FloatType> MakeOperators<T> for FloatOpsFactory<T> {
    fn make<'a>() -> Vec<Operator<'a, T>> {
        let mut ops = VectorCalcOpsFactory::<T>::make();
        ops.extend([
            Operator::make_unary("exp", |a: T| a.exp()),
            Operator::make_unary("log2", |a: T| a.log2()),
            Operator::make_unary("sin", |a: T| a.sin()),
            Operator::make_unary("cos", |a: T| a.cos()),
            Operator::make_unary("tan", |a: T| a.tan()),
            Operator::make_unary("sinh", |a: T| a.sinh()),
            Operator::make_unary("cosh", |a: T| a.cosh()),
            Operator::make_unary("tanh", |a: T| a.tanh()),
            Operator::make_unary("floor", |a: T| a.floor()),
            Operator::make_unary("ceil", |a: T| a.ceil()),
            Operator::make_unary("signum", |a: T| a.signum()),
        ]);
        ops
    }
}

#[cfg(test)]
use crate::util::assert_float_eq_f64;

#[test]
fn test_floored_mod() {
    assert_float_eq_f64(floored_mod(7.0, 3.0), 1.0);
    assert_float_eq_f64(floored_mod(-7.0, 3.0), 2.0);
    assert_float_eq_f64(floored_mod(7.0, -3.0), -2.0);
    assert_float_eq_f64(floored_mod(-6.0, 3.0), 0.0);
    assert!(floored_mod(1.0_f64, 0.0).is_nan());
}

#[test]
fn test_factories() {
    let ops = VectorCalcOpsFactory::<f64>::make();
    let find = |repr: &str| ops.iter().find(|op| op.repr() == repr);
    assert!(find("sin").is_none());
    assert!(find("log").is_none());
    let minus = find("-").unwrap();
    assert!(minus.has_bin() && minus.has_unary());
    assert_float_eq_f64((minus.unary().unwrap())(2.0), -2.0);
    assert_float_eq_f64((minus.bin().unwrap().apply)(5.0, 2.0), 3.0);
    assert_eq!(find("**").unwrap().bin().unwrap().prio, 8);
    assert_float_eq_f64(find("PI").unwrap().constant().unwrap(), std::f64::consts::PI);
    assert!(find("E").unwrap().is_constant());
    assert_float_eq_f64((find("log10").unwrap().unary().unwrap())(1000.0), 3.0);

    let ops = FloatOpsFactory::<f64>::make();
    assert!(ops.iter().any(|op| op.repr() == "sin"));
    assert!(ops.iter().any(|op| op.repr() == "sqrt"));
}
