use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use num::Float;

/// Gathers `Float`, `FromStr`, `Debug`, `Display`, `Send`, and `Sync` in one trait.
/// Every type that is used as number of an expression needs to implement at least this.
/// An implementation is provided for `f32` and `f64` and any other type that satisfies the bounds.
pub trait FloatType: Float + FromStr + Debug + Display + Default + Send + Sync + 'static {}
impl<T: Float + FromStr + Debug + Display + Default + Send + Sync + 'static> FloatType for T {}

/// Converts an `f64` constant into the number type of the expression.
pub(crate) fn from_f64<T: FloatType>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}
