use std::{fmt, marker::PhantomData};

use serde::{de, de::Visitor, Deserialize, Deserializer, Serialize, Serializer};

use crate::{data_type::FloatType, Expression, Parser};

impl<F: FloatType> Serialize for Expression<F> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.unparse())
    }
}

/// Expressions are deserialized by parsing with the parser of the vector calculator.
impl<'de, F: FloatType> Deserialize<'de> for Expression<F> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ExpressionVisitor {
            float_dummy: PhantomData,
        })
    }
}

#[derive(Debug)]
struct ExpressionVisitor<F> {
    float_dummy: PhantomData<F>,
}

impl<'de, F: FloatType> Visitor<'de> for ExpressionVisitor<F> {
    type Value = Expression<F>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a string that can be parsed by `veccalc`")
    }

    fn visit_str<E>(self, unparsed: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Parser::<F>::vector_calculator()
            .parse(unparsed)
            .map_err(|e| E::custom(format!("Parse error - {}", e.msg())))
    }
}

#[cfg(test)]
use {crate::Val, serde_test::Token, std::collections::HashMap};

#[test]
fn test_ser_de() {
    let test = |s: &str, reference: f64| {
        let expr = Parser::<f64>::vector_calculator().parse(s).unwrap();
        serde_test::assert_ser_tokens(&expr, &[Token::Str(s)]);
        let serialized = serde_json::to_string(&expr).unwrap();
        let deserialized = serde_json::from_str::<Expression<f64>>(serialized.as_str()).unwrap();
        assert_eq!(s, format!("{}", deserialized));
        let bindings = HashMap::from([("x", Val::Scalar(2.0)), ("y", Val::Scalar(3.0))]);
        assert_eq!(deserialized.eval(&bindings).unwrap(), Val::Scalar(reference));
    };
    test("x+y*2", 8.0);
    test("sqrt(x*8)", 4.0);
    test("-x^2 % y", -1.0);
}

#[test]
fn test_de_error() {
    let res = serde_json::from_str::<Expression<f64>>("\"x+\"");
    let msg = res.unwrap_err().to_string();
    assert!(msg.contains("Parse error"));
    assert!(msg.contains("parity"));
}
