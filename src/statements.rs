//! Lines of the interactive calculator. A line is either an assignment such as `x = 1, 2, 3`
//! or an expression that is evaluated with the variables assigned so far.
use std::collections::HashMap;

use log::debug;

use crate::{data_type::FloatType, exerr, ExErrorKind, ExResult, Val, VectorCalculator};

/// Split of a line into an optional variable and the right-hand side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Statement<'a> {
    pub var: Option<&'a str>,
    pub rhs: &'a str,
}

pub fn line_2_statement(line: &str) -> ExResult<Statement<'_>> {
    let mut splitted = line.split('=');
    let first = splitted.next();
    let second = splitted.next();
    if splitted.next().is_some() {
        return Err(exerr!("more than one '=' in {}", line));
    }
    match (first, second) {
        (Some(rhs), None) => Ok(Statement {
            var: None,
            rhs: rhs.trim(),
        }),
        (Some(var), Some(rhs)) => Ok(Statement {
            var: Some(var.trim()),
            rhs: rhs.trim(),
        }),
        _ => Err(exerr!("could not split {}", line)),
    }
}

/// Variables assigned so far. All expressions are checked by the whitelist of a
/// [`VectorCalculator`](VectorCalculator).
#[derive(Clone, Debug, Default)]
pub struct Statements<F: FloatType = f64> {
    calculator: VectorCalculator<F>,
    bindings: HashMap<String, Val<F>>,
}

impl<F: FloatType> Statements<F> {
    /// Evaluates the right-hand side. A comma separated list results in an array.
    pub fn eval(&self, rhs: &str) -> ExResult<Val<F>> {
        let items = rhs.split(',').map(str::trim).collect::<Vec<_>>();
        let eval_item = |item: &str| {
            self.calculator
                .parse_expression(item)?
                .eval(&self.bindings)
        };
        if items.len() == 1 {
            return eval_item(items[0]);
        }
        let values = items
            .iter()
            .map(|item| eval_item(item)?.to_scalar())
            .collect::<ExResult<Vec<F>>>()?;
        Ok(Val::Array(values))
    }

    pub fn insert(mut self, var: &str, rhs: &str) -> ExResult<Self> {
        let var_expr = self.calculator.parse_expression(var)?;
        if var_expr.variables() != [var] {
            return Err(exerr!(
                ExErrorKind::Whitelist,
                "cannot assign to {}",
                var
            ));
        }
        let value = self.eval(rhs)?;
        debug!("{} = {}", var, value);
        self.bindings.insert(var.to_string(), value);
        Ok(self)
    }

    pub fn bindings(&self) -> &HashMap<String, Val<F>> {
        &self.bindings
    }
}

#[test]
fn test_line_2_statement() {
    let statement = line_2_statement("x = 1, 2, 3").unwrap();
    assert_eq!(statement.var, Some("x"));
    assert_eq!(statement.rhs, "1, 2, 3");
    let statement = line_2_statement(" x*2 ").unwrap();
    assert_eq!(statement.var, None);
    assert_eq!(statement.rhs, "x*2");
    assert!(line_2_statement("x = y = 2").is_err());
}

#[test]
fn test_statements() {
    let statements = Statements::<f64>::default();
    let statements = statements.insert("x", "1, 2, 3").unwrap();
    let statements = statements.insert("y", "x*2").unwrap();
    assert_eq!(
        statements.bindings()["y"],
        Val::Array(vec![2.0, 4.0, 6.0])
    );
    assert_eq!(
        statements.eval("y-x").unwrap(),
        Val::Array(vec![1.0, 2.0, 3.0])
    );
    assert_eq!(statements.eval("2, 3").unwrap(), Val::Array(vec![2.0, 3.0]));
    assert!(statements.eval("z").is_err());
    assert!(statements.eval("x, 1").is_err());
    assert!(statements.clone().insert("ab", "1").is_err());
    let err = statements.insert("2", "1").unwrap_err();
    assert_eq!(err.msg(), "cannot assign to 2");
}
