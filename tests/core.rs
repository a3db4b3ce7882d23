#[cfg(test)]
mod utils;
use std::{
    collections::{BTreeMap, HashMap},
    fs::{self, File},
    io::{self, BufRead},
    sync::Arc,
    thread,
};

use rand::{thread_rng, Rng};
use regex::Regex;
use utils::{assert_arrays_eq_f64, assert_float_eq_f64};
use veccalc::{
    eval_str, parse, prelude::*, BinOp, ExErrorKind, FloatOpsFactory, MakeOperators,
    NumericErrorKind, Operator, ParserConfig, Token, VectorCalcOpsFactory,
};

fn eval_scalar(text: &str, bindings: &[(&str, f64)]) -> f64 {
    let bindings = bindings
        .iter()
        .map(|(k, v)| (*k, Val::Scalar(*v)))
        .collect::<HashMap<_, _>>();
    parse::<f64>(text)
        .unwrap()
        .eval(&bindings)
        .unwrap()
        .to_scalar()
        .unwrap()
}

fn eval_array(text: &str, bindings: &[(&str, Vec<f64>)]) -> Vec<f64> {
    let bindings = bindings
        .iter()
        .map(|(k, v)| (*k, Val::from(v.clone())))
        .collect::<HashMap<_, _>>();
    parse::<f64>(text)
        .unwrap()
        .eval(&bindings)
        .unwrap()
        .to_array()
        .unwrap()
}

#[test]
fn test_version() {
    // make sure the version strings in the Cargo.toml and lib.rs coincide
    let file = File::open("src/lib.rs").unwrap();
    let version_line_lib = io::BufReader::new(file)
        .lines()
        .find(|line| line.as_ref().unwrap().contains("html_root_url"))
        .unwrap()
        .unwrap();
    let re_version = Regex::new(r#"[0-9]{1,4}\.[0-9]{1,4}\.[0-9]{1,4}"#).unwrap();
    let match_lib = re_version.find(&version_line_lib).unwrap().as_str();

    let toml_string = fs::read_to_string("Cargo.toml").unwrap();
    let cargo_toml: toml::Value = toml::from_str(&toml_string).unwrap();
    let package = cargo_toml.get("package").unwrap().as_table().unwrap();
    let version = package.get("version").unwrap().as_str().unwrap();
    assert_eq!(match_lib, version);
}

#[test]
fn test_display() -> ExResult<()> {
    let expr = parse::<f64>("sqrt(var)/5")?;
    assert_eq!(format!("{}", expr), "sqrt(var)/5");
    assert_eq!(expr.unparse(), "sqrt(var)/5");
    assert_eq!(expr.to_postfix_string(), "var sqrt 5 /");
    Ok(())
}

#[test]
fn test_scalars() {
    assert_float_eq_f64(eval_scalar("1", &[]), 1.0);
    assert_float_eq_f64(eval_scalar("a", &[("a", 2.0)]), 2.0);
    assert_float_eq_f64(eval_scalar("2 * 3", &[]), 6.0);
    assert_float_eq_f64(eval_scalar("2 ^ x", &[("x", 3.0)]), 8.0);
    assert_float_eq_f64(eval_scalar("2 ** x", &[("x", 3.0)]), 8.0);
    assert_float_eq_f64(eval_scalar("-1.E2 ** x + 2.0E2", &[("x", 1.0)]), 100.0);
    assert_float_eq_f64(eval_scalar("2 + 3 * x", &[("x", 4.0)]), 14.0);
    assert_float_eq_f64(eval_scalar("-3^x", &[("x", 4.0)]), -81.0);
    assert_float_eq_f64(eval_scalar("(-3)^x", &[("x", 4.0)]), 81.0);
    assert_float_eq_f64(eval_scalar("x/(x+y)", &[("x", 2.0), ("y", 3.0)]), 0.4);
    assert_float_eq_f64(eval_scalar("log10(100)", &[]), 2.0);
    assert_float_eq_f64(eval_scalar("log10(1E4)", &[]), 4.0);
    assert!((eval_scalar("ln(E^100)", &[]) - 100.0).abs() < 1e-10);
    assert!((eval_scalar("ln(E**25)", &[]) - 25.0).abs() < 1e-10);
}

#[test]
fn test_precedence_and_associativity() {
    let x = [("x", 4.0)];
    assert_float_eq_f64(eval_scalar("2 + 3 * 4", &[]), 14.0);
    assert_float_eq_f64(eval_scalar("(2 + 3) * 4", &[]), 20.0);
    assert_float_eq_f64(eval_scalar("2^3^2", &[]), 64.0);
    assert_float_eq_f64(eval_scalar("2**3**2", &[]), 64.0);
    assert_float_eq_f64(eval_scalar("2^(3^2)", &[]), 512.0);
    // the first operand that is popped is the right-hand side
    assert_float_eq_f64(eval_scalar("10 - x", &x), 6.0);
    assert_float_eq_f64(eval_scalar("x - 10", &x), -6.0);
    assert_float_eq_f64(eval_scalar("1 / x", &x), 0.25);
    assert_float_eq_f64(eval_scalar("x / 1", &x), 4.0);
    assert_float_eq_f64(eval_scalar("x ^ 0.5", &x), 2.0);
    assert_float_eq_f64(eval_scalar("0.5 ^ x", &x), 0.0625);
    assert_float_eq_f64(eval_scalar("x - 1 - 1", &x), 2.0);
    assert_float_eq_f64(eval_scalar("x / 2 * 2", &x), 4.0);
    assert_float_eq_f64(eval_scalar("x * -2", &x), -8.0);
    assert_float_eq_f64(eval_scalar("x - -2", &x), 6.0);
    assert_float_eq_f64(eval_scalar("x + +2", &x), 6.0);
    assert_float_eq_f64(eval_scalar("--x", &x), 4.0);
    assert_float_eq_f64(eval_scalar("sqrt(x)^3", &x), 8.0);
    assert_float_eq_f64(eval_scalar("-sqrt(x)", &x), -2.0);
    assert_float_eq_f64(eval_scalar("abs(-x) * 2", &x), 8.0);
    assert_float_eq_f64(eval_scalar("x % 3 * 2", &x), 2.0);
    assert_float_eq_f64(eval_scalar("(x)", &x), 4.0);
    assert_float_eq_f64(eval_scalar("x\u{2219}x\u{2022}2", &x), 32.0);
}

#[test]
fn test_variables() {
    let vars = |text: &str| {
        parse::<f64>(text)
            .unwrap()
            .variables()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(vars("ln(a)+ln(b)"), ["a", "b"]);
    assert_eq!(vars("log10(x)+sqrt(y)"), ["x", "y"]);
    assert_eq!(vars("xy^2-(a+sqrt(b))"), ["xy", "a", "b"]);
    assert_eq!(vars("b*a+a*b"), ["b", "a"]);
    assert!(vars("2*PI+E").is_empty());
    assert_eq!(vars("PI_2*E2"), ["PI_2", "E2"]);
}

#[test]
fn test_arrays() {
    assert_eq!(
        eval_array("a", &[("a", vec![2.0, 3.0, 4.0])]),
        [2.0, 3.0, 4.0]
    );
    assert_eq!(
        eval_array("a * 3", &[("a", vec![2.0, 3.0, 4.0])]),
        [6.0, 9.0, 12.0]
    );
    assert_eq!(
        eval_array("2 ^ x", &[("x", vec![3.0, 5.0, 8.0])]),
        [8.0, 32.0, 256.0]
    );
    assert_eq!(
        eval_array("2 + 3 * x", &[("x", vec![2.0, 4.0, 5.0])]),
        [8.0, 14.0, 17.0]
    );
    assert_arrays_eq_f64(
        &eval_array("log10(x)", &[("x", vec![10.0, 100.0, 1000.0])]),
        &[1.0, 2.0, 3.0],
    );
    assert_arrays_eq_f64(
        &eval_array("ln(E^x)", &[("x", vec![10.0, 20.0, 30.0])]),
        &[10.0, 20.0, 30.0],
    );
    assert_arrays_eq_f64(
        &eval_array(
            "x/(x+y)",
            &[("x", vec![6.0, 7.0, 10.0]), ("y", vec![2.0, 3.0, 6.0])],
        ),
        &[0.75, 0.7, 0.625],
    );
    assert_eq!(
        eval_array("abs(x)", &[("x", vec![-3.1, -1.2, 2.3])]),
        [3.1, 1.2, 2.3]
    );
    assert_eq!(
        eval_array("sqrt(x)", &[("x", vec![4.0, 25.0, 81.0])]),
        [2.0, 5.0, 9.0]
    );
    assert_eq!(
        eval_array("x - y", &[("x", vec![1.0, 2.0]), ("y", vec![1.0])]),
        [0.0, 1.0]
    );
}

#[test]
fn test_random_arrays() {
    let mut rng = thread_rng();
    let expr = parse::<f64>("a*b - b/2 + sqrt(abs(a))").unwrap();
    for _ in 0..20 {
        let n = rng.gen_range(1..50);
        let a = (0..n).map(|_| rng.gen_range(-1e3..1e3)).collect::<Vec<f64>>();
        let b = (0..n).map(|_| rng.gen_range(-1e3..1e3)).collect::<Vec<f64>>();
        let bindings = BTreeMap::from([("a", Val::from(a.clone())), ("b", Val::from(b.clone()))]);
        let res = expr.eval(&bindings).unwrap().to_array().unwrap();
        let reference = a
            .iter()
            .zip(b.iter())
            .map(|(a, b)| a * b - b / 2.0 + a.abs().sqrt())
            .collect::<Vec<_>>();
        assert_arrays_eq_f64(&res, &reference);

        // scalars broadcast like arrays of length 1
        let s: f64 = rng.gen_range(-1e3..1e3);
        let bindings = BTreeMap::from([("a", Val::from(a.clone())), ("b", Val::Scalar(s))]);
        let res_scalar = expr.eval(&bindings).unwrap();
        let bindings = BTreeMap::from([("a", Val::from(a.clone())), ("b", Val::from(vec![s]))]);
        let res_single = expr.eval(&bindings).unwrap();
        assert_eq!(res_scalar, res_single);
    }
    let bindings = HashMap::from([
        ("a", Val::from(vec![1.0, 2.0, 3.0])),
        ("b", Val::from(vec![1.0, 2.0])),
    ]);
    let err = expr.eval(&bindings).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::Operand);
}

#[test]
fn test_errors() {
    let bindings = HashMap::from([("x", Val::Scalar(1.0))]);
    let err = parse::<f64>("x + yz").unwrap().eval(&bindings).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::UndefinedVariable("yz".to_string()));
    assert_eq!(err.msg(), "undefined variable: yz");

    let err = parse::<f64>("x(2)").unwrap().eval(&bindings).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NotAFunction("1".to_string()));

    for invalid in ["x,y", "ln(a,b)", "x||y", "a==b", "x <= y", "a in ab", "'a'-'b'", "2 3"] {
        let err = parse::<f64>(invalid).unwrap_err();
        assert!(matches!(err.kind(), ExErrorKind::Parse { .. }), "{invalid}");
        assert!(err.msg().starts_with("parse error [column"));
    }
    let err = parse::<f64>("x <= y").unwrap_err();
    assert_eq!(err.column(), Some(2));
    let err = parse::<f64>("a in ab").unwrap_err();
    assert_eq!(err.column(), Some(2));
}

#[test]
fn test_numeric_mode() {
    let parser = Parser::<f64>::vector_calculator().with_numeric_mode(NumericMode::Strict);
    let zero = HashMap::from([("x", Val::Scalar(0.0))]);
    let expr = parser.parse("1/x").unwrap();
    assert_eq!(expr.numeric_mode(), NumericMode::Strict);
    let err = expr.eval(&zero).unwrap_err();
    assert_eq!(
        err.kind(),
        &ExErrorKind::NumericDomain(NumericErrorKind::DivideByZero)
    );
    assert_eq!(err.msg(), "divide by zero encountered in /");
    let res = expr.eval_with_mode(&zero, NumericMode::Propagate).unwrap();
    assert!(res.to_scalar().unwrap().is_infinite());

    let err = parser.parse("sqrt(x-1)").unwrap().eval(&zero).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Invalid));
    let err = parser.parse("E^(x+1000)").unwrap().eval(&zero).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Overflow));
    for pole in ["0^-1", "x**(-2)", "-(x^-0.5)"] {
        let err = parser.evaluate(pole, &zero).unwrap_err();
        assert_eq!(
            err.kind(),
            &ExErrorKind::NumericDomain(NumericErrorKind::DivideByZero),
            "{pole}"
        );
    }
    assert_eq!(
        parser.evaluate("x^-1", &zero).unwrap_err().msg(),
        "divide by zero encountered in ^"
    );
    let err = parser.evaluate("2^2000", &zero).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NumericDomain(NumericErrorKind::Overflow));
    let res = eval_str::<f64>("ln(0)").unwrap().to_scalar().unwrap();
    assert_eq!(res, f64::NEG_INFINITY);

    let config = ParserConfig {
        numeric_mode: NumericMode::Strict,
    };
    let parser = Parser::<f64>::vector_calculator().with_config(config);
    assert_eq!(parser.config(), config);
    assert!(parser.evaluate("x % 0", &zero).is_err());
}

#[test]
fn test_calls() {
    fn mean(args: &[Val<f64>]) -> ExResult<Val<f64>> {
        let values = args
            .iter()
            .map(|a| a.to_array())
            .collect::<ExResult<Vec<_>>>()?
            .concat();
        if values.is_empty() {
            return Ok(Val::Scalar(0.0));
        }
        Ok(Val::Scalar(values.iter().sum::<f64>() / values.len() as f64))
    }
    let bindings = HashMap::from([
        ("mean", Val::Func(mean)),
        ("x", Val::from(vec![1.0, 2.0, 6.0])),
    ]);
    let parser = Parser::<f64>::default();
    assert_eq!(parser.evaluate("mean(x)", &bindings).unwrap(), Val::Scalar(3.0));
    assert_eq!(parser.evaluate("mean(x*2)+1", &bindings).unwrap(), Val::Scalar(7.0));
    assert_eq!(parser.evaluate("2*mean()", &bindings).unwrap(), Val::Scalar(0.0));
    let err = parser.evaluate("mean(x)(x)", &bindings).unwrap_err();
    assert_eq!(err.kind(), &ExErrorKind::NotAFunction("3".to_string()));
}

#[test]
fn test_custom_operators() {
    #[derive(Clone)]
    struct MinMaxOps;
    impl MakeOperators<f64> for MinMaxOps {
        fn make<'a>() -> Vec<Operator<'a, f64>> {
            let mut ops = VectorCalcOpsFactory::<f64>::make();
            ops.extend([
                Operator::make_bin(
                    "max",
                    BinOp {
                        apply: |a: f64, b: f64| a.max(b),
                        prio: 7,
                    },
                ),
                Operator::make_unary("twice", |a| 2.0 * a),
                Operator::make_constant("TAU", 2.0 * std::f64::consts::PI),
            ]);
            ops
        }
    }
    let parser = Parser::<f64>::from_factory::<MinMaxOps>();
    let bindings = HashMap::from([("x", Val::from(vec![-1.0, 3.0]))]);
    assert_eq!(
        parser.evaluate("x max 0 * 2", &bindings).unwrap(),
        Val::Array(vec![0.0, 6.0])
    );
    assert_eq!(
        parser.evaluate("twice(x)", &bindings).unwrap(),
        Val::Array(vec![-2.0, 6.0])
    );
    let tau = parser.evaluate("TAU/2", &bindings).unwrap().to_scalar().unwrap();
    assert_float_eq_f64(tau, std::f64::consts::PI);
    assert!(parser.parse("sin(x)").unwrap().variables().contains(&"sin"));

    let parser = Parser::<f64>::float();
    let res = parser.evaluate("sin(PI/2) + floor(x)", &bindings).unwrap();
    assert_eq!(res, Val::Array(vec![0.0, 4.0]));
    assert!(FloatOpsFactory::<f64>::make().len() > VectorCalcOpsFactory::<f64>::make().len());
}

#[test]
fn test_tokens() {
    let expr = parse::<f64>("-a + 2").unwrap();
    let tokens = expr.tokens();
    assert!(matches!(&tokens[0], Token::Var(name) if name == "a"));
    assert!(matches!(tokens[1], Token::UnaryOp { repr: "-", .. }));
    assert!(matches!(tokens[2], Token::Num(Val::Scalar(x)) if x == 2.0));
    assert!(matches!(tokens[3], Token::BinaryOp { repr: "+", .. }));
    let copy = Expression::from_tokens(tokens.to_vec());
    let bindings = HashMap::from([("a", Val::Scalar(5.0))]);
    assert_eq!(copy.eval(&bindings).unwrap(), Val::Scalar(-3.0));
}

#[test]
fn test_determinism_across_threads() {
    let parser = Arc::new(Parser::<f64>::vector_calculator());
    let text = "x/(x+y) - sqrt(abs(y))^2 % 3";
    let reference = parser.parse(text).unwrap().to_postfix_string();
    let handles = (0..4)
        .map(|i| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                let expr = parser.parse(text).unwrap();
                let bindings = HashMap::from([
                    ("x", Val::Scalar(i as f64)),
                    ("y", Val::Scalar(1.0)),
                ]);
                (expr.to_postfix_string(), expr.eval(&bindings).unwrap())
            })
        })
        .collect::<Vec<_>>();
    for (i, handle) in handles.into_iter().enumerate() {
        let (postfix, res) = handle.join().unwrap();
        assert_eq!(postfix, reference);
        let x = i as f64;
        assert_float_eq_f64(res.to_scalar().unwrap(), x / (x + 1.0) - 1.0);
    }
}
