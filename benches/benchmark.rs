use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use itertools::izip;
use veccalc::{Parser, Val, Whitelist};

const BENCH_EXPRESSIONS_NAMES: [&str; 2] = ["flat", "nested"];
const BENCH_EXPRESSIONS_STRS: [&str; 2] = [
    "2 * 6 - 4 - 3 / 2 + 3 * 4 * x - 32 * y + 43 * z",
    "sqrt(x + 1 / (abs(y * 5))) + 5 ^ (2 / (0.5 * z))",
];
const BENCH_EXPRESSIONS_REFS: [fn(f64, f64, f64) -> f64; 2] = [
    |x, y, z| 2.0 * 6.0 - 4.0 - 3.0 / 2.0 + 3.0 * 4.0 * x - 32.0 * y + 43.0 * z,
    |x, y, z| (x + 1.0 / (y * 5.0).abs()).sqrt() + 5f64.powf(2.0 / (0.5 * z)),
];

const BENCH_N: usize = 100;
const BENCH_Y: f64 = 3.0;
const BENCH_Z: f64 = 4.0;

fn assert_float_eq(f1: f64, f2: f64) {
    assert!((f1 - f2).abs() <= 1e-9 * f2.abs().max(1.0));
}

fn xs() -> Vec<f64> {
    (0..BENCH_N).map(|i| i as f64).collect()
}

fn scalar_eval(c: &mut Criterion) {
    let parser = Parser::<f64>::vector_calculator();
    let expressions = BENCH_EXPRESSIONS_STRS
        .iter()
        .map(|s| parser.parse(s).unwrap())
        .collect::<Vec<_>>();
    for (expr, name, reference) in izip!(expressions, BENCH_EXPRESSIONS_NAMES, BENCH_EXPRESSIONS_REFS)
    {
        let mut bindings = HashMap::from([
            ("x", Val::Scalar(0.0)),
            ("y", Val::Scalar(BENCH_Y)),
            ("z", Val::Scalar(BENCH_Z)),
        ]);
        c.bench_function(&format!("scalar_{name}"), |b| {
            b.iter(|| {
                for x in xs() {
                    bindings.insert("x", Val::Scalar(black_box(x)));
                    let res = expr.eval(&bindings).unwrap().to_scalar().unwrap();
                    assert_float_eq(res, reference(x, BENCH_Y, BENCH_Z));
                }
            })
        });
    }
}

fn array_eval(c: &mut Criterion) {
    let parser = Parser::<f64>::vector_calculator();
    for (s, name, reference) in izip!(BENCH_EXPRESSIONS_STRS, BENCH_EXPRESSIONS_NAMES, BENCH_EXPRESSIONS_REFS)
    {
        let expr = parser.parse(s).unwrap();
        let bindings = HashMap::from([
            ("x", Val::from(xs())),
            ("y", Val::Scalar(BENCH_Y)),
            ("z", Val::Scalar(BENCH_Z)),
        ]);
        c.bench_function(&format!("array_{name}"), |b| {
            b.iter(|| {
                let res = expr.eval(black_box(&bindings)).unwrap().to_array().unwrap();
                assert_float_eq(res[7], reference(7.0, BENCH_Y, BENCH_Z));
            })
        });
    }
}

fn parse(c: &mut Criterion) {
    let parser = Parser::<f64>::vector_calculator();
    let whitelist = Whitelist::<f64>::default();
    for (s, name) in izip!(BENCH_EXPRESSIONS_STRS, BENCH_EXPRESSIONS_NAMES) {
        c.bench_function(&format!("parse_{name}"), |b| {
            b.iter(|| parser.parse(black_box(s)).unwrap())
        });
        c.bench_function(&format!("whitelist_{name}"), |b| {
            b.iter(|| whitelist.check(black_box(s)).unwrap())
        });
    }
}

criterion_group!(benches, scalar_eval, array_eval, parse);
criterion_main!(benches);
