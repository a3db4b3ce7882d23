#![no_main]
use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use veccalc::{Parser, Val};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(expr) = Parser::<f64>::float().parse(s) {
            let bindings = expr
                .variables()
                .into_iter()
                .map(|v| (v, Val::from(vec![1.0, -2.0])))
                .collect::<HashMap<_, _>>();
            let _ = expr.eval(&bindings);
        }
    }
});
