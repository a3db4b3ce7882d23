#![no_main]
use libfuzzer_sys::fuzz_target;
use veccalc::{statements, Statements};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(statement) = statements::line_2_statement(s) {
            let statements = Statements::<f64>::default();
            match statement.var {
                Some(var) => {
                    let _ = statements.insert(var, statement.rhs);
                }
                None => {
                    let _ = statements.eval(statement.rhs);
                }
            }
        }
    }
});
