use std::io::{self, Write};

use veccalc::{statements, Statement, Statements};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    let mut stdout = io::stdout();
    let stdin = io::stdin();
    let mut statements = Statements::<f64>::default();
    loop {
        stdout.write_all("> ".as_bytes())?;
        stdout.flush()?;
        if stdin.read_line(&mut buffer)? == 0 {
            return Ok(());
        }
        let line = buffer.trim();
        if !line.is_empty() {
            match statements::line_2_statement(line) {
                Ok(Statement {
                    var: Some(var),
                    rhs,
                }) => match statements.clone().insert(var, rhs) {
                    Ok(inserted) => statements = inserted,
                    Err(e) => eprintln!("Error {e}"),
                },
                Ok(Statement { var: None, rhs }) => match statements.eval(rhs) {
                    Ok(x) => println!("{x}"),
                    Err(e) => eprintln!("Error {e}"),
                },
                Err(e) => eprintln!("Error {e}"),
            }
        }
        buffer.clear();
    }
}
