use crate::data_type::FloatType;
use crate::operators::Operator;
use crate::{ExError, ExResult};
use lazy_static::lazy_static;
use regex::Regex;

/// Symbolic operators in the order they are tried. The second entry is the representation of
/// the operator in the operator table, i.e., the bullet glyphs are read as multiplication.
const SYMBOLS: [(&str, &str); 9] = [
    ("**", "**"),
    ("^", "^"),
    ("%", "%"),
    ("/", "/"),
    ("\u{2219}", "*"),
    ("\u{2022}", "*"),
    ("*", "*"),
    ("+", "+"),
    ("-", "-"),
];

/// Whether `piece` is part of an operator symbol, e.g., `*` as part of `**`.
pub(crate) fn is_symbol_piece(piece: &str) -> bool {
    !piece.is_empty() && SYMBOLS.iter().any(|(sym, _)| sym.contains(piece))
}

/// Lexical unit found at the current position of the [`Scanner`](Scanner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lexeme<'a, T: Copy> {
    /// Symbolic binary operator such as `*` together with its priority.
    Symbol { repr: &'a str, prio: i32 },
    Num(T),
    Constant(T),
    OpenParen,
    CloseParen,
    /// Named unary operator like `sqrt`.
    UnaryFunc(&'a str),
    /// Named binary operator like `mod`, used infix.
    BinaryFunc { repr: &'a str, prio: i32 },
    Var(&'a str),
    Whitespace,
}

fn is_cased(c: char) -> bool {
    c.is_lowercase() || c.is_uppercase()
}

/// Splits into runs of characters that may form names or numbers and single other
/// characters, e.g., `log_2(x.1)` into `log_2`, `(`, `x.1`, `)`.
pub(crate) fn split_identifiers(text: &str) -> impl Iterator<Item = &str> {
    lazy_static! {
        static ref RE_IDENTIFIERS: Regex = Regex::new(
            r"[\p{Lowercase}\p{Uppercase}0-9_.]+|[^\p{Lowercase}\p{Uppercase}0-9_.]"
        )
        .unwrap();
    }
    RE_IDENTIFIERS.find_iter(text).map(|m| m.as_str())
}

/// Length in bytes of a name that could be an operator, e.g., `log10`.
fn op_name_len(text: &str) -> usize {
    text.char_indices()
        .take_while(|(i, c)| is_cased(*c) || (*i > 0 && (c.is_ascii_digit() || *c == '_')))
        .map(|(_, c)| c.len_utf8())
        .sum()
}

/// Length in bytes of a variable name. Variables may contain dots and underscores.
fn var_name_len(text: &str) -> usize {
    text.chars()
        .take_while(|c| is_cased(*c) || c.is_ascii_digit() || *c == '_' || *c == '.')
        .map(|c| c.len_utf8())
        .sum()
}

/// Returns the prefix of `text` that is a number in scientific notation such as `1.5e-3`.
pub fn is_scientific_text(text: &str) -> Option<&str> {
    lazy_static! {
        static ref RE_SCIENTIFIC: Regex =
            Regex::new(r"^[-+]?([0-9]+\.?[0-9]*|\.[0-9]+)[eE][-+]?[0-9]+").unwrap();
    }
    RE_SCIENTIFIC.find(text).map(|m| m.as_str())
}

/// Returns the prefix of `text` that is a decimal number with at most one dot. A single dot
/// is a number, too.
pub fn is_numeric_text(text: &str) -> Option<&str> {
    let mut n_dots = 0;
    let n_num_chars = text
        .chars()
        .take_while(|c| {
            let is_dot = *c == '.';
            if is_dot {
                n_dots += 1;
            }
            c.is_ascii_digit() || (is_dot && n_dots < 2)
        })
        .count();
    if n_num_chars > 0 {
        Some(&text[0..n_num_chars])
    } else {
        None
    }
}

/// Reads one lexeme after the other from the text. The scanner lives exactly as long as one
/// parse run and holds all mutable state of it.
pub struct Scanner<'a, 'b, T: Copy> {
    text: &'a str,
    ops: &'b [Operator<'a, T>],
    pos: usize,
}

impl<'a, 'b, T: FloatType> Scanner<'a, 'b, T> {
    pub fn new(text: &'a str, ops: &'b [Operator<'a, T>]) -> Self {
        Scanner { text, ops, pos: 0 }
    }

    /// Position of the cursor in characters, not bytes.
    pub fn column(&self) -> usize {
        self.text[..self.pos].chars().count()
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn advance<U>(&mut self, n_bytes: usize, lexeme: U) -> Option<U> {
        self.pos += n_bytes;
        Some(lexeme)
    }

    fn find_op(&self, repr: &str) -> Option<&'b Operator<'a, T>> {
        self.ops.iter().find(|op| op.repr() == repr)
    }

    fn symbol(&mut self) -> Option<Lexeme<'a, T>> {
        let rest = self.rest();
        let (sym, repr, prio) = SYMBOLS.iter().find_map(|(sym, repr)| {
            if !rest.starts_with(sym) {
                return None;
            }
            let op = self.find_op(repr)?;
            op.bin().map(|bin_op| (*sym, op.repr(), bin_op.prio))
        })?;
        self.advance(sym.len(), Lexeme::Symbol { repr, prio })
    }

    fn number(&mut self) -> Option<Lexeme<'a, T>> {
        let rest = self.rest();
        if rest.starts_with('E') {
            return None;
        }
        let num_str = is_scientific_text(rest).or_else(|| is_numeric_text(rest))?;
        let to_parse = if num_str.starts_with('.') && num_str.len() == 1 {
            "0."
        } else {
            num_str
        };
        let parsed = to_parse.parse::<T>().ok()?;
        self.advance(num_str.len(), Lexeme::Num(parsed))
    }

    fn constant(&mut self) -> Option<Lexeme<'a, T>> {
        let rest = self.rest();
        let (len, value) = self.ops.iter().find_map(|op| {
            let value = op.constant()?;
            let repr = op.repr();
            let next = rest.strip_prefix(repr)?.chars().next();
            match next {
                Some(c) if c.is_alphanumeric() || c == '_' => None,
                _ => Some((repr.len(), value)),
            }
        })?;
        self.advance(len, Lexeme::Constant(value))
    }

    fn paren(&mut self) -> Option<Lexeme<'a, T>> {
        match self.rest().chars().next()? {
            '(' => self.advance(1, Lexeme::OpenParen),
            ')' => self.advance(1, Lexeme::CloseParen),
            _ => None,
        }
    }

    fn named_op(&mut self) -> Option<Lexeme<'a, T>> {
        let n = op_name_len(self.rest());
        if n == 0 {
            return None;
        }
        let name = &self.rest()[..n];
        let ops = self.ops;
        let lexeme = ops
            .iter()
            .find(|op| op.repr() == name && op.has_unary())
            .map(|op| Lexeme::UnaryFunc(op.repr()))
            .or_else(|| {
                ops.iter().find_map(|op| {
                    let bin_op = op.bin().filter(|_| op.repr() == name)?;
                    Some(Lexeme::BinaryFunc {
                        repr: op.repr(),
                        prio: bin_op.prio,
                    })
                })
            })?;
        self.advance(n, lexeme)
    }

    fn var(&mut self) -> Option<Lexeme<'a, T>> {
        let n = var_name_len(self.rest());
        if n == 0 {
            return None;
        }
        let name = &self.rest()[..n];
        self.advance(n, Lexeme::Var(name))
    }

    fn whitespace(&mut self) -> Option<Lexeme<'a, T>> {
        let c = self.rest().chars().next()?;
        if c.is_whitespace() {
            self.advance(c.len_utf8(), Lexeme::Whitespace)
        } else {
            None
        }
    }

    /// Returns the next lexeme and the column where it starts, or `None` at the end of the text.
    ///
    /// # Errors
    ///
    /// If nothing can be read at the current position.
    pub fn next_lexeme(&mut self) -> ExResult<Option<(Lexeme<'a, T>, usize)>> {
        if self.is_done() {
            return Ok(None);
        }
        let column = self.column();
        let lexeme = self
            .symbol()
            .or_else(|| self.number())
            .or_else(|| self.paren())
            .or_else(|| self.constant())
            .or_else(|| self.named_op())
            .or_else(|| self.var())
            .or_else(|| self.whitespace());
        match lexeme {
            Some(l) => Ok(Some((l, column))),
            None => Err(ExError::parse(column, "unknown character", self.text)),
        }
    }
}

#[cfg(test)]
use crate::{operators::MakeOperators, VectorCalcOpsFactory};

#[cfg(test)]
fn lex_all(text: &str) -> Option<Vec<Lexeme<'_, f64>>> {
    let ops = VectorCalcOpsFactory::<f64>::make();
    let mut scanner = Scanner::new(text, &ops);
    let mut res = vec![];
    while let Some((lexeme, _)) = scanner.next_lexeme().ok()? {
        if lexeme != Lexeme::Whitespace {
            res.push(lexeme);
        }
    }
    Some(res)
}

#[test]
fn test_is_numeric() {
    assert_eq!(is_numeric_text("5/6").unwrap(), "5");
    assert_eq!(is_numeric_text(".").unwrap(), ".");
    assert!(is_numeric_text("o.4").is_none());
    assert_eq!(is_numeric_text("6").unwrap(), "6");
    assert_eq!(is_numeric_text("4.").unwrap(), "4.");
    assert_eq!(is_numeric_text(".4").unwrap(), ".4");
    assert_eq!(is_numeric_text("23.414").unwrap(), "23.414");
    assert_eq!(is_numeric_text("3.4.5").unwrap(), "3.4");
}

#[test]
fn test_is_scientific() {
    assert_eq!(is_scientific_text("1E2+x").unwrap(), "1E2");
    assert_eq!(is_scientific_text("1.E2").unwrap(), "1.E2");
    assert_eq!(is_scientific_text(".5e-3*2").unwrap(), ".5e-3");
    assert_eq!(is_scientific_text("2.0E+2").unwrap(), "2.0E+2");
    assert!(is_scientific_text("e2").is_none());
    assert!(is_scientific_text("2e").is_none());
    assert!(is_scientific_text("E2").is_none());
}

#[test]
fn test_scanner() {
    let lexemes = lex_all("2.5*x^PI").unwrap();
    assert_eq!(lexemes.len(), 5);
    assert_eq!(lexemes[0], Lexeme::Num(2.5));
    assert_eq!(lexemes[1], Lexeme::Symbol { repr: "*", prio: 5 });
    assert_eq!(lexemes[2], Lexeme::Var("x"));
    assert_eq!(lexemes[3], Lexeme::Symbol { repr: "^", prio: 8 });
    assert_eq!(lexemes[4], Lexeme::Constant(std::f64::consts::PI));

    // glyphs are multiplication, ** wins over *
    let lexemes = lex_all("a\u{2219}b\u{2022}c**2").unwrap();
    assert_eq!(lexemes[1], Lexeme::Symbol { repr: "*", prio: 5 });
    assert_eq!(lexemes[3], Lexeme::Symbol { repr: "*", prio: 5 });
    assert_eq!(lexemes[5], Lexeme::Symbol { repr: "**", prio: 8 });

    // constants need a boundary, names of functions are found greedily
    let lexemes = lex_all("PI2+E_x+log10(PI)").unwrap();
    assert_eq!(lexemes[0], Lexeme::Var("PI2"));
    assert_eq!(lexemes[2], Lexeme::Var("E_x"));
    assert_eq!(lexemes[4], Lexeme::UnaryFunc("log10"));
    assert_eq!(lexemes[5], Lexeme::OpenParen);
    assert_eq!(lexemes[6], Lexeme::Constant(std::f64::consts::PI));
    assert_eq!(lexemes[7], Lexeme::CloseParen);

    // a function name as prefix of a variable name is a variable
    let lexemes = lex_all("lnx").unwrap();
    assert_eq!(lexemes, vec![Lexeme::Var("lnx")]);

    // numbers
    let lexemes = lex_all("1E2 .5 . 7").unwrap();
    assert_eq!(
        lexemes,
        vec![
            Lexeme::Num(100.0),
            Lexeme::Num(0.5),
            Lexeme::Num(0.0),
            Lexeme::Num(7.0)
        ]
    );
    let lexemes = lex_all("a.b_1").unwrap();
    assert_eq!(lexemes, vec![Lexeme::Var("a.b_1")]);

    assert!(lex_all("a,b").is_none());
    assert!(lex_all("a'b").is_none());
    assert!(lex_all("x==y").is_none());
}

#[test]
fn test_column() {
    let ops = VectorCalcOpsFactory::<f64>::make();
    let mut scanner = Scanner::new("\u{2219}x", &ops);
    let (_, col) = scanner.next_lexeme().unwrap().unwrap();
    assert_eq!(col, 0);
    let (lexeme, col) = scanner.next_lexeme().unwrap().unwrap();
    assert_eq!(lexeme, Lexeme::Var("x"));
    assert_eq!(col, 1);
    assert!(scanner.is_done());
    assert_eq!(scanner.next_lexeme(), Ok(None));

    let mut scanner = Scanner::new("x?", &ops);
    scanner.next_lexeme().unwrap();
    let err = scanner.next_lexeme().unwrap_err();
    assert_eq!(err.column(), Some(1));
    assert!(err.msg().contains("unknown character"));
}

#[test]
fn test_split_identifiers() {
    let pieces = split_identifiers("log_2(x)+ 2.5").collect::<Vec<_>>();
    assert_eq!(pieces, ["log_2", "(", "x", ")", "+", " ", "2.5"]);
    let pieces = split_identifiers("ŝqrt(a)\u{2219}b").collect::<Vec<_>>();
    assert_eq!(pieces, ["ŝqrt", "(", "a", ")", "\u{2219}", "b"]);
}
