use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{
    data_type::FloatType,
    parser::{is_symbol_piece, split_identifiers},
    ExError, ExResult, Expression, Parser, Val,
};

/// Characters that are rejected before parsing by default.
pub const DEFAULT_BLACKLIST: [char; 2] = ['\'', '"'];

fn singular_or_plural(items: &[&str], singular: &str, plural: &str) -> String {
    match items {
        [item] => singular.replace("{}", item),
        _ => plural.replace("{}", &items.join(", ")),
    }
}

fn is_single_letter(name: &str) -> bool {
    lazy_static! {
        static ref RE_LETTER: Regex = Regex::new(r"^[a-zA-Z]$").unwrap();
    }
    RE_LETTER.is_match(name)
}

/// Outcome of validating user input.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub enum Verdict {
    #[default]
    Unparsed,
    Valid {
        variables: Vec<String>,
    },
    /// The message is empty if and only if the input was empty.
    Invalid {
        message: String,
    },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }
    pub fn message(&self) -> &str {
        match self {
            Verdict::Invalid { message } => message,
            _ => "",
        }
    }
    pub fn variables(&self) -> &[String] {
        match self {
            Verdict::Valid { variables } => variables,
            _ => &[],
        }
    }
}

/// Restrictions on top of the grammar of [`Parser`](Parser) for expressions that are typed in
/// by end users. The parser determines which functions are available, by default the
/// restricted set of [`VectorCalcOpsFactory`](crate::VectorCalcOpsFactory).
///
/// ```rust
/// use veccalc::Whitelist;
/// let whitelist = Whitelist::<f64>::default();
/// assert!(whitelist.verdict("sqrt(x)+log10(y)").is_valid());
/// let verdict = whitelist.verdict("ab+cd");
/// assert_eq!(verdict.message(), "Variables ab, cd are not single characters");
/// ```
#[derive(Clone, Debug)]
pub struct Whitelist<F: FloatType = f64> {
    parser: Parser<F>,
    blacklist: Vec<char>,
}

impl<F: FloatType> Whitelist<F> {
    pub fn new(parser: Parser<F>, blacklist: &[char]) -> Self {
        Whitelist {
            parser,
            blacklist: blacklist.to_vec(),
        }
    }

    pub fn parser(&self) -> &Parser<F> {
        &self.parser
    }

    pub fn blacklist(&self) -> &[char] {
        &self.blacklist
    }

    fn check_blacklist(&self, text: &str) -> ExResult<()> {
        let mut found: Vec<String> = vec![];
        for c in text.chars().filter(|c| self.blacklist.contains(c)) {
            let c = c.to_string();
            if !found.contains(&c) {
                found.push(c);
            }
        }
        if found.is_empty() {
            return Ok(());
        }
        let found = found.iter().map(|s| s.as_str()).collect::<Vec<_>>();
        Err(ExError::whitelist(singular_or_plural(
            &found,
            "Character {} is not allowed",
            "Characters {} are not allowed",
        )))
    }

    /// Each `(` must open the expression or follow a function, an operator, or another `(`.
    /// Otherwise, the parser would read it as call of a variable or of a parenthesized term.
    fn check_call_sites(&self, text: &str) -> ExResult<()> {
        let mut prev: Option<&str> = None;
        for piece in split_identifiers(text) {
            if piece == "(" {
                if let Some(prev) = prev {
                    let is_allowed =
                        prev == "(" || is_symbol_piece(prev) || self.parser.is_function_name(prev);
                    if !is_allowed {
                        let is_name = |c: char| c.is_alphanumeric() || c == '_' || c == '.';
                        let msg = if prev.starts_with(is_name) {
                            format!("Unsupported function: {prev}()")
                        } else {
                            format!("Unsupported function call after \"{prev}\"")
                        };
                        return Err(ExError::whitelist(msg));
                    }
                }
            }
            if !piece.trim().is_empty() {
                prev = Some(piece);
            }
        }
        Ok(())
    }

    fn check_variables(expr: &Expression<F>) -> ExResult<()> {
        let vars = expr.variables();
        let multi_char = vars
            .iter()
            .filter(|v| v.chars().count() > 1)
            .copied()
            .collect::<Vec<_>>();
        if !multi_char.is_empty() {
            return Err(ExError::whitelist(singular_or_plural(
                &multi_char,
                "Variable {} is not a single character",
                "Variables {} are not single characters",
            )));
        }
        let non_letters = vars
            .iter()
            .filter(|v| !is_single_letter(v))
            .copied()
            .collect::<Vec<_>>();
        if !non_letters.is_empty() {
            return Err(ExError::whitelist(singular_or_plural(
                &non_letters,
                "Variable {} is not a letter of a-z or A-Z",
                "Variables {} are not letters of a-z or A-Z",
            )));
        }
        Ok(())
    }

    /// Evaluates once with all variables set to 1.
    fn check_placeholder_eval(expr: &Expression<F>) -> ExResult<()> {
        let bindings = expr
            .variables()
            .into_iter()
            .map(|v| (v, Val::Scalar(F::one())))
            .collect::<HashMap<_, _>>();
        expr.eval(&bindings).map(|_| ())
    }

    /// Parses the text and applies all restrictions.
    ///
    /// # Errors
    ///
    /// Blacklisted characters, call sites, and variable names are reported with kind
    /// [`Whitelist`](crate::ExErrorKind::Whitelist). Parse and evaluation errors are passed
    /// through.
    pub fn check(&self, text: &str) -> ExResult<Expression<F>> {
        self.check_blacklist(text)?;
        let expr = self.parser.parse(text)?;
        self.check_call_sites(text)?;
        Self::check_variables(&expr)?;
        Self::check_placeholder_eval(&expr)?;
        Ok(expr)
    }

    pub fn verdict(&self, text: &str) -> Verdict {
        if text.is_empty() {
            return Verdict::Invalid {
                message: String::new(),
            };
        }
        match self.check(text) {
            Ok(expr) => {
                debug!("'{}' is valid", text);
                Verdict::Valid {
                    variables: expr.variables().iter().map(|v| v.to_string()).collect(),
                }
            }
            Err(e) => {
                debug!("'{}' is invalid, {}", text, e);
                Verdict::Invalid {
                    message: e.msg().to_string(),
                }
            }
        }
    }
}

impl<F: FloatType> Default for Whitelist<F> {
    fn default() -> Self {
        Whitelist::new(Parser::vector_calculator(), &DEFAULT_BLACKLIST)
    }
}

#[cfg(test)]
use crate::ExErrorKind;

#[test]
fn test_singular_plural() {
    assert_eq!(
        singular_or_plural(&["x"], "Variable {} is bad", "Variables {} are bad"),
        "Variable x is bad"
    );
    assert_eq!(
        singular_or_plural(&["x", "y"], "Variable {} is bad", "Variables {} are bad"),
        "Variables x, y are bad"
    );
}

#[test]
fn test_check() {
    let whitelist = Whitelist::<f64>::default();
    let check_msg = |text: &str, kind: ExErrorKind, msg: &str| {
        let err = whitelist.check(text).unwrap_err();
        assert_eq!(err.kind(), &kind);
        assert_eq!(err.msg(), msg);
    };
    check_msg("a'b", ExErrorKind::Whitelist, "Character ' is not allowed");
    check_msg(
        "\"a\"+'b'",
        ExErrorKind::Whitelist,
        "Characters \", ' are not allowed",
    );
    check_msg("a(b)", ExErrorKind::Whitelist, "Unsupported function: a()");
    check_msg("sin(x)", ExErrorKind::Whitelist, "Unsupported function: sin()");
    check_msg(
        "(a)(b)",
        ExErrorKind::Whitelist,
        "Unsupported function call after \")\"",
    );
    check_msg(
        "ab*2",
        ExErrorKind::Whitelist,
        "Variable ab is not a single character",
    );
    check_msg(
        "_+x",
        ExErrorKind::Whitelist,
        "Variable _ is not a letter of a-z or A-Z",
    );
    assert!(whitelist.check("x y").unwrap_err().column().is_some());

    for valid in [
        "x",
        "(x)",
        "-(x+y)",
        "sqrt (x)",
        "x*(y+z)",
        "((x))",
        "2**(x)",
        "log10(a-b)",
        "E^2*x",
    ] {
        assert!(whitelist.check(valid).is_ok(), "{valid}");
    }
}

#[test]
fn test_verdict() {
    let whitelist = Whitelist::<f64>::default();
    assert_eq!(Verdict::default(), Verdict::Unparsed);
    assert!(!Verdict::default().is_valid());

    let verdict = whitelist.verdict("");
    assert_eq!(verdict, Verdict::Invalid { message: "".to_string() });

    let verdict = whitelist.verdict("a+b*a");
    assert!(verdict.is_valid());
    assert_eq!(verdict.variables(), ["a", "b"]);
    assert_eq!(verdict.message(), "");

    let verdict = whitelist.verdict("a+");
    assert!(!verdict.is_valid());
    assert!(verdict.message().contains("parity"));
    assert!(verdict.variables().is_empty());
    assert_eq!(whitelist.verdict("a+"), verdict);

    let custom = Whitelist::new(Parser::<f64>::vector_calculator(), &[';']);
    assert!(custom.verdict("x;y").message().contains("Character ; is not allowed"));
    assert_eq!(custom.blacklist(), [';']);
}
