use log::debug;
use smallvec::SmallVec;

use crate::{
    data_type::FloatType,
    expression::{Bindings, Expression, Token},
    operators::{MakeOperators, Operator},
    parser::{Lexeme, Scanner},
    ExError, ExResult, FloatOpsFactory, NumericMode, Val, VectorCalcOpsFactory,
};

// What may come next, combined as bit mask.
const PRIMARY: u8 = 1;
const OPERATOR: u8 = 2;
const FUNCTION: u8 = 4;
const LPAREN: u8 = 8;
const RPAREN: u8 = 16;
const SIGN: u8 = 32;
const CALL: u8 = 64;
const NULLARY_CALL: u8 = 128;

/// Added to all priorities per level of parentheses.
const PAREN_PRIO: i32 = 10;
const SIGN_PRIO: i32 = 5;
const FUNCTION_PRIO: i32 = 9;
const CALL_PRIO: i32 = -2;

/// Settings of a [`Parser`](Parser) besides its operators.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct ParserConfig {
    /// Numeric mode that is attached to all parsed expressions.
    pub numeric_mode: NumericMode,
}

struct PendingOp<F: FloatType> {
    token: Token<F>,
    prio: i32,
}

/// Stacks of one parse run.
struct ParseState<F: FloatType> {
    output: Vec<Token<F>>,
    pending: SmallVec<[PendingOp<F>; 16]>,
    n_operators: usize,
}

impl<F: FloatType> ParseState<F> {
    fn new() -> Self {
        ParseState {
            output: vec![],
            pending: SmallVec::new(),
            n_operators: 0,
        }
    }

    /// Operators with an operand on the left resolve pending operators of lower or equal
    /// priority first.
    fn push_infix(&mut self, token: Token<F>, prio: i32) {
        while let Some(top) = self.pending.last() {
            if prio <= top.prio {
                if let Some(op) = self.pending.pop() {
                    self.output.push(op.token);
                }
            } else {
                break;
            }
        }
        self.pending.push(PendingOp { token, prio });
    }

    /// Prefix operators have no operand on their left, everything pending waits for them.
    fn push_prefix(&mut self, token: Token<F>, prio: i32) {
        self.pending.push(PendingOp { token, prio });
    }

    fn finish(mut self) -> Vec<Token<F>> {
        while let Some(op) = self.pending.pop() {
            self.output.push(op.token);
        }
        self.output
    }
}

/// Parses strings into [`Expression`](Expression)s by precedence climbing. The parser owns
/// its operators and constants and is immutable. Hence, one instance can be shared by many
/// threads.
///
/// ```rust
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// #
/// use std::collections::HashMap;
/// use veccalc::{Parser, Val};
/// let parser = Parser::<f64>::vector_calculator();
/// let expr = parser.parse("-3^x")?;
/// let bindings = HashMap::from([("x", Val::Scalar(4.0))]);
/// assert_eq!(expr.eval(&bindings)?, Val::Scalar(-81.0));
/// assert_eq!(parser.evaluate("(-3)^x", &bindings)?, Val::Scalar(81.0));
/// #
/// #     Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Parser<F: FloatType = f64> {
    ops: Vec<Operator<'static, F>>,
    config: ParserConfig,
}

impl<F: FloatType> Parser<F> {
    pub fn from_ops(ops: Vec<Operator<'static, F>>, config: ParserConfig) -> Self {
        Parser { ops, config }
    }

    /// Creates a parser with the operators of the given factory.
    pub fn from_factory<OF: MakeOperators<F>>() -> Self {
        Parser::from_ops(OF::make(), ParserConfig::default())
    }

    /// Parser with the restricted operator set of the vector calculator,
    /// see [`VectorCalcOpsFactory`](VectorCalcOpsFactory).
    pub fn vector_calculator() -> Self {
        Parser::from_factory::<VectorCalcOpsFactory<F>>()
    }

    /// Parser with all operators of [`FloatOpsFactory`](FloatOpsFactory).
    pub fn float() -> Self {
        Parser::from_factory::<FloatOpsFactory<F>>()
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_numeric_mode(mut self, numeric_mode: NumericMode) -> Self {
        self.config.numeric_mode = numeric_mode;
        self
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    pub fn operators(&self) -> &[Operator<'static, F>] {
        &self.ops
    }

    /// Named operators are functions from the perspective of a user, e.g., `sqrt` or `ln`.
    pub fn is_function_name(&self, name: &str) -> bool {
        name.starts_with(char::is_alphabetic)
            && self
                .ops
                .iter()
                .any(|op| op.repr() == name && (op.has_unary() || op.has_bin()))
    }

    fn unary_token(&self, repr: &str) -> Option<Token<F>> {
        self.ops.iter().find_map(|op| {
            let apply = op.unary().filter(|_| op.repr() == repr)?;
            Some(Token::UnaryOp {
                repr: op.repr(),
                apply,
            })
        })
    }

    fn binary_token(&self, repr: &str) -> Option<Token<F>> {
        self.ops.iter().find_map(|op| {
            let bin_op = op.bin().filter(|_| op.repr() == repr)?;
            Some(Token::BinaryOp {
                repr: op.repr(),
                apply: bin_op.apply,
            })
        })
    }

    /// Parses a string into an expression.
    ///
    /// # Errors
    ///
    /// An [`ExError`](ExError) of kind [`Parse`](crate::ExErrorKind::Parse) that contains the
    /// column of the problem.
    pub fn parse(&self, text: &str) -> ExResult<Expression<F>> {
        let err = |column: usize, msg: &str| ExError::parse(column, msg, text);
        let mut scanner = Scanner::new(text, &self.ops);
        let mut state = ParseState::new();
        let mut expected = PRIMARY | LPAREN | FUNCTION | SIGN;
        let mut paren_offset = 0;

        while let Some((lexeme, column)) = scanner.next_lexeme()? {
            match lexeme {
                Lexeme::Symbol { repr, prio } => {
                    if (repr == "+" || repr == "-") && expected & SIGN != 0 {
                        if repr == "-" {
                            let token = self
                                .unary_token(repr)
                                .ok_or_else(|| err(column, "unexpected operator"))?;
                            state.push_prefix(token, SIGN_PRIO + paren_offset);
                            state.n_operators += 1;
                        }
                    } else {
                        if expected & OPERATOR == 0 {
                            return Err(err(column, "unexpected operator"));
                        }
                        let token = self
                            .binary_token(repr)
                            .ok_or_else(|| err(column, "unexpected operator"))?;
                        state.push_infix(token, prio + paren_offset);
                        state.n_operators += 2;
                    }
                    expected = PRIMARY | LPAREN | FUNCTION | SIGN;
                }
                Lexeme::Num(x) | Lexeme::Constant(x) => {
                    if expected & PRIMARY == 0 {
                        let msg = if let Lexeme::Num(_) = lexeme {
                            "unexpected number"
                        } else {
                            "unexpected constant"
                        };
                        return Err(err(column, msg));
                    }
                    state.output.push(Token::Num(Val::Scalar(x)));
                    expected = OPERATOR | RPAREN;
                }
                Lexeme::OpenParen => {
                    paren_offset += PAREN_PRIO;
                    if expected & LPAREN == 0 {
                        return Err(err(column, "unexpected \"(\""));
                    }
                    if expected & CALL != 0 {
                        state.push_infix(Token::Call, CALL_PRIO + paren_offset);
                        state.n_operators += 2;
                        expected = PRIMARY | LPAREN | FUNCTION | SIGN | NULLARY_CALL;
                    } else {
                        expected = PRIMARY | LPAREN | FUNCTION | SIGN;
                    }
                }
                Lexeme::CloseParen => {
                    paren_offset -= PAREN_PRIO;
                    if paren_offset < 0 {
                        return Err(err(column, "unmatched \"()\""));
                    }
                    if expected & NULLARY_CALL != 0 {
                        state.output.push(Token::Num(Val::List(vec![])));
                    } else if expected & RPAREN == 0 {
                        return Err(err(column, "unexpected \")\""));
                    }
                    expected = OPERATOR | RPAREN | LPAREN | CALL;
                }
                Lexeme::UnaryFunc(repr) => {
                    if expected & FUNCTION == 0 {
                        return Err(err(column, "unexpected function"));
                    }
                    let token = self
                        .unary_token(repr)
                        .ok_or_else(|| err(column, "unexpected function"))?;
                    state.push_prefix(token, FUNCTION_PRIO + paren_offset);
                    state.n_operators += 1;
                    expected = LPAREN;
                }
                Lexeme::BinaryFunc { repr, prio } => {
                    if expected & OPERATOR == 0 {
                        return Err(err(column, "unexpected function"));
                    }
                    let token = self
                        .binary_token(repr)
                        .ok_or_else(|| err(column, "unexpected function"))?;
                    state.push_infix(token, prio + paren_offset);
                    state.n_operators += 2;
                    expected = PRIMARY | LPAREN | FUNCTION | SIGN;
                }
                Lexeme::Var(name) => {
                    if expected & PRIMARY == 0 {
                        return Err(err(column, "unexpected variable"));
                    }
                    state.output.push(Token::Var(name.to_string()));
                    expected = OPERATOR | RPAREN | LPAREN | CALL;
                }
                Lexeme::Whitespace => (),
            }
        }
        let end = scanner.column();
        if paren_offset != 0 {
            return Err(err(end, "unmatched \"()\""));
        }
        let n_operators = state.n_operators;
        let tokens = state.finish();
        if n_operators + 1 != tokens.len() {
            return Err(err(end, "parity"));
        }
        let expr = Expression::new(text, tokens, self.config.numeric_mode);
        debug!("parsed '{}' to '{}'", text, expr.to_postfix_string());
        Ok(expr)
    }

    /// Parses and evaluates in one go.
    pub fn evaluate<B: Bindings<F> + ?Sized>(&self, text: &str, bindings: &B) -> ExResult<Val<F>> {
        self.parse(text)?.eval(bindings)
    }
}

impl<F: FloatType> Default for Parser<F> {
    fn default() -> Self {
        Parser::vector_calculator()
    }
}

#[cfg(test)]
use crate::{util::assert_float_eq_f64, BinOp, ExErrorKind};
#[cfg(test)]
use std::collections::HashMap;

#[cfg(test)]
fn postfix(text: &str) -> String {
    Parser::<f64>::vector_calculator()
        .parse(text)
        .unwrap()
        .to_postfix_string()
}

#[test]
fn test_postfix() {
    assert_eq!(postfix("a+b*c"), "a b c * +");
    assert_eq!(postfix("(a+b)*c"), "a b + c *");
    assert_eq!(postfix("a-b-c"), "a b - c -");
    assert_eq!(postfix("a^b^c"), "a b ^ c ^");
    assert_eq!(postfix("-a^b"), "a b ^ -");
    assert_eq!(postfix("(-a)^b"), "a - b ^");
    assert_eq!(postfix("2*-3"), "2 3 - *");
    assert_eq!(postfix("2^-3+1"), "2 3 - ^ 1 +");
    assert_eq!(postfix("+a"), "a");
    assert_eq!(postfix("sqrt(a)^2"), "a sqrt 2 ^");
    assert_eq!(postfix("ln(a)+log10(b)"), "a ln b log10 +");
    assert_eq!(postfix("a\u{2219}b"), "a b *");
    assert_eq!(postfix("f(x)"), "f x CALL");
    assert_eq!(postfix("f()"), "f () CALL");
}

#[test]
fn test_parse_errors() {
    fn test(text: &str, msg_part: &str, column: usize) {
        let err = Parser::<f64>::vector_calculator().parse(text).unwrap_err();
        println!("{}", err);
        assert!(err.msg().contains(msg_part));
        assert_eq!(err.kind(), &ExErrorKind::Parse { column });
        assert!(err.msg().ends_with(&format!("expression: {text}")));
    }
    test("*2", "unexpected operator", 0);
    test("2 3", "unexpected number", 2);
    test("x y", "unexpected variable", 2);
    test("2 PI", "unexpected constant", 2);
    test("2 sqrt(x)", "unexpected function", 2);
    test("sqrt x", "unexpected variable", 5);
    test("2(3)", "unexpected \"(\"", 1);
    test("(2+)", "unexpected \")\"", 3);
    test("2+)", "unmatched \"()\"", 2);
    test("()", "unexpected \")\"", 1);
    test("x)+(y", "unmatched \"()\"", 1);
    test("(x", "unmatched \"()\"", 2);
    test("x(", "unmatched \"()\"", 2);
    test("x,y", "unknown character", 1);
    test("a==b", "unknown character", 1);
    test("2+", "parity", 2);
    test("", "parity", 0);
    test("-", "parity", 1);
    test("2e", "unexpected variable", 1);
}

#[test]
fn test_parse_column_unicode() {
    let err = Parser::<f64>::vector_calculator()
        .parse("a\u{2022}\u{2022}b")
        .unwrap_err();
    assert_eq!(err.column(), Some(2));
}

#[test]
fn test_named_binary_operator() {
    #[derive(Clone)]
    struct ModFactory;
    impl MakeOperators<f64> for ModFactory {
        fn make<'a>() -> Vec<Operator<'a, f64>> {
            let mut ops = VectorCalcOpsFactory::<f64>::make();
            ops.push(Operator::make_bin(
                "mod",
                BinOp {
                    apply: crate::operators::floored_mod,
                    prio: 6,
                },
            ));
            ops
        }
    }
    let parser = Parser::<f64>::from_factory::<ModFactory>();
    let bindings: HashMap<&str, Val<f64>> = HashMap::new();
    let res = parser.evaluate("2 + 7 mod 3", &bindings).unwrap();
    assert_float_eq_f64(res.to_scalar().unwrap(), 3.0);
    assert!(parser.is_function_name("mod"));
    assert!(parser.is_function_name("sqrt"));
    assert!(!parser.is_function_name("sin"));
    assert!(!parser.is_function_name("+"));
    assert!(parser.parse("mod 3").is_err());
}

#[test]
fn test_parser_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Parser<f64>>();
    assert_send_sync::<Expression<f32>>();
}
