//! Data exchanged with the user interface of the vector calculator and the functions that
//! operate on it.
use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::{BuildHasher, Hash},
};

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    data_type::FloatType,
    whitelist::Verdict,
    ExResult, Expression, Val, Whitelist,
};

/// Maximal number of characters of an expression name.
pub const MAX_NAME_LENGTH: usize = 50;

/// Pair of a variable name and the names of vectors it is mapped to.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct VariableVectorMapInfo {
    pub variable_name: String,
    pub vector_name: Vec<String>,
}

/// Expression as it is stored by the user interface.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ExpressionInfo {
    pub name: String,
    pub expression: String,
    pub id: String,
    pub variable_vector_map: Vec<VariableVectorMapInfo>,
    pub is_valid: bool,
    pub is_deletable: bool,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
}

impl ExpressionInfo {
    /// Expression a new entry in the user interface starts with, `x+2*y`.
    pub fn default_expression(id: &str) -> Self {
        let variable = |name: &str| VariableVectorMapInfo {
            variable_name: name.to_string(),
            vector_name: vec![],
        };
        ExpressionInfo {
            name: String::new(),
            expression: "x+2*y".to_string(),
            id: id.to_string(),
            variable_vector_map: vec![variable("x"), variable("y")],
            is_valid: false,
            is_deletable: true,
            description: None,
        }
    }
}

/// Node of the tree of vector names, e.g., `WOPT` with the child `OP_1` for `WOPT:OP_1`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VectorTreeNode {
    pub name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub children: Vec<VectorTreeNode>,
}

impl VectorTreeNode {
    pub fn new(name: &str, children: Vec<VectorTreeNode>) -> Self {
        VectorTreeNode {
            name: name.to_string(),
            children,
        }
    }
}

/// Result of parsing an [`ExpressionInfo`](ExpressionInfo) that is sent back to the user
/// interface.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ExternalParseData {
    pub expression: String,
    pub id: String,
    pub variables: Vec<String>,
    pub is_valid: bool,
    pub message: String,
}

/// Maps each variable to the first name of its vectors. Variables without vector are skipped.
pub fn variable_vector_dict(var_vec_map: &[VariableVectorMapInfo]) -> HashMap<String, String> {
    var_vec_map
        .iter()
        .filter_map(|elt| {
            elt.vector_name
                .first()
                .map(|vec_name| (elt.variable_name.clone(), vec_name.clone()))
        })
        .collect()
}

/// Splits into runs of `[a-zA-Z0-9]` and single other characters.
fn split_pieces(text: &str) -> impl Iterator<Item = &str> {
    lazy_static! {
        static ref RE_PIECES: Regex = Regex::new(r"[a-zA-Z0-9]+|[^a-zA-Z0-9]").unwrap();
    }
    RE_PIECES.find_iter(text).map(|m| m.as_str())
}

/// Expression with variables replaced by the names of the vectors they are mapped to.
///
/// ```rust
/// use veccalc::{detailed_expression, ExpressionInfo};
/// let mut info = ExpressionInfo::default_expression("0");
/// info.variable_vector_map[0].vector_name = vec!["WOPT:OP_1".to_string()];
/// assert_eq!(detailed_expression(&info), "WOPT:OP_1+2*y");
/// ```
pub fn detailed_expression(info: &ExpressionInfo) -> String {
    let var_vec_dict = variable_vector_dict(&info.variable_vector_map);
    split_pieces(&info.expression)
        .map(|piece| {
            var_vec_dict
                .get(piece)
                .map(|s| s.as_str())
                .unwrap_or(piece)
        })
        .collect()
}

/// Checks whether the name can be used for a new vector, e.g., `WOPT:OP_1`.
pub fn is_valid_expression_name(name: &str) -> bool {
    lazy_static! {
        static ref RE_NAME: Regex = Regex::new(r"^[A-Za-z]([:_]?[A-Za-z0-9]+)*$").unwrap();
    }
    let n_chars = name.chars().count();
    (1..=MAX_NAME_LENGTH).contains(&n_chars) && RE_NAME.is_match(name)
}

/// Checks whether the `:`-separated parts of `name` lead to a leaf of the vector tree or end
/// at an inner node. A name that leaves the tree is free, e.g., `WOPT:OP_3` if only
/// `WOPT:OP_1` exists.
pub fn is_name_occupied_by_vectors(name: &str, vectors: &[VectorTreeNode]) -> bool {
    let mut children = vectors;
    for part in name.split(':') {
        match children.iter().find(|child| child.name == part) {
            None => return false,
            Some(child) if child.children.is_empty() => return true,
            Some(child) => children = &child.children,
        }
    }
    true
}

pub fn is_valid_and_unoccupied_expression_name(name: &str, vectors: &[VectorTreeNode]) -> bool {
    is_valid_expression_name(name) && !is_name_occupied_by_vectors(name, vectors)
}

/// Explains what is wrong with a name. Returns an empty string for valid names.
pub fn expression_name_validation_message(name: &str) -> String {
    lazy_static! {
        static ref RE_WHITESPACE: Regex = Regex::new(r"\s").unwrap();
        static ref RE_DOUBLE_COLON: Regex = Regex::new(r":{2,}").unwrap();
        static ref RE_DOUBLE_UNDERSCORE: Regex = Regex::new(r"_{2,}").unwrap();
        static ref RE_COLON_FOLLOWER: Regex = Regex::new(r":[^a-zA-Z0-9]").unwrap();
        static ref RE_UNDERSCORE_FOLLOWER: Regex = Regex::new(r"_[^a-zA-Z0-9]").unwrap();
    }
    let msg = if is_valid_expression_name(name) {
        ""
    } else if name.is_empty() {
        "Empty name!"
    } else if name.chars().count() > MAX_NAME_LENGTH {
        "Maximum 50 characters!"
    } else if RE_WHITESPACE.is_match(name) {
        "Whitespace not allowed!"
    } else if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        "First character must be: a-z or A-Z"
    } else if name.ends_with(':') {
        "Cannot end with \" : \""
    } else if name.ends_with('_') {
        "Cannot end with \" _ \""
    } else if RE_DOUBLE_COLON.is_match(name) {
        "Only one \" : \" in a row"
    } else if RE_DOUBLE_UNDERSCORE.is_match(name) {
        "Only one \" _ \" in a row"
    } else if RE_COLON_FOLLOWER.is_match(name) {
        "\" : \" Must be followed by: a-z, A-Z or 0-9"
    } else if RE_UNDERSCORE_FOLLOWER.is_match(name) {
        "\" _ \" Must be followed by: a-z, A-Z or 0-9"
    } else {
        "Valid characters: a-z, A-Z, 0-9, \" _ \" and \" : \""
    };
    msg.to_string()
}

/// Proposes `suggestion` or, if taken, `suggestion_1`, `suggestion_2`, ... as name that is not
/// used by any of the expressions.
pub fn available_name(suggestion: &str, expressions: &[ExpressionInfo]) -> String {
    let is_taken = |name: &str| expressions.iter().any(|e| e.name == name);
    let mut name = suggestion.to_string();
    let mut n = 1;
    while is_taken(&name) {
        name = format!("{suggestion}_{n}");
        n += 1;
    }
    name
}

/// Entry point for the user interface. All expressions are checked against a
/// [`Whitelist`](Whitelist).
///
/// ```rust
/// use std::collections::HashMap;
/// use veccalc::{ExpressionInfo, Val, VectorCalculator};
/// let calculator = VectorCalculator::<f64>::default();
/// let info = ExpressionInfo::default_expression("some-id");
/// let parse_data = calculator.external_parse_data(&info);
/// assert!(parse_data.is_valid);
/// assert_eq!(parse_data.variables, ["x", "y"]);
///
/// let values = HashMap::from([("x", Val::from(vec![1.0, 2.0])), ("y", Val::Scalar(0.5))]);
/// let res = calculator.evaluate_expression("x+2*y", &values);
/// assert_eq!(res, Some(Val::Array(vec![2.0, 3.0])));
/// ```
#[derive(Clone, Debug, Default)]
pub struct VectorCalculator<F: FloatType = f64> {
    whitelist: Whitelist<F>,
}

impl<F: FloatType> VectorCalculator<F> {
    pub fn new(whitelist: Whitelist<F>) -> Self {
        VectorCalculator { whitelist }
    }

    pub fn whitelist(&self) -> &Whitelist<F> {
        &self.whitelist
    }

    /// Parses and checks the expression against the whitelist.
    pub fn parse_expression(&self, text: &str) -> ExResult<Expression<F>> {
        self.whitelist.check(text)
    }

    pub fn external_parse_data(&self, info: &ExpressionInfo) -> ExternalParseData {
        let verdict = self.whitelist.verdict(&info.expression);
        debug!("verdict for expression with id {}: {:?}", info.id, verdict);
        let (variables, is_valid, message) = match verdict {
            Verdict::Valid { variables } => (variables, true, String::new()),
            Verdict::Invalid { message } => (vec![], false, message),
            Verdict::Unparsed => (vec![], false, String::new()),
        };
        ExternalParseData {
            expression: info.expression.clone(),
            id: info.id.clone(),
            variables,
            is_valid,
            message,
        }
    }

    pub fn validate_expression(&self, info: &ExpressionInfo) -> bool {
        self.whitelist.check(&info.expression).is_ok()
    }

    /// Evaluates a valid expression. Returns `None` if the expression is invalid, if the
    /// evaluation fails, or if a variable of `values` does not occur in the expression.
    pub fn evaluate_expression<K, S>(
        &self,
        expression: &str,
        values: &HashMap<K, Val<F>, S>,
    ) -> Option<Val<F>>
    where
        K: Borrow<str> + Hash + Eq,
        S: BuildHasher,
    {
        let mut invalid_variables = values
            .keys()
            .map(|k| Borrow::<str>::borrow(k))
            .filter(|k| !expression.contains(*k))
            .collect::<Vec<_>>();
        if !invalid_variables.is_empty() {
            invalid_variables.sort_unstable();
            warn!(
                "variables {:?} are not present in expression '{}'",
                invalid_variables, expression
            );
            return None;
        }
        match self
            .parse_expression(expression)
            .and_then(|expr| expr.eval(values))
        {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("could not evaluate '{}', {}", expression, e);
                None
            }
        }
    }
}

#[test]
fn test_split_pieces() {
    let pieces = split_pieces("log10(a)+ b").collect::<Vec<_>>();
    assert_eq!(pieces, ["log10", "(", "a", ")", "+", " ", "b"]);
    let pieces = split_pieces("a\u{2219}b").collect::<Vec<_>>();
    assert_eq!(pieces, ["a", "\u{2219}", "b"]);
}

#[cfg(test)]
fn info(expression: &str) -> ExpressionInfo {
    ExpressionInfo {
        expression: expression.to_string(),
        id: "id".to_string(),
        ..ExpressionInfo::default_expression("id")
    }
}

#[test]
fn test_external_parse_data() {
    let calculator = VectorCalculator::<f64>::default();
    let data = calculator.external_parse_data(&info("a-b/100"));
    assert_eq!(
        data,
        ExternalParseData {
            expression: "a-b/100".to_string(),
            id: "id".to_string(),
            variables: vec!["a".to_string(), "b".to_string()],
            is_valid: true,
            message: String::new(),
        }
    );
    let data = calculator.external_parse_data(&info(""));
    assert!(!data.is_valid);
    assert!(data.message.is_empty());
    let data = calculator.external_parse_data(&info("ab"));
    assert!(!data.is_valid);
    assert!(data.variables.is_empty());
    assert_eq!(data.message, "Variable ab is not a single character");
    assert!(calculator.validate_expression(&info("sqrt(a)")));
    assert!(!calculator.validate_expression(&info("sin(a)")));
}

#[test]
fn test_evaluate_expression() {
    let calculator = VectorCalculator::<f64>::default();
    let values = HashMap::from([
        ("a".to_string(), Val::from(vec![2.0, 3.0, 4.0])),
        ("b".to_string(), Val::Scalar(1.0)),
    ]);
    assert_eq!(
        calculator.evaluate_expression("a*3-b", &values),
        Some(Val::Array(vec![5.0, 8.0, 11.0]))
    );
    assert_eq!(calculator.evaluate_expression("a*3", &values), None);
    assert_eq!(calculator.evaluate_expression("a*b+c", &values), None);
    assert_eq!(calculator.evaluate_expression("a*b+", &values), None);
    assert_eq!(calculator.evaluate_expression("ab*b", &values), None);
}

#[test]
fn test_detailed_expression() {
    let mut info = info("a+b*ab-log10(b)");
    info.variable_vector_map = vec![
        VariableVectorMapInfo {
            variable_name: "a".to_string(),
            vector_name: vec!["FOPT".to_string(), "FOPR".to_string()],
        },
        VariableVectorMapInfo {
            variable_name: "b".to_string(),
            vector_name: vec!["WOPT:OP_1".to_string()],
        },
        VariableVectorMapInfo {
            variable_name: "c".to_string(),
            vector_name: vec![],
        },
    ];
    assert_eq!(
        detailed_expression(&info),
        "FOPT+WOPT:OP_1*ab-log10(WOPT:OP_1)"
    );
    let dict = variable_vector_dict(&info.variable_vector_map);
    assert_eq!(dict.len(), 2);
    assert_eq!(dict["a"], "FOPT");
}

#[test]
fn test_expression_names() {
    for valid in ["a", "WOPT:OP_1", "x_2:y", "A1b2"] {
        assert!(is_valid_expression_name(valid), "{valid}");
        assert_eq!(expression_name_validation_message(valid), "");
    }
    let test = |name: &str, msg: &str| {
        assert!(!is_valid_expression_name(name));
        assert_eq!(expression_name_validation_message(name), msg);
    };
    test("", "Empty name!");
    test(&"a".repeat(51), "Maximum 50 characters!");
    test("a b", "Whitespace not allowed!");
    test("1a", "First character must be: a-z or A-Z");
    test("a:", "Cannot end with \" : \"");
    test("a_", "Cannot end with \" _ \"");
    test("a::b", "Only one \" : \" in a row");
    test("a__b", "Only one \" _ \" in a row");
    test("a:_b", "\" : \" Must be followed by: a-z, A-Z or 0-9");
    test("a_:b", "\" _ \" Must be followed by: a-z, A-Z or 0-9");
    test("a-b", "Valid characters: a-z, A-Z, 0-9, \" _ \" and \" : \"");
    assert!(is_valid_expression_name(&"a".repeat(50)));
}

#[test]
fn test_default_expression_and_names() {
    let info = ExpressionInfo::default_expression("abc");
    assert_eq!(info.expression, "x+2*y");
    assert_eq!(info.id, "abc");
    assert!(!info.is_valid && info.is_deletable);
    assert_eq!(info.variable_vector_map.len(), 2);
    assert!(info.variable_vector_map.iter().all(|m| m.vector_name.is_empty()));

    let mut taken = info.clone();
    taken.name = "x".to_string();
    let mut taken_1 = info;
    taken_1.name = "x_1".to_string();
    assert_eq!(available_name("y", &[taken.clone()]), "y");
    assert_eq!(available_name("x", &[taken.clone()]), "x_1");
    assert_eq!(available_name("x", &[taken, taken_1]), "x_2");
}

#[test]
fn test_names_occupied_by_vectors() {
    let vectors = [
        VectorTreeNode::new(
            "WOPT",
            vec![
                VectorTreeNode::new("OP_1", vec![]),
                VectorTreeNode::new("OP_2", vec![]),
            ],
        ),
        VectorTreeNode::new("FOPT", vec![]),
    ];
    for occupied in ["FOPT", "WOPT", "WOPT:OP_1", "FOPT:x", "WOPT:OP_2:x"] {
        assert!(is_name_occupied_by_vectors(occupied, &vectors), "{occupied}");
    }
    for free in ["GOPT", "WOPT:OP_3", "wopt", "FOPT1"] {
        assert!(!is_name_occupied_by_vectors(free, &vectors), "{free}");
    }
    assert!(!is_name_occupied_by_vectors("FOPT", &[]));

    assert!(is_valid_and_unoccupied_expression_name("WOPT:OP_3", &vectors));
    assert!(!is_valid_and_unoccupied_expression_name("WOPT:OP_1", &vectors));
    assert!(!is_valid_and_unoccupied_expression_name("GOPT:", &vectors));
}
