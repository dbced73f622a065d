//! Conversion from infix expression strings into the expression IR.
//!
//! Strings are parsed with the [evalexpr](https://github.com/ISibboI/evalexpr)
//! crate and its operator tree is translated node by node. Only the parts of
//! the evalexpr grammar that have a counterpart in the closed expression
//! grammar are accepted:
//!
//! * Arithmetic: `+`, `-`, `*`, `/`, `^` and unary `-`
//! * Comparisons: `<`, `<=`, `>`, `>=`, `==`, `!=`
//! * Numeric constants (integers are widened to floats)
//! * Identifiers, read as name references
//! * Function calls with one or more arguments; `log` is read as `ln`
//!
//! Function names are kept as written; whether they exist is decided by the
//! validation pass of each generation call, like every other reference.

use evalexpr::{build_operator_tree, Node, Operator, Value};

use crate::errors::ConvertError;
use crate::expr::{BinaryOp, Expression, UnaryOp};

/// Parses an infix expression string.
///
/// # Example
/// ```
/// use kinetic_codegen::convert::parse_expression;
/// use kinetic_codegen::prelude::*;
///
/// let parsed = parse_expression("Vmax * S / (Km + S)").unwrap();
/// let (vmax, s, km) = (Expression::name("Vmax"), Expression::name("S"), Expression::name("Km"));
/// assert_eq!(parsed, &vmax * &s / (&km + &s));
/// ```
pub fn parse_expression(expression: &str) -> Result<Expression, ConvertError> {
    let node: Node = build_operator_tree(expression)?;
    build_expression(&node)
}

/// Converts an evalexpr operator tree into an expression.
///
/// # Arguments
/// * `node` - The evalexpr node to convert
///
/// # Returns
/// The converted expression, or the first unsupported construct found
pub fn build_expression(node: &Node) -> Result<Expression, ConvertError> {
    let children = node.children();
    match node.operator() {
        // Parenthesized groups and the top level both come as root nodes
        Operator::RootNode => match children {
            [child] => build_expression(child),
            _ => Err(ConvertError::RootNode(format!(
                "{} children in {:?}",
                children.len(),
                node.to_string()
            ))),
        },
        // evalexpr may chain several operands into one node
        Operator::Add => fold(children, BinaryOp::Add, "+"),
        Operator::Mul => fold(children, BinaryOp::Mul, "*"),
        Operator::Sub => binary(children, BinaryOp::Sub, "-"),
        Operator::Div => binary(children, BinaryOp::Div, "/"),
        Operator::Exp => binary(children, BinaryOp::Pow, "^"),
        Operator::Lt => binary(children, BinaryOp::Lt, "<"),
        Operator::Leq => binary(children, BinaryOp::Le, "<="),
        Operator::Gt => binary(children, BinaryOp::Gt, ">"),
        Operator::Geq => binary(children, BinaryOp::Ge, ">="),
        Operator::Eq => binary(children, BinaryOp::Eq, "=="),
        Operator::Neq => binary(children, BinaryOp::Ne, "!="),
        Operator::Neg => {
            let [operand] = operands::<1>(children, "-")?;
            // `-2` is a negative literal, `-(2)` stays a negation
            match (operand.operator(), build_expression(operand)?) {
                (Operator::Const { .. }, Expression::Literal(value)) => {
                    Ok(Expression::Literal(-value))
                }
                (_, operand) => Ok(Expression::unary(UnaryOp::Neg, operand)),
            }
        }
        Operator::Const { value } => match value {
            Value::Float(f) => Ok(Expression::Literal(*f)),
            Value::Int(i) => Ok(Expression::Literal(*i as f64)),
            _ => Err(ConvertError::ConstOperator(format!("{value:?}"))),
        },
        Operator::VariableIdentifierRead { identifier } => Ok(Expression::name(identifier.as_str())),
        Operator::FunctionIdentifier { identifier } => {
            let function = match identifier.as_str() {
                "log" => "ln",
                other => other,
            };
            let args = call_arguments(children)?
                .into_iter()
                .map(build_expression)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expression::call(function, args))
        }
        other => Err(ConvertError::UnsupportedOperator(format!("{other:?}"))),
    }
}

fn fold(children: &[Node], op: BinaryOp, symbol: &str) -> Result<Expression, ConvertError> {
    let Some((first, rest)) = children.split_first() else {
        return Err(ConvertError::Operands {
            operator: symbol.to_string(),
            expected: 2,
            got: 0,
        });
    };
    rest.iter()
        .try_fold(build_expression(first)?, |acc, child| {
            Ok(Expression::binary(op, acc, build_expression(child)?))
        })
}

fn binary(children: &[Node], op: BinaryOp, symbol: &str) -> Result<Expression, ConvertError> {
    let [left, right] = operands::<2>(children, symbol)?;
    Ok(Expression::binary(
        op,
        build_expression(left)?,
        build_expression(right)?,
    ))
}

fn operands<'a, const N: usize>(
    children: &'a [Node],
    symbol: &str,
) -> Result<[&'a Node; N], ConvertError> {
    let refs: Vec<&Node> = children.iter().collect();
    refs.try_into().map_err(|refs: Vec<&Node>| ConvertError::Operands {
        operator: symbol.to_string(),
        expected: N,
        got: refs.len(),
    })
}

/// Arguments of a call: a single expression, or the members of a tuple,
/// possibly wrapped in the root node of the parentheses.
fn call_arguments(children: &[Node]) -> Result<Vec<&Node>, ConvertError> {
    let mut node = match children {
        [child] => child,
        _ => return Ok(children.iter().collect()),
    };
    while let (Operator::RootNode, [inner]) = (node.operator(), node.children()) {
        node = inner;
    }
    match node.operator() {
        Operator::Tuple => Ok(node.children().iter().collect()),
        Operator::RootNode if node.children().is_empty() => Ok(Vec::new()),
        _ => Ok(vec![node]),
    }
}
