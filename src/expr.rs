//! Expression module for representing scalar rate-law expressions.
//!
//! This module defines the closed expression grammar shared by every code generation
//! target. The main types are:
//!
//! - `Expression`: An enum representing the node kinds of the grammar
//! - `BinaryOp` / `UnaryOp`: The closed operator set
//! - `RenderRules`: The per-target syntax a renderer needs (operator symbols,
//!   call syntax, precedence and parenthesization policy)
//!
//! The expression tree is built recursively using `Box<Expression>` for nested
//! expressions and can be:
//! - Rendered into any target syntax through a `RenderRules` implementation
//! - Scanned once for the names and functions it references
//! - Checked for the single-level call restriction
//! - Evaluated directly as a reference interpreter
//!
//! # Expression Tree Structure
//! The expression tree is built recursively with each node being one of:
//! - Leaf nodes: Literals and Names
//! - Unary operations: Neg
//! - Binary operations: Add, Sub, Mul, Div, Pow and the comparison set
//! - Calls: a function name with an ordered argument list
//!
//! # Parenthesization
//! Renderers parenthesize a child whenever its operator binds less tightly than
//! the parent, or equally tightly on the side the parent does not associate
//! towards (e.g. the right operand of subtraction or division). The rendered
//! text therefore re-parses to exactly the same tree.
//!
//! # Authoring
//! Expressions are usually written with operator overloading over owned or
//! borrowed expressions:
//!
//! ```
//! use kinetic_codegen::prelude::*;
//!
//! let k1 = Expression::name("k1");
//! let s = Expression::name("S");
//! let rate = &k1 * &s / (lit(1.0) + &s);
//! assert_eq!(rate.to_string(), "k1 * S / (1 + S)");
//! ```

use std::collections::{BTreeSet, HashSet};

use crate::errors::{CodegenError, EvalError};
use crate::functions::Builtin;

/// Binding strength of the operator classes, from loosest to tightest.
pub mod precedence {
    /// Comparisons (`<`, `<=`, `>`, `>=`, `==`, `!=`)
    pub const COMPARISON: u8 = 1;
    /// Addition and subtraction
    pub const SUM: u8 = 2;
    /// Multiplication and division
    pub const PRODUCT: u8 = 3;
    /// Prefix negation, and negative literals
    pub const PREFIX: u8 = 4;
    /// Exponentiation
    pub const POWER: u8 = 5;
    /// Leaves, calls and anything rendered with its own delimiters
    pub const ATOM: u8 = u8::MAX;
}

/// Binary operators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    /// Returns true for the comparison set used by conditional rate laws.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    /// The infix symbol used by the plain text syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// Applies the operator with floating-point semantics.
    ///
    /// Comparisons yield `1.0` when they hold and `0.0` otherwise. Division by
    /// zero and other numeric exceptions are not intercepted.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        let truth = |holds: bool| if holds { 1.0 } else { 0.0 };
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
            BinaryOp::Pow => left.powf(right),
            BinaryOp::Lt => truth(left < right),
            BinaryOp::Le => truth(left <= right),
            BinaryOp::Gt => truth(left > right),
            BinaryOp::Ge => truth(left >= right),
            BinaryOp::Eq => truth(left == right),
            BinaryOp::Ne => truth(left != right),
        }
    }
}

/// Unary operators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
}

impl UnaryOp {
    pub fn apply(self, operand: f64) -> f64 {
        match self {
            UnaryOp::Neg => -operand,
        }
    }
}

/// An expression tree node.
///
/// The set of node kinds is closed: every renderer and analysis matches it
/// exhaustively, so adding a kind is a compile error until all targets handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A floating point constant
    Literal(f64),
    /// A reference to a variable, parameter or derived quantity by name
    Name(String),
    /// A binary operation
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    /// A unary operation
    Unary(UnaryOp, Box<Expression>),
    /// A call to a named function with an ordered argument list
    Call(String, Vec<Expression>),
}

/// How a target writes a binary operator, which decides when operands need
/// parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    /// `left op right`, binding with the given strength
    Infix { precedence: u8, assoc: Assoc },
    /// Superscript style: the base is parenthesized unless atomic, the exponent
    /// is delimited by the target's own syntax
    Script { precedence: u8 },
    /// Function-like syntax whose operands never need parentheses
    Enclosed,
}

/// Side an infix operator associates towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// Target-specific syntax used when rendering an expression to text.
pub trait RenderRules {
    /// Text of a literal.
    fn literal(&self, value: f64) -> String;

    /// Binding strength of a rendered literal. Negative literals bind like a
    /// prefix negation unless the target wraps them.
    fn literal_precedence(&self, value: f64) -> u8 {
        if value.is_sign_negative() {
            precedence::PREFIX
        } else {
            precedence::ATOM
        }
    }

    /// Text of a name reference.
    fn name(&self, name: &str) -> String;

    /// How the target writes `op`.
    fn fixity(&self, op: BinaryOp) -> Fixity;

    /// Combines already-parenthesized operands.
    fn binary(&self, op: BinaryOp, left: &str, right: &str) -> String;

    /// Applies a unary operator to an already-parenthesized operand.
    fn unary(&self, op: UnaryOp, operand: &str) -> String;

    /// Text of a call with rendered arguments.
    fn call(&self, function: &str, args: &[String]) -> String;

    /// Wraps text in grouping parentheses.
    fn group(&self, inner: &str) -> String {
        format!("({inner})")
    }

    /// Whether a literal operand of a unary operator is always grouped. Set
    /// by targets whose reader folds `-<number>` into a negative literal.
    fn group_unary_literal(&self) -> bool {
        false
    }
}

/// Plain infix syntax, readable back by [`crate::convert::parse_expression`].
struct PlainRules;

impl RenderRules for PlainRules {
    fn literal(&self, value: f64) -> String {
        format!("{value}")
    }

    fn name(&self, name: &str) -> String {
        name.to_string()
    }

    fn fixity(&self, op: BinaryOp) -> Fixity {
        match op {
            BinaryOp::Add | BinaryOp::Sub => Fixity::Infix {
                precedence: precedence::SUM,
                assoc: Assoc::Left,
            },
            BinaryOp::Mul | BinaryOp::Div => Fixity::Infix {
                precedence: precedence::PRODUCT,
                assoc: Assoc::Left,
            },
            BinaryOp::Pow => Fixity::Infix {
                precedence: precedence::POWER,
                assoc: Assoc::None,
            },
            _ => Fixity::Infix {
                precedence: precedence::COMPARISON,
                assoc: Assoc::None,
            },
        }
    }

    fn binary(&self, op: BinaryOp, left: &str, right: &str) -> String {
        format!("{left} {} {right}", op.symbol())
    }

    fn unary(&self, op: UnaryOp, operand: &str) -> String {
        match op {
            UnaryOp::Neg => format!("-{operand}"),
        }
    }

    fn call(&self, function: &str, args: &[String]) -> String {
        format!("{function}({})", args.join(", "))
    }

    fn group_unary_literal(&self) -> bool {
        true
    }
}

impl Expression {
    /// Creates a literal node.
    pub fn literal(value: f64) -> Self {
        Expression::Literal(value)
    }

    /// Creates a name reference node.
    pub fn name(name: impl Into<String>) -> Self {
        Expression::Name(name.into())
    }

    /// Creates a binary node.
    pub fn binary(op: BinaryOp, left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Expression::Binary(op, Box::new(left.into()), Box::new(right.into()))
    }

    /// Creates a unary node.
    pub fn unary(op: UnaryOp, operand: impl Into<Expression>) -> Self {
        Expression::Unary(op, Box::new(operand.into()))
    }

    /// Creates a call node.
    pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call(function.into(), args)
    }

    /// Renders the expression with the syntax supplied by `rules`.
    ///
    /// # Arguments
    /// * `rules` - Operator symbols, call syntax and precedence policy of the target
    ///
    /// # Returns
    /// The rendered text, parenthesized so that it re-parses to the same tree
    pub fn render<R: RenderRules + ?Sized>(&self, rules: &R) -> String {
        self.render_node(rules).0
    }

    fn render_node<R: RenderRules + ?Sized>(&self, rules: &R) -> (String, u8) {
        match self {
            Expression::Literal(value) => (rules.literal(*value), rules.literal_precedence(*value)),
            Expression::Name(name) => (rules.name(name), precedence::ATOM),
            Expression::Unary(op, operand) => {
                let (text, inner) = operand.render_node(rules);
                let literal = matches!(**operand, Expression::Literal(_));
                let grouped =
                    inner <= precedence::PREFIX || (literal && rules.group_unary_literal());
                let text = if grouped {
                    rules.group(&text)
                } else {
                    text
                };
                (rules.unary(*op, &text), precedence::PREFIX)
            }
            Expression::Binary(op, left, right) => {
                let (left_text, left_prec) = left.render_node(rules);
                let (right_text, right_prec) = right.render_node(rules);
                match rules.fixity(*op) {
                    Fixity::Infix { precedence, assoc } => {
                        let wrap_left =
                            left_prec < precedence || (left_prec == precedence && assoc != Assoc::Left);
                        let wrap_right = right_prec < precedence
                            || (right_prec == precedence && assoc != Assoc::Right);
                        let left_text = wrap(rules, left_text, wrap_left);
                        let right_text = wrap(rules, right_text, wrap_right);
                        (rules.binary(*op, &left_text, &right_text), precedence)
                    }
                    Fixity::Script { precedence } => {
                        let left_text = wrap(rules, left_text, left_prec <= precedence);
                        (rules.binary(*op, &left_text, &right_text), precedence)
                    }
                    Fixity::Enclosed => (
                        rules.binary(*op, &left_text, &right_text),
                        precedence::ATOM,
                    ),
                }
            }
            Expression::Call(function, args) => {
                let args: Vec<String> = args.iter().map(|arg| arg.render(rules)).collect();
                (rules.call(function, &args), precedence::ATOM)
            }
        }
    }

    /// Visits every node in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        visit(self);
        match self {
            Expression::Literal(_) | Expression::Name(_) => {}
            Expression::Unary(_, operand) => operand.walk(visit),
            Expression::Binary(_, left, right) => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::Call(_, args) => args.iter().for_each(|arg| arg.walk(visit)),
        }
    }

    /// Names referenced by `Name` nodes, sorted and deduplicated.
    pub fn references(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.walk(&mut |node| {
            if let Expression::Name(name) = node {
                names.insert(name.as_str());
            }
        });
        names
    }

    /// Function names targeted by `Call` nodes, with their argument counts,
    /// in pre-order.
    pub fn calls(&self) -> Vec<(&str, usize)> {
        let mut calls = Vec::new();
        self.walk(&mut |node| {
            if let Expression::Call(function, args) = node {
                calls.push((function.as_str(), args.len()));
            }
        });
        calls
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Checks the single-level call restriction.
    ///
    /// Fails if any call's argument subtree itself contains a call whose name is
    /// one of `reactions`. The traversal visits every node once.
    ///
    /// # Arguments
    /// * `entity` - Name of the entity owning this expression, used in the error
    /// * `reactions` - Names of all reactions in the model
    pub fn check_single_level(
        &self,
        entity: &str,
        reactions: &HashSet<&str>,
    ) -> Result<(), CodegenError> {
        self.find_nested_call(None, reactions).map_or(Ok(()), |(outer, inner)| {
            Err(CodegenError::UnsupportedExpression {
                entity: entity.to_string(),
                reason: format!(
                    "call to '{outer}' receives a nested call to reaction '{inner}'; \
                     only single-level calls are supported"
                ),
            })
        })
    }

    fn find_nested_call<'a>(
        &'a self,
        enclosing: Option<&'a str>,
        reactions: &HashSet<&str>,
    ) -> Option<(&'a str, &'a str)> {
        match self {
            Expression::Literal(_) | Expression::Name(_) => None,
            Expression::Unary(_, operand) => operand.find_nested_call(enclosing, reactions),
            Expression::Binary(_, left, right) => left
                .find_nested_call(enclosing, reactions)
                .or_else(|| right.find_nested_call(enclosing, reactions)),
            Expression::Call(function, args) => {
                if let Some(outer) = enclosing {
                    if reactions.contains(function.as_str()) {
                        return Some((outer, function.as_str()));
                    }
                }
                let enclosing = enclosing.or(Some(function.as_str()));
                args.iter()
                    .find_map(|arg| arg.find_nested_call(enclosing, reactions))
            }
        }
    }

    /// Evaluates the expression.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value bound to a name, if any
    ///
    /// # Returns
    /// The floating-point value; numeric exceptions propagate as infinities or NaN
    pub fn eval(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64, EvalError> {
        match self {
            Expression::Literal(value) => Ok(*value),
            Expression::Name(name) => lookup(name).ok_or_else(|| EvalError::UnboundName(name.clone())),
            Expression::Unary(op, operand) => Ok(op.apply(operand.eval(lookup)?)),
            Expression::Binary(op, left, right) => Ok(op.apply(left.eval(lookup)?, right.eval(lookup)?)),
            Expression::Call(function, args) => {
                let builtin = Builtin::from_name(function)
                    .ok_or_else(|| EvalError::UnknownFunction(function.clone()))?;
                if args.len() != builtin.arity() {
                    return Err(EvalError::ArityMismatch {
                        function: function.clone(),
                        expected: builtin.arity(),
                        got: args.len(),
                    });
                }
                let values = args
                    .iter()
                    .map(|arg| arg.eval(lookup))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(builtin.apply(&values))
            }
        }
    }
}

fn wrap<R: RenderRules + ?Sized>(rules: &R, text: String, needed: bool) -> String {
    if needed {
        rules.group(&text)
    } else {
        text
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::Literal(value)
    }
}

impl From<&Expression> for Expression {
    fn from(expression: &Expression) -> Self {
        expression.clone()
    }
}

/// Creates a literal expression.
pub fn lit(value: f64) -> Expression {
    Expression::Literal(value)
}

/// Raises `base` to the power `exponent`.
pub fn pow(base: impl Into<Expression>, exponent: impl Into<Expression>) -> Expression {
    Expression::binary(BinaryOp::Pow, base, exponent)
}

/// Calls a function by name. Prefer the typed helpers in [`crate::functions`]
/// for built-in functions.
pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Expression {
    Expression::call(function, args)
}

macro_rules! comparison_helpers {
    ($($fn_name:ident => $op:ident, $doc:literal;)*) => {
        $(
            #[doc = $doc]
            pub fn $fn_name(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
                Expression::binary(BinaryOp::$op, left, right)
            }
        )*
    };
}

comparison_helpers! {
    lt => Lt, "`left < right`, evaluating to 1.0 or 0.0.";
    le => Le, "`left <= right`, evaluating to 1.0 or 0.0.";
    gt => Gt, "`left > right`, evaluating to 1.0 or 0.0.";
    ge => Ge, "`left >= right`, evaluating to 1.0 or 0.0.";
    eq => Eq, "`left == right`, evaluating to 1.0 or 0.0.";
    ne => Ne, "`left != right`, evaluating to 1.0 or 0.0.";
}

macro_rules! arithmetic_operator {
    ($trait:ident, $method:ident, $op:ident) => {
        impl std::ops::$trait<Expression> for Expression {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression {
                Expression::binary(BinaryOp::$op, self, rhs)
            }
        }

        impl std::ops::$trait<&Expression> for Expression {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression {
                Expression::binary(BinaryOp::$op, self, rhs)
            }
        }

        impl std::ops::$trait<Expression> for &Expression {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression {
                Expression::binary(BinaryOp::$op, self, rhs)
            }
        }

        impl std::ops::$trait<&Expression> for &Expression {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression {
                Expression::binary(BinaryOp::$op, self, rhs)
            }
        }
    };
}

arithmetic_operator!(Add, add, Add);
arithmetic_operator!(Sub, sub, Sub);
arithmetic_operator!(Mul, mul, Mul);
arithmetic_operator!(Div, div, Div);

impl std::ops::Neg for Expression {
    type Output = Expression;
    fn neg(self) -> Expression {
        Expression::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Neg for &Expression {
    type Output = Expression;
    fn neg(self) -> Expression {
        Expression::unary(UnaryOp::Neg, self)
    }
}

/// Implements string formatting for expressions.
///
/// The output uses plain infix notation with minimal parentheses:
/// - Literals are formatted as numbers
/// - Names are formatted verbatim
/// - Binary operations use `+ - * / ^` and the comparison symbols
/// - Calls use `f(a, b)` notation
impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&PlainRules))
    }
}
