//! Error types for the kinetic-codegen crate.
//!
//! This module defines the failure modes of every stage of the pipeline:
//!
//! - `CodegenError`: Validation failures detected before any artifact is emitted
//! - `ModelError`: Errors while authoring a model through the builder
//! - `ConvertError`: Errors during conversion from evalexpr AST to the expression IR
//! - `DocumentError`: Errors while loading a JSON model document
//! - `EvalError`: Errors during reference evaluation of a model
//!
//! Each error type implements the standard Error trait and provides detailed error messages.

use evalexpr::{DefaultNumericTypes, EvalexprError};
use itertools::Itertools;
use thiserror::Error;

use crate::model::EntityKind;
use crate::naming::Target;

/// Errors raised by the validation pass that precedes every code generation call.
///
/// Generation is fail-closed: when any of these is returned, no partial artifact
/// has been produced. Every variant names the offending entity or entities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// An expression violates the structural restrictions of the IR, such as a
    /// call into a reaction nested inside another call
    #[error("unsupported expression in '{entity}': {reason}")]
    UnsupportedExpression { entity: String, reason: String },
    /// Derived quantities reference each other in a cycle
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<String> },
    /// Two distinct raw names map to the same identifier for a target
    #[error("names '{first}' and '{second}' both sanitize to '{sanitized}' for the {target} target")]
    NameCollision {
        first: String,
        second: String,
        sanitized: String,
        target: Target,
    },
    /// An expression or stoichiometry entry references a name absent from the model
    #[error("'{entity}' references unknown name '{name}'")]
    UnknownReference { entity: String, name: String },
}

fn format_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {first}", cycle.iter().join(" -> ")),
        None => String::new(),
    }
}

/// Errors that can occur while authoring a model with `ModelBuilder`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The same name was declared twice, possibly for two different entity kinds
    #[error("duplicate name '{name}': declared as {first} and again as {second}")]
    DuplicateName {
        name: String,
        first: EntityKind,
        second: EntityKind,
    },
}

/// Errors that can occur during conversion from evalexpr AST to the expression IR.
///
/// This enum represents the parts of the evalexpr grammar that have no
/// counterpart in the closed expression grammar.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Error when the expression string cannot be parsed by evalexpr
    #[error("failed to parse expression: {0}")]
    Parse(#[from] EvalexprError<DefaultNumericTypes>),
    /// Error when encountering an operator that is not supported by our implementation
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// Error when a constant value is not numeric
    #[error("expected numeric constant: {0}")]
    ConstOperator(String),
    /// Error when the root node does not have exactly one child
    #[error("expected single child for root node: {0}")]
    RootNode(String),
    /// Error when an operator node does not have the expected number of children
    #[error("operator {operator} expects {expected} operands, got {got}")]
    Operands {
        operator: String,
        expected: usize,
        got: usize,
    },
}

/// Errors that can occur while loading a JSON model document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to parse JSON
    #[error("failed to parse model document: {0}")]
    Json(#[from] serde_json::Error),
    /// An expression string inside the document could not be converted
    #[error("invalid expression for '{entity}': {source}")]
    Expression {
        entity: String,
        #[source]
        source: ConvertError,
    },
    /// The document describes an invalid model
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors that can occur while evaluating a model directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An expression referenced a name with no bound value
    #[error("no value bound for name: {0}")]
    UnboundName(String),
    /// An expression called a function outside the built-in table
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// A built-in function was called with the wrong number of arguments
    #[error("function {function} expects {expected} arguments, got {got}")]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },
    /// Error when the input length is not the same as the model expects
    #[error("Invalid input length: expected {expected}, got {got}")]
    InvalidInputLength { expected: usize, got: usize },
    /// Error when the output buffer length is not the same as the number of variables
    #[error("Invalid output length: expected {expected}, got {got}")]
    InvalidOutputLength { expected: usize, got: usize },
    /// Error when the output vector type cannot hold one value per variable
    #[error("output vector type cannot hold {0} values")]
    UnrepresentableOutput(usize),
    /// Error when an input vector does not store its values contiguously
    #[error("input vector is not contiguous in memory")]
    NonContiguous,
    /// The model failed validation before evaluation could be planned
    #[error(transparent)]
    Invalid(#[from] CodegenError),
}
