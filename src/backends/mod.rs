//! Code generation targets.
//!
//! Every generation call runs the same pipeline:
//!
//! 1. `validate` checks the whole model and resolves the emission order
//! 2. a fresh `NameTable` is computed for the target (name collisions)
//! 3. the target's emitter renders the validated model
//!
//! Steps 1 and 2 complete before any text is written, so a failing call never
//! returns a partial artifact. The emitters receive the ordered model and the
//! name table by value; nothing is shared between calls.

use crate::errors::CodegenError;
use crate::model::Model;
use crate::naming::{NameTable, Target};
use crate::validate::validate;

/// Rust right-hand-side function emitter
pub mod function;
/// LaTeX equation emitter
pub mod latex;
/// Builder-API source emitter
pub mod native;

/// Names used for the items the Rust targets declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Name of the generated right-hand-side function
    pub function_name: String,
    /// Name of the generated model-building function
    pub builder_name: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            function_name: "rhs".to_string(),
            builder_name: "build_model".to_string(),
        }
    }
}

/// Generates the artifact for `target` with default options.
///
/// # Example
/// ```
/// use kinetic_codegen::prelude::*;
///
/// let mut builder = ModelBuilder::new();
/// let s = builder.variable("S", 1.0);
/// let k = builder.parameter("k", 0.1);
/// builder.reaction("decay", &k * &s);
/// builder.stoichiometry("decay", "S", -1.0);
/// let model = builder.build().unwrap();
///
/// let latex = generate(&model, Target::Latex).unwrap();
/// assert!(latex.contains(r"\frac{dS}{dt} = -decay"));
/// ```
pub fn generate(model: &Model, target: Target) -> Result<String, CodegenError> {
    generate_with(model, target, &EmitOptions::default())
}

/// Generates the artifact for `target`.
///
/// # Errors
/// Returns the first validation failure; in that case no text is produced.
pub fn generate_with(
    model: &Model,
    target: Target,
    options: &EmitOptions,
) -> Result<String, CodegenError> {
    let plan = validate(model)?;
    let names = NameTable::build(model, target)?;

    let artifact = match target {
        Target::NativeSource => native::emit(plan, names, options),
        Target::GenericFunction => function::emit(plan, names, options),
        Target::Latex => latex::emit(plan, names),
    };

    tracing::debug!(%target, bytes = artifact.len(), "artifact emitted");
    Ok(artifact)
}

impl Model {
    /// Rust source that rebuilds this model through `ModelBuilder`.
    pub fn to_native_source(&self) -> Result<String, CodegenError> {
        generate(self, Target::NativeSource)
    }

    /// A standalone Rust right-hand-side function for this model.
    pub fn to_function(&self) -> Result<String, CodegenError> {
        generate(self, Target::GenericFunction)
    }

    /// LaTeX equations for this model.
    pub fn to_latex(&self) -> Result<String, CodegenError> {
        generate(self, Target::Latex)
    }
}

/// Rust source text of a float literal.
pub(crate) fn rust_float(value: f64) -> String {
    if value.is_nan() {
        "f64::NAN".to_string()
    } else if value == f64::INFINITY {
        "f64::INFINITY".to_string()
    } else if value == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".to_string()
    } else {
        format!("{value:?}")
    }
}
