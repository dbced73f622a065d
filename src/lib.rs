//! Code generation for reaction-network models.
//!
//! A model declares state variables, constant parameters, derived quantities
//! and reactions whose rates feed the variables' time derivatives through
//! stoichiometric coefficients. This crate turns such a model into three
//! textual artifacts:
//!
//! - Rust source that rebuilds an equal model through [`ModelBuilder`]
//! - a standalone Rust right-hand-side function for an external ODE integrator
//! - LaTeX equations
//!
//! Expressions are a closed tree grammar ([`expr::Expression`]) rendered by each
//! target with its own syntax and parenthesization rules. Derived quantities and
//! reactions are emitted in dependency order. Every generation call validates the
//! whole model first and either returns a complete artifact or an error.
//!
//! # Features
//!
//! - Builder API with operator overloading for authoring models
//! - Infix string expressions and JSON model documents
//! - Deterministic, byte-identical output for an unchanged model
//! - Direct evaluation of the right-hand side, sequential or in parallel
//!
//! # Example
//!
//! ```rust
//! use kinetic_codegen::prelude::*;
//!
//! let mut builder = ModelBuilder::new();
//! let s1 = builder.variable("S1", 2.0);
//! builder.variable("S2", 0.0);
//! let k1 = builder.parameter("k1", 0.5);
//! builder.reaction("v1", &k1 * &s1);
//! builder.stoichiometry("v1", "S1", -1.0);
//! builder.stoichiometry("v1", "S2", 1.0);
//! let model = builder.build().unwrap();
//!
//! let latex = generate(&model, Target::Latex).unwrap();
//! assert!(latex.contains(r"v1 := k1 \cdot S1"));
//! assert!(latex.contains(r"\frac{dS2}{dt} = +v1"));
//! ```

pub use backends::{generate, generate_with, EmitOptions};
pub use errors::CodegenError;
pub use model::{Model, ModelBuilder};
pub use naming::Target;

/// Everything needed to author a model and generate code from it. Emitted
/// native source imports this module.
pub mod prelude {
    pub use crate::backends::{generate, generate_with, EmitOptions};
    pub use crate::errors::{CodegenError, ModelError};
    pub use crate::expr::{call, eq, ge, gt, le, lit, lt, ne, pow, Expression};
    pub use crate::functions::{abs, cos, exp, ln, log10, max, min, sin, sqrt, tan};
    pub use crate::model::{EntityKind, Model, ModelBuilder};
    pub use crate::naming::Target;
}

/// Code generation targets
pub mod backends;
/// Conversion from infix strings to expressions
pub mod convert;
/// JSON model documents
pub mod document;
/// Error types for the various failure modes
pub mod errors;
/// Expression tree representation and rendering
pub mod expr;
/// Built-in scalar functions
pub mod functions;
/// The model graph and its builder
pub mod model;
/// Per-target identifier sanitization
pub mod naming;
/// Dependency ordering of derived quantities and reactions
pub mod resolve;
/// Direct evaluation of the right-hand side
pub mod rhs;
/// Validation pass preceding every generation call
pub mod validate;
/// Vector types accepted by the evaluator
pub mod vector;
