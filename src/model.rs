//! The model graph consumed by the code generators.
//!
//! A `Model` aggregates variables, parameters, derived quantities, reactions and
//! stoichiometry entries in declaration order. It is assembled through
//! `ModelBuilder`, which is also the target API of the native-source emitter:
//! every artifact that emitter produces is a sequence of builder calls.
//!
//! Once built, a model is never mutated by this crate. Every generation call
//! borrows it immutably, so one model may be shared freely across calls and
//! threads.
//!
//! # Example
//!
//! ```
//! use kinetic_codegen::prelude::*;
//!
//! let mut builder = ModelBuilder::new();
//! let s1 = builder.variable("S1", 2.0);
//! let s2 = builder.variable("S2", 0.0);
//! let k1 = builder.parameter("k1", 0.5);
//! builder.reaction("v1", &k1 * &s1);
//! builder.stoichiometry("v1", "S1", -1.0);
//! builder.stoichiometry("v1", "S2", 1.0);
//! let model = builder.build().unwrap();
//!
//! assert_eq!(model.variables().len(), 2);
//! assert_eq!(model.kind_of("v1"), Some(EntityKind::Reaction));
//! ```

use std::collections::HashMap;

use crate::errors::ModelError;
use crate::expr::Expression;

/// A state component with an associated time derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub initial_value: f64,
}

/// An immutable constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
}

/// A named intermediate value computed from other entities.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuantity {
    pub name: String,
    pub expression: Expression,
}

/// A named rate law.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub name: String,
    pub rate: Expression,
}

/// Contributes `coefficient * rate(reaction)` to the derivative of `variable`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoichiometryEntry {
    pub reaction: String,
    pub variable: String,
    pub coefficient: f64,
}

/// The kind of a named model entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Variable,
    Parameter,
    Derived,
    Reaction,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntityKind::Variable => "variable",
            EntityKind::Parameter => "parameter",
            EntityKind::Derived => "derived quantity",
            EntityKind::Reaction => "reaction",
        };
        f.write_str(label)
    }
}

/// A complete reaction-network model.
///
/// Equality is structural. Variables, parameters, reactions and stoichiometry
/// entries are compared in declaration order, since positions fix the vector
/// layouts and the accumulation order. Derived quantities are compared by
/// name: every emitter writes them in dependency order, so their declaration
/// order carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: Vec<Variable>,
    parameters: Vec<Parameter>,
    derived: Vec<DerivedQuantity>,
    reactions: Vec<Reaction>,
    stoichiometry: Vec<StoichiometryEntry>,
    kinds: HashMap<String, EntityKind>,
}

impl Model {
    /// Starts an empty builder.
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn derived(&self) -> &[DerivedQuantity] {
        &self.derived
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn stoichiometry(&self) -> &[StoichiometryEntry] {
        &self.stoichiometry
    }

    /// Kind of the entity called `name`, if the model declares one.
    pub fn kind_of(&self, name: &str) -> Option<EntityKind> {
        self.kinds.get(name).copied()
    }

    /// Every entity name in declaration order: variables, parameters, derived
    /// quantities, then reactions.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.parameters.iter().map(|p| p.name.as_str()))
            .chain(self.derived.iter().map(|d| d.name.as_str()))
            .chain(self.reactions.iter().map(|r| r.name.as_str()))
    }

    /// Position of a variable in the state vector.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Position of a parameter in the parameter vector.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    /// Position of a reaction in declaration order.
    pub fn reaction_index(&self, name: &str) -> Option<usize> {
        self.reactions.iter().position(|r| r.name == name)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        let theirs: HashMap<&str, &Expression> = other
            .derived
            .iter()
            .map(|d| (d.name.as_str(), &d.expression))
            .collect();

        self.variables == other.variables
            && self.parameters == other.parameters
            && self.reactions == other.reactions
            && self.stoichiometry == other.stoichiometry
            && self.derived.len() == other.derived.len()
            && self
                .derived
                .iter()
                .all(|d| theirs.get(d.name.as_str()) == Some(&&d.expression))
    }
}

/// Incremental construction of a `Model`.
///
/// Declaration methods return a name handle (`Expression::Name`) that can be
/// combined with the operator API to write expressions referencing the entity.
/// Name uniqueness is checked once, by `build`.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    variables: Vec<Variable>,
    parameters: Vec<Parameter>,
    derived: Vec<DerivedQuantity>,
    reactions: Vec<Reaction>,
    stoichiometry: Vec<StoichiometryEntry>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a state variable with its initial value.
    ///
    /// # Returns
    /// A name handle for use in expressions
    pub fn variable(&mut self, name: impl Into<String>, initial_value: f64) -> Expression {
        let name = name.into();
        self.variables.push(Variable {
            name: name.clone(),
            initial_value,
        });
        Expression::Name(name)
    }

    /// Declares a constant parameter.
    ///
    /// # Returns
    /// A name handle for use in expressions
    pub fn parameter(&mut self, name: impl Into<String>, value: f64) -> Expression {
        let name = name.into();
        self.parameters.push(Parameter {
            name: name.clone(),
            value,
        });
        Expression::Name(name)
    }

    /// Declares a derived quantity.
    ///
    /// # Returns
    /// A name handle for use in expressions
    pub fn derived(&mut self, name: impl Into<String>, expression: impl Into<Expression>) -> Expression {
        let name = name.into();
        self.derived.push(DerivedQuantity {
            name: name.clone(),
            expression: expression.into(),
        });
        Expression::Name(name)
    }

    /// Declares a reaction with its rate law. Reactions cannot be referenced
    /// from other expressions, so no handle is returned.
    pub fn reaction(&mut self, name: impl Into<String>, rate: impl Into<Expression>) {
        self.reactions.push(Reaction {
            name: name.into(),
            rate: rate.into(),
        });
    }

    /// Links a reaction's rate into a variable's derivative.
    pub fn stoichiometry(
        &mut self,
        reaction: impl Into<String>,
        variable: impl Into<String>,
        coefficient: f64,
    ) -> &mut Self {
        self.stoichiometry.push(StoichiometryEntry {
            reaction: reaction.into(),
            variable: variable.into(),
            coefficient,
        });
        self
    }

    /// Finishes the model.
    ///
    /// # Errors
    /// Returns `ModelError::DuplicateName` if a name is declared twice, across
    /// all entity kinds. References inside expressions are checked later, by
    /// the validation pass of each generation call.
    pub fn build(self) -> Result<Model, ModelError> {
        let mut kinds: HashMap<String, EntityKind> = HashMap::new();
        let declared = self
            .variables
            .iter()
            .map(|v| (&v.name, EntityKind::Variable))
            .chain(self.parameters.iter().map(|p| (&p.name, EntityKind::Parameter)))
            .chain(self.derived.iter().map(|d| (&d.name, EntityKind::Derived)))
            .chain(self.reactions.iter().map(|r| (&r.name, EntityKind::Reaction)));

        for (name, kind) in declared {
            if let Some(&first) = kinds.get(name) {
                return Err(ModelError::DuplicateName {
                    name: name.clone(),
                    first,
                    second: kind,
                });
            }
            kinds.insert(name.clone(), kind);
        }

        tracing::trace!(entities = kinds.len(), "model built");

        Ok(Model {
            variables: self.variables,
            parameters: self.parameters,
            derived: self.derived,
            reactions: self.reactions,
            stoichiometry: self.stoichiometry,
            kinds,
        })
    }
}
