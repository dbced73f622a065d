//! The validation pass run before every generation call.
//!
//! Checks run to completion over the whole model, in a fixed order, before
//! any emitter sees it:
//!
//! 1. single-level call restriction, per derived quantity then per reaction
//! 2. expression references (names and called functions)
//! 3. stoichiometry endpoints
//! 4. dependency order (cycles)
//!
//! Name collisions depend on the target and are checked when the per-target
//! `NameTable` is built. The result is a `ValidatedModel` that carries the
//! resolved emission order; emitters only accept that type.

use std::collections::HashSet;

use crate::errors::CodegenError;
use crate::expr::Expression;
use crate::functions::Builtin;
use crate::model::{DerivedQuantity, EntityKind, Model, Reaction};
use crate::resolve::{resolve_order, DependencyNode};

/// A derived quantity or reaction, the two kinds of entity that own an
/// expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity<'a> {
    Derived(&'a DerivedQuantity),
    Reaction(&'a Reaction),
}

impl<'a> Entity<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Entity::Derived(derived) => &derived.name,
            Entity::Reaction(reaction) => &reaction.name,
        }
    }

    pub fn expression(&self) -> &'a Expression {
        match self {
            Entity::Derived(derived) => &derived.expression,
            Entity::Reaction(reaction) => &reaction.rate,
        }
    }
}

/// A model that passed validation, together with its emission order.
#[derive(Debug, Clone)]
pub struct ValidatedModel<'a> {
    model: &'a Model,
    order: Vec<Entity<'a>>,
}

impl<'a> ValidatedModel<'a> {
    pub fn model(&self) -> &'a Model {
        self.model
    }

    /// Derived quantities and reactions in dependency order.
    pub fn order(&self) -> &[Entity<'a>] {
        &self.order
    }
}

/// Validates `model` for code generation.
///
/// # Errors
/// Returns the first `CodegenError` found, following the check order above.
pub fn validate(model: &Model) -> Result<ValidatedModel<'_>, CodegenError> {
    let entities: Vec<Entity<'_>> = model
        .derived()
        .iter()
        .map(Entity::Derived)
        .chain(model.reactions().iter().map(Entity::Reaction))
        .collect();

    let reactions: HashSet<&str> = model.reactions().iter().map(|r| r.name.as_str()).collect();
    for entity in &entities {
        entity.expression().check_single_level(entity.name(), &reactions)?;
    }

    for entity in &entities {
        check_references(model, entity)?;
    }

    check_stoichiometry(model)?;

    let nodes: Vec<DependencyNode<'_>> = entities
        .iter()
        .map(|entity| DependencyNode {
            name: entity.name(),
            references: entity.expression().references(),
        })
        .collect();
    let order: Vec<Entity<'_>> = resolve_order(&nodes)?
        .into_iter()
        .map(|index| entities[index])
        .collect();

    tracing::debug!(
        entities = order.len(),
        order = ?order.iter().map(Entity::name).collect::<Vec<_>>(),
        "model validated"
    );

    Ok(ValidatedModel { model, order })
}

fn check_references(model: &Model, entity: &Entity<'_>) -> Result<(), CodegenError> {
    let owner = entity.name();
    let expression = entity.expression();

    for name in expression.references() {
        match model.kind_of(name) {
            Some(EntityKind::Reaction) => {
                return Err(CodegenError::UnsupportedExpression {
                    entity: owner.to_string(),
                    reason: format!("reaction '{name}' cannot be referenced from an expression"),
                })
            }
            Some(_) => {}
            None => {
                return Err(CodegenError::UnknownReference {
                    entity: owner.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }

    for (function, arity) in expression.calls() {
        if model.kind_of(function) == Some(EntityKind::Reaction) {
            return Err(CodegenError::UnsupportedExpression {
                entity: owner.to_string(),
                reason: format!("reaction '{function}' cannot be called"),
            });
        }
        let builtin = Builtin::from_name(function).ok_or_else(|| CodegenError::UnknownReference {
            entity: owner.to_string(),
            name: function.to_string(),
        })?;
        if builtin.arity() != arity {
            return Err(CodegenError::UnsupportedExpression {
                entity: owner.to_string(),
                reason: format!(
                    "'{function}' takes {} argument(s), called with {arity}",
                    builtin.arity()
                ),
            });
        }
    }

    Ok(())
}

fn check_stoichiometry(model: &Model) -> Result<(), CodegenError> {
    for entry in model.stoichiometry() {
        if model.kind_of(&entry.variable) != Some(EntityKind::Variable) {
            return Err(CodegenError::UnknownReference {
                entity: entry.reaction.clone(),
                name: entry.variable.clone(),
            });
        }
        if model.kind_of(&entry.reaction) != Some(EntityKind::Reaction) {
            return Err(CodegenError::UnknownReference {
                entity: entry.variable.clone(),
                name: entry.reaction.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{call, lit};
    use crate::functions::{exp, max};
    use crate::model::ModelBuilder;

    fn names<'a>(validated: &ValidatedModel<'a>) -> Vec<&'a str> {
        validated.order().iter().map(Entity::name).collect()
    }

    #[test]
    fn test_order_follows_references() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        let total = Expression::name("total");
        let scaled = builder.derived("scaled", &total * lit(2.0));
        builder.derived("total", &s + lit(1.0));
        builder.reaction("v", &scaled + &s);
        builder.stoichiometry("v", "S", -1.0);
        let model = builder.build().unwrap();

        let validated = validate(&model).unwrap();
        assert_eq!(names(&validated), vec!["total", "scaled", "v"]);
    }

    #[test]
    fn test_unknown_name() {
        let mut builder = ModelBuilder::new();
        builder.variable("S", 1.0);
        builder.reaction("v", Expression::name("k") * Expression::name("S"));
        let model = builder.build().unwrap();
        assert_eq!(
            validate(&model).unwrap_err(),
            CodegenError::UnknownReference {
                entity: "v".to_string(),
                name: "k".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_function() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        builder.derived("d", call("hill", vec![s]));
        let model = builder.build().unwrap();
        assert_eq!(
            validate(&model).unwrap_err(),
            CodegenError::UnknownReference {
                entity: "d".to_string(),
                name: "hill".to_string(),
            }
        );
    }

    #[test]
    fn test_wrong_arity() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        builder.derived("d", call("exp", vec![s.clone(), s]));
        let model = builder.build().unwrap();
        assert!(matches!(
            validate(&model),
            Err(CodegenError::UnsupportedExpression { entity, .. }) if entity == "d"
        ));
    }

    #[test]
    fn test_reaction_reference_is_unsupported() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        builder.reaction("v1", &s * lit(2.0));
        builder.reaction("v2", Expression::name("v1") + &s);
        let model = builder.build().unwrap();
        assert!(matches!(
            validate(&model),
            Err(CodegenError::UnsupportedExpression { entity, .. }) if entity == "v2"
        ));
    }

    #[test]
    fn test_nested_reaction_call_is_reported_first() {
        // The nested call also names an unknown function, but the structural
        // check runs before reference checks
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        builder.reaction("v1", &s * lit(2.0));
        builder.reaction("v2", max(exp(call("v1", vec![s.clone()])), lit(0.0)));
        let model = builder.build().unwrap();
        let err = validate(&model).unwrap_err();
        assert!(matches!(
            &err,
            CodegenError::UnsupportedExpression { entity, reason }
                if entity == "v2" && reason.contains("v1")
        ));
    }

    #[test]
    fn test_stoichiometry_endpoints() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        builder.reaction("v", s);
        builder.stoichiometry("v", "P", 1.0);
        let model = builder.build().unwrap();
        assert_eq!(
            validate(&model).unwrap_err(),
            CodegenError::UnknownReference {
                entity: "v".to_string(),
                name: "P".to_string(),
            }
        );

        let mut builder = ModelBuilder::new();
        builder.variable("S", 1.0);
        builder.parameter("k", 1.0);
        builder.stoichiometry("k", "S", 1.0);
        let model = builder.build().unwrap();
        assert_eq!(
            validate(&model).unwrap_err(),
            CodegenError::UnknownReference {
                entity: "S".to_string(),
                name: "k".to_string(),
            }
        );
    }

    #[test]
    fn test_cycle_between_derived_quantities() {
        let mut builder = ModelBuilder::new();
        builder.derived("A", Expression::name("B") + lit(1.0));
        builder.derived("B", Expression::name("A") * lit(2.0));
        let model = builder.build().unwrap();
        assert_eq!(
            validate(&model).unwrap_err(),
            CodegenError::CyclicDependency {
                cycle: vec!["A".to_string(), "B".to_string()],
            }
        );
    }
}
