//! JSON model documents.
//!
//! A document describes a model with expressions written as infix strings:
//!
//! ```json
//! {
//!   "variables": [{ "name": "S", "value": 10.0 }, { "name": "P", "value": 0.0 }],
//!   "parameters": [{ "name": "Vmax", "value": 1.0 }, { "name": "Km", "value": 0.5 }],
//!   "derived": [{ "name": "saturation", "expression": "S / (Km + S)" }],
//!   "reactions": [
//!     {
//!       "name": "conversion",
//!       "rate": "Vmax * saturation",
//!       "stoichiometry": [
//!         { "variable": "S", "coefficient": -1 },
//!         { "variable": "P", "coefficient": 1 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Stoichiometry may also be listed at the top level, as
//! `{ "reaction", "variable", "coefficient" }` entries. Loading parses every
//! expression and replays the declarations through `ModelBuilder`, in
//! document order: the entries nested under each reaction first, then the
//! top-level list. `ModelDocument::from_model` writes the top-level list only,
//! so a described model loads back with its entries in their original order.

use serde::{Deserialize, Serialize};

use crate::convert::parse_expression;
use crate::errors::DocumentError;
use crate::model::{Model, ModelBuilder};

/// A named value: initial value of a variable or value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueEntry {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedEntry {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionEntry {
    pub name: String,
    pub rate: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stoichiometry: Vec<CoefficientEntry>,
}

/// Coefficient of the enclosing reaction in one variable's derivative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoefficientEntry {
    pub variable: String,
    pub coefficient: f64,
}

/// A stoichiometry entry listed outside its reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    pub reaction: String,
    pub variable: String,
    pub coefficient: f64,
}

/// A model described in JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    #[serde(default)]
    pub variables: Vec<ValueEntry>,
    #[serde(default)]
    pub parameters: Vec<ValueEntry>,
    #[serde(default)]
    pub derived: Vec<DerivedEntry>,
    #[serde(default)]
    pub reactions: Vec<ReactionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stoichiometry: Vec<LinkEntry>,
}

impl ModelDocument {
    /// Parse a JSON string into a document
    pub fn from_str(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Describes an existing model. Expressions are written in their plain
    /// infix form; stoichiometry goes to the top-level list in declaration
    /// order, including entries whose reaction is not declared.
    pub fn from_model(model: &Model) -> Self {
        let values = |entries: Vec<(&String, f64)>| {
            entries
                .into_iter()
                .map(|(name, value)| ValueEntry {
                    name: name.clone(),
                    value,
                })
                .collect()
        };

        Self {
            variables: values(
                model
                    .variables()
                    .iter()
                    .map(|v| (&v.name, v.initial_value))
                    .collect(),
            ),
            parameters: values(
                model
                    .parameters()
                    .iter()
                    .map(|p| (&p.name, p.value))
                    .collect(),
            ),
            derived: model
                .derived()
                .iter()
                .map(|d| DerivedEntry {
                    name: d.name.clone(),
                    expression: d.expression.to_string(),
                })
                .collect(),
            reactions: model
                .reactions()
                .iter()
                .map(|r| ReactionEntry {
                    name: r.name.clone(),
                    rate: r.rate.to_string(),
                    stoichiometry: Vec::new(),
                })
                .collect(),
            stoichiometry: model
                .stoichiometry()
                .iter()
                .map(|entry| LinkEntry {
                    reaction: entry.reaction.clone(),
                    variable: entry.variable.clone(),
                    coefficient: entry.coefficient,
                })
                .collect(),
        }
    }

    /// Builds the model the document describes.
    ///
    /// # Errors
    /// * `DocumentError::Expression` naming the entity whose expression failed to parse
    /// * `DocumentError::Model` for duplicate names
    pub fn to_model(&self) -> Result<Model, DocumentError> {
        let mut builder = ModelBuilder::new();

        for variable in &self.variables {
            builder.variable(variable.name.as_str(), variable.value);
        }
        for parameter in &self.parameters {
            builder.parameter(parameter.name.as_str(), parameter.value);
        }
        for derived in &self.derived {
            let expression = parse_expression(&derived.expression).map_err(|source| {
                DocumentError::Expression {
                    entity: derived.name.clone(),
                    source,
                }
            })?;
            builder.derived(derived.name.as_str(), expression);
        }
        for reaction in &self.reactions {
            let rate = parse_expression(&reaction.rate).map_err(|source| {
                DocumentError::Expression {
                    entity: reaction.name.clone(),
                    source,
                }
            })?;
            builder.reaction(reaction.name.as_str(), rate);
        }
        for reaction in &self.reactions {
            for entry in &reaction.stoichiometry {
                builder.stoichiometry(
                    reaction.name.as_str(),
                    entry.variable.as_str(),
                    entry.coefficient,
                );
            }
        }
        for entry in &self.stoichiometry {
            builder.stoichiometry(
                entry.reaction.as_str(),
                entry.variable.as_str(),
                entry.coefficient,
            );
        }

        let model = builder.build()?;
        tracing::debug!(
            variables = model.variables().len(),
            reactions = model.reactions().len(),
            "model document loaded"
        );
        Ok(model)
    }
}
