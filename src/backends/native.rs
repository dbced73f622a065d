//! Rust source that rebuilds a model through the builder API.
//!
//! The emitted function declares every entity with `ModelBuilder` and writes
//! each expression with the operator API of the prelude, so compiling the
//! output and calling it yields a model structurally equal to the input.
//! Raw names travel as string literals; only the local bindings use sanitized
//! identifiers.

use std::fmt::Write;

use crate::backends::{rust_float, EmitOptions};
use crate::expr::{precedence, Assoc, BinaryOp, Fixity, RenderRules, UnaryOp};
use crate::naming::NameTable;
use crate::validate::{Entity, ValidatedModel};

struct NativeRules<'a> {
    names: &'a NameTable,
}

impl RenderRules for NativeRules<'_> {
    fn literal(&self, value: f64) -> String {
        format!("lit({})", rust_float(value))
    }

    fn literal_precedence(&self, _value: f64) -> u8 {
        precedence::ATOM
    }

    fn name(&self, name: &str) -> String {
        format!("&{}", self.names.get(name))
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
            _ => Fixity::Enclosed,
        }
    }

    fn binary(&self, op: BinaryOp, left: &str, right: &str) -> String {
        let function = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                return format!("{left} {} {right}", op.symbol());
            }
            BinaryOp::Pow => "pow",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
        };
        format!("{function}({left}, {right})")
    }

    fn unary(&self, op: UnaryOp, operand: &str) -> String {
        match op {
            UnaryOp::Neg => format!("-{operand}"),
        }
    }

    // Validated models only call built-ins, and every built-in has a prelude
    // helper of the same name
    fn call(&self, function: &str, args: &[String]) -> String {
        format!("{function}({})", args.join(", "))
    }
}

/// Renders the builder-API source of a validated model.
pub fn emit(plan: ValidatedModel<'_>, names: NameTable, options: &EmitOptions) -> String {
    let model = plan.model();
    let rules = NativeRules { names: &names };
    let mut sections: Vec<Vec<String>> = Vec::new();

    sections.push(
        model
            .variables()
            .iter()
            .map(|v| {
                format!(
                    "let {} = builder.variable({:?}, {});",
                    names.get(&v.name),
                    v.name,
                    rust_float(v.initial_value)
                )
            })
            .collect(),
    );

    sections.push(
        model
            .parameters()
            .iter()
            .map(|p| {
                format!(
                    "let {} = builder.parameter({:?}, {});",
                    names.get(&p.name),
                    p.name,
                    rust_float(p.value)
                )
            })
            .collect(),
    );

    sections.push(
        plan.order()
            .iter()
            .map(|entity| {
                let expression = entity.expression().render(&rules);
                match entity {
                    Entity::Derived(derived) => format!(
                        "let {} = builder.derived({:?}, {expression});",
                        names.get(&derived.name),
                        derived.name
                    ),
                    Entity::Reaction(reaction) => {
                        format!("builder.reaction({:?}, {expression});", reaction.name)
                    }
                }
            })
            .collect(),
    );

    sections.push(
        model
            .stoichiometry()
            .iter()
            .map(|entry| {
                format!(
                    "builder.stoichiometry({:?}, {:?}, {});",
                    entry.reaction,
                    entry.variable,
                    rust_float(entry.coefficient)
                )
            })
            .collect(),
    );

    let mut out = String::new();
    out.push_str("// Generated by kinetic-codegen. Rebuilds the model through the builder API.\n");
    out.push_str("use kinetic_codegen::prelude::*;\n\n");
    out.push_str("#[allow(non_snake_case, unused_variables)]\n");
    let _ = writeln!(
        out,
        "pub fn {}() -> Result<Model, ModelError> {{",
        options.builder_name
    );
    out.push_str("    let mut builder = ModelBuilder::new();\n");
    for section in sections.iter().filter(|lines| !lines.is_empty()) {
        out.push('\n');
        for line in section {
            let _ = writeln!(out, "    {line}");
        }
    }
    out.push_str("\n    builder.build()\n}\n");
    out
}
