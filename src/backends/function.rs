//! Standalone Rust right-hand-side function.
//!
//! The emitted function has the signature
//! `fn(time: f64, y: &[f64], p: &[f64]) -> Vec<f64>` and no dependency on
//! this crate. Variables read from `y` and parameters from `p` by declaration
//! position; derived quantities and reaction rates become locals in
//! dependency order. Numeric exceptions are left to IEEE semantics.

use std::collections::HashMap;
use std::fmt::Write;

use itertools::Itertools;

use crate::backends::{rust_float, EmitOptions};
use crate::expr::{precedence, Assoc, BinaryOp, Fixity, RenderRules, UnaryOp};
use crate::naming::NameTable;
use crate::validate::ValidatedModel;

struct FunctionRules<'a> {
    /// Rendered text of every name: `y[i]`, `p[j]` or a local
    names: HashMap<&'a str, String>,
}

impl RenderRules for FunctionRules<'_> {
    fn literal(&self, value: f64) -> String {
        rust_float(value)
    }

    fn literal_precedence(&self, value: f64) -> u8 {
        if value.is_finite() && value.is_sign_negative() {
            precedence::PREFIX
        } else {
            precedence::ATOM
        }
    }

    fn name(&self, name: &str) -> String {
        self.names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
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
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                format!("{left} {} {right}", op.symbol())
            }
            BinaryOp::Pow => format!("f64::powf({left}, {right})"),
            BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Ne => format!("f64::from(u8::from({left} {} {right}))", op.symbol()),
        }
    }

    fn unary(&self, op: UnaryOp, operand: &str) -> String {
        match op {
            UnaryOp::Neg => format!("-{operand}"),
        }
    }

    fn call(&self, function: &str, args: &[String]) -> String {
        format!("f64::{function}({})", args.join(", "))
    }
}

/// Renders the right-hand-side function of a validated model.
pub fn emit(plan: ValidatedModel<'_>, names: NameTable, options: &EmitOptions) -> String {
    let model = plan.model();

    let mut bound: HashMap<&str, String> = HashMap::new();
    for (i, variable) in model.variables().iter().enumerate() {
        bound.insert(&variable.name, format!("y[{i}]"));
    }
    for (j, parameter) in model.parameters().iter().enumerate() {
        bound.insert(&parameter.name, format!("p[{j}]"));
    }
    for entity in plan.order() {
        bound.insert(entity.name(), names.get(entity.name()));
    }
    let rules = FunctionRules { names: bound };

    let layout = |list: Vec<&str>| {
        if list.is_empty() {
            "(empty)".to_string()
        } else {
            list.iter().map(|name| format!("{name:?}")).join(", ")
        }
    };

    let mut out = String::new();
    out.push_str("/// Right-hand side of the model, for use with an external ODE integrator.\n");
    out.push_str("///\n");
    let _ = writeln!(
        out,
        "/// State vector layout: {}.",
        layout(model.variables().iter().map(|v| v.name.as_str()).collect())
    );
    let _ = writeln!(
        out,
        "/// Parameter vector layout: {}.",
        layout(model.parameters().iter().map(|p| p.name.as_str()).collect())
    );
    out.push_str("#[allow(non_snake_case, unused_variables, unused_mut)]\n");
    let _ = writeln!(
        out,
        "pub fn {}(time: f64, y: &[f64], p: &[f64]) -> Vec<f64> {{",
        options.function_name
    );

    for entity in plan.order() {
        let _ = writeln!(
            out,
            "    let {} = {};",
            names.get(entity.name()),
            entity.expression().render(&rules)
        );
    }

    let _ = writeln!(
        out,
        "    let mut dydt = vec![0.0; {}];",
        model.variables().len()
    );

    // Reaction declaration order, stable within one reaction
    let accumulation = model
        .stoichiometry()
        .iter()
        .filter_map(|entry| {
            let reaction = model.reaction_index(&entry.reaction)?;
            let variable = model.variable_index(&entry.variable)?;
            Some((reaction, variable, entry))
        })
        .sorted_by_key(|(reaction, _, _)| *reaction);
    for (_, variable, entry) in accumulation {
        let _ = writeln!(
            out,
            "    dydt[{variable}] += {} * {};",
            rust_float(entry.coefficient),
            names.get(&entry.reaction)
        );
    }

    out.push_str("    dydt\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use crate::expr::{ge, lit, pow};
    use crate::functions::{ln, min};
    use crate::model::ModelBuilder;
    use crate::naming::Target;

    #[test]
    fn test_layout() {
        let mut builder = ModelBuilder::new();
        let s1 = builder.variable("S1", 2.0);
        builder.variable("S2", 0.0);
        let k1 = builder.parameter("k1", 0.5);
        builder.reaction("v1", &k1 * &s1);
        builder.stoichiometry("v1", "S1", -1.0);
        builder.stoichiometry("v1", "S2", 1.0);
        let model = builder.build().unwrap();

        let source = crate::backends::generate(&model, Target::GenericFunction).unwrap();
        let expected = r#"/// Right-hand side of the model, for use with an external ODE integrator.
///
/// State vector layout: "S1", "S2".
/// Parameter vector layout: "k1".
#[allow(non_snake_case, unused_variables, unused_mut)]
pub fn rhs(time: f64, y: &[f64], p: &[f64]) -> Vec<f64> {
    let v1 = p[0] * y[0];
    let mut dydt = vec![0.0; 2];
    dydt[0] += -1.0 * v1;
    dydt[1] += 1.0 * v1;
    dydt
}
"#;
        assert_eq!(source, expected);
    }

    #[test]
    fn test_operators_and_accumulation_order() {
        let mut builder = ModelBuilder::new();
        let a = builder.variable("A", 1.0);
        let b = builder.variable("B", 1.0);
        let k = builder.parameter("k", 1.0);
        let d = builder.derived("d", pow(&a, lit(2.0)) - -&b);
        builder.reaction("first", ln(&d) * ge(&a, &k));
        builder.reaction("second", min(&a, lit(-3.0)) / (&a - &b));
        builder.stoichiometry("second", "A", 2.0);
        builder.stoichiometry("first", "B", 1.0);
        builder.stoichiometry("first", "A", -1.0);
        let model = builder.build().unwrap();

        let source = model.to_function().unwrap();
        assert!(source.contains("    let d = f64::powf(y[0], 2.0) - -y[1];\n"));
        assert!(source.contains(
            "    let first = f64::ln(d) * f64::from(u8::from(y[0] >= p[0]));\n"
        ));
        assert!(source.contains("    let second = f64::min(y[0], -3.0) / (y[0] - y[1]);\n"));
        assert!(source.contains(
            "    dydt[1] += 1.0 * first;\n    dydt[0] += -1.0 * first;\n    dydt[0] += 2.0 * second;\n"
        ));
        assert!(!source.contains("Expression"));
    }

    #[test]
    fn test_empty_layouts() {
        let model = ModelBuilder::new().build().unwrap();
        let source = model.to_function().unwrap();
        assert!(source.contains("/// State vector layout: (empty).\n"));
        assert!(source.contains("    let mut dydt = vec![0.0; 0];\n"));
    }
}
