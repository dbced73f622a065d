//! LaTeX equations for a model.
//!
//! One `equation` environment per derived quantity and reaction, in
//! dependency order, followed by a `gather` environment holding the time
//! derivative of every variable. The output is a fragment: no preamble, only
//! `amsmath` environments.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::expr::{precedence, Assoc, BinaryOp, Fixity, RenderRules, UnaryOp};
use crate::functions::Builtin;
use crate::naming::NameTable;
use crate::validate::ValidatedModel;

struct LatexRules<'a> {
    names: &'a NameTable,
}

impl RenderRules for LatexRules<'_> {
    fn literal(&self, value: f64) -> String {
        latex_number(value)
    }

    fn name(&self, name: &str) -> String {
        self.names.get(name)
    }

    fn fixity(&self, op: BinaryOp) -> Fixity {
        match op {
            BinaryOp::Add | BinaryOp::Sub => Fixity::Infix {
                precedence: precedence::SUM,
                assoc: Assoc::Left,
            },
            BinaryOp::Mul => Fixity::Infix {
                precedence: precedence::PRODUCT,
                assoc: Assoc::Left,
            },
            BinaryOp::Div => Fixity::Enclosed,
            BinaryOp::Pow => Fixity::Script {
                precedence: precedence::POWER,
            },
            BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Ne => Fixity::Infix {
                precedence: precedence::COMPARISON,
                assoc: Assoc::None,
            },
        }
    }

    fn binary(&self, op: BinaryOp, left: &str, right: &str) -> String {
        let symbol = match op {
            BinaryOp::Div => return format!(r"\frac{{{left}}}{{{right}}}"),
            BinaryOp::Pow => return format!("{left}^{{{right}}}"),
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => r"\cdot",
            BinaryOp::Lt => "<",
            BinaryOp::Le => r"\leq",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => r"\geq",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => r"\neq",
        };
        format!("{left} {symbol} {right}")
    }

    fn unary(&self, op: UnaryOp, operand: &str) -> String {
        match op {
            UnaryOp::Neg => format!("-{operand}"),
        }
    }

    fn call(&self, function: &str, args: &[String]) -> String {
        let joined = args.join(", ");
        match Builtin::from_name(function) {
            Some(Builtin::Sqrt) => format!(r"\sqrt{{{joined}}}"),
            Some(Builtin::Abs) => format!(r"\left|{joined}\right|"),
            Some(Builtin::Log10) => format!(r"\log_{{10}}\left({joined}\right)"),
            // exp, ln, sin, cos, tan, min and max all have a LaTeX command
            _ => format!(r"\{function}\left({joined}\right)"),
        }
    }

    fn group(&self, inner: &str) -> String {
        format!(r"\left({inner}\right)")
    }
}

fn latex_number(value: f64) -> String {
    if value.is_nan() {
        r"\mathrm{NaN}".to_string()
    } else if value == f64::INFINITY {
        r"\infty".to_string()
    } else if value == f64::NEG_INFINITY {
        r"-\infty".to_string()
    } else {
        format!("{value}")
    }
}

/// Renders the equations of a validated model.
pub fn emit(plan: ValidatedModel<'_>, names: NameTable) -> String {
    let model = plan.model();
    let rules = LatexRules { names: &names };
    let mut out = String::new();

    for entity in plan.order() {
        out.push_str("\\begin{equation}\n");
        let _ = writeln!(
            out,
            "  {} := {}",
            names.get(entity.name()),
            entity.expression().render(&rules)
        );
        out.push_str("\\end{equation}\n");
    }

    // Summed coefficient per (variable, reaction) pair, keyed by declaration
    // position so terms come out in reaction order
    let mut coefficients: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for entry in model.stoichiometry() {
        if let (Some(variable), Some(reaction)) = (
            model.variable_index(&entry.variable),
            model.reaction_index(&entry.reaction),
        ) {
            *coefficients.entry((variable, reaction)).or_insert(0.0) += entry.coefficient;
        }
    }

    let lines: Vec<String> = model
        .variables()
        .iter()
        .enumerate()
        .map(|(index, variable)| {
            let terms: Vec<String> = coefficients
                .range((index, 0)..(index + 1, 0))
                // Entries that cancel out contribute nothing
                .filter(|(_, coefficient)| **coefficient != 0.0)
                .enumerate()
                .map(|(position, (&(_, reaction), &coefficient))| {
                    let rate = names.get(&model.reactions()[reaction].name);
                    term(coefficient, &rate, position == 0)
                })
                .collect();
            let rhs = if terms.is_empty() {
                "0".to_string()
            } else {
                terms.concat()
            };
            format!(r"\frac{{d{}}}{{dt}} = {rhs}", names.get(&variable.name))
        })
        .collect();

    if !lines.is_empty() {
        out.push_str("\\begin{gather}\n");
        out.push_str("  ");
        out.push_str(&lines.join(" \\\\\n  "));
        out.push_str("\n\\end{gather}\n");
    }

    out
}

/// One `[sign][coefficient \cdot]rate` term; later terms get spaced signs.
fn term(coefficient: f64, rate: &str, leading: bool) -> String {
    let sign = if coefficient.is_sign_negative() { '-' } else { '+' };
    let magnitude = coefficient.abs();
    let body = if magnitude == 1.0 {
        rate.to_string()
    } else {
        format!(r"{} \cdot {rate}", latex_number(magnitude))
    };
    if leading {
        format!("{sign}{body}")
    } else {
        format!(" {sign} {body}")
    }
}
