//! Per-target identifier sanitization.
//!
//! Every code generation target has its own notion of a safe identifier. This
//! module maps raw model names to target-safe names with a pure, deterministic
//! function, and builds the per-call `NameTable` that detects two raw names
//! landing on the same safe name.
//!
//! - Rust targets (native source, generic function): characters outside
//!   `[A-Za-z0-9_]` become `_`, a leading digit gets a `_` prefix, and names
//!   from the reserved set get a `_` suffix.
//! - LaTeX: an underscore-introduced trailing digit run (or one following a
//!   Greek letter name) becomes a subscript, Greek letter names become their
//!   commands, and the LaTeX special characters are escaped.

use std::collections::HashMap;

use crate::errors::CodegenError;
use crate::functions::Builtin;
use crate::model::Model;

/// A code generation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Rust source that rebuilds the model through `ModelBuilder`
    NativeSource,
    /// A standalone Rust right-hand-side function
    GenericFunction,
    /// A LaTeX equation fragment
    Latex,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Target::NativeSource => "native-source",
            Target::GenericFunction => "generic-function",
            Target::Latex => "latex",
        };
        f.write_str(label)
    }
}

/// Rust keywords, strict and reserved, plus names a `let` binding cannot shadow.
const RUST_RESERVED: &[&str] = &[
    "_", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try",
    "type", "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield", "Ok",
    "Err", "Some", "None",
];

/// Free functions of the authoring prelude used by native source, besides the
/// built-in function helpers.
const PRELUDE_FUNCTIONS: &[&str] = &["lit", "pow", "call", "lt", "le", "gt", "ge", "eq", "ne"];

/// Local binding used by native source for the builder.
pub(crate) const BUILDER_BINDING: &str = "builder";

/// Argument and output bindings of the generated right-hand-side function.
pub(crate) const FUNCTION_BINDINGS: &[&str] = &["time", "y", "p", "dydt"];

const GREEK_LETTERS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi",
    "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi", "Psi",
    "Omega",
];

/// Maps a raw model name to a name that is safe for `target`.
///
/// # Arguments
/// * `raw` - The name as declared in the model
/// * `target` - The code generation target
///
/// # Example
/// ```
/// use kinetic_codegen::naming::{sanitize, Target};
///
/// assert_eq!(sanitize("k.1", Target::NativeSource), "k_1");
/// assert_eq!(sanitize("type", Target::GenericFunction), "type_");
/// assert_eq!(sanitize("alpha_2", Target::Latex), r"\alpha_{2}");
/// ```
pub fn sanitize(raw: &str, target: Target) -> String {
    match target {
        Target::NativeSource => rust_identifier(raw, |ident| {
            PRELUDE_FUNCTIONS.contains(&ident)
                || Builtin::from_name(ident).is_some()
                || ident == BUILDER_BINDING
        }),
        Target::GenericFunction => rust_identifier(raw, |ident| FUNCTION_BINDINGS.contains(&ident)),
        Target::Latex => latex_identifier(raw),
    }
}

fn rust_identifier(raw: &str, reserved_by_target: impl Fn(&str) -> bool) -> String {
    let mut ident: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RUST_RESERVED.contains(&ident.as_str()) || reserved_by_target(&ident) {
        ident.push('_');
    }
    ident
}

fn latex_identifier(raw: &str) -> String {
    let (stem, subscript) = split_subscript(raw);
    let stem = match greek_command(stem) {
        Some(command) => command,
        None => escape_latex(stem),
    };
    match subscript {
        Some(digits) => format!("{stem}_{{{digits}}}"),
        None => stem,
    }
}

/// Splits `k_12` into `("k", Some("12"))` and `alpha2` into
/// `("alpha", Some("2"))`. Other names are returned whole.
fn split_subscript(raw: &str) -> (&str, Option<&str>) {
    let stem_len = raw.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if stem_len == 0 || stem_len == raw.len() {
        return (raw, None);
    }
    let (stem, digits) = raw.split_at(stem_len);
    if let Some(base) = stem.strip_suffix('_') {
        if !base.is_empty() {
            return (base, Some(digits));
        }
    }
    if greek_command(stem).is_some() {
        return (stem, Some(digits));
    }
    (raw, None)
}

fn greek_command(name: &str) -> Option<String> {
    GREEK_LETTERS
        .contains(&name)
        .then(|| format!("\\{name}"))
}

/// Escapes the characters LaTeX treats specially.
fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '%' | '&' | '#' | '$' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            '\\' => escaped.push_str(r"\textbackslash{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Raw-to-safe name mapping for one target, computed fresh for every
/// generation call.
#[derive(Debug, Clone)]
pub struct NameTable {
    target: Target,
    safe: HashMap<String, String>,
}

impl NameTable {
    /// Sanitizes every entity name of `model` for `target`.
    ///
    /// # Errors
    /// Returns `CodegenError::NameCollision` naming the first pair of distinct
    /// raw names (in declaration order) that map to the same safe name.
    pub fn build(model: &Model, target: Target) -> Result<Self, CodegenError> {
        let mut safe = HashMap::new();
        let mut owners: HashMap<String, &str> = HashMap::new();

        for raw in model.names() {
            let sanitized = sanitize(raw, target);
            if let Some(first) = owners.get(&sanitized) {
                return Err(CodegenError::NameCollision {
                    first: first.to_string(),
                    second: raw.to_string(),
                    sanitized,
                    target,
                });
            }
            owners.insert(sanitized.clone(), raw);
            safe.insert(raw.to_string(), sanitized);
        }

        Ok(Self { target, safe })
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Safe name for `raw`. Names outside the model are sanitized on the fly.
    pub fn get(&self, raw: &str) -> String {
        self.safe
            .get(raw)
            .cloned()
            .unwrap_or_else(|| sanitize(raw, self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    #[test]
    fn test_rust_identifiers() {
        assert_eq!(sanitize("S1", Target::NativeSource), "S1");
        assert_eq!(sanitize("k.1", Target::NativeSource), "k_1");
        assert_eq!(sanitize("S total", Target::NativeSource), "S_total");
        assert_eq!(sanitize("1st", Target::NativeSource), "_1st");
        assert_eq!(sanitize("ATP→ADP", Target::NativeSource), "ATP_ADP");
        assert_eq!(sanitize("", Target::NativeSource), "__");
        assert_eq!(sanitize("fn", Target::NativeSource), "fn_");
        assert_eq!(sanitize("None", Target::GenericFunction), "None_");
    }

    #[test]
    fn test_target_specific_reserved_words() {
        assert_eq!(sanitize("exp", Target::NativeSource), "exp_");
        assert_eq!(sanitize("builder", Target::NativeSource), "builder_");
        assert_eq!(sanitize("lit", Target::NativeSource), "lit_");
        assert_eq!(sanitize("exp", Target::GenericFunction), "exp");

        assert_eq!(sanitize("y", Target::GenericFunction), "y_");
        assert_eq!(sanitize("time", Target::GenericFunction), "time_");
        assert_eq!(sanitize("y", Target::NativeSource), "y");
    }

    #[test]
    fn test_latex_subscripts_and_greek() {
        assert_eq!(sanitize("v1", Target::Latex), "v1");
        assert_eq!(sanitize("k_1", Target::Latex), "k_{1}");
        assert_eq!(sanitize("k_cat_12", Target::Latex), r"k\_cat_{12}");
        assert_eq!(sanitize("alpha", Target::Latex), r"\alpha");
        assert_eq!(sanitize("alpha2", Target::Latex), r"\alpha_{2}");
        assert_eq!(sanitize("Omega_3", Target::Latex), r"\Omega_{3}");
        assert_eq!(sanitize("alphabet", Target::Latex), "alphabet");
        assert_eq!(sanitize("42", Target::Latex), "42");
        assert_eq!(sanitize("_1", Target::Latex), r"\_1");
    }

    #[test]
    fn test_latex_escapes_special_characters() {
        assert_eq!(sanitize("a%b", Target::Latex), r"a\%b");
        assert_eq!(sanitize("R&D", Target::Latex), r"R\&D");
        assert_eq!(sanitize("#n", Target::Latex), r"\#n");
        assert_eq!(sanitize("x_y", Target::Latex), r"x\_y");
        assert_eq!(sanitize("a^b", Target::Latex), r"a\textasciicircum{}b");
        assert_eq!(sanitize(r"a\b", Target::Latex), r"a\textbackslash{}b");
    }

    #[test]
    fn test_latex_never_leaks_reserved_characters() {
        let nasty = [
            "k_1", "a_b_c", "50%", "x&y", "#1", "$cost", "{set}", "~tilde", "^hat", r"\cmd",
            "alpha_beta", "mixed_%&#_9",
        ];
        for raw in nasty {
            let safe = sanitize(raw, Target::Latex);
            let stripped = safe
                .replace(r"\textasciitilde{}", "")
                .replace(r"\textasciicircum{}", "")
                .replace(r"\textbackslash{}", "")
                .replace(r"\_", "")
                .replace(r"\%", "")
                .replace(r"\&", "")
                .replace(r"\#", "")
                .replace(r"\$", "")
                .replace(r"\{", "")
                .replace(r"\}", "");
            // What remains may only be a generated subscript `_{digits}`.
            let stripped = match stripped.find("_{") {
                Some(at) if stripped.ends_with('}') => stripped[..at].to_string(),
                _ => stripped,
            };
            for reserved in ['_', '%', '&', '#', '$', '{', '}', '~', '^', '\\'] {
                assert!(
                    !stripped.contains(reserved),
                    "{raw:?} -> {safe:?} leaks {reserved:?}"
                );
            }
        }
    }

    #[test]
    fn test_collision_is_detected() {
        let mut builder = ModelBuilder::new();
        builder.parameter("k_1", 1.0);
        builder.parameter("k.1", 2.0);
        let model = builder.build().unwrap();

        let err = NameTable::build(&model, Target::NativeSource).unwrap_err();
        assert_eq!(
            err,
            CodegenError::NameCollision {
                first: "k_1".to_string(),
                second: "k.1".to_string(),
                sanitized: "k_1".to_string(),
                target: Target::NativeSource,
            }
        );

        // LaTeX keeps them apart
        let table = NameTable::build(&model, Target::Latex).unwrap();
        assert_eq!(table.get("k_1"), "k_{1}");
        assert_eq!(table.get("k.1"), "k.1");
    }

    #[test]
    fn test_reserved_suffix_can_collide() {
        let mut builder = ModelBuilder::new();
        builder.parameter("fn", 1.0);
        builder.parameter("fn_", 2.0);
        let model = builder.build().unwrap();
        assert!(matches!(
            NameTable::build(&model, Target::NativeSource),
            Err(CodegenError::NameCollision { .. })
        ));
    }
}
