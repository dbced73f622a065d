//! Built-in scalar functions callable from expressions.
//!
//! Calls in the expression grammar target this closed table. Each function has
//! a fixed arity and a floating-point implementation; the code generation
//! targets map the names to their own syntax (`f64::exp` in Rust, `\exp` in LaTeX).
//!
//! The lowercase helpers (`exp`, `ln`, `min`, ...) build call nodes and are part
//! of the authoring prelude.

use crate::expr::Expression;

/// A function from the built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Min,
    Max,
}

impl Builtin {
    /// Every built-in function, in table order.
    pub const ALL: [Builtin; 10] = [
        Builtin::Exp,
        Builtin::Ln,
        Builtin::Log10,
        Builtin::Sqrt,
        Builtin::Abs,
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Min,
        Builtin::Max,
    ];

    /// Looks up a built-in by the name used in call nodes.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Name used in call nodes and in the authoring prelude.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exp => "exp",
            Builtin::Ln => "ln",
            Builtin::Log10 => "log10",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Min => "min",
            Builtin::Max => "max",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Builtin::Min | Builtin::Max => 2,
            _ => 1,
        }
    }

    /// Evaluates the function. `args` must hold exactly `arity()` values.
    pub fn apply(self, args: &[f64]) -> f64 {
        match self {
            Builtin::Exp => args[0].exp(),
            Builtin::Ln => args[0].ln(),
            Builtin::Log10 => args[0].log10(),
            Builtin::Sqrt => args[0].sqrt(),
            Builtin::Abs => args[0].abs(),
            Builtin::Sin => args[0].sin(),
            Builtin::Cos => args[0].cos(),
            Builtin::Tan => args[0].tan(),
            Builtin::Min => args[0].min(args[1]),
            Builtin::Max => args[0].max(args[1]),
        }
    }
}

macro_rules! unary_helpers {
    ($($name:ident => $builtin:ident;)*) => {
        $(
            #[doc = concat!("Calls the built-in `", stringify!($name), "` function.")]
            pub fn $name(x: impl Into<Expression>) -> Expression {
                Expression::call(Builtin::$builtin.name(), vec![x.into()])
            }
        )*
    };
}

macro_rules! binary_helpers {
    ($($name:ident => $builtin:ident;)*) => {
        $(
            #[doc = concat!("Calls the built-in `", stringify!($name), "` function.")]
            pub fn $name(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
                Expression::call(Builtin::$builtin.name(), vec![a.into(), b.into()])
            }
        )*
    };
}

unary_helpers! {
    exp => Exp;
    ln => Ln;
    log10 => Log10;
    sqrt => Sqrt;
    abs => Abs;
    sin => Sin;
    cos => Cos;
    tan => Tan;
}

binary_helpers! {
    min => Min;
    max => Max;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_round_trips_names() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("log"), None);
        assert_eq!(Builtin::from_name("v1"), None);
    }

    #[test]
    fn test_apply() {
        assert_eq!(Builtin::Exp.apply(&[0.0]), 1.0);
        assert_eq!(Builtin::Ln.apply(&[1.0]), 0.0);
        assert_eq!(Builtin::Log10.apply(&[100.0]), 2.0);
        assert_eq!(Builtin::Sqrt.apply(&[9.0]), 3.0);
        assert_eq!(Builtin::Abs.apply(&[-3.0]), 3.0);
        assert_eq!(Builtin::Min.apply(&[1.0, 2.0]), 1.0);
        assert_eq!(Builtin::Max.apply(&[1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_helpers_build_calls() {
        assert_eq!(
            sqrt(Expression::name("x")),
            Expression::Call("sqrt".to_string(), vec![Expression::name("x")])
        );
        assert_eq!(
            min(1.0, Expression::name("x")),
            Expression::Call(
                "min".to_string(),
                vec![Expression::Literal(1.0), Expression::name("x")]
            )
        );
    }
}
