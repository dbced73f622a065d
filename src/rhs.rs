//! Direct evaluation of a model's right-hand side.
//!
//! `RightHandSide` compiles a validated model into an evaluation plan: every
//! name is resolved once to a state slot, a parameter slot or a local computed
//! earlier in dependency order, and every call to its built-in function. The
//! plan computes the same values as the generated right-hand-side function,
//! which makes it the reference for testing generated code and a way to
//! integrate a model without compiling anything.
//!
//! # Example
//!
//! ```
//! use kinetic_codegen::prelude::*;
//! use kinetic_codegen::rhs::RightHandSide;
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
//! let rhs = RightHandSide::new(&model).unwrap();
//! let dydt = rhs.eval(0.0, &rhs.initial_state(), &rhs.parameter_values()).unwrap();
//! assert_eq!(dydt, vec![-1.0, 1.0]);
//! ```

use std::collections::HashMap;

use rayon::prelude::*;

use crate::errors::EvalError;
use crate::expr::{BinaryOp, Expression, UnaryOp};
use crate::functions::Builtin;
use crate::model::Model;
use crate::validate::{validate, Entity};
use crate::vector::Vector;

/// Where a name's value comes from during evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    State(usize),
    Parameter(usize),
    Local(usize),
}

/// An expression with every name and function resolved.
#[derive(Debug, Clone, PartialEq)]
enum Compiled {
    Literal(f64),
    Load(Slot),
    Binary(BinaryOp, Box<Compiled>, Box<Compiled>),
    Unary(UnaryOp, Box<Compiled>),
    Call(Builtin, Vec<Compiled>),
}

impl Compiled {
    fn compile(expression: &Expression, slots: &HashMap<&str, Slot>) -> Result<Self, EvalError> {
        Ok(match expression {
            Expression::Literal(value) => Compiled::Literal(*value),
            Expression::Name(name) => Compiled::Load(
                *slots
                    .get(name.as_str())
                    .ok_or_else(|| EvalError::UnboundName(name.clone()))?,
            ),
            Expression::Binary(op, left, right) => Compiled::Binary(
                *op,
                Box::new(Self::compile(left, slots)?),
                Box::new(Self::compile(right, slots)?),
            ),
            Expression::Unary(op, operand) => {
                Compiled::Unary(*op, Box::new(Self::compile(operand, slots)?))
            }
            Expression::Call(function, args) => {
                let builtin = Builtin::from_name(function)
                    .ok_or_else(|| EvalError::UnknownFunction(function.clone()))?;
                if args.len() != builtin.arity() {
                    return Err(EvalError::ArityMismatch {
                        function: function.clone(),
                        expected: builtin.arity(),
                        got: args.len(),
                    });
                }
                Compiled::Call(
                    builtin,
                    args.iter()
                        .map(|arg| Self::compile(arg, slots))
                        .collect::<Result<_, _>>()?,
                )
            }
        })
    }

    fn eval(&self, y: &[f64], p: &[f64], locals: &[f64]) -> f64 {
        match self {
            Compiled::Literal(value) => *value,
            Compiled::Load(Slot::State(i)) => y[*i],
            Compiled::Load(Slot::Parameter(j)) => p[*j],
            Compiled::Load(Slot::Local(k)) => locals[*k],
            Compiled::Binary(op, left, right) => {
                op.apply(left.eval(y, p, locals), right.eval(y, p, locals))
            }
            Compiled::Unary(op, operand) => op.apply(operand.eval(y, p, locals)),
            Compiled::Call(builtin, args) => {
                let values: Vec<f64> = args.iter().map(|arg| arg.eval(y, p, locals)).collect();
                builtin.apply(&values)
            }
        }
    }
}

/// The compiled right-hand side of a model.
#[derive(Debug, Clone)]
pub struct RightHandSide {
    variables: Vec<String>,
    parameters: Vec<String>,
    initial_state: Vec<f64>,
    parameter_values: Vec<f64>,
    /// One step per derived quantity and reaction, in dependency order
    steps: Vec<Compiled>,
    /// Local slot of each derived quantity, in declaration order
    derived_locals: Vec<usize>,
    /// Local slot of each reaction, in declaration order
    reaction_locals: Vec<usize>,
    /// (variable, local, coefficient), ordered by reaction declaration
    accumulation: Vec<(usize, usize, f64)>,
}

impl RightHandSide {
    /// Validates `model` and compiles its evaluation plan.
    ///
    /// # Errors
    /// Returns `EvalError::Invalid` when the model fails validation.
    pub fn new(model: &Model) -> Result<Self, EvalError> {
        let plan = validate(model)?;

        let mut slots: HashMap<&str, Slot> = HashMap::new();
        for (i, variable) in model.variables().iter().enumerate() {
            slots.insert(&variable.name, Slot::State(i));
        }
        for (j, parameter) in model.parameters().iter().enumerate() {
            slots.insert(&parameter.name, Slot::Parameter(j));
        }

        let mut steps = Vec::with_capacity(plan.order().len());
        let mut derived_locals = vec![0; model.derived().len()];
        let mut reaction_locals = vec![0; model.reactions().len()];
        for (local, entity) in plan.order().iter().enumerate() {
            steps.push(Compiled::compile(entity.expression(), &slots)?);
            slots.insert(entity.name(), Slot::Local(local));
            match entity {
                Entity::Derived(derived) => {
                    if let Some(index) = model.derived().iter().position(|d| d.name == derived.name) {
                        derived_locals[index] = local;
                    }
                }
                Entity::Reaction(reaction) => {
                    if let Some(index) = model.reaction_index(&reaction.name) {
                        reaction_locals[index] = local;
                    }
                }
            }
        }

        let mut accumulation: Vec<(usize, usize, usize, f64)> = model
            .stoichiometry()
            .iter()
            .filter_map(|entry| {
                let reaction = model.reaction_index(&entry.reaction)?;
                let variable = model.variable_index(&entry.variable)?;
                Some((reaction, variable, reaction_locals[reaction], entry.coefficient))
            })
            .collect();
        accumulation.sort_by_key(|&(reaction, ..)| reaction);

        tracing::debug!(steps = steps.len(), "evaluation plan compiled");

        Ok(Self {
            variables: model.variables().iter().map(|v| v.name.clone()).collect(),
            parameters: model.parameters().iter().map(|p| p.name.clone()).collect(),
            initial_state: model.variables().iter().map(|v| v.initial_value).collect(),
            parameter_values: model.parameters().iter().map(|p| p.value).collect(),
            steps,
            derived_locals,
            reaction_locals,
            accumulation: accumulation
                .into_iter()
                .map(|(_, variable, local, coefficient)| (variable, local, coefficient))
                .collect(),
        })
    }

    /// Variable names in state-vector order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Parameter names in parameter-vector order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Initial values of the variables, in state-vector order.
    pub fn initial_state(&self) -> Vec<f64> {
        self.initial_state.clone()
    }

    /// Declared parameter values, in parameter-vector order.
    pub fn parameter_values(&self) -> Vec<f64> {
        self.parameter_values.clone()
    }

    /// Evaluates the time derivative of every variable.
    ///
    /// # Arguments
    /// * `time` - Current time; rate laws do not depend on it
    /// * `y` - State vector, one value per variable
    /// * `p` - Parameter vector, one value per parameter
    ///
    /// # Returns
    /// The derivative vector, in the same vector type as the state
    pub fn eval<V: Vector, P: Vector>(&self, time: f64, y: &V, p: &P) -> Result<V, EvalError> {
        let y = y.as_slice().ok_or(EvalError::NonContiguous)?;
        let p = p.as_slice().ok_or(EvalError::NonContiguous)?;
        let mut results = vec![0.0; self.variables.len()];
        self.eval_into(time, y, p, &mut results)?;
        let len = results.len();
        V::from_vec(results).ok_or(EvalError::UnrepresentableOutput(len))
    }

    /// Evaluates the time derivative into a pre-allocated buffer.
    ///
    /// # Errors
    /// Returns `EvalError::InvalidInputLength` or `EvalError::InvalidOutputLength`
    /// when a slice does not match the model.
    pub fn eval_into<'a>(
        &self,
        _time: f64,
        y: &[f64],
        p: &[f64],
        results: &'a mut [f64],
    ) -> Result<&'a [f64], EvalError> {
        if results.len() != self.variables.len() {
            return Err(EvalError::InvalidOutputLength {
                expected: self.variables.len(),
                got: results.len(),
            });
        }
        let locals = self.locals(y, p)?;
        results.fill(0.0);
        for &(variable, local, coefficient) in &self.accumulation {
            results[variable] += coefficient * locals[local];
        }
        Ok(results)
    }

    /// Reaction rates, in reaction declaration order.
    pub fn fluxes(&self, _time: f64, y: &[f64], p: &[f64]) -> Result<Vec<f64>, EvalError> {
        let locals = self.locals(y, p)?;
        Ok(self.reaction_locals.iter().map(|&local| locals[local]).collect())
    }

    /// Values of the derived quantities, in declaration order.
    pub fn derived_values(&self, _time: f64, y: &[f64], p: &[f64]) -> Result<Vec<f64>, EvalError> {
        let locals = self.locals(y, p)?;
        Ok(self.derived_locals.iter().map(|&local| locals[local]).collect())
    }

    /// Evaluates the right-hand side for many state vectors in parallel.
    ///
    /// # Arguments
    /// * `time` - Current time
    /// * `states` - State vectors, each with one value per variable
    /// * `p` - Parameter vector shared by all evaluations
    pub fn eval_parallel(
        &self,
        time: f64,
        states: &[Vec<f64>],
        p: &[f64],
    ) -> Result<Vec<Vec<f64>>, EvalError> {
        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        let chunk_size = (states.len() / (num_threads * 4)).max(1);
        let n_variables = self.variables.len();

        states
            .par_chunks(chunk_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|y| {
                        let mut results = vec![0.0; n_variables];
                        self.eval_into(time, y, p, &mut results)?;
                        Ok(results)
                    })
                    .collect::<Result<Vec<_>, EvalError>>()
            })
            .collect::<Result<Vec<_>, EvalError>>()
            .map(|chunks| chunks.into_iter().flatten().collect())
    }

    fn locals(&self, y: &[f64], p: &[f64]) -> Result<Vec<f64>, EvalError> {
        self.validate_input_length(y, self.variables.len())?;
        self.validate_input_length(p, self.parameters.len())?;
        let mut locals = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let value = step.eval(y, p, &locals);
            locals.push(value);
        }
        Ok(locals)
    }

    fn validate_input_length(&self, inputs: &[f64], expected: usize) -> Result<(), EvalError> {
        if inputs.len() != expected {
            return Err(EvalError::InvalidInputLength {
                expected,
                got: inputs.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CodegenError;
    use crate::expr::{gt, lit, pow};
    use crate::functions::max;
    use crate::model::ModelBuilder;
    use approx::assert_relative_eq;

    fn cascade() -> Model {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 4.0);
        let p = builder.variable("P", 1.0);
        let k = builder.parameter("k", 0.5);
        let km = builder.parameter("Km", 2.0);
        let late = Expression::name("saturation");
        let scaled = builder.derived("scaled", &late * &k);
        builder.derived("saturation", &s / (&km + &s));
        builder.reaction("forward", &scaled * max(&s, lit(0.0)));
        builder.reaction("backward", &k * pow(&p, lit(2.0)) * gt(&p, lit(0.5)));
        builder.stoichiometry("backward", "S", 1.0);
        builder.stoichiometry("forward", "S", -1.0);
        builder.stoichiometry("forward", "P", 1.0);
        builder.stoichiometry("backward", "P", -1.0);
        builder.build().unwrap()
    }

    #[test]
    fn test_eval_matches_manual_substitution() {
        let rhs = RightHandSide::new(&cascade()).unwrap();
        let y = vec![4.0, 1.0];
        let p = vec![0.5, 2.0];

        let saturation: f64 = 4.0 / (2.0 + 4.0);
        let forward = saturation * 0.5 * 4.0;
        let backward = 0.5 * 1.0 * 1.0;

        assert_eq!(rhs.fluxes(0.0, &y, &p).unwrap(), vec![forward, backward]);
        assert_eq!(
            rhs.derived_values(0.0, &y, &p).unwrap(),
            vec![saturation * 0.5, saturation]
        );
        let dydt = rhs.eval(0.0, &y, &p).unwrap();
        assert_relative_eq!(dydt[0], -forward + backward);
        assert_relative_eq!(dydt[1], forward - backward);
    }

    #[test]
    fn test_eval_agrees_with_expression_eval() {
        let model = cascade();
        let rhs = RightHandSide::new(&model).unwrap();
        let y = [3.0, 0.25];
        let p = [1.5, 0.75];

        let mut values: HashMap<String, f64> = HashMap::new();
        values.insert("S".into(), y[0]);
        values.insert("P".into(), y[1]);
        values.insert("k".into(), p[0]);
        values.insert("Km".into(), p[1]);
        let saturation = model.derived()[1]
            .expression
            .eval(&|name| values.get(name).copied())
            .unwrap();
        values.insert("saturation".into(), saturation);
        let scaled = model.derived()[0]
            .expression
            .eval(&|name| values.get(name).copied())
            .unwrap();
        values.insert("scaled".into(), scaled);
        let fluxes: Vec<f64> = model
            .reactions()
            .iter()
            .map(|r| r.rate.eval(&|name| values.get(name).copied()).unwrap())
            .collect();

        assert_eq!(rhs.fluxes(0.0, &y, &p).unwrap(), fluxes);
        let dydt = rhs.eval(0.0, &y, &p).unwrap();
        assert_relative_eq!(dydt[0], -fluxes[0] + fluxes[1]);
        assert_relative_eq!(dydt[1], fluxes[0] - fluxes[1]);
    }

    #[test]
    fn test_initial_values() {
        let rhs = RightHandSide::new(&cascade()).unwrap();
        assert_eq!(rhs.initial_state(), vec![4.0, 1.0]);
        assert_eq!(rhs.parameter_values(), vec![0.5, 2.0]);
        assert_eq!(rhs.variables(), ["S", "P"]);
        assert_eq!(rhs.parameters(), ["k", "Km"]);
    }

    #[test]
    fn test_length_mismatches() {
        let rhs = RightHandSide::new(&cascade()).unwrap();
        assert_eq!(
            rhs.eval(0.0, &vec![1.0], &vec![0.5, 2.0]),
            Err(EvalError::InvalidInputLength {
                expected: 2,
                got: 1
            })
        );
        let mut short = [0.0; 1];
        assert_eq!(
            rhs.eval_into(0.0, &[1.0, 1.0], &[0.5, 2.0], &mut short),
            Err(EvalError::InvalidOutputLength {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_state_and_parameters_may_differ_in_type_and_length() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 1.0);
        let vmax = builder.parameter("Vmax", 2.0);
        let km = builder.parameter("Km", 1.0);
        builder.reaction("uptake", &vmax * &s / (&km + &s));
        builder.stoichiometry("uptake", "S", -1.0);
        let rhs = RightHandSide::new(&builder.build().unwrap()).unwrap();

        let p: [f64; 2] = [2.0, 1.0];
        let dydt: [f64; 1] = rhs.eval(0.0, &[1.0], &p).unwrap();
        assert_relative_eq!(dydt[0], -1.0);
        let dydt: Vec<f64> = rhs.eval(0.0, &vec![3.0], &p).unwrap();
        assert_relative_eq!(dydt[0], -1.5);
    }

    #[test]
    fn test_eval_parallel_matches_sequential() {
        let rhs = RightHandSide::new(&cascade()).unwrap();
        let p = rhs.parameter_values();
        let states: Vec<Vec<f64>> = (0..100)
            .map(|i| vec![i as f64 * 0.1, 5.0 - i as f64 * 0.05])
            .collect();

        let parallel = rhs.eval_parallel(0.0, &states, &p).unwrap();
        assert_eq!(parallel.len(), states.len());
        for (state, result) in states.iter().zip(&parallel) {
            assert_eq!(&rhs.eval(0.0, state, &p).unwrap(), result);
        }
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let mut builder = ModelBuilder::new();
        builder.derived("A", Expression::name("B"));
        builder.derived("B", Expression::name("A"));
        let model = builder.build().unwrap();
        assert!(matches!(
            RightHandSide::new(&model),
            Err(EvalError::Invalid(CodegenError::CyclicDependency { .. }))
        ));
    }

    #[test]
    fn test_division_by_zero_propagates() {
        let mut builder = ModelBuilder::new();
        let s = builder.variable("S", 0.0);
        builder.reaction("v", lit(1.0) / &s);
        builder.stoichiometry("v", "S", 1.0);
        let rhs = RightHandSide::new(&builder.build().unwrap()).unwrap();
        let dydt = rhs.eval(0.0, &vec![0.0], &Vec::<f64>::new()).unwrap();
        assert!(dydt[0].is_infinite());
    }
}
