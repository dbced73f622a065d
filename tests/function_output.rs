mod common;

mod generated {
    include!("fixtures/rhs_function.rs");
}

use approx::assert_relative_eq;
use common::reference_model;
use kinetic_codegen::prelude::*;
use kinetic_codegen::rhs::RightHandSide;
use ode_solvers::dopri5::*;
use ode_solvers::*;

type State = Vector2<f64>;

#[test]
fn test_emitted_function_matches_fixture() {
    let source = reference_model().to_function().unwrap();
    assert_eq!(source, include_str!("fixtures/rhs_function.rs"));
}

#[test]
fn test_generated_rhs_matches_manual_substitution() {
    let (s1, s2) = (2.0, 0.5);
    let (k1, k_cat, km) = (0.5, 1.2, 0.1);

    let total: f64 = s1 + s2;
    let sat = s1 / (km + total);
    let v1 = k1 * s1;
    let v2 = k_cat * sat * total.max(0.0);
    let v3 = k1 * s2 * s2;
    let v4 = k1;

    let dydt = generated::rhs(0.0, &[s1, s2], &[k1, k_cat, km]);
    assert_relative_eq!(dydt[0], -v1 - v2 + v3 - v4, epsilon = 1e-12);
    assert_relative_eq!(dydt[1], v1 + v2 - 2.0 * v3, epsilon = 1e-12);
}

#[test]
fn test_generated_rhs_agrees_with_reference_evaluation() {
    let model = reference_model();
    let reference = RightHandSide::new(&model).unwrap();
    let p = reference.parameter_values();

    for y in [[2.0, 0.0], [0.5, 0.5], [1.0, 3.0], [0.0, 0.0], [10.0, 1e-3]] {
        let expected = reference.eval(0.0, &y.to_vec(), &p).unwrap();
        let actual = generated::rhs(0.0, &y, &p);
        assert_relative_eq!(actual[0], expected[0], epsilon = 1e-12);
        assert_relative_eq!(actual[1], expected[1], epsilon = 1e-12);
    }
}

#[test]
fn test_scenario_single_reaction() {
    let mut builder = ModelBuilder::new();
    let s1 = builder.variable("S1", 2.0);
    builder.variable("S2", 0.0);
    let k1 = builder.parameter("k1", 0.5);
    builder.reaction("v1", &k1 * &s1);
    builder.stoichiometry("v1", "S1", -1.0);
    builder.stoichiometry("v1", "S2", 1.0);
    let model = builder.build().unwrap();

    let source = model.to_function().unwrap();
    assert!(source.contains("    let v1 = p[0] * y[0];\n"));

    let reference = RightHandSide::new(&model).unwrap();
    let dydt = reference
        .eval(0.0, &reference.initial_state(), &reference.parameter_values())
        .unwrap();
    assert_eq!(dydt, vec![-1.0, 1.0]);
}

struct Generated {
    p: Vec<f64>,
}

impl System<f64, State> for Generated {
    fn system(&self, t: f64, y: &State, dy: &mut State) {
        let dydt = generated::rhs(t, y.as_slice(), &self.p);
        dy.copy_from_slice(&dydt);
    }
}

struct Reference {
    rhs: RightHandSide,
    p: Vec<f64>,
}

impl System<f64, State> for Reference {
    fn system(&self, t: f64, y: &State, dy: &mut State) {
        let mut results = [0.0; 2];
        self.rhs
            .eval_into(t, y.as_slice(), &self.p, &mut results)
            .unwrap();
        dy.copy_from_slice(&results);
    }
}

#[test]
fn test_generated_rhs_integrates_like_reference() {
    let model = reference_model();
    let reference = RightHandSide::new(&model).unwrap();
    let y0 = State::from_column_slice(&reference.initial_state());
    let p = reference.parameter_values();

    let mut generated = Dopri5::new(Generated { p: p.clone() }, 0.0, 5.0, 1e-2, y0, 1e-8, 1e-10);
    let mut direct = Dopri5::new(
        Reference {
            rhs: reference,
            p,
        },
        0.0,
        5.0,
        1e-2,
        y0,
        1e-8,
        1e-10,
    );
    generated.integrate().unwrap();
    direct.integrate().unwrap();

    let end_generated = generated.y_out().last().unwrap();
    let end_direct = direct.y_out().last().unwrap();
    assert_relative_eq!(end_generated[0], end_direct[0], epsilon = 1e-9);
    assert_relative_eq!(end_generated[1], end_direct[1], epsilon = 1e-9);
    assert!(end_generated.iter().all(|value| value.is_finite()));
}
