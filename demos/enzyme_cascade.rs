//! This example shows the full round of kinetic-codegen on a two-step enzyme cascade:
//! 1. Author the model with the builder API
//! 2. Generate the three artifacts (builder source, right-hand-side function, LaTeX)
//! 3. Integrate the model with the DOPRI5 solver from ode_solvers
//!
//! The cascade converts a substrate S into a product P through an intermediate I:
//!     S -> I -> P
//! Both steps follow Michaelis-Menten kinetics; the second enzyme is inhibited by
//! its own product:
//!
//! v1 = Vmax1 * S / (Km1 + S)
//! v2 = Vmax2 * I / (Km2 + I) / (1 + P / Ki)
//!
//! d[S]/dt = -v1
//! d[I]/dt = v1 - v2
//! d[P]/dt = v2
//!
//! Run with: `cargo run --example enzyme_cascade`

use colored::Colorize;
use kinetic_codegen::prelude::*;
use kinetic_codegen::rhs::RightHandSide;
use ode_solvers::dopri5::*;
use ode_solvers::*;

/// State vector type: concentrations of [S], [I] and [P]
type State = Vector3<f64>;

/// ODE system backed by the compiled right-hand side of the model
struct Cascade {
    rhs: RightHandSide,
    parameters: Vec<f64>,
}

impl System<f64, State> for Cascade {
    fn system(&self, t: f64, y: &State, dy: &mut State) {
        let mut results = [0.0; 3];
        self.rhs
            .eval_into(t, y.as_slice(), &self.parameters, &mut results)
            .expect("Failed to evaluate right-hand side");
        dy.copy_from_slice(&results);
    }
}

fn build_cascade() -> Result<Model, ModelError> {
    let mut builder = ModelBuilder::new();
    let s = builder.variable("S", 10.0);
    let i = builder.variable("I", 0.0);
    let p = builder.variable("P", 0.0);

    let vmax1 = builder.parameter("Vmax1", 1.5);
    let km1 = builder.parameter("Km1", 2.0);
    let vmax2 = builder.parameter("Vmax2", 0.8);
    let km2 = builder.parameter("Km2", 0.5);
    let ki = builder.parameter("Ki", 4.0);

    let inhibition = builder.derived("inhibition", lit(1.0) + &p / &ki);
    builder.reaction("v1", &vmax1 * &s / (&km1 + &s));
    builder.reaction("v2", &vmax2 * &i / (&km2 + &i) / &inhibition);

    builder
        .stoichiometry("v1", "S", -1.0)
        .stoichiometry("v1", "I", 1.0)
        .stoichiometry("v2", "I", -1.0)
        .stoichiometry("v2", "P", 1.0);

    builder.build()
}

fn main() {
    let model = build_cascade().expect("Failed to build model");

    for (title, target) in [
        ("=== Builder source ===", Target::NativeSource),
        ("=== Right-hand-side function ===", Target::GenericFunction),
        ("=== LaTeX ===", Target::Latex),
    ] {
        println!("\n{}", title.bright_blue().bold());
        match generate(&model, target) {
            Ok(artifact) => print!("{artifact}"),
            Err(e) => println!("{} {}", "error:".red().bold(), e),
        }
    }

    let rhs = RightHandSide::new(&model).expect("Failed to compile model");
    let y0 = State::from_column_slice(&rhs.initial_state());
    let parameters = rhs.parameter_values();

    // Simulation parameters
    let t0 = 0.0;
    let tf = 60.0;
    let dt = 1e-2;

    let mut stepper = Dopri5::new(Cascade { rhs, parameters }, t0, tf, dt, y0, 1.0e-6, 1.0e-9);

    println!("\n{}", "=== Simulation ===".bright_green().bold());
    match stepper.integrate() {
        Ok(stats) => {
            println!("Number of evaluations: {}", stats.num_eval);
            println!("Number of accepted steps: {}", stats.accepted_steps);
            if let (Some(t), Some(y)) = (stepper.x_out().last(), stepper.y_out().last()) {
                println!(
                    "t = {t:.1}: S = {:.4}, I = {:.4}, P = {:.4} (total {:.4})",
                    y[0],
                    y[1],
                    y[2],
                    y.sum()
                );
            }
        }
        Err(e) => println!("An error occurred: {}", e),
    }
}
