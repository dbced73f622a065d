// Generated by kinetic-codegen. Rebuilds the model through the builder API.
use kinetic_codegen::prelude::*;

#[allow(non_snake_case, unused_variables)]
pub fn build_model() -> Result<Model, ModelError> {
    let mut builder = ModelBuilder::new();

    let S = builder.variable("S", 1.0);

    let k = builder.parameter("k", 2.0);

    let late = builder.derived("late", &S + &k);
    let early = builder.derived("early", &late * &k);
    builder.reaction("v", &early - &S);

    builder.stoichiometry("v", "S", 1.0);

    builder.build()
}
