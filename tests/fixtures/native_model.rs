// Generated by kinetic-codegen. Rebuilds the model through the builder API.
use kinetic_codegen::prelude::*;

#[allow(non_snake_case, unused_variables)]
pub fn build_model() -> Result<Model, ModelError> {
    let mut builder = ModelBuilder::new();

    let S1 = builder.variable("S1", 2.0);
    let S2 = builder.variable("S2", 0.0);

    let k1 = builder.parameter("k1", 0.5);
    let k_cat = builder.parameter("k.cat", 1.2);
    let Km = builder.parameter("Km", 0.1);

    let S_total = builder.derived("S total", &S1 + &S2);
    let sat = builder.derived("sat", &S1 / (&Km + &S_total));
    builder.reaction("v1", &k1 * &S1);
    builder.reaction("v2", &k_cat * &sat * max(&S_total, lit(0.0)));
    builder.reaction("v3", &k1 * pow(&S2, lit(2.0)));
    builder.reaction("v4", &k1 * gt(&S1, lit(1.0)));

    builder.stoichiometry("v1", "S1", -1.0);
    builder.stoichiometry("v1", "S2", 1.0);
    builder.stoichiometry("v3", "S1", 1.0);
    builder.stoichiometry("v2", "S1", -1.0);
    builder.stoichiometry("v2", "S2", 1.0);
    builder.stoichiometry("v3", "S2", -2.0);
    builder.stoichiometry("v4", "S1", -1.0);

    builder.build()
}
