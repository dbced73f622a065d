use kinetic_codegen::prelude::*;

/// Model behind the checked-in fixtures.
///
/// It covers raw names that need sanitizing (`k.cat`, `S total`), a derived
/// quantity referencing another, built-in calls, powers, a comparison and
/// stoichiometry entries declared out of reaction order.
pub fn reference_model() -> Model {
    let mut builder = ModelBuilder::new();
    let s1 = builder.variable("S1", 2.0);
    let s2 = builder.variable("S2", 0.0);

    let k1 = builder.parameter("k1", 0.5);
    let k_cat = builder.parameter("k.cat", 1.2);
    let km = builder.parameter("Km", 0.1);

    let total = builder.derived("S total", &s1 + &s2);
    let sat = builder.derived("sat", &s1 / (&km + &total));

    builder.reaction("v1", &k1 * &s1);
    builder.reaction("v2", &k_cat * &sat * max(&total, lit(0.0)));
    builder.reaction("v3", &k1 * pow(&s2, lit(2.0)));
    builder.reaction("v4", &k1 * gt(&s1, lit(1.0)));

    builder
        .stoichiometry("v1", "S1", -1.0)
        .stoichiometry("v1", "S2", 1.0)
        .stoichiometry("v3", "S1", 1.0)
        .stoichiometry("v2", "S1", -1.0)
        .stoichiometry("v2", "S2", 1.0)
        .stoichiometry("v3", "S2", -2.0)
        .stoichiometry("v4", "S1", -1.0);

    builder.build().unwrap()
}
