/// Right-hand side of the model, for use with an external ODE integrator.
///
/// State vector layout: "S1", "S2".
/// Parameter vector layout: "k1", "k.cat", "Km".
#[allow(non_snake_case, unused_variables, unused_mut)]
pub fn rhs(time: f64, y: &[f64], p: &[f64]) -> Vec<f64> {
    let S_total = y[0] + y[1];
    let sat = y[0] / (p[2] + S_total);
    let v1 = p[0] * y[0];
    let v2 = p[1] * sat * f64::max(S_total, 0.0);
    let v3 = p[0] * f64::powf(y[1], 2.0);
    let v4 = p[0] * f64::from(u8::from(y[0] > 1.0));
    let mut dydt = vec![0.0; 2];
    dydt[0] += -1.0 * v1;
    dydt[1] += 1.0 * v1;
    dydt[0] += -1.0 * v2;
    dydt[1] += 1.0 * v2;
    dydt[0] += 1.0 * v3;
    dydt[1] += -2.0 * v3;
    dydt[0] += -1.0 * v4;
    dydt
}
