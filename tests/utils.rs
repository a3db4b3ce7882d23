pub fn assert_float_eq<T: num::Float + std::fmt::Display>(
    f1: T,
    f2: T,
    atol: T,
    rtol: T,
    msg: &str,
) {
    if (f1 - f2).abs() >= atol + rtol * f2.abs() {
        panic!("Floats not almost equal. {}\nf1: {}\nf2: {}\n", msg, f1, f2);
    }
}

#[allow(dead_code)]
pub fn assert_float_eq_f64(f1: f64, f2: f64) {
    assert_float_eq(f1, f2, 1e-12, 1e-12, "");
}

#[allow(dead_code)]
pub fn assert_arrays_eq_f64(a1: &[f64], a2: &[f64]) {
    assert_eq!(a1.len(), a2.len());
    for (i, (f1, f2)) in a1.iter().zip(a2.iter()).enumerate() {
        assert_float_eq(*f1, *f2, 1e-12, 1e-12, &format!("index {i}"));
    }
}
