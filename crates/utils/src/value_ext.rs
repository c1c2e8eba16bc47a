use crate::f;

/// Extends primitives with more specific formatting options
pub trait ValueExt {
    /// Shortest decimal string that reads back to the same value
    ///
    /// Positional notation is used for magnitudes in `[1e-4, 1e16)` and zero,
    /// with at least one fractional digit for floats. Anything else switches
    /// to scientific notation with a signed exponent of at least two digits.
    ///
    /// This is the representation the solver input files expect.
    ///
    /// ```rust
    /// # use mgtools_utils::ValueExt;
    /// assert_eq!(0.5_f64.repr(), "0.5");
    /// assert_eq!(0.0_f64.repr(), "0.0");
    /// assert_eq!(2e7_f64.repr(), "20000000.0");
    /// assert_eq!(1e-5_f64.repr(), "1e-05");
    /// assert_eq!(1.5e20_f64.repr(), "1.5e+20");
    /// assert_eq!(f64::NAN.repr(), "nan");
    /// ```
    fn repr(&self) -> String;
}

impl ValueExt for f64 {
    fn repr(&self) -> String {
        // Debug is already the shortest round-trip form
        let mut num = f!("{:?}", &self);
        if num == "NaN" {
            return "nan".to_string();
        }

        // only the exponent style differs, e.g. `1e-5` => `1e-05`
        if let Some(idx) = num.find('e') {
            let exp = num.split_off(idx);
            let (sign, exp) = match exp.strip_prefix("e-") {
                Some(exp) => ('-', exp),
                None => ('+', &exp[1..]),
            };
            num.push_str(&f!("e{}{:0>2}", sign, exp));
        }
        num
    }
}
