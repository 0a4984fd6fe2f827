//! Partial-fraction approximations of fractional powers.
//!
//! `x^{-s} = (sin πs / π) ∫ e^{(1−s)v} / (x + e^v) dv` for `0 < s < 1`,
//! discretised with the trapezoid rule in `v`. The truncation of the
//! `v` range is set from the target relative accuracy on `[lo, hi]`,
//! which is floored at [`MIN_TOL`] so the poles stay within a few
//! decades of the interval.

/// Accuracy floor. The `h = 0.9` trapezoid error is already near `1e-9`,
/// and tighter truncation only adds ill-conditioned far poles.
pub const MIN_TOL: f64 = 1e-8;

/// `norm + Σ res_k / (x + pole_k)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pfe {
    pub norm: f64,
    pub res: Vec<f64>,
    pub pole: Vec<f64>,
}

impl Pfe {
    pub fn eval(&self, x: f64) -> f64 {
        self.norm
            + self
                .res
                .iter()
                .zip(&self.pole)
                .map(|(r, p)| r / (x + p))
                .sum::<f64>()
    }

    pub fn degree(&self) -> usize {
        self.res.len()
    }

    /// The exact `x^{-1}`.
    pub fn inverse() -> Self {
        Self {
            norm: 0.0,
            res: vec![1.0],
            pole: vec![0.0],
        }
    }

    /// `x^{-s}` for `0 < s < 1`.
    pub fn inverse_power(s: f64, lo: f64, hi: f64, tol: f64) -> Self {
        let tol = tol.max(MIN_TOL);
        let h = 0.9;
        let v_min = lo.ln() + tol.ln() / (1.0 - s);
        let v_max = hi.ln() - tol.ln() / s;
        let n = ((v_max - v_min) / h).ceil() as usize;
        let c = (std::f64::consts::PI * s).sin() / std::f64::consts::PI;
        let (res, pole) = (0..=n)
            .map(|k| {
                let v = v_min + k as f64 * h;
                (c * h * ((1.0 - s) * v).exp(), v.exp())
            })
            .unzip();
        Self {
            norm: 0.0,
            res,
            pole,
        }
    }

    /// `x^{r}` for `0 < r < 1`, as `x · x^{-(1−r)}`.
    pub fn power(r: f64, lo: f64, hi: f64, tol: f64) -> Self {
        let inv = Self::inverse_power(1.0 - r, lo, hi, tol);
        Self {
            norm: inv.res.iter().sum(),
            res: inv.res.iter().zip(&inv.pole).map(|(w, p)| -w * p).collect(),
            pole: inv.pole,
        }
    }

    /// `<tag><norm/><res/><pole/></tag>`.
    pub fn to_xml(&self, tag: &str) -> String {
        let join = |v: &[f64]| v.iter().map(|x| format!("{x:?}")).collect::<Vec<_>>().join(" ");
        format!(
            "<{tag}><norm>{:?}</norm><res>{}</res><pole>{}</pole></{tag}>",
            self.norm,
            join(&self.res),
            join(&self.pole)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_square_root_is_accurate() {
        let p = Pfe::inverse_power(0.5, 0.01, 50.0, 1e-6);
        for i in 0..40 {
            let x = 0.01 * 1.2f64.powi(i);
            if x > 50.0 {
                break;
            }
            assert!((p.eval(x) * x.sqrt() - 1.0).abs() < 5e-6, "x={x}");
        }
    }

    #[test]
    fn positive_power_is_accurate() {
        let p = Pfe::power(0.25, 0.01, 50.0, 1e-6);
        for x in [0.02, 0.5, 3.0, 40.0] {
            assert!((p.eval(x) / x.powf(0.25) - 1.0).abs() < 5e-6, "x={x}");
        }
    }

    #[test]
    fn pole_range_is_capped_by_the_accuracy_floor() {
        let (lo, hi, r) = (1e-4, 1e3, 0.5);
        let p = Pfe::power(r, lo, hi, 1e-15);
        assert_eq!(p, Pfe::power(r, lo, hi, MIN_TOL));
        let s = 1.0 - r;
        let min = lo * MIN_TOL.powf(1.0 / (1.0 - s)) * 0.999;
        let max = hi * MIN_TOL.powf(-1.0 / s) * 2.5;
        assert!(p.pole.iter().all(|&q| q >= min && q <= max));
    }
}
