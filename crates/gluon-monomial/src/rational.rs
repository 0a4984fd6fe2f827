//! Partial-fraction expansions and their validation.
//!
//! The coefficients come from an external Remez run; this module only
//! reads them and checks that they approximate the power they are meant
//! to, on the spectral interval they were generated for.

use gluon_core::ConfigError;
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

/// Points at which an expansion is compared with the exact power.
pub const VALIDATION_SAMPLES: usize = 64;

/// Default bound on the maximum relative error.
pub const DEFAULT_REL_ERROR_BOUND: f64 = 1e-3;

/// `R(x) = norm + Σ_k res_k / (x + pole_k)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialFraction {
    /// Constant term.
    pub norm: f64,
    /// Residues.
    pub res: Vec<f64>,
    /// Shifts.
    pub pole: Vec<f64>,
}

impl PartialFraction {
    /// Evaluate at a scalar `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.norm
            + self
                .res
                .iter()
                .zip(&self.pole)
                .map(|(r, p)| r / (x + p))
                .sum::<f64>()
    }

    /// Number of poles.
    pub fn degree(&self) -> usize {
        self.pole.len()
    }

    /// `(res_k, pole_k)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.res.iter().copied().zip(self.pole.iter().copied())
    }

    /// Largest `|R(x)/x^power − 1|` over [`VALIDATION_SAMPLES`]
    /// log-spaced points in `[lo, hi]`.
    pub fn max_rel_error(&self, power: f64, lo: f64, hi: f64) -> f64 {
        let ratio = hi / lo;
        (0..VALIDATION_SAMPLES)
            .map(|i| {
                let t = i as f64 / (VALIDATION_SAMPLES - 1) as f64;
                let x = lo * ratio.powf(t);
                (self.eval(x) / x.powf(power) - 1.0).abs()
            })
            .fold(0.0, f64::max)
    }

    /// Check this expansion against `x^power` on `[lo, hi]`.
    ///
    /// `path` names the element in error messages; `degree` is the pole
    /// count the configuration declared, if it declared one.
    pub fn validate(
        &self,
        path: &str,
        degree: Option<usize>,
        power: f64,
        lo: f64,
        hi: f64,
        bound: f64,
    ) -> Result<(), ConfigError> {
        if self.res.len() != self.pole.len() {
            return Err(invalid(
                path,
                format!(
                    "{} residues but {} poles",
                    self.res.len(),
                    self.pole.len()
                ),
            ));
        }
        if let Some(d) = degree {
            if d != self.degree() {
                return Err(invalid(
                    path,
                    format!("declared degree {d}, found {} poles", self.degree()),
                ));
            }
        }
        if let Some(p) = self.pole.iter().find(|&&p| p <= -lo) {
            return Err(invalid(
                path,
                format!("pole {p} does not exceed -lowerMin = {}", -lo),
            ));
        }
        let err = self.max_rel_error(power, lo, hi);
        if !(err <= bound) {
            return Err(invalid(
                path,
                format!("relative error {err:.3e} of x^{power} exceeds bound {bound:.3e}"),
            ));
        }
        Ok(())
    }
}

fn invalid(path: &str, reason: String) -> ConfigError {
    tracing::error!(path, %reason, "rejected rational approximation");
    ConfigError::invalid(path, reason)
}

impl ReadXml for PartialFraction {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        Ok(Self {
            norm: block.read("norm")?,
            res: block.read("res")?,
            pole: block.read("pole")?,
        })
    }
}

impl WriteXml for PartialFraction {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("norm", &self.norm);
        xml.write("res", &self.res);
        xml.write("pole", &self.pole);
        xml.pop();
    }
}

/// The `<Remez>` block: the spectral interval, the declared degrees and
/// the three expansions.
#[derive(Clone, Debug, PartialEq)]
pub struct RemezParams {
    /// Lower end of the spectrum of `M†M`.
    pub lower_min: f64,
    /// Upper end of the spectrum of `M†M`.
    pub upper_max: f64,
    /// Pole count of the force expansion.
    pub force_degree: usize,
    /// Pole count of the action expansion.
    pub action_degree: usize,
    /// Working precision of the generator, carried through unchanged.
    pub digit_precision: Option<u32>,
    /// Force expansion.
    pub fpfe: PartialFraction,
    /// Action expansion.
    pub spfe: PartialFraction,
    /// Heatbath expansion.
    pub sipfe: PartialFraction,
    /// Accepted maximum relative error.
    pub rel_error_bound: f64,
}

impl RemezParams {
    /// Check the interval and all three expansions. Force and action
    /// approximate `x^alpha`, the heatbath `x^{−alpha/2}`.
    ///
    /// `path` is the full path of the `<Remez>` element.
    pub fn validate(&self, path: &str, alpha: f64) -> Result<(), ConfigError> {
        let (lo, hi) = (self.lower_min, self.upper_max);
        if !(lo > 0.0) {
            return Err(invalid(
                &format!("{path}/lowerMin"),
                format!("must be positive, found {lo}"),
            ));
        }
        if !(hi > lo) {
            return Err(invalid(
                &format!("{path}/upperMax"),
                format!("must exceed lowerMin = {lo}, found {hi}"),
            ));
        }
        let bound = self.rel_error_bound;
        self.fpfe.validate(
            &format!("{path}/FPFE"),
            Some(self.force_degree),
            alpha,
            lo,
            hi,
            bound,
        )?;
        self.spfe.validate(
            &format!("{path}/SPFE"),
            Some(self.action_degree),
            alpha,
            lo,
            hi,
            bound,
        )?;
        self.sipfe
            .validate(&format!("{path}/SIPFE"), None, -alpha / 2.0, lo, hi, bound)
    }
}

impl ReadXml for RemezParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let rel_error_bound = block.read_or("relErrorBound", DEFAULT_REL_ERROR_BOUND)?;
        if !(rel_error_bound > 0.0) {
            return Err(invalid(
                &block.full_path("relErrorBound"),
                format!("must be positive, found {rel_error_bound}"),
            ));
        }
        Ok(Self {
            lower_min: block.read("lowerMin")?,
            upper_max: block.read("upperMax")?,
            force_degree: block.read("forceDegree")?,
            action_degree: block.read("actionDegree")?,
            digit_precision: block.read_opt("digitPrecision")?,
            fpfe: block.read_block("FPFE")?,
            spfe: block.read_block("SPFE")?,
            sipfe: block.read_block("SIPFE")?,
            rel_error_bound,
        })
    }
}

impl WriteXml for RemezParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("lowerMin", &self.lower_min);
        xml.write("upperMax", &self.upper_max);
        xml.write("forceDegree", &self.force_degree);
        xml.write("actionDegree", &self.action_degree);
        xml.write_opt("digitPrecision", self.digit_precision.as_ref());
        xml.write_block("FPFE", &self.fpfe);
        xml.write_block("SPFE", &self.spfe);
        xml.write_block("SIPFE", &self.sipfe);
        xml.write("relErrorBound", &self.rel_error_bound);
        xml.pop();
    }
}
