//! Fermion action parameter blocks.
//!
//! Every block reads strictly from the action's XML element, defaults
//! only the tags documented as optional, and writes back everything it
//! read so that a read/write/read cycle is the identity.

use gluon_core::{ConfigError, ND};
use gluon_linop::CloverCoeffs;
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

/// Anisotropic lattice parameters (`<AnisoParam>`).
#[derive(Clone, Debug, PartialEq)]
pub struct AnisoParam {
    /// Whether anisotropy is switched on at all.
    pub aniso_p: bool,
    /// Temporal direction.
    pub t_dir: usize,
    /// Bare anisotropy `ξ0`.
    pub xi_0: f64,
    /// Bare speed of light `ν`.
    pub nu: f64,
}

impl Default for AnisoParam {
    fn default() -> Self {
        Self {
            aniso_p: false,
            t_dir: ND - 1,
            xi_0: 1.0,
            nu: 1.0,
        }
    }
}

impl ReadXml for AnisoParam {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let t_dir: usize = block.read("t_dir")?;
        if t_dir >= ND {
            return Err(ConfigError::invalid(
                block.full_path("t_dir"),
                format!("direction must be below {ND}, found {t_dir}"),
            ));
        }
        let xi_0: f64 = block.read("xi_0")?;
        if xi_0 <= 0.0 {
            return Err(ConfigError::invalid(
                block.full_path("xi_0"),
                format!("anisotropy must be positive, found {xi_0}"),
            ));
        }
        Ok(Self {
            aniso_p: block.read("anisoP")?,
            t_dir,
            xi_0,
            nu: block.read("nu")?,
        })
    }
}

impl WriteXml for AnisoParam {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("anisoP", &self.aniso_p);
        xml.write("t_dir", &self.t_dir);
        xml.write("xi_0", &self.xi_0);
        xml.write("nu", &self.nu);
        xml.pop();
    }
}

/// Clover (and stout-smeared clover) action parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CloverFermActParams {
    /// Bare quark mass.
    pub mass: f64,
    /// Clover coefficient.
    pub clov_coeff: f64,
    /// Spatial clover coefficient; defaults to `clov_coeff`.
    pub clov_coeff_r: f64,
    /// Temporal clover coefficient; defaults to `clov_coeff`.
    pub clov_coeff_t: f64,
    /// Tadpole factor.
    pub u0: f64,
    /// Anisotropy, if configured.
    pub aniso: Option<AnisoParam>,
}

impl CloverFermActParams {
    /// Isotropic parameters with unit tadpole factor.
    pub fn new(mass: f64, clov_coeff: f64) -> Self {
        Self {
            mass,
            clov_coeff,
            clov_coeff_r: clov_coeff,
            clov_coeff_t: clov_coeff,
            u0: 1.0,
            aniso: None,
        }
    }

    /// Operator coefficients for these parameters.
    pub fn coeffs(&self) -> CloverCoeffs {
        match &self.aniso {
            Some(a) if a.aniso_p => CloverCoeffs::anisotropic(
                self.mass,
                self.clov_coeff_r,
                self.clov_coeff_t,
                self.u0,
                a.t_dir,
                a.xi_0,
                a.nu,
            ),
            _ => CloverCoeffs::isotropic(self.mass, self.clov_coeff, self.u0),
        }
    }
}

impl ReadXml for CloverFermActParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let clov_coeff: f64 = block.read("clovCoeff")?;
        let u0: f64 = block.read_or("u0", 1.0)?;
        if u0 <= 0.0 {
            return Err(ConfigError::invalid(
                block.full_path("u0"),
                format!("tadpole factor must be positive, found {u0}"),
            ));
        }
        let aniso = if block.exists("AnisoParam") {
            Some(block.read_block("AnisoParam")?)
        } else {
            None
        };
        Ok(Self {
            mass: block.read("Mass")?,
            clov_coeff,
            clov_coeff_r: block.read_or("clovCoeffR", clov_coeff)?,
            clov_coeff_t: block.read_or("clovCoeffT", clov_coeff)?,
            u0,
            aniso,
        })
    }
}

impl WriteXml for CloverFermActParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("Mass", &self.mass);
        xml.write("clovCoeff", &self.clov_coeff);
        xml.write("clovCoeffR", &self.clov_coeff_r);
        xml.write("clovCoeffT", &self.clov_coeff_t);
        xml.write("u0", &self.u0);
        if let Some(aniso) = &self.aniso {
            xml.write_block("AnisoParam", aniso);
        }
        xml.pop();
    }
}

/// HISQ staggered action parameters. Only read and written; no HISQ
/// operator is built from them.
#[derive(Clone, Debug, PartialEq)]
pub struct HisqFermActParams {
    /// Bare quark mass.
    pub mass: f64,
    /// Tadpole factor.
    pub u0: f64,
}

impl Default for HisqFermActParams {
    fn default() -> Self {
        Self { mass: 0.0, u0: 1.0 }
    }
}

impl ReadXml for HisqFermActParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        Ok(Self {
            mass: block.read("Mass")?,
            u0: block.read("u0")?,
        })
    }
}

impl WriteXml for HisqFermActParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("Mass", &self.mass);
        xml.write("u0", &self.u0);
        xml.pop();
    }
}

/// KNO domain-wall array parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct KnoFermActParams {
    /// Domain-wall height `M5`.
    pub over_mass: f64,
    /// Quark mass.
    pub mass: f64,
    /// Per-slice coefficients `ω_s`.
    pub coefs: Vec<f64>,
    /// Fifth-dimension extent.
    pub n5: usize,
}

impl ReadXml for KnoFermActParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let n5: usize = block.read("N5")?;
        if n5 == 0 {
            tracing::error!(path = %block.full_path("N5"), "N5 must be positive");
            return Err(ConfigError::invalid(block.full_path("N5"), "N5 must be positive"));
        }
        let coefs: Vec<f64> = block.read("coefs")?;
        if coefs.len() != n5 {
            let reason = format!("expected N5 = {n5} coefficients, found {}", coefs.len());
            tracing::error!(path = %block.full_path("coefs"), %reason, "bad KNO coefficients");
            return Err(ConfigError::invalid(block.full_path("coefs"), reason));
        }
        Ok(Self {
            over_mass: block.read("OverMass")?,
            mass: block.read("Mass")?,
            coefs,
            n5,
        })
    }
}

impl WriteXml for KnoFermActParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("OverMass", &self.over_mass);
        xml.write("Mass", &self.mass);
        xml.write("coefs", &self.coefs);
        xml.write("N5", &self.n5);
        xml.pop();
    }
}

/// Overlap pole-approximation parameters.
///
/// `ε(H) ≈ H (constP + Σ_k resP_k / (H² + rootQ_k))`.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlapPoleParams {
    /// Quark mass `μ`.
    pub mass: f64,
    /// Wilson kernel height: the kernel has bare mass `−OverMass`.
    pub over_mass: f64,
    /// Constant term.
    pub const_p: f64,
    /// Residues.
    pub res_p: Vec<f64>,
    /// Pole positions.
    pub root_q: Vec<f64>,
    /// Inner CG iteration cap.
    pub max_cg: usize,
    /// Inner CG residual target.
    pub rsd_cg: f64,
}

impl OverlapPoleParams {
    /// Number of poles.
    pub fn num_poles(&self) -> usize {
        self.res_p.len()
    }
}

impl ReadXml for OverlapPoleParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let res_p: Vec<f64> = block.read("resP")?;
        let root_q: Vec<f64> = block.read("rootQ")?;
        if res_p.len() != root_q.len() {
            let reason = format!(
                "{} residues but {} poles",
                res_p.len(),
                root_q.len()
            );
            tracing::error!(path = %block.full_path("rootQ"), %reason, "bad pole approximation");
            return Err(ConfigError::invalid(block.full_path("rootQ"), reason));
        }
        if let Some(q) = root_q.iter().find(|&&q| q <= 0.0) {
            return Err(ConfigError::invalid(
                block.full_path("rootQ"),
                format!("poles must be positive, found {q}"),
            ));
        }
        let rsd_cg: f64 = block.read("RsdCG")?;
        if rsd_cg <= 0.0 {
            return Err(ConfigError::invalid(
                block.full_path("RsdCG"),
                format!("residual target must be positive, found {rsd_cg}"),
            ));
        }
        Ok(Self {
            mass: block.read("Mass")?,
            over_mass: block.read("OverMass")?,
            const_p: block.read("constP")?,
            res_p,
            root_q,
            max_cg: block.read("MaxCG")?,
            rsd_cg,
        })
    }
}

impl WriteXml for OverlapPoleParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("Mass", &self.mass);
        xml.write("OverMass", &self.over_mass);
        xml.write("constP", &self.const_p);
        xml.write("resP", &self.res_p);
        xml.write("rootQ", &self.root_q);
        xml.write("MaxCG", &self.max_cg);
        xml.write("RsdCG", &self.rsd_cg);
        xml.pop();
    }
}
