//! `ONE_FLAVOR_EOPREC_CONSTDET_FERM_RAT_MONOMIAL`: one flavour of an
//! even-odd preconditioned 4D action through a rational approximation
//! of `(M†M)^α`, without the even-even determinant.
//!
//! With `α = −expNumPower / (2·expDenPower·nthRoot)` the monomial carries
//! `nthRoot` pseudofermions `φ_i` on the odd sites and
//!
//! ```text
//! S = Σ_i φ_i† R_spfe(M†M) φ_i,      φ_i = R_sipfe(M†M) η_i,
//! ```
//!
//! where `η_i` is drawn from `exp(−η†η)` and `R_spfe ≈ x^α`,
//! `R_sipfe ≈ x^{−α/2}`.

use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::Arc;
use std::time::Instant;

use gluon_core::random::gaussian;
use gluon_core::{
    Complex64, ConfigError, FermionField, GaugeField, LatticeFermion, Parity, PlusMinus, Spinor,
    NC, ND, NS,
};
use gluon_fermacts::{create_ferm_act, EvenOddPrecFermAct4d, FermAct, EO_PREC_4D};
use gluon_layout::Layout;
use gluon_linop::{EvenOddPrecLinearOperator, LinearOperator};
use gluon_solver::{
    create_mdagm_solver, BoxedMdagMSolver, MdagMSystemSolver, SysSolverArgs, MDAGM_SOLVER_FACTORY,
};
use gluon_state::GaugeConfig;
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};
use rand::RngCore;

use crate::error::MonomialError;
use crate::monomial::Monomial;
use crate::rational::{PartialFraction, RemezParams};

/// Gaussian fermion on the odd sites, distributed as `exp(−η†η)`, zero
/// on the even sites.
pub fn gaussian_odd(layout: &Layout, rng: &mut dyn RngCore) -> LatticeFermion {
    let mut eta = LatticeFermion::new(layout.volume());
    for &x in layout.sites(Parity::Odd) {
        let mut s = Spinor::ZERO;
        for spin in 0..NS {
            for c in 0..NC {
                s.s[spin][c] = Complex64::new(gaussian(rng), gaussian(rng)) * FRAC_1_SQRT_2;
            }
        }
        eta[x] = s;
    }
    eta
}

/// Parameters of [`OneFlavorEoPrecConstDetFermRatMonomial`].
#[derive(Clone, Debug)]
pub struct OneFlavorRatMonomialParams {
    /// The `<InvertParam>` block, handed to the solver registry.
    pub inv_param: XmlReader,
    /// The `<FermionAction>` block, handed to the action registry.
    pub fermact: XmlReader,
    /// Rational approximations.
    pub remez: RemezParams,
    /// Numerator of the flavour power.
    pub exp_num_power: i32,
    /// Denominator of the flavour power.
    pub exp_den_power: i32,
    /// Number of pseudofermions the power is split over.
    pub nth_root: usize,
}

impl OneFlavorRatMonomialParams {
    /// `α = −expNumPower / (2·expDenPower·nthRoot)`.
    pub fn alpha(&self) -> f64 {
        -f64::from(self.exp_num_power)
            / (2.0 * f64::from(self.exp_den_power) * self.nth_root as f64)
    }
}

impl ReadXml for OneFlavorRatMonomialParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let exp_den_power: i32 = block.read("expDenPower")?;
        if exp_den_power <= 0 {
            let path = block.full_path("expDenPower");
            tracing::error!(%path, exp_den_power, "flavour power denominator must be positive");
            return Err(ConfigError::invalid(
                path,
                format!("must be positive, found {exp_den_power}"),
            ));
        }
        let nth_root: usize = block.read("nthRoot")?;
        if nth_root == 0 {
            let path = block.full_path("nthRoot");
            tracing::error!(%path, "at least one pseudofermion is needed");
            return Err(ConfigError::invalid(path, "must be positive, found 0"));
        }
        Ok(Self {
            inv_param: block.child("InvertParam")?,
            fermact: block.child("FermionAction")?,
            remez: block.read_block("Remez")?,
            exp_num_power: block.read("expNumPower")?,
            exp_den_power,
            nth_root,
        })
    }
}

impl WriteXml for OneFlavorRatMonomialParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write(
            "Name",
            &OneFlavorEoPrecConstDetFermRatMonomial::NAME.to_string(),
        );
        xml.copy_from(&self.inv_param);
        xml.copy_from(&self.fermact);
        xml.write_block("Remez", &self.remez);
        xml.write("expNumPower", &self.exp_num_power);
        xml.write("expDenPower", &self.exp_den_power);
        xml.write("nthRoot", &self.nth_root);
        xml.pop();
    }
}

/// Operator and solver bound to one gauge configuration.
struct Bound {
    op: Arc<dyn EvenOddPrecLinearOperator<LatticeFermion>>,
    solver: BoxedMdagMSolver,
    layout: Arc<Layout>,
}

impl Bound {
    /// `R(M†M) src` on the odd sites. Returns the solver iterations spent.
    fn apply_rational(
        &self,
        pf: &PartialFraction,
        src: &LatticeFermion,
    ) -> Result<(LatticeFermion, usize), MonomialError> {
        let odd = self.layout.sites(Parity::Odd);
        let mut out = src.zeros_like();
        out.copy_on(src, odd);
        out.scale_on(pf.norm, odd);
        let mut n_count = 0;
        for (res, pole) in pf.terms() {
            let mut x = src.zeros_like();
            n_count += self.solver.solve_shifted(&mut x, src, pole)?.n_count;
            out.axpy_on(Complex64::new(res, 0.0), &x, odd);
        }
        Ok((out, n_count))
    }
}

/// The one-flavour rational monomial on an even-odd preconditioned 4D
/// action, with `ln det A_ee` held constant.
pub struct OneFlavorEoPrecConstDetFermRatMonomial {
    params: OneFlavorRatMonomialParams,
    fermact: Box<dyn FermAct>,
    phi: Option<Vec<LatticeFermion>>,
}

impl OneFlavorEoPrecConstDetFermRatMonomial {
    /// Registry name.
    pub const NAME: &'static str = "ONE_FLAVOR_EOPREC_CONSTDET_FERM_RAT_MONOMIAL";

    /// Build from parameters. `remez_path` names the `<Remez>` element in
    /// validation errors.
    fn build(params: OneFlavorRatMonomialParams, remez_path: &str) -> Result<Self, ConfigError> {
        let fermact = create_ferm_act(&params.fermact)?;
        if fermact.as_eo_prec_4d().is_none() {
            tracing::error!(
                action = fermact.name(),
                capability = fermact.capability(),
                "monomial needs an even-odd preconditioned 4D action"
            );
            return Err(ConfigError::CapabilityMismatch {
                name: fermact.name().to_owned(),
                expected: EO_PREC_4D,
                actual: fermact.capability(),
            });
        }
        params.remez.validate(remez_path, params.alpha())?;

        let inv_type: String = params.inv_param.read("invType")?;
        if !MDAGM_SOLVER_FACTORY.is_registered(&inv_type) {
            tracing::error!(inv_type = %inv_type, "unknown solver for monomial");
            return Err(ConfigError::UnknownType {
                factory: MDAGM_SOLVER_FACTORY.kind(),
                name: inv_type,
            });
        }

        tracing::info!(
            action = fermact.name(),
            inv_type = %inv_type,
            alpha = params.alpha(),
            nth_root = params.nth_root,
            force_degree = params.remez.force_degree,
            action_degree = params.remez.action_degree,
            "one-flavour rational monomial built"
        );
        Ok(Self {
            params,
            fermact,
            phi: None,
        })
    }

    /// Build from parameters.
    pub fn new(params: OneFlavorRatMonomialParams) -> Result<Self, ConfigError> {
        Self::build(params, "Remez")
    }

    /// Read from a `<Monomial>` block.
    pub fn from_xml(xml: &XmlReader) -> Result<Self, ConfigError> {
        let params = OneFlavorRatMonomialParams::read_xml(xml, ".")?;
        Self::build(params, &xml.full_path("Remez"))
    }

    /// Parameters.
    pub fn params(&self) -> &OneFlavorRatMonomialParams {
        &self.params
    }

    /// The fermion action.
    pub fn fermact(&self) -> &dyn FermAct {
        self.fermact.as_ref()
    }

    /// Current pseudofermions, one per root.
    pub fn pseudofermions(&self) -> Option<&[LatticeFermion]> {
        self.phi.as_deref()
    }

    /// Replace the pseudofermions, e.g. when restoring a checkpoint.
    pub fn set_pseudofermions(&mut self, phi: Vec<LatticeFermion>) -> Result<(), ConfigError> {
        if phi.len() != self.params.nth_root {
            return Err(ConfigError::invalid(
                "nthRoot",
                format!(
                    "expected {} pseudofermions, got {}",
                    self.params.nth_root,
                    phi.len()
                ),
            ));
        }
        self.phi = Some(phi);
        Ok(())
    }

    fn eo_act(&self) -> Result<&dyn EvenOddPrecFermAct4d, ConfigError> {
        self.fermact
            .as_eo_prec_4d()
            .ok_or_else(|| ConfigError::CapabilityMismatch {
                name: self.fermact.name().to_owned(),
                expected: EO_PREC_4D,
                actual: self.fermact.capability(),
            })
    }

    fn bind(&self, gauge: &GaugeConfig) -> Result<Bound, MonomialError> {
        let state = self.fermact.create_state(gauge.layout(), gauge.links())?;
        let op: Arc<dyn EvenOddPrecLinearOperator<LatticeFermion>> =
            Arc::from(self.eo_act()?.linop(&state)?);
        let lin: Arc<dyn LinearOperator<LatticeFermion>> = op.clone();
        let solver = create_mdagm_solver(&SysSolverArgs {
            xml: self.params.inv_param.clone(),
            state,
            op: lin,
        })?;
        Ok(Bound {
            op,
            solver,
            layout: Arc::clone(gauge.layout()),
        })
    }

    fn phi(&self) -> Result<&[LatticeFermion], MonomialError> {
        self.pseudofermions().ok_or(MonomialError::NotRefreshed)
    }
}

impl Monomial for OneFlavorEoPrecConstDetFermRatMonomial {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn refresh_internal_fields(
        &mut self,
        gauge: &GaugeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<(), MonomialError> {
        let start = Instant::now();
        let bound = self.bind(gauge)?;
        let mut phi = Vec::with_capacity(self.params.nth_root);
        let mut n_count = 0;
        for _ in 0..self.params.nth_root {
            let eta = gaussian_odd(gauge.layout(), rng);
            let (p, n) = bound.apply_rational(&self.params.remez.sipfe, &eta)?;
            n_count += n;
            phi.push(p);
        }
        self.phi = Some(phi);
        tracing::info!(
            monomial = Self::NAME,
            n_count,
            secs = start.elapsed().as_secs_f64(),
            "pseudofermions refreshed"
        );
        Ok(())
    }

    fn s(&self, gauge: &GaugeConfig) -> Result<f64, MonomialError> {
        let phi = self.phi()?;
        let start = Instant::now();
        let bound = self.bind(gauge)?;
        let odd = gauge.layout().sites(Parity::Odd);
        let mut action = 0.0;
        let mut n_count = 0;
        for p in phi {
            let (x, n) = bound.apply_rational(&self.params.remez.spfe, p)?;
            n_count += n;
            action += p.inner_on(&x, odd).re;
        }
        tracing::info!(
            monomial = Self::NAME,
            action,
            n_count,
            secs = start.elapsed().as_secs_f64(),
            "action evaluated"
        );
        Ok(action)
    }

    fn dsdq(&self, gauge: &GaugeConfig) -> Result<GaugeField, MonomialError> {
        let phi = self.phi()?;
        let start = Instant::now();
        let bound = self.bind(gauge)?;
        let mut ds = GaugeField::zeros(gauge.layout().volume());
        let mut n_count = 0;
        for p in phi {
            for (res, pole) in self.params.remez.fpfe.terms() {
                let mut x = p.zeros_like();
                n_count += bound.solver.solve_shifted(&mut x, p, pole)?.n_count;
                let mut y = p.zeros_like();
                bound.op.apply(&mut y, &x, PlusMinus::Plus);
                ds.add_scaled(-res, &bound.op.deriv(&y, &x, PlusMinus::Plus));
                ds.add_scaled(-res, &bound.op.deriv(&x, &y, PlusMinus::Minus));
            }
        }

        let u = gauge.links();
        for mu in 0..ND {
            for (x, f) in ds.dir_mut(mu).iter_mut().enumerate() {
                *f = (*u.link(mu, x) * *f).traceless_antihermitian();
            }
        }
        tracing::info!(
            monomial = Self::NAME,
            n_count,
            force_norm = ds.norm_sq().sqrt(),
            secs = start.elapsed().as_secs_f64(),
            "force evaluated"
        );
        Ok(ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_test_utils::{clover_action, one_flavor_monomial, small_layout, Pfe};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn xml() -> String {
        let sqrt = Pfe::power(0.5, 0.01, 50.0, 1e-8);
        one_flavor_monomial(
            &clover_action(0.1, 1.0),
            "CG_INVERTER",
            &Pfe::inverse(),
            &Pfe::inverse(),
            &sqrt,
            0.01,
            50.0,
            2,
            1,
            1,
        )
    }

    #[test]
    fn gaussian_odd_has_half_variance_per_component() {
        let layout = small_layout();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut total = 0.0;
        let draws = 200;
        for _ in 0..draws {
            let eta = gaussian_odd(&layout, &mut rng);
            assert_eq!(eta.norm_sq_on(layout.sites(Parity::Even)), 0.0);
            total += eta.norm_sq_on(layout.sites(Parity::Odd));
        }
        // <η†η> = one unit per complex component.
        let per = (layout.sites(Parity::Odd).len() * NS * NC) as f64;
        let mean = total / (draws as f64 * per);
        assert!((mean - 1.0).abs() < 0.02, "{mean}");
    }

    #[test]
    fn alpha_follows_the_flavour_power() {
        let doc = XmlReader::parse(&xml()).unwrap();
        let mut p = OneFlavorRatMonomialParams::read_xml(&doc, "Monomial").unwrap();
        assert_eq!(p.alpha(), -1.0);
        p.exp_num_power = 1;
        p.nth_root = 2;
        assert_eq!(p.alpha(), -0.25);
    }

    #[test]
    fn params_round_trip() {
        let doc = XmlReader::parse(&xml()).unwrap();
        let p = OneFlavorRatMonomialParams::read_xml(&doc, "Monomial").unwrap();
        let mut w = XmlWriter::new();
        p.write_xml(&mut w, "Monomial");
        let back = XmlReader::parse(&w.finish()).unwrap();
        let q = OneFlavorRatMonomialParams::read_xml(&back, "Monomial").unwrap();
        assert_eq!(q.remez, p.remez);
        assert_eq!(q.nth_root, 1);
        assert_eq!(q.fermact.read::<String>("FermAct").unwrap(), "CLOVER");
        assert_eq!(q.inv_param.read::<String>("invType").unwrap(), "CG_INVERTER");
    }

    #[test]
    fn zero_roots_are_rejected() {
        let text = xml().replace("<nthRoot>1</nthRoot>", "<nthRoot>0</nthRoot>");
        let doc = XmlReader::parse(&text).unwrap();
        assert!(matches!(
            OneFlavorRatMonomialParams::read_xml(&doc, "Monomial"),
            Err(ConfigError::InvalidValue { ref path, .. }) if path == "/Monomial/nthRoot"
        ));
    }

    #[test]
    fn pseudofermion_count_is_checked() {
        crate::register_all();
        let doc = XmlReader::parse(&xml()).unwrap();
        let mut m =
            OneFlavorEoPrecConstDetFermRatMonomial::from_xml(&doc.child("Monomial").unwrap())
                .unwrap();
        let layout = small_layout();
        assert!(m.set_pseudofermions(vec![]).is_err());
        m.set_pseudofermions(vec![LatticeFermion::new(layout.volume())])
            .unwrap();
        assert_eq!(m.pseudofermions().map(<[_]>::len), Some(1));
    }
}
