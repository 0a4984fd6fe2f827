//! Integration test: the one-flavour rational monomial built from
//! configuration, checked against direct solves and finite differences.

use gluon_core::{ColorMatrix, ConfigError, FermionField, GaugeField, LatticeFermion, Parity, ND};
use gluon_fermacts::{EO_PREC_4D, UNPREC_4D};
use gluon_linop::{LinearOperator, MdagMLinOp};
use gluon_monomial::{
    create_monomial, gaussian_odd, Monomial, MonomialError, OneFlavorEoPrecConstDetFermRatMonomial,
};
use gluon_solver::{cg_solve, CgParams};
use gluon_state::GaugeConfig;
use gluon_test_utils::{
    clover_action, one_flavor_monomial, overlap_action, random_gauge, slrc_action, small_layout,
    Pfe,
};
use gluon_xml::XmlReader;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ── Setup ────────────────────────────────────────────────────────────

const LO: f64 = 1e-4;
const HI: f64 = 1e3;

/// `(M†M)^{-1}` with an exact single-pole expansion.
fn exact_xml(action: &str, inv_type: &str) -> String {
    let sqrt = Pfe::power(0.5, LO, HI, 1e-6);
    one_flavor_monomial(
        action,
        inv_type,
        &Pfe::inverse(),
        &Pfe::inverse(),
        &sqrt,
        LO,
        HI,
        2,
        1,
        1,
    )
}

/// `(M†M)^{-1/2}` split over two pseudofermions: `α = −1/4`.
fn fourth_root_xml(action: &str) -> String {
    let inv = Pfe::inverse_power(0.25, LO, HI, 1e-7);
    let heat = Pfe::power(0.125, LO, HI, 1e-7);
    one_flavor_monomial(action, "CG_INVERTER", &inv, &inv, &heat, LO, HI, 1, 1, 2)
}

fn build(xml: &str) -> Result<OneFlavorEoPrecConstDetFermRatMonomial, ConfigError> {
    gluon_monomial::register_all();
    let doc = XmlReader::parse(xml).unwrap();
    OneFlavorEoPrecConstDetFermRatMonomial::from_xml(&doc.child("Monomial").unwrap())
}

fn gauge(seed: u64) -> GaugeConfig {
    let layout = small_layout();
    let links = random_gauge(&layout, seed);
    GaugeConfig::new(layout, links).unwrap()
}

/// `U' = e^{tH} U` on every link.
fn evolve(g: &GaugeConfig, h: &GaugeField, t: f64) -> GaugeConfig {
    let mut out = g.clone();
    for mu in 0..ND {
        for (x, u) in out.links_mut().dir_mut(mu).iter_mut().enumerate() {
            *u = h.link(mu, x).scale(t).exp() * *u;
        }
    }
    out
}

fn random_algebra_field(volume: usize, seed: u64) -> GaugeField {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut h = GaugeField::zeros(volume);
    for mu in 0..ND {
        for m in h.dir_mut(mu) {
            *m = ColorMatrix::random_algebra(&mut rng, 1.0);
        }
    }
    h
}

fn assert_force_matches_finite_difference(m: &OneFlavorEoPrecConstDetFermRatMonomial, g: &GaugeConfig) {
    let h = random_algebra_field(g.layout().volume(), 77);
    let f = m.dsdq(g).unwrap();
    let an = f.re_trace_pairing(&h);
    let eps = 1e-4;
    let fd = (m.s(&evolve(g, &h, eps)).unwrap() - m.s(&evolve(g, &h, -eps)).unwrap()) / (2.0 * eps);
    assert!(
        (fd - an).abs() < 1e-5 * an.abs().max(1.0),
        "finite difference {fd} vs force {an}"
    );
}

// ── Construction ─────────────────────────────────────────────────────

#[test]
fn unknown_action_is_named() {
    let action = clover_action(0.1, 1.0).replace("CLOVER", "NO_SUCH_ACTION");
    let err = build(&exact_xml(&action, "CG_INVERTER")).err();
    assert_eq!(
        err,
        Some(ConfigError::UnknownType {
            factory: "FermionAction",
            name: "NO_SUCH_ACTION".into(),
        })
    );
}

#[test]
fn overlap_action_is_a_capability_mismatch() {
    let err = build(&exact_xml(&overlap_action(), "CG_INVERTER")).err();
    assert_eq!(
        err,
        Some(ConfigError::CapabilityMismatch {
            name: "OVERLAP_POLE_4D".into(),
            expected: EO_PREC_4D,
            actual: UNPREC_4D,
        })
    );
}

#[test]
fn unknown_solver_is_rejected_up_front() {
    let err = build(&exact_xml(&clover_action(0.1, 1.0), "BICGSTAB_INVERTER")).err();
    assert!(matches!(
        err,
        Some(ConfigError::UnknownType { factory: "MdagMSystemSolver", ref name }) if name == "BICGSTAB_INVERTER"
    ));
}

#[test]
fn inaccurate_expansion_is_rejected_with_its_path() {
    // An x^{-1/2} expansion where x^{-1} is needed.
    let inv_sqrt = Pfe::inverse_power(0.5, LO, HI, 1e-8);
    let sqrt = Pfe::power(0.5, LO, HI, 1e-8);
    let xml = one_flavor_monomial(
        &clover_action(0.1, 1.0),
        "CG_INVERTER",
        &inv_sqrt,
        &Pfe::inverse(),
        &sqrt,
        LO,
        HI,
        2,
        1,
        1,
    );
    assert!(matches!(
        build(&xml).err(),
        Some(ConfigError::InvalidValue { ref path, .. }) if path == "/Monomial/Remez/FPFE"
    ));
}

#[test]
fn registry_builds_the_monomial() {
    gluon_monomial::register_all();
    let doc = XmlReader::parse(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    let m = create_monomial(&doc.child("Monomial").unwrap()).unwrap();
    assert_eq!(m.name(), "ONE_FLAVOR_EOPREC_CONSTDET_FERM_RAT_MONOMIAL");
}

// ── Evaluation ───────────────────────────────────────────────────────

#[test]
fn evaluation_before_refresh_fails() {
    let m = build(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    let g = gauge(1);
    assert_eq!(m.s(&g).err(), Some(MonomialError::NotRefreshed));
    assert_eq!(m.dsdq(&g).err(), Some(MonomialError::NotRefreshed));
}

#[test]
fn fresh_action_equals_the_gaussian_norm() {
    let g = gauge(2);
    let mut m = build(&fourth_root_xml(&clover_action(0.1, 1.0))).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(5))
        .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let odd = g.layout().sites(Parity::Odd);
    let expected: f64 = (0..2)
        .map(|_| gaussian_odd(g.layout(), &mut rng).norm_sq_on(odd))
        .sum();
    let s = m.s(&g).unwrap();
    assert!((s - expected).abs() < 1e-5 * expected, "{s} vs {expected}");
}

#[test]
fn action_matches_direct_cg() {
    let g = gauge(3);
    let mut m = build(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(9))
        .unwrap();
    let s = m.s(&g).unwrap();

    let state = m.fermact().create_state(g.layout(), g.links()).unwrap();
    let op = m.fermact().as_eo_prec_4d().unwrap().linop(&state).unwrap();
    let m_op: &dyn LinearOperator<LatticeFermion> = op.as_ref();
    let mdagm = MdagMLinOp::new(m_op);
    let phi = &m.pseudofermions().unwrap()[0];
    let mut x = phi.zeros_like();
    let params = CgParams {
        rsd_cg: 1e-12,
        max_cg: 2000,
    };
    assert!(cg_solve(&mdagm, &mut x, phi, &params).converged);
    let direct = phi.inner_on(&x, g.layout().sites(Parity::Odd)).re;
    assert!((s - direct).abs() < 1e-8 * direct.abs(), "{s} vs {direct}");
}

#[test]
fn bridge_solver_gives_the_same_action() {
    let g = gauge(4);
    let bridge = exact_xml(&clover_action(0.1, 1.0), "QUDA_WILSON_INVERTER").replace(
        "<RsdCG>1e-12</RsdCG><MaxCG>2000</MaxCG>",
        "<MaxIter>2000</MaxIter><RsdTarget>1e-12</RsdTarget>\
         <SolverType>CG</SolverType><CudaPrecision>DOUBLE</CudaPrecision>",
    );
    let mut a = build(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    let mut b = build(&bridge).unwrap();
    a.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(13))
        .unwrap();
    // The heatbath solves amplify residuals, so compare on identical fields.
    b.set_pseudofermions(a.pseudofermions().unwrap().to_vec())
        .unwrap();
    let (sa, sb) = (a.s(&g).unwrap(), b.s(&g).unwrap());
    assert!((sa - sb).abs() < 1e-8 * sa.abs(), "{sa} vs {sb}");
}

#[test]
fn force_is_in_the_lie_algebra() {
    let g = gauge(5);
    let mut m = build(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(6))
        .unwrap();
    let f = m.dsdq(&g).unwrap();
    assert!(f.norm_sq() > 0.0);
    for mu in 0..ND {
        for x in f.dir(mu) {
            assert!((*x + x.adjoint()).norm_sq() < 1e-24);
            assert!(x.trace().norm() < 1e-12);
        }
    }
}

// ── Finite differences ───────────────────────────────────────────────

#[test]
fn clover_force_matches_finite_difference() {
    let g = gauge(21);
    let mut m = build(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(22))
        .unwrap();
    assert_force_matches_finite_difference(&m, &g);
}

#[test]
fn rational_force_matches_finite_difference() {
    let g = gauge(31);
    let mut m = build(&fourth_root_xml(&clover_action(0.2, 1.2))).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(32))
        .unwrap();
    assert_force_matches_finite_difference(&m, &g);
}

#[test]
fn smeared_force_matches_finite_difference() {
    let g = gauge(41);
    let mut m = build(&exact_xml(&slrc_action(0.1, 1.0, 1, 0.1), "CG_INVERTER")).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(42))
        .unwrap();
    assert_force_matches_finite_difference(&m, &g);
}

#[test]
fn pseudofermions_survive_a_gauge_update() {
    let g = gauge(51);
    let mut m = build(&exact_xml(&clover_action(0.1, 1.0), "CG_INVERTER")).unwrap();
    m.refresh_internal_fields(&g, &mut ChaCha8Rng::seed_from_u64(52))
        .unwrap();
    let before = m.pseudofermions().unwrap().to_vec();
    let h = random_algebra_field(g.layout().volume(), 53);
    let moved = evolve(&g, &h, 0.05);
    let s0 = m.s(&g).unwrap();
    let s1 = m.s(&moved).unwrap();
    assert_ne!(s0, s1);
    assert_eq!(m.pseudofermions().unwrap(), &before[..]);
}
