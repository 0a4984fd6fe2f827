//! Integration test: the `QUDA_WILSON_INVERTER` bridge with the host
//! reference backend agrees with the reference CG on the same system.

use std::sync::Arc;

use gluon_core::{Complex64, FermionField, LatticeFermion, Parity, PlusMinus};
use gluon_linop::{CloverCoeffs, EvenOddPrecCloverLinOp, LinearOperator, ShiftedMdagMLinOp};
use gluon_solver::{
    create_mdagm_solver, odd_buffer_len, MdagMSystemSolver, PackedOperator, SysSolverArgs,
};
use gluon_test_utils::{random_fermion, random_fermion_on, random_gauge, simple_state, small_layout};
use gluon_xml::XmlReader;

// ── Setup ────────────────────────────────────────────────────────────

fn setup(inv: &str) -> SysSolverArgs {
    gluon_solver::register_all();
    let layout = small_layout();
    let u = random_gauge(&layout, 11);
    let state = simple_state(&layout, &u);
    let op: Arc<dyn LinearOperator<LatticeFermion>> = Arc::new(
        EvenOddPrecCloverLinOp::new(&state, CloverCoeffs::isotropic(0.15, 1.0, 1.0)).unwrap(),
    );
    let doc = XmlReader::parse(inv).unwrap();
    SysSolverArgs {
        xml: doc.child("InvertParam").unwrap(),
        state,
        op,
    }
}

const CG: &str = "<InvertParam><invType>CG_INVERTER</invType>\
                  <RsdCG>1e-11</RsdCG><MaxCG>1000</MaxCG></InvertParam>";

const BRIDGE: &str = "<InvertParam><invType>QUDA_WILSON_INVERTER</invType>\
                      <MaxIter>1000</MaxIter><RsdTarget>1e-11</RsdTarget>\
                      <SolverType>CG</SolverType><CudaPrecision>DOUBLE</CudaPrecision>\
                      <Verbose>true</Verbose></InvertParam>";

// ── Agreement ────────────────────────────────────────────────────────

#[test]
fn bridge_matches_reference_cg() {
    let cg_args = setup(CG);
    let bridge_args = setup(BRIDGE);
    let layout = cg_args.op.layout().clone();
    let odd = layout.sites(Parity::Odd);
    let chi = random_fermion_on(&layout, Parity::Odd, 3);

    for shift in [0.0, 0.7] {
        let mut a = cg_args.op.zero_field();
        let mut b = bridge_args.op.zero_field();
        let ra = create_mdagm_solver(&cg_args)
            .unwrap()
            .solve_shifted(&mut a, &chi, shift)
            .unwrap();
        let rb = create_mdagm_solver(&bridge_args)
            .unwrap()
            .solve_shifted(&mut b, &chi, shift)
            .unwrap();
        assert!(ra.converged && rb.converged);
        assert!(rb.n_count > 0);
        assert!(rb.resid < 1e-10, "{rb:?}");

        b.axpy_on(-Complex64::ONE, &a, odd);
        assert!(b.norm_sq_on(odd).sqrt() < 1e-8 * a.norm_sq_on(odd).sqrt());
    }
}

#[test]
fn bridge_leaves_even_sites_untouched() {
    let args = setup(BRIDGE);
    let layout = args.op.layout().clone();
    let chi = random_fermion_on(&layout, Parity::Odd, 4);
    let mut psi = random_fermion(&layout, 5);
    let before = psi.clone();
    create_mdagm_solver(&args).unwrap().solve(&mut psi, &chi).unwrap();
    for &x in layout.sites(Parity::Even) {
        assert_eq!(psi[x], before[x]);
    }
}

#[test]
fn iteration_cap_is_reported_not_raised() {
    let capped = BRIDGE.replace("<MaxIter>1000</MaxIter>", "<MaxIter>3</MaxIter>");
    let args = setup(&capped);
    let chi = random_fermion_on(args.op.layout(), Parity::Odd, 6);
    let mut psi = args.op.zero_field();
    let res = create_mdagm_solver(&args).unwrap().solve(&mut psi, &chi).unwrap();
    assert!(!res.converged);
    assert_eq!(res.n_count, 3);
}

// ── Packed operator ──────────────────────────────────────────────────

#[test]
fn packed_operator_matches_field_operator() {
    let args = setup(CG);
    let layout = args.op.layout().clone();
    let psi = random_fermion_on(&layout, Parity::Odd, 8);
    let view = PackedOperator::new(args.op.as_ref(), args.state.links(), 0.3);
    assert_eq!(view.buffer_len(), odd_buffer_len(&layout));

    let inp = gluon_solver::pack_odd(&layout, &psi);
    let mut out = vec![0.0; view.buffer_len()];
    view.apply(&mut out, &inp).unwrap();

    let mut expect = args.op.zero_field();
    ShiftedMdagMLinOp::new(args.op.as_ref(), 0.3).apply(&mut expect, &psi, PlusMinus::Plus);
    let expect = gluon_solver::pack_odd(&layout, &expect);
    for (a, b) in out.iter().zip(&expect) {
        assert!((a - b).abs() < 1e-12);
    }
    assert!(view.apply(&mut out[..10], &inp).is_err());
}
