//! Integration test: operators handed out by registry-built actions.

use gluon_core::{Complex64, FermionField, LatticeFermion, Parity, PlusMinus};
use gluon_fermacts::{create_ferm_act, FermAct, EO_PREC_4D};
use gluon_test_utils::{clover_action, random_array, random_fermion_on, random_gauge, small_layout};
use gluon_xml::XmlReader;

fn action(text: &str) -> Box<dyn FermAct> {
    gluon_fermacts::register_all();
    let xml = XmlReader::parse(text).unwrap();
    create_ferm_act(&xml.child("FermionAction").unwrap()).unwrap()
}

// ── Clover family ────────────────────────────────────────────────────

#[test]
fn unsmeared_slrc_is_clover() {
    let clover = action(&clover_action(0.1, 1.2));
    let slrc = action(
        "<FermionAction><FermAct>SLRC</FermAct><Mass>0.1</Mass><clovCoeff>1.2</clovCoeff>\
         <FermionBC><FermBC>SIMPLE_FERMBC</FermBC><boundary>1 1 1 -1</boundary></FermionBC>\
         </FermionAction>",
    );
    assert_eq!(slrc.capability(), EO_PREC_4D);

    let layout = small_layout();
    let u = random_gauge(&layout, 21);
    let psi = random_fermion_on(&layout, Parity::Odd, 22);
    let apply = |act: &dyn FermAct| -> LatticeFermion {
        let state = act.create_state(&layout, &u).unwrap();
        let op = act.as_eo_prec_4d().unwrap().linop(&state).unwrap();
        let mut chi = op.zero_field();
        op.apply(&mut chi, &psi, PlusMinus::Plus);
        chi
    };
    let mut a = apply(clover.as_ref());
    let b = apply(slrc.as_ref());
    let odd = layout.sites(Parity::Odd);
    a.axpy_on(-Complex64::ONE, &b, odd);
    assert!(a.norm_sq_on(odd).sqrt() < 1e-12);
}

#[test]
fn each_linop_call_builds_a_fresh_operator() {
    let act = action(&clover_action(0.2, 1.0));
    let layout = small_layout();
    let u = random_gauge(&layout, 23);
    let state = act.create_state(&layout, &u).unwrap();
    let eo = act.as_eo_prec_4d().unwrap();
    let a = eo.linop(&state).unwrap();
    let b = eo.linop(&state).unwrap();
    assert_eq!(a.log_det_even_even(), b.log_det_even_even());
}

// ── Domain wall ──────────────────────────────────────────────────────

#[test]
fn kno_array_schur_apply_stays_on_odd_sites() {
    let act = action(
        "<FermionAction><FermAct>KNO</FermAct><OverMass>1.5</OverMass><Mass>0.1</Mass>\
         <coefs>1 1 1</coefs><N5>3</N5></FermionAction>",
    );
    assert_eq!(act.flavor_count(), 3);
    let layout = small_layout();
    let state = act.create_state(&layout, &random_gauge(&layout, 24)).unwrap();
    let op = act.as_eo_prec_array().unwrap().linop(&state).unwrap();

    let psi = random_array(&layout, 3, 25);
    let mut chi = op.zero_field();
    op.apply(&mut chi, &psi, PlusMinus::Plus);
    let even = layout.sites(Parity::Even);
    assert_eq!(chi.norm_sq_on(even), 0.0);
    assert!(chi.norm_sq_on(layout.sites(Parity::Odd)) > 0.0);
}
