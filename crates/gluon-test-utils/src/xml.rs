//! Configuration snippets.

use crate::rational::Pfe;

/// An isotropic clover action block.
pub fn clover_action(mass: f64, clov_coeff: f64) -> String {
    format!(
        "<FermionAction><FermAct>CLOVER</FermAct><Mass>{mass:?}</Mass>\
         <clovCoeff>{clov_coeff:?}</clovCoeff>\
         <FermionBC><FermBC>SIMPLE_FERMBC</FermBC><boundary>1 1 1 -1</boundary></FermionBC>\
         </FermionAction>"
    )
}

/// A stout-smeared clover action block.
pub fn slrc_action(mass: f64, clov_coeff: f64, n_smear: usize, rho: f64) -> String {
    format!(
        "<FermionAction><FermAct>SLRC</FermAct><Mass>{mass:?}</Mass>\
         <clovCoeff>{clov_coeff:?}</clovCoeff>\
         <StoutParam><n_smear>{n_smear}</n_smear><rho>{rho:?}</rho></StoutParam>\
         </FermionAction>"
    )
}

/// A two-pole overlap action block.
pub fn overlap_action() -> String {
    "<FermionAction><FermAct>OVERLAP_POLE_4D</FermAct><Mass>0.05</Mass><OverMass>1.4</OverMass>\
     <constP>0.1</constP><resP>0.5 0.3</resP><rootQ>0.2 2.0</rootQ>\
     <MaxCG>500</MaxCG><RsdCG>1e-10</RsdCG></FermionAction>"
        .to_string()
}

/// A complete one-flavour rational monomial around `action`.
#[allow(clippy::too_many_arguments)]
pub fn one_flavor_monomial(
    action: &str,
    inv_type: &str,
    fpfe: &Pfe,
    spfe: &Pfe,
    sipfe: &Pfe,
    lower: f64,
    upper: f64,
    exp_num: i32,
    exp_den: i32,
    nth_root: i32,
) -> String {
    format!(
        "<Monomial><Name>ONE_FLAVOR_EOPREC_CONSTDET_FERM_RAT_MONOMIAL</Name>\
         <InvertParam><invType>{inv_type}</invType><RsdCG>1e-12</RsdCG><MaxCG>2000</MaxCG></InvertParam>\
         {action}\
         <Remez><lowerMin>{lower:?}</lowerMin><upperMax>{upper:?}</upperMax>\
         <forceDegree>{}</forceDegree><actionDegree>{}</actionDegree>\
         {}{}{}</Remez>\
         <expNumPower>{exp_num}</expNumPower><expDenPower>{exp_den}</expDenPower><nthRoot>{nth_root}</nthRoot>\
         </Monomial>",
        fpfe.degree(),
        spfe.degree(),
        fpfe.to_xml("FPFE"),
        spfe.to_xml("SPFE"),
        sipfe.to_xml("SIPFE"),
    )
}
