//! Linear system solvers for Gluon.
//!
//! Solvers are bound to one operator `M` and solve the (optionally
//! shifted) normal equations `(M†M + σ) ψ = χ` on its subset.
//!
//! # Modules
//!
//! - [`system`]: the [`MdagMSystemSolver`] trait and [`SystemSolverResults`]
//! - [`cg`]: the reference conjugate gradient (`CG_INVERTER`)
//! - [`pack`]: the flat odd-checkerboard buffer layout
//! - [`quda`]: the `QUDA_WILSON_INVERTER` bridge and its backends
//! - [`factory`]: the `invType` registry

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cg;
pub mod error;
pub mod factory;
pub mod pack;
pub mod quda;
pub mod system;

pub use cg::{cg_solve, CgInverter, CgParams};
pub use error::SolverError;
pub use factory::{
    create_mdagm_solver, register_all, BoxedMdagMSolver, SysSolverArgs, MDAGM_SOLVER_FACTORY,
};
pub use pack::{odd_buffer_len, pack_odd, unpack_odd, REALS_PER_SITE};
pub use quda::{
    install_external_backend, remove_external_backend, ExternalInverter, ExternalSolveReport,
    HostReferenceBackend, PackedOperator, QudaPrecision, QudaSolverType, QudaWilsonParams,
    QudaWilsonSolver,
};
pub use system::{MdagMSystemSolver, SystemSolverResults};
