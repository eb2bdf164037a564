pub mod glpk_backend;

#[cfg(feature = "highs-solver")]
pub mod highs_backend;

#[cfg(feature = "gurobi-solver")]
pub mod gurobi_backend;

pub use glpk_backend::GlpkBackend;

#[cfg(feature = "highs-solver")]
pub use highs_backend::HighsBackend;

#[cfg(feature = "gurobi-solver")]
pub use gurobi_backend::GurobiBackend;
