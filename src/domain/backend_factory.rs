use crate::domain::backend::OptimizationBackend;
use crate::domain::backends::GlpkBackend;
use crate::error::PCenterError;

#[cfg(feature = "highs-solver")]
use crate::domain::backends::HighsBackend;

#[cfg(feature = "gurobi-solver")]
use crate::domain::backends::GurobiBackend;

/// Available optimization backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Glpk,
    #[cfg(feature = "highs-solver")]
    Highs,
    #[cfg(feature = "gurobi-solver")]
    Gurobi,
}

impl BackendType {
    /// Parse backend type from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "glpk" => Some(BackendType::Glpk),
            #[cfg(feature = "highs-solver")]
            "highs" => Some(BackendType::Highs),
            #[cfg(feature = "gurobi-solver")]
            "gurobi" => Some(BackendType::Gurobi),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, PCenterError> {
        Self::from_str(s).ok_or_else(|| PCenterError::UnknownSolver(s.to_string()))
    }

    /// Whether the backend stops at `SolverConfig::time_limit`.
    /// glpk-rust exposes no limit, so GLPK runs until it proves optimality.
    pub fn enforces_time_limit(&self) -> bool {
        match self {
            BackendType::Glpk => false,
            #[cfg(feature = "highs-solver")]
            BackendType::Highs => true,
            #[cfg(feature = "gurobi-solver")]
            BackendType::Gurobi => true,
        }
    }
}

/// Options that only some backends read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendOptions {
    /// Fixed-point units per distance unit for GLPK
    pub glpk_scale: i32,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions {
            glpk_scale: crate::domain::backends::glpk_backend::DEFAULT_SCALE,
        }
    }
}

/// Create a fresh backend instance based on the specified type
pub fn create_backend(
    backend_type: BackendType,
    options: &BackendOptions,
) -> Box<dyn OptimizationBackend> {
    match backend_type {
        BackendType::Glpk => Box::new(GlpkBackend::with_scale(options.glpk_scale)),
        #[cfg(feature = "highs-solver")]
        BackendType::Highs => Box::new(HighsBackend::new()),
        #[cfg(feature = "gurobi-solver")]
        BackendType::Gurobi => Box::new(GurobiBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_from_str() {
        assert_eq!(BackendType::from_str("glpk"), Some(BackendType::Glpk));
        assert_eq!(BackendType::from_str(" GLPK "), Some(BackendType::Glpk));
        #[cfg(feature = "highs-solver")]
        assert_eq!(BackendType::from_str("HiGHS"), Some(BackendType::Highs));
        #[cfg(feature = "gurobi-solver")]
        assert_eq!(BackendType::from_str("Gurobi"), Some(BackendType::Gurobi));
        assert_eq!(BackendType::from_str("cplex"), None);
    }

    #[test]
    fn test_parse_given_unknown_solver_should_name_it() {
        let err = BackendType::parse("cplex").unwrap_err();
        assert!(matches!(err, PCenterError::UnknownSolver(ref s) if s == "cplex"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_create_glpk_backend() {
        let backend = create_backend(BackendType::Glpk, &BackendOptions::default());
        assert_eq!(backend.name(), "GLPK");
    }

    #[cfg(feature = "highs-solver")]
    #[test]
    fn test_create_highs_backend() {
        let backend = create_backend(BackendType::Highs, &BackendOptions::default());
        assert_eq!(backend.name(), "HiGHS");
    }

    #[cfg(feature = "gurobi-solver")]
    #[test]
    fn test_create_gurobi_backend() {
        let backend = create_backend(BackendType::Gurobi, &BackendOptions::default());
        assert_eq!(backend.name(), "Gurobi");
    }
}
