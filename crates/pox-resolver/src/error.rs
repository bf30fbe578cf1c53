use pox_semver::VersionParserError;
use thiserror::Error;

use crate::solver::Explanation;

#[derive(Error, Debug)]
pub enum ResolverError {
    // Pool errors
    #[error("Repository {name} is not registered in the pool")]
    UnknownRepository { name: String },

    #[error("Repository {name} is already registered in the pool")]
    DuplicateRepository { name: String },

    #[error("Cannot add repository {name}: the pool is frozen once packages have been looked up")]
    PoolFrozen { name: String },

    #[error("The installed repository must be registered before any other repository")]
    InstalledRepositoryNotFirst,

    #[error("Package not found: id {id}")]
    PackageNotFound { id: i32 },

    // Rule errors
    #[error("Rule not found: id {id}")]
    RuleNotFound { id: u32 },

    // Solver errors
    #[error("Your requirements could not be resolved to an installable set of packages.\n\n{0}")]
    Unsatisfiable(Explanation),

    #[error("Internal solver error: {0}")]
    InternalSolverInvariantViolation(String),

    // Version errors
    #[error("Invalid version: {0}")]
    Version(#[from] VersionParserError),
}

impl ResolverError {
    /// True for the user-facing "no solution" outcome, as opposed to programming errors.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, ResolverError::Unsatisfiable(_))
    }

    pub fn explanation(&self) -> Option<&Explanation> {
        match self {
            ResolverError::Unsatisfiable(explanation) => Some(explanation),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
