//! Composer-compatible dependency resolution.
//!
//! Packages from several prioritized repositories are merged into a [`Pool`],
//! a [`Request`] describes what should be installed, and the CDCL [`Solver`]
//! turns both into an ordered [`Transaction`] of install, update and uninstall
//! operations. The [`installer`] module wires those pieces together the way an
//! install or update command does, without touching the filesystem.

pub mod error;
pub mod installer;
pub mod lock;
pub mod package;
pub mod repository;
pub mod solver;
pub mod util;

pub use error::{ResolverError, Result};
pub use installer::{InstallConfig, InstallOutcome, Installer};
pub use lock::{LockSnapshot, LockedPackage};
pub use package::{Link, LinkType, Package, Stability};
pub use repository::{ArrayRepository, InstalledRepository, PlatformRepository, Repository};
pub use solver::{
    Explanation, Operation, PackageId, Policy, Pool, Request, Solver, SolverConfig, Transaction,
};
pub use util::is_platform_package;
