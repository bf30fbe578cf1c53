//! SAT-based dependency resolver for Composer packages.
//!
//! This module implements a CDCL (Conflict-Driven Clause Learning) SAT solver
//! specifically designed for package dependency resolution. The implementation
//! follows Composer's solver design.
//!
//! # Architecture
//!
//! - [`Pool`]: Registry of all available packages with lookup by name/constraint
//! - [`Request`]: Specification of what needs to be resolved
//! - [`RuleSet`]: Collection of SAT clauses representing dependencies
//! - [`Policy`]: Ordering of candidates when the solver has to choose
//! - [`Solver`]: The main CDCL algorithm implementation
//! - [`Transaction`]: Ordered operations derived from the solver's decisions
//!
//! # Algorithm Overview
//!
//! 1. **Rule Generation**: Convert the dependency graph to SAT clauses
//! 2. **Unit Propagation**: Force decisions from unit clauses
//! 3. **Decision Making**: Choose package versions using the policy
//! 4. **Conflict Analysis**: Learn from conflicts to avoid repeating mistakes
//! 5. **Backjumping**: Revert to the level where the learned rule becomes unit
//!
//! # Example
//!
//! ```
//! use pox_resolver::solver::{Policy, Pool, Request, Solver, Transaction};
//! use pox_resolver::{ArrayRepository, Package};
//!
//! let mut pool = Pool::new();
//! pool.add_repository(ArrayRepository::with_packages(
//!     "packagist",
//!     vec![
//!         Package::new("monolog/monolog", "3.5.0").with_require("psr/log", "^3.0"),
//!         Package::new("psr/log", "3.0.0"),
//!     ],
//! ))?;
//!
//! let mut request = Request::new();
//! request.install("monolog/monolog", "^3.0");
//!
//! let policy = Policy::new();
//! let decisions = Solver::new(&pool, &policy).solve(&request)?;
//! let transaction = Transaction::build(&pool, &decisions, &[]);
//!
//! let operations: Vec<String> = transaction.operations.iter().map(|op| op.to_string()).collect();
//! assert_eq!(
//!     operations,
//!     vec!["Installing psr/log (3.0.0)", "Installing monolog/monolog (3.5.0)"]
//! );
//! # Ok::<(), pox_resolver::ResolverError>(())
//! ```

mod decisions;
mod policy;
mod pool;
mod problem;
mod request;
mod rule;
mod rule_generator;
mod rule_set;
#[allow(clippy::module_inception)]
mod solver;
mod transaction;
mod watch_graph;


pub use decisions::Decisions;
pub use policy::Policy;
pub use pool::{PackageId, Pool};
pub use problem::{Explanation, Problem, ProblemRule, UnresolvableRequirement};
pub use request::{Job, Request};
pub use rule::{Literal, Rule, RuleId, RuleReason, RuleType};
pub use rule_generator::RuleGenerator;
pub use rule_set::{RuleSet, RuleSetStats};
pub use solver::{Solver, SolverConfig};
pub use transaction::{Operation, Transaction, TransactionSummary};
pub use watch_graph::WatchGraph;
