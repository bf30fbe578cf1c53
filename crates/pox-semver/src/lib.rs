//! Composer-compatible version handling.
//!
//! Versions are normalized to Composer's four-part form (`1.2.0.0`, `1.0.0.0-beta2`,
//! `dev-master`) and compared with PHP `version_compare` ordering. Constraints are
//! parsed into a closed [`Constraint`] tree that supports intersection checks, which
//! is what dependency resolution needs to decide whether a provided version range
//! can satisfy a required one.

mod comparator;
mod constraint;
mod operator;
mod stability;
mod version_parser;

pub use comparator::{compare_versions, Comparator};
pub use constraint::Constraint;
pub use operator::{InvalidOperatorError, Operator};
pub use stability::Stability;
pub use version_parser::{VersionParser, VersionParserError};
