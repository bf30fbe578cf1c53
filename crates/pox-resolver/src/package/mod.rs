// Package model used by the resolver
//
// Packages arrive fully materialized from repository collaborators; the
// resolver only needs identity, version, stability and the link maps.

mod link;
mod package;

pub use link::{Link, LinkType};
pub use package::Package;
pub use pox_semver::Stability;
