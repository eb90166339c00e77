//! Repository traits.

pub mod accounts;
pub mod groups;
pub mod packages;
pub mod revisions;

pub use accounts::AccountRepo;
pub use groups::GroupRepo;
pub use packages::PackageRepo;
pub use revisions::RevisionRepo;
