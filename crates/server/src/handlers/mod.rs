//! Request handlers.

pub mod admin;
pub mod health;
pub mod mirror;
pub mod registry;

pub use admin::{create_account, create_package};
pub use health::health_check;
pub use mirror::{put_package_descriptor, put_package_tarball};
pub use registry::{
    add_mirrorer, backup_mirrorers, list_mirrorers, remove_mirrorer, restore_mirrorers,
};
