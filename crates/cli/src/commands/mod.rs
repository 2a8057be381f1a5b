//! Command implementations.

mod run;
mod validate;

pub use run::run_drive;
pub use validate::run_validate;
