//! Command implementations.

mod handle;
mod targets;
mod validate;

pub use handle::run_handle;
pub use targets::run_targets;
pub use validate::run_validate;
