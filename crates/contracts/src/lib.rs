//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Dispatch Model
//! - One trigger event names one artifact `(bucket, key)`
//! - The artifact is sent to every [`Target`] of a [`TargetRegistry`]
//! - Every target yields exactly one [`Outcome`], collected in a [`RunResult`]

mod endpoint;
mod error;
mod event;
mod outcome;
mod response;
mod run_result;
mod settings;
mod store;
mod target;

pub use endpoint::{InferenceEndpoint, LocalInferenceEndpoint};
pub use error::*;
pub use event::*;
pub use outcome::*;
pub use response::*;
pub use run_result::RunResult;
pub use settings::*;
pub use store::{LocalObjectStore, ObjectStore};
pub use target::*;
