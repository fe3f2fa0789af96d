//! declkit: resource declaration runtime.
//!
//! Programs declare resources through typed constructors against an explicit
//! [`Context`](core::context::Context). Each declaration is validated and
//! appended to an ordered registry; the run driver reports either the full
//! registry or the first error.

pub mod cli;
pub mod core;
pub mod program;
pub mod sdk;
pub mod tripwire;

pub use crate::core::context::Context;
pub use crate::core::driver::{run, Driver, RunOutcome};
pub use crate::core::error::{Error, Result};
pub use crate::core::value::{PropertyValue, StringMap};
