//! Preflight checks that run before any subprocess is spawned
//!
//! - Argument and environment validation (network name, deployment secret)
//! - Tool availability (build tool, deploy CLI) with optional version requirements

pub mod prereq;
pub mod validate;

pub use prereq::{PathProbe, ToolCheck, ToolProbe, ToolSpec, check_all, check_tool};
pub use validate::{Invocation, validate_invocation};

#[cfg(test)]
pub use prereq::MockToolProbe;
