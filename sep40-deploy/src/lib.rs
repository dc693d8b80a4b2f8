//! Build the SEP-40 oracle contract and deploy it to a Soroban network
//!
//! The pipeline runs strictly in order and stops at the first failure:
//! validate the invocation, check the required tools, build, verify the
//! artifact, deploy, then report the contract identifier.

pub mod builder;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deployer;
pub mod env;
pub mod error;
pub mod orchestrator;
pub mod preflight;
pub mod process;
pub mod report;
pub mod types;

pub use config::DeployConfig;
pub use env::{EnvSnapshot, Secret};
pub use error::{Error, ErrorKind};
pub use orchestrator::{Deployment, Orchestrator};
pub use types::{ContractId, Network};
