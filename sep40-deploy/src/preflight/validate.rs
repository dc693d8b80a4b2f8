//! Argument and environment validation

use crate::env::{EnvSnapshot, Secret};
use crate::error::{EmptyNetworkSnafu, Error, MissingSecretSnafu, UsageSnafu};
use crate::types::Network;
use snafu::{OptionExt, ensure};

/// Validated inputs for one deploy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub network: Network,
    pub secret: Secret,
}

/// Check that exactly one network was given and that the secret is set.
///
/// Usage problems are reported before configuration problems.
pub fn validate_invocation(
    args: &[String],
    env: &EnvSnapshot,
    secret_var: &str,
) -> Result<Invocation, Error> {
    let [network] = args else {
        return UsageSnafu { count: args.len() }.fail();
    };
    ensure!(!network.is_empty(), EmptyNetworkSnafu);

    let secret = env
        .get(secret_var)
        .filter(|value| !value.is_empty())
        .context(MissingSecretSnafu { var: secret_var })?;

    Ok(Invocation {
        network: Network::new(network.as_str()),
        secret: Secret::new(secret),
    })
}
