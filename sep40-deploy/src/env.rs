//! Environment snapshot, captured once at startup
//!
//! Nothing past `main` reads the process environment directly; stages receive
//! an [`EnvSnapshot`] and look values up there.

use crate::error::{EnvFileSnafu, Error};
use snafu::ResultExt;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Deployment credential. Never printed: both `Debug` and `Display` are masked.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, only for handing to the deploy subprocess
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the process environment, skipping entries that are not UTF-8
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Capture the process environment layered over an optional dotenv file.
    ///
    /// Entries already present in the process environment win over the file.
    /// A missing file is an error only when `required` is set.
    pub fn capture_with_env_file(path: &Path, required: bool) -> Result<Self, Error> {
        let mut snapshot = Self::default();

        if path.exists() || required {
            let entries = dotenvy::from_path_iter(path).context(EnvFileSnafu { path })?;
            for entry in entries {
                let (key, value) = entry.context(EnvFileSnafu { path })?;
                snapshot.vars.insert(key, value);
            }
            tracing::debug!(path = %path.display(), count = snapshot.vars.len(), "loaded env file");
        }

        snapshot.vars.extend(Self::capture().vars);
        Ok(snapshot)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value of `PATH`, used to resolve external tools
    pub fn search_path(&self) -> Option<&str> {
        self.get("PATH")
    }
}

// 🤓 Only keys: the snapshot holds the deployment secret
impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("EnvSnapshot").field("keys", &keys).finish()
    }
}
