//! Secret naming and credential lookup.
//!
//! Credentials are referred to by secret id, e.g.
//! `dcp/fusillade/dev/deployer_service_account.json`, and resolved from the
//! `GROUPSYNC_TOKEN` env var or the local credentials file:
//!
//! ```yaml
//! dcp/fusillade/dev/deployer_service_account.json:
//!   token: <bearer token>
//! ```

use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use yaml_peg::serde as yaml;

use crate::logging::debug;

/// Root of every deployer secret id.
pub const SECRET_ROOT: &str = "dcp/fusillade";

/// Env var that, when set, takes precedence over the credentials file.
pub const TOKEN_ENV_VAR: &str = "GROUPSYNC_TOKEN";

/// Default name of the deployer secret.
pub const DEFAULT_SECRET: &str = "deployer_service_account.json";

/// Alias for HashMap to hold credentials information.
pub type CredentialsMap = HashMap<String, String>;

/// Put `name` under `prefix`.
///
/// A trailing `/` on the name is dropped, and a name that already starts
/// with the prefix doesn't get it twice.
pub fn prefixed_secret_id(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = name.trim_end_matches('/');
    let name = name.strip_prefix(prefix).unwrap_or(name);
    format!("{prefix}/{}", name.trim_start_matches('/'))
}

/// The id of a deployer secret for a stage.
pub fn deployer_secret_id(stage: &str, secret: &str) -> String {
    prefixed_secret_id(&format!("{SECRET_ROOT}/{stage}"), secret)
}

/// Fetch every credentials block from a credentials file, keyed by secret id.
pub fn fetch_credentials<P: AsRef<Path>>(path: P) -> Result<HashMap<String, CredentialsMap>> {
    debug!("Trying to read credentials from {:?}", path.as_ref());
    let credentials_raw = fs::read_to_string(path)?;
    let mut config = yaml::from_str::<HashMap<String, CredentialsMap>>(&credentials_raw)?;

    config
        .pop()
        .ok_or_else(|| anyhow!["failed to read credentials"])
}

/// Credentials for the directory service.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct DirectoryCredentials {
    /// Bearer token
    pub token: String,
}

impl DirectoryCredentials {
    /// Perform simple field validation to catch bad input.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(anyhow!(
                "Credentials are missing. Set {TOKEN_ENV_VAR} or add a token to your credentials file."
            ));
        }
        Ok(())
    }

    /// Look the credentials up in a credentials map.
    pub fn from_map(secret_id: &str, credentials: &HashMap<String, CredentialsMap>) -> Result<Self> {
        let block = credentials
            .get(secret_id)
            .ok_or_else(|| anyhow!("no credentials found for secret {secret_id}"))?;
        let creds = DirectoryCredentials {
            token: block.get("token").cloned().unwrap_or_default(),
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Use the env var if it's set, otherwise the credentials file.
    pub fn resolve<P: AsRef<Path>>(secret_id: &str, credentials_path: P) -> Result<Self> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            debug!("using credentials from {TOKEN_ENV_VAR}");
            let creds = DirectoryCredentials { token };
            creds.validate()?;
            return Ok(creds);
        }
        let credentials = fetch_credentials(&credentials_path).with_context(|| {
            format!(
                "unable to read {} - set {TOKEN_ENV_VAR} or create the file",
                credentials_path.as_ref().display()
            )
        })?;
        Self::from_map(secret_id, &credentials)
    }
}
