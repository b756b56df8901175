//! Project discovery from a credentials file
//!
//! The path to a JSON credentials document is taken from an environment
//! variable. Its `project_id` names the target project; service-account
//! keys in the same file are picked up by the token layer.

use super::error::{LoggerError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing to the JSON credentials file
pub const ENV_CONFIG: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    project_id: String,
}

/// Path of the credentials file named by `env_var`
///
/// # Errors
///
/// Returns `MissingEnv` when the variable is unset or empty.
pub fn credentials_path(env_var: &str) -> Result<PathBuf> {
    match std::env::var_os(env_var) {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => Err(LoggerError::missing_env(env_var)),
    }
}

/// Resolve the project id from the file named by `env_var`
///
/// # Errors
///
/// - `MissingEnv` when the variable is unset or empty
/// - `CredentialsRead` / `CredentialsParse` when the file is unusable
/// - `InvalidConfiguration` when `project_id` is empty
pub fn resolve_project_id(env_var: &str) -> Result<String> {
    read_project_id(&credentials_path(env_var)?)
}

/// Read the project id from a credentials file
pub fn read_project_id(path: &Path) -> Result<String> {
    let credentials: CredentialsFile = read_credentials_file(path)?;

    if credentials.project_id.trim().is_empty() {
        return Err(LoggerError::config(
            "credentials",
            format!("{} has an empty project_id", path.display()),
        ));
    }
    Ok(credentials.project_id)
}

/// Read and decode a JSON credentials document
pub(crate) fn read_credentials_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|source| LoggerError::CredentialsRead {
        path: display.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| LoggerError::CredentialsParse {
        path: display,
        source,
    })
}
