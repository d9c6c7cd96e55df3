//! Operators file: who may sign in, and who is an admin.
//!
//! ```yaml
//! operators:
//!   - id: "1"
//!     name: Test User
//!     email: ops@example.com
//!     password_hash: "$argon2id$v=19$..."
//! admins:            # optional; defaults to every operator's email
//!   - ops@example.com
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use password_hash::PasswordHash;
use serde::Deserialize;
use thiserror::Error;

use ecom_core::Email;

use super::CredentialAuthority;
use crate::models::{AdminAllowlist, Operator};

/// Errors loading or validating an operators file.
#[derive(Debug, Error)]
pub enum OperatorFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid operators file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("operators file must list at least one operator")]
    NoOperators,

    #[error("duplicate operator email: {0}")]
    DuplicateEmail(String),

    #[error("duplicate operator id: {0}")]
    DuplicateId(String),

    #[error("operator {0} has an invalid password hash")]
    InvalidHash(String),

    #[error("admins list is empty; omit it to allow every operator")]
    EmptyAllowlist,
}

/// Parsed operators file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorsFile {
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub admins: Option<Vec<Email>>,
}

impl OperatorsFile {
    /// Read and validate an operators file from disk.
    ///
    /// # Errors
    ///
    /// Returns `OperatorFileError` if the file cannot be read, is not valid
    /// YAML, or fails validation.
    pub fn load(path: &Path) -> Result<Self, OperatorFileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| OperatorFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate operators YAML.
    ///
    /// # Errors
    ///
    /// Returns `OperatorFileError` on invalid YAML or failed validation.
    pub fn from_yaml(raw: &str) -> Result<Self, OperatorFileError> {
        let file: Self = serde_yaml::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), OperatorFileError> {
        if self.operators.is_empty() {
            return Err(OperatorFileError::NoOperators);
        }

        let mut emails = HashSet::new();
        let mut ids = HashSet::new();
        for operator in &self.operators {
            if !emails.insert(operator.email.normalized()) {
                return Err(OperatorFileError::DuplicateEmail(
                    operator.email.to_string(),
                ));
            }
            if !ids.insert(operator.id.as_str()) {
                return Err(OperatorFileError::DuplicateId(operator.id.to_string()));
            }
            PasswordHash::new(&operator.password_hash)
                .map_err(|_| OperatorFileError::InvalidHash(operator.email.to_string()))?;
        }

        if self.admins.as_ref().is_some_and(Vec::is_empty) {
            return Err(OperatorFileError::EmptyAllowlist);
        }

        Ok(())
    }

    /// The admin allowlist: the `admins` list if present, else every operator.
    #[must_use]
    pub fn allowlist(&self) -> AdminAllowlist {
        self.admins.as_ref().map_or_else(
            || AdminAllowlist::new(self.operators.iter().map(|op| &op.email)),
            |admins| AdminAllowlist::new(admins),
        )
    }

    /// Split into the credential authority and the admin allowlist.
    #[must_use]
    pub fn into_parts(self) -> (CredentialAuthority, AdminAllowlist) {
        let allowlist = self.allowlist();
        (CredentialAuthority::new(self.operators), allowlist)
    }
}
