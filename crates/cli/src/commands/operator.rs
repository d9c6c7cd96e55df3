//! Operator management commands.
//!
//! Operators are not stored in the database; they live in the operators
//! file named by `ADMIN_OPERATORS_FILE`. These commands help maintain it.
//!
//! # Usage
//!
//! ```bash
//! # Print an Argon2id hash for the operators file (prompts on stdin if omitted)
//! ecom-cli operator hash-password 'correct horse battery staple'
//!
//! # Validate an operators file
//! ecom-cli operator check operators.yaml
//! ```

use std::io::BufRead;
use std::path::Path;

use ecom_admin::services::AuthError;
use ecom_admin::services::auth::{OperatorFileError, OperatorsFile, hash_password};
use thiserror::Error;

/// Shortest password we are willing to hash for an operator.
pub const MIN_PASSWORD_LEN: usize = 12;

/// Errors that can occur during operator commands.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hashing failed: {0}")]
    Hash(#[from] AuthError),

    #[error("Invalid operators file: {0}")]
    File(#[from] OperatorFileError),
}

/// Summary of a validated operators file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorsSummary {
    pub operators: usize,
    pub admins: usize,
}

/// Hash a password for the operators file.
///
/// # Errors
///
/// Returns `OperatorError::PasswordTooShort` for short passwords.
pub fn hash(password: &str) -> Result<String, OperatorError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(OperatorError::PasswordTooShort);
    }
    Ok(hash_password(password)?)
}

/// Read one line from stdin, without the trailing newline.
///
/// # Errors
///
/// Returns `OperatorError::Io` if stdin cannot be read.
pub fn read_password_line(input: impl BufRead) -> Result<String, OperatorError> {
    let line = input.lines().next().transpose()?.unwrap_or_default();
    Ok(line.trim_end_matches('\r').to_string())
}

/// Load and validate an operators file.
///
/// # Errors
///
/// Returns `OperatorError::File` if the file is missing or invalid.
pub fn check(path: &Path) -> Result<OperatorsSummary, OperatorError> {
    let file = OperatorsFile::load(path)?;
    let admins = file.allowlist().len();
    let (credentials, _) = file.into_parts();
    Ok(OperatorsSummary {
        operators: credentials.len(),
        admins,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_hash_rejects_short_password() {
        assert!(matches!(hash("short"), Err(OperatorError::PasswordTooShort)));
    }

    #[test]
    fn test_hash_produces_argon2id_phc() {
        let phc = hash("correct horse battery").unwrap();
        assert!(phc.starts_with("$argon2id$"));
    }

    #[test]
    fn test_read_password_line() {
        let input = b"hunter2hunter2\r\nignored\n".as_slice();
        assert_eq!(read_password_line(input).unwrap(), "hunter2hunter2");
        assert_eq!(read_password_line(b"".as_slice()).unwrap(), "");
    }

    #[test]
    fn test_check_counts_operators_and_admins() {
        let hash = hash("correct horse battery").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
operators:
  - id: "1"
    name: Test User
    email: ops@example.com
    password_hash: "{hash}"
  - id: "2"
    name: Second User
    email: two@example.com
    password_hash: "{hash}"
admins:
  - ops@example.com
"#
        )
        .unwrap();

        let summary = check(file.path()).unwrap();
        assert_eq!(
            summary,
            OperatorsSummary {
                operators: 2,
                admins: 1
            }
        );
    }

    #[test]
    fn test_check_missing_file() {
        let result = check(Path::new("/nonexistent/operators.yaml"));
        assert!(matches!(result, Err(OperatorError::File(_))));
    }
}
