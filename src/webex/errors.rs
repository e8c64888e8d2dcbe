//! Provider error codes and the per-call error set.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Exception ids returned in `serv:exceptionID`.
pub mod codes {
    /// The supplied user password is wrong or expired.
    pub const BAD_PASSWORD: &str = "030002";
    /// A user with this WebEx id already exists.
    pub const DUPLICATE_LOGIN: &str = "030004";
    /// A user with this email already exists.
    pub const DUPLICATE_EMAIL: &str = "030005";
    /// The query matched nothing.
    pub const NO_RECORDS: &str = "000015";
    /// Used when a failure carries no exception id.
    pub const UNKNOWN: &str = "unknown";
}

/// Error code to message map captured from a single provider call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    entries: BTreeMap<String, String>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.insert(code, message);
        set
    }

    pub fn insert(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(code.into(), message.into());
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn message(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "no error detail");
        }
        let mut first = true;
        for (code, message) in &self.entries {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", code, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
    #[error("authentication failed (code {code})")]
    Authentication { code: String },
    #[error("account already exists (code {code})")]
    DuplicateAccount { code: String },
    #[error("provider error {code}: {message}")]
    Provider { code: String, message: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ProviderError {
    /// Map a failure reported in the response header to an error kind.
    pub fn from_errors(errors: &ErrorSet) -> Self {
        if errors.contains(codes::BAD_PASSWORD) {
            return ProviderError::Authentication {
                code: codes::BAD_PASSWORD.to_string(),
            };
        }
        for code in [codes::DUPLICATE_LOGIN, codes::DUPLICATE_EMAIL] {
            if errors.contains(code) {
                return ProviderError::DuplicateAccount {
                    code: code.to_string(),
                };
            }
        }
        match errors.iter().next() {
            Some((code, message)) => ProviderError::Provider {
                code: code.to_string(),
                message: message.to_string(),
            },
            None => ProviderError::Provider {
                code: codes::UNKNOWN.to_string(),
                message: "request failed without detail".to_string(),
            },
        }
    }
}

impl From<anyhow::Error> for ProviderError {
    fn from(err: anyhow::Error) -> Self {
        ProviderError::Persistence(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_set_display() {
        let mut errors = ErrorSet::new();
        assert_eq!(errors.to_string(), "no error detail");

        errors.insert("030002", "Incorrect password");
        errors.insert("000015", "Sorry, no record found");
        assert_eq!(
            errors.to_string(),
            "000015: Sorry, no record found; 030002: Incorrect password"
        );
    }

    #[test]
    fn test_classify_bad_password() {
        let errors = ErrorSet::with(codes::BAD_PASSWORD, "Incorrect user or password");
        assert_eq!(
            ProviderError::from_errors(&errors),
            ProviderError::Authentication {
                code: "030002".to_string()
            }
        );
    }

    #[test]
    fn test_classify_duplicates() {
        let login = ErrorSet::with(codes::DUPLICATE_LOGIN, "Duplicated WebEx ID");
        let email = ErrorSet::with(codes::DUPLICATE_EMAIL, "Email address already exists");
        assert!(matches!(
            ProviderError::from_errors(&login),
            ProviderError::DuplicateAccount { code } if code == "030004"
        ));
        assert!(matches!(
            ProviderError::from_errors(&email),
            ProviderError::DuplicateAccount { code } if code == "030005"
        ));
    }

    #[test]
    fn test_classify_other() {
        let errors = ErrorSet::with("060001", "Meeting not found");
        assert_eq!(
            ProviderError::from_errors(&errors),
            ProviderError::Provider {
                code: "060001".to_string(),
                message: "Meeting not found".to_string()
            }
        );
    }
}
