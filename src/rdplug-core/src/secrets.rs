//! Connection passwords kept in the OS keyring.
//!
//! Entries are stored under the "rdplug" service with a user key of
//! `<profile>/<secret kind>`, so profiles on disk never need to carry a
//! password.

use thiserror::Error;

const SERVICE_NAME: &str = "rdplug";

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("credential not found: {key}")]
    NotFound { key: String },

    #[error("keyring access denied: {0}")]
    AccessDenied(String),

    #[error("keyring unavailable: {0}")]
    Unavailable(String),

    #[error("keyring error: {0}")]
    Other(String),
}

impl From<keyring::Error> for SecretsError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => SecretsError::NotFound {
                key: "unknown".into(),
            },
            keyring::Error::NoStorageAccess(e) => SecretsError::AccessDenied(e.to_string()),
            keyring::Error::PlatformFailure(e) => SecretsError::Unavailable(e.to_string()),
            other => SecretsError::Other(other.to_string()),
        }
    }
}

pub type SecretsResult<T> = Result<T, SecretsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Password,
}

impl SecretKind {
    fn as_str(&self) -> &'static str {
        match self {
            SecretKind::Password => "password",
        }
    }

    /// Profile key the secret is attached under.
    pub fn profile_key(&self) -> &'static str {
        self.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.into(),
        }
    }

    fn build_key(profile: &str, kind: SecretKind) -> String {
        format!("{}/{}", profile, kind.as_str())
    }

    fn entry(&self, key: &str) -> SecretsResult<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)?)
    }

    pub fn store(&self, profile: &str, kind: SecretKind, secret: &str) -> SecretsResult<()> {
        let key = Self::build_key(profile, kind);
        self.entry(&key)?.set_password(secret)?;
        tracing::debug!(profile, kind = ?kind, "stored credential in keyring");
        Ok(())
    }

    /// Returns `SecretsError::NotFound` if nothing is stored for the profile.
    pub fn get(&self, profile: &str, kind: SecretKind) -> SecretsResult<String> {
        let key = Self::build_key(profile, kind);
        match self.entry(&key)?.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => Err(SecretsError::NotFound { key }),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`get`](Self::get) but maps a missing entry to `None`.
    pub fn find(&self, profile: &str, kind: SecretKind) -> SecretsResult<Option<String>> {
        match self.get(profile, kind) {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretsError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Succeeds even if nothing was stored.
    pub fn delete(&self, profile: &str, kind: SecretKind) -> SecretsResult<()> {
        let key = Self::build_key(profile, kind);
        match self.entry(&key)?.delete_credential() {
            Ok(()) => {
                tracing::debug!(profile, kind = ?kind, "deleted credential from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn store_password(&self, profile: &str, password: &str) -> SecretsResult<()> {
        self.store(profile, SecretKind::Password, password)
    }

    pub fn find_password(&self, profile: &str) -> SecretsResult<Option<String>> {
        self.find(profile, SecretKind::Password)
    }

    pub fn delete_password(&self, profile: &str) -> SecretsResult<()> {
        self.delete(profile, SecretKind::Password)
    }
}
