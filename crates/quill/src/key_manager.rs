use keyring::Entry;
use std::env;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;
#[cfg(test)]
use mockall::predicate::*;

const KEYRING_SERVICE: &str = "quill";

/// Environment variable consulted before the keyring.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Error, Debug)]
pub enum KeyManagerError {
    #[error("Failed to access keyring: {0}")]
    KeyringAccess(String),

    #[error("Failed to save to keyring: {0}")]
    KeyringSave(String),

    #[error("Could not find {0} in environment or keyring")]
    NotFound(String),
}

impl From<keyring::Error> for KeyManagerError {
    fn from(err: keyring::Error) -> Self {
        KeyManagerError::KeyringAccess(err.to_string())
    }
}

#[cfg_attr(test, automock)]
pub trait Keyring: Send + Sync {
    fn get_password(&self) -> Result<String, KeyManagerError>;
    fn set_password(&self, password: &str) -> Result<(), KeyManagerError>;
}

#[cfg_attr(test, automock)]
pub trait Environment: Send + Sync {
    fn get_var(&self, key: &str) -> Result<String, env::VarError>;
}

pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get_var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }
}

// Inherent Entry methods take precedence inside the impl, so these calls
// hit keyring directly.
impl Keyring for Entry {
    fn get_password(&self) -> Result<String, KeyManagerError> {
        self.get_password().map_err(KeyManagerError::from)
    }

    fn set_password(&self, password: &str) -> Result<(), KeyManagerError> {
        self.set_password(password).map_err(KeyManagerError::from)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum KeyRetrievalStrategy {
    /// Only look in environment variables
    EnvironmentOnly,
    /// Only look in the system keyring
    KeyringOnly,
    /// Environment variable first, keyring as fallback
    #[default]
    Both,
}

/// Defers `Entry` construction until the keyring is actually consulted,
/// so a missing keyring backend cannot fail a lookup the environment
/// variable would have satisfied.
struct LazyEntry<'a> {
    key_name: &'a str,
}

impl Keyring for LazyEntry<'_> {
    fn get_password(&self) -> Result<String, KeyManagerError> {
        let entry = Entry::new(KEYRING_SERVICE, self.key_name)?;
        entry.get_password().map_err(KeyManagerError::from)
    }

    fn set_password(&self, password: &str) -> Result<(), KeyManagerError> {
        let entry = Entry::new(KEYRING_SERVICE, self.key_name)?;
        entry.set_password(password).map_err(KeyManagerError::from)
    }
}

pub fn get_api_key_default(
    api_key_name: &str,
    strategy: KeyRetrievalStrategy,
) -> Result<String, KeyManagerError> {
    let env = RealEnvironment;
    let kr = LazyEntry {
        key_name: api_key_name,
    };
    get_api_key(api_key_name, strategy, &kr, &env)
}

pub fn get_api_key(
    api_key_name: &str,
    strategy: KeyRetrievalStrategy,
    keyring: &impl Keyring,
    env: &impl Environment,
) -> Result<String, KeyManagerError> {
    match strategy {
        KeyRetrievalStrategy::EnvironmentOnly => env
            .get_var(api_key_name)
            .map_err(|_| KeyManagerError::NotFound(api_key_name.to_string())),
        KeyRetrievalStrategy::KeyringOnly => keyring.get_password(),
        KeyRetrievalStrategy::Both => match env.get_var(api_key_name) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => keyring
                .get_password()
                .map_err(|_| KeyManagerError::NotFound(api_key_name.to_string())),
        },
    }
}

pub fn save_to_keyring(key_name: &str, api_key: &str) -> Result<(), KeyManagerError> {
    let kr = Entry::new(KEYRING_SERVICE, key_name)?;
    Keyring::set_password(&kr, api_key)
        .map_err(|e| KeyManagerError::KeyringSave(format!("Failed to save key {key_name}: {e}")))
}
