//! Secret configuration values
//!
//! The token signing key and the database connection string are held in a
//! [`SecretString`]: a `secrecy::Secret` around [`SecretValue`], which is
//! zeroed on drop and prints as `[REDACTED]` in debug output. Reading the
//! value needs an explicit `expose_secret()`.
//!
//! ```rust
//! use clinic::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let key = secret_string("signing-key".to_string());
//! assert_eq!(key.expose_secret().len(), 11);
//! assert!(!format!("{key:?}").contains("signing-key"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload of a [`SecretString`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Key material for HMAC signing
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A zeroizing, redacted string
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string, e.g. one read from a `CLINIC_*` override
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue(value))
}
