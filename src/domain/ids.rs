//! Domain identifier types with validation
//!
//! Newtype wrappers keep identity ids, appointment ids and clinical-note ids
//! from being mixed up. Relational ids are positive integers generated by the
//! store; note ids are UUID strings generated on insert.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity identifier
///
/// Shared by the base identity record and its role specialization
/// (clinician or patient profile), so a doctor id is also a user id.
///
/// # Examples
///
/// ```
/// use clinic::domain::ids::UserId;
/// use std::str::FromStr;
///
/// let id = UserId::from_str("17").unwrap();
/// assert_eq!(id.value(), 17);
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new UserId
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not positive
    pub fn new(id: i64) -> Result<Self, String> {
        if id <= 0 {
            return Err(format!("User ID must be positive, got: {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("Invalid user ID: {s}"))?;
        Self::new(id)
    }
}

/// Appointment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(i64);

impl AppointmentId {
    /// Creates a new AppointmentId
    pub fn new(id: i64) -> Result<Self, String> {
        if id <= 0 {
            return Err(format!("Appointment ID must be positive, got: {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppointmentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("Invalid appointment ID: {s}"))?;
        Self::new(id)
    }
}

/// Clinical-note (prescription or medical record) identifier
///
/// Generated by the document store. References from notes to identities and
/// appointments are plain numbers and are never checked.
///
/// # Examples
///
/// ```
/// use clinic::domain::ids::NoteId;
///
/// let id = NoteId::generate();
/// assert_eq!(id.as_str().len(), 36);
/// assert!(NoteId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Creates a NoteId from an existing string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Note ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Generates a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_creation() {
        let id = UserId::new(5).unwrap();
        assert_eq!(id.value(), 5);
        assert_eq!(id.to_string(), "5");
    }

    #[test]
    fn test_user_id_rejects_non_positive() {
        assert!(UserId::new(0).is_err());
        assert!(UserId::new(-3).is_err());
        assert!(UserId::from_str("abc").is_err());
    }

    #[test]
    fn test_appointment_id_from_str() {
        let id = AppointmentId::from_str(" 12 ").unwrap();
        assert_eq!(id.value(), 12);
    }

    #[test]
    fn test_note_id_generate_is_unique() {
        assert_ne!(NoteId::generate(), NoteId::generate());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&UserId::new(7).unwrap()).unwrap();
        assert_eq!(json, "7");
        let id: NoteId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
    }
}
