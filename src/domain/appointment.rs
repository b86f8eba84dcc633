//! Appointment domain model

use super::ids::{AppointmentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[serde(alias = "SCHEDULED")]
    Scheduled,
    #[serde(alias = "CONFIRMED")]
    Confirmed,
    #[serde(alias = "COMPLETED")]
    Completed,
    #[serde(alias = "CANCELLED")]
    Cancelled,
    #[serde(alias = "NO_SHOW")]
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Whether the transition table allows `self -> next`
    ///
    /// scheduled -> confirmed | completed | cancelled | no_show
    /// confirmed -> completed | cancelled | no_show
    /// completed, cancelled and no_show are terminal.
    /// Writing the current status again is always allowed.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Scheduled, Confirmed | Completed | Cancelled | NoShow)
                | (Confirmed, Completed | Cancelled | NoShow)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid appointment status '{s}'. Must be one of: scheduled, confirmed, completed, cancelled, no_show"
                )
            })
    }
}

/// Stored appointment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request
#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Full appointment update (date, notes and status)
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentUpdate {
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
}

/// Per-status appointment counts for one clinician
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoctorAppointmentStats {
    pub doctor_id: i64,
    pub total: i64,
    pub scheduled: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
}

impl DoctorAppointmentStats {
    /// Tallies `appointments` (expected to belong to `doctor_id`)
    pub fn tally(doctor_id: UserId, appointments: &[Appointment]) -> Self {
        let mut stats = Self {
            doctor_id: doctor_id.value(),
            ..Default::default()
        };
        for appointment in appointments {
            stats.total += 1;
            match appointment.status {
                AppointmentStatus::Scheduled => stats.scheduled += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                AppointmentStatus::NoShow => stats.no_show += 1,
            }
        }
        stats
    }
}
