//! Appointment records kept by the calendar.
use serde::{Deserialize, Serialize};

use crate::{CareError, Result};

/// A single appointment record in the backing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Identifier assigned by the store at insertion time
    pub id: u64,
    /// What the appointment is for
    pub title: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Time of day, `HH:MM`
    pub time: String,
    /// Optional free text, empty when not given
    #[serde(default)]
    pub details: String,
}

/// User input for a new appointment, before an id is assigned.
#[derive(Debug, Clone, Default)]
pub struct NewAppointment {
    pub title: String,
    pub date: String,
    pub time: String,
    pub details: String,
}

impl NewAppointment {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            time: time.into(),
            details: details.into(),
        }
    }

    /// Rejects input with a missing title, date or time.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("date", &self.date),
            ("time", &self.time),
        ] {
            if value.trim().is_empty() {
                return Err(CareError::Validation {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Turns validated input into a stored record.
    pub fn into_appointment(self, id: u64) -> Appointment {
        Appointment {
            id,
            title: self.title,
            date: self.date,
            time: self.time,
            details: self.details,
        }
    }
}

impl Appointment {
    /// One-line label used when listing or picking an appointment.
    pub fn label(&self) -> String {
        format!("{} - {} {}", self.title, self.date, self.time)
    }
}
