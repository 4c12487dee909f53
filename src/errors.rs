//! Error types for the carevox application.
//!
//! This module defines the error taxonomy shared by the appointment store,
//! the reminder dispatcher and the command-line front end.

use std::io;

use thiserror::Error;

/// The main error type for the carevox application.
#[derive(Error, Debug)]
pub enum CareError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required field was missing or empty.
    #[error("Please enter a {field}.")]
    Validation { field: String },

    /// Appointment was not found when performing an operation.
    #[error("Appointment not found: {id}")]
    AppointmentNotFound { id: u64 },

    /// A reminder entry carries a time that can never match the clock.
    #[error("Invalid reminder time '{value}', expected hh:mm AM/PM")]
    InvalidTriggerTime { value: String },

    /// No canned content exists for the requested health condition.
    #[error("Unknown health condition: {condition}")]
    UnknownCondition { condition: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Errors related to the reminder dispatcher.
    #[error("Reminder scheduler error: {message}")]
    SchedulerError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
