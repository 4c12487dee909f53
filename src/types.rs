//! Shared types for the carevox application.
//!
//! This module contains the crate-wide `Result` alias and the subcommands
//! understood by the command-line front end.
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;

use crate::{parse_date, parse_time, CareError, Routine};

/// A specialized Result type for carevox operations.
pub type Result<T> = std::result::Result<T, CareError>;

/// Available subcommands for the carevox application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the welcome screen
    Dashboard,

    /// Add an appointment to the calendar
    Add {
        /// What the appointment is for
        #[clap(short = 'T', long)]
        title: String,

        /// Date of the appointment (YYYY-MM-DD)
        #[clap(short, long, value_parser = parse_date)]
        date: NaiveDate,

        /// Time of the appointment (HH:MM or hh:mm AM/PM)
        #[clap(short, long, value_parser = parse_time)]
        time: NaiveTime,

        /// Additional details
        #[clap(short = 'D', long, default_value = "")]
        details: String,
    },

    /// List all appointments
    List {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Remove an appointment by ID
    Remove {
        /// ID of the appointment to remove
        id: u64,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Announce the daily health reminders until interrupted
    Reminders,

    /// Show a daily routine
    Routine {
        /// Which routine
        #[clap(value_enum)]
        routine: Routine,

        /// Read the routine aloud
        #[clap(short, long)]
        speak: bool,
    },

    /// Get a diet recommendation for a health condition
    Diet {
        /// Health condition, e.g. "Diabetes"
        condition: String,
    },

    /// Suggest medication and check likely adherence
    Medication {
        /// Health condition, e.g. "Hypertension"
        condition: String,

        /// Past adherence, from 0 to 1
        #[clap(short, long, default_value_t = 0.8)]
        past_adherence: f64,

        /// Activity level, from 1 to 100
        #[clap(short, long, default_value_t = 50)]
        activity_level: u32,
    },

    /// Show the configuration, or reset it
    Config {
        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
