//! CareVox elder-care assistant library
//!
//! This library keeps a calendar of appointments in a JSON file, announces
//! daily health reminders in the background, and serves canned caregiving
//! content (diet plans, medication suggestions, routines) through a spoken
//! notifier.

mod appointment;
mod care;
mod cli;
mod config;
mod errors;
mod helper;
mod reminder_scheduler;
mod session;
mod speech;
mod storage;
mod types;

// Re-export key components
pub use appointment::*;
pub use care::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use reminder_scheduler::*;
pub use session::*;
pub use speech::*;
pub use storage::*;
pub use types::*;
