use std::{
    fs,
    io::Write,
    path::Path,
};

use chrono::{NaiveDate, NaiveTime};
use log::{debug, error, trace};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tempfile::NamedTempFile;

use crate::{Appointment, CareError, Result};

/// Clock format used by reminder trigger times, e.g. `08:00 AM`
pub const CLOCK_FORMAT: &str = "%I:%M %p";

/// Helper method to load the appointment collection from the backing file
pub fn load_appointments_from_file(path: &Path) -> Result<Vec<Appointment>> {
    debug!("Loading appointments from file: {}", path.display());
    let content = fs::read_to_string(path)?;

    let appointments: Vec<Appointment> = serde_json::from_str(&content)?;

    trace!("Successfully loaded {} appointments", appointments.len());
    Ok(appointments)
}

/// Serializes `value` as JSON indented with four spaces
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Replaces the file at `path` with `value` as pretty JSON.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a half-written file.
pub fn write_json_atomically<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        debug!("Creating parent directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            CareError::Io(e)
        })?;
    }

    let json = to_json_pretty(value)?;

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        CareError::Io(e)
    })?;

    temp_file.write_all(&json).map_err(|e| {
        error!("Failed to write to temporary file: {}", e);
        CareError::Io(e)
    })?;
    temp_file.flush()?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        CareError::Io(e.error)
    })?;

    trace!("Wrote {} bytes to {}", json.len(), path.display());
    Ok(())
}

/// Formats a time of day the way reminder tables spell it
pub fn format_clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

// clap value parser for appointment dates
pub fn parse_date(input: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date, expected YYYY-MM-DD", input))
}

// clap value parser for appointment times
pub fn parse_time(input: &str) -> std::result::Result<NaiveTime, String> {
    let input = input.trim();
    ["%H:%M", "%H:%M:%S", "%I:%M %p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| format!("'{}' is not a time, expected HH:MM or hh:mm AM/PM", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_clock_is_zero_padded() {
        let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert_eq!(format_clock(time), "08:00 AM");

        let time = NaiveTime::from_hms_opt(14, 5, 59).unwrap();
        assert_eq!(format_clock(time), "02:05 PM");
    }

    #[test]
    fn test_parse_time_accepts_common_formats() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_time("09:00").unwrap(), nine);
        assert_eq!(parse_time("09:00:00").unwrap(), nine);
        assert_eq!(parse_time("09:00 AM").unwrap(), nine);
        assert!(parse_time("nine o'clock").is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2024-05-01").is_ok());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("tomorrow").is_err());
    }

    #[test]
    fn test_write_json_atomically_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("data.json");

        write_json_atomically(&path, &vec![1, 2, 3]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[\n    1,\n    2,\n    3\n]");
    }
}
