use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::{
    load_appointments_from_file, write_json_atomically, Appointment, CareError, NewAppointment,
    Result,
};

/// Manages the backing file and the in-memory working copy of appointments.
///
/// Every mutation rewrites the whole file. There is no locking: two
/// processes writing the same file race and the last writer wins.
#[derive(Debug)]
pub struct AppointmentStore {
    /// Location of the backing file
    path: PathBuf,

    /// Working copy, in insertion order
    appointments: Vec<Appointment>,

    /// Id handed to the next added appointment, `None` once ids are exhausted
    next_id: Option<u64>,
}

impl AppointmentStore {
    /// Opens the store at `path`, loading whatever the backing file holds.
    ///
    /// A missing or unreadable file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Opening appointment store at {}", path.display());

        let mut store = Self {
            path,
            appointments: Vec::new(),
            next_id: Some(1),
        };
        store.reload();
        store
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the backing file.
    ///
    /// Never fails: a missing file and a corrupt file both read as an empty
    /// collection.
    pub fn load(&self) -> Vec<Appointment> {
        if !self.path.exists() {
            debug!("No appointment file yet at {}", self.path.display());
            return Vec::new();
        }

        match load_appointments_from_file(&self.path) {
            Ok(appointments) => appointments,
            Err(e) => {
                warn!(
                    "Ignoring unreadable appointment file {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replaces the working copy with the backing file's content and
    /// returns the number of appointments loaded
    pub fn reload(&mut self) -> usize {
        self.appointments = self.load();
        self.next_id = seed_next_id(&self.appointments);
        match self.next_id {
            Some(next_id) => debug!(
                "Loaded {} appointments, next id {}",
                self.appointments.len(),
                next_id
            ),
            None => warn!(
                "Appointment ids in {} are exhausted, new appointments will be refused",
                self.path.display()
            ),
        }
        self.appointments.len()
    }

    /// Overwrites the backing file with `appointments`.
    pub fn save(&self, appointments: &[Appointment]) -> Result<()> {
        debug!(
            "Saving {} appointments to {}",
            appointments.len(),
            self.path.display()
        );
        write_json_atomically(&self.path, appointments).map_err(|e| {
            error!("Failed to save appointments: {}", e);
            e
        })
    }

    /// Validates and appends a new appointment, then persists the collection.
    ///
    /// On a validation or write failure the working copy is left as it was.
    pub fn add(&mut self, new: NewAppointment) -> Result<Appointment> {
        new.validate()?;

        let id = self.next_id.ok_or_else(|| CareError::ApplicationError {
            message: "No appointment id left to assign".to_string(),
        })?;

        let appointment = new.into_appointment(id);
        self.appointments.push(appointment.clone());

        if let Err(e) = self.save(&self.appointments) {
            self.appointments.pop();
            return Err(e);
        }

        self.next_id = id.checked_add(1);
        info!(
            "Added appointment {}: {}",
            appointment.id,
            appointment.label()
        );
        Ok(appointment)
    }

    /// Removes the first appointment equal to `target` and persists the rest.
    ///
    /// When nothing matches, neither the working copy nor the file is touched.
    pub fn remove(&mut self, target: &Appointment) -> Result<Appointment> {
        let position = self
            .appointments
            .iter()
            .position(|appointment| appointment == target)
            .ok_or(CareError::AppointmentNotFound { id: target.id })?;

        self.remove_at(position)
    }

    /// Removes the first appointment carrying `id`
    pub fn remove_by_id(&mut self, id: u64) -> Result<Appointment> {
        let position = self
            .appointments
            .iter()
            .position(|appointment| appointment.id == id)
            .ok_or(CareError::AppointmentNotFound { id })?;

        self.remove_at(position)
    }

    fn remove_at(&mut self, position: usize) -> Result<Appointment> {
        let removed = self.appointments.remove(position);

        if let Err(e) = self.save(&self.appointments) {
            self.appointments.insert(position, removed);
            return Err(e);
        }

        info!("Removed appointment {}: {}", removed.id, removed.label());
        Ok(removed)
    }

    /// Appointments in insertion order
    pub fn list(&self) -> &[Appointment] {
        &self.appointments
    }

    /// First appointment carrying `id`
    pub fn get(&self, id: u64) -> Option<&Appointment> {
        self.appointments.iter().find(|appointment| appointment.id == id)
    }

    pub fn next_id(&self) -> Option<u64> {
        self.next_id
    }
}

// Ids only grow: seed past both the highest stored id and the count, so a
// store whose file already holds duplicates still hands out fresh ids.
fn seed_next_id(appointments: &[Appointment]) -> Option<u64> {
    let max_id = appointments.iter().map(|a| a.id).max().unwrap_or(0);
    max_id.max(appointments.len() as u64).checked_add(1)
}
