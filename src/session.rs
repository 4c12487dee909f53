//! Per-session context.
//!
//! A [`Session`] owns everything one interactive user session needs: the
//! appointment store, the notifier, which feature intros were already
//! spoken, and the reminder dispatcher once it has been activated.
use std::{collections::HashMap, sync::Arc};

use log::{debug, info};

use crate::{
    Appointment, AppointmentStore, Config, Feature, NewAppointment, Notifier, ReminderDispatcher,
    ReminderDispatcherStatus, ReminderTable, Result,
};

/// Spoken once the reminder dispatcher is running
pub const REMINDERS_ACTIVATED: &str =
    "Daily voice reminders activated. I'll help you stay on track with your health routine.";

pub struct Session {
    store: AppointmentStore,
    notifier: Arc<dyn Notifier>,
    reminder_table: ReminderTable,
    reminder_interval: std::time::Duration,

    /// Features whose intro has been spoken since they were last entered
    intro_spoken: HashMap<Feature, bool>,
    current_feature: Option<Feature>,

    reminders: Option<ReminderDispatcher>,
}

impl Session {
    /// Opens a session with the store and reminder settings from `config`
    pub fn open(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let reminder_table = config.reminder_table()?;
        let store = AppointmentStore::open(&config.appointments_file);

        Ok(Self::with_store(store, notifier, reminder_table, config.reminder_interval()))
    }

    pub fn with_store(
        store: AppointmentStore,
        notifier: Arc<dyn Notifier>,
        reminder_table: ReminderTable,
        reminder_interval: std::time::Duration,
    ) -> Self {
        debug!(
            "Session opened with {} appointments",
            store.list().len()
        );

        Self {
            store,
            notifier,
            reminder_table,
            reminder_interval,
            intro_spoken: Feature::ALL.iter().map(|f| (*f, false)).collect(),
            current_feature: None,
            reminders: None,
        }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Speaks through the session's notifier
    pub fn say(&self, text: &str) {
        self.notifier.notify(text);
    }

    /// Enters `feature`, speaking its intro unless it was already spoken
    /// since the user last switched to it
    pub fn navigate(&mut self, feature: Feature) {
        if self.current_feature != Some(feature) {
            self.intro_spoken.insert(feature, false);
            self.current_feature = Some(feature);
        }

        let spoken = self.intro_spoken.entry(feature).or_insert(false);
        if !*spoken {
            *spoken = true;
            self.notifier.notify(feature.intro());
        }
    }

    pub fn current_feature(&self) -> Option<Feature> {
        self.current_feature
    }

    pub fn appointments(&self) -> &[Appointment] {
        self.store.list()
    }

    pub fn store(&self) -> &AppointmentStore {
        &self.store
    }

    /// Adds an appointment and confirms it aloud
    pub fn add_appointment(&mut self, new: NewAppointment) -> Result<Appointment> {
        let appointment = self.store.add(new)?;
        self.notifier.notify(&format!(
            "Your appointment for {} has been added.",
            appointment.title
        ));
        Ok(appointment)
    }

    /// Removes the first appointment equal to `target` and confirms it aloud
    pub fn remove_appointment(&mut self, target: &Appointment) -> Result<Appointment> {
        let removed = self.store.remove(target)?;
        self.notifier.notify("Your appointment has been removed.");
        Ok(removed)
    }

    pub fn remove_appointment_by_id(&mut self, id: u64) -> Result<Appointment> {
        let removed = self.store.remove_by_id(id)?;
        self.notifier.notify("Your appointment has been removed.");
        Ok(removed)
    }

    /// Starts the daily reminders. Does nothing if they are already running.
    pub fn activate_reminders(&mut self) -> Result<()> {
        if self.reminders.as_ref().is_some_and(|d| d.is_running()) {
            info!("Daily reminders already active");
            return Ok(());
        }

        let mut dispatcher = ReminderDispatcher::new(
            self.reminder_table.clone(),
            self.reminder_interval,
            Arc::clone(&self.notifier),
        );
        dispatcher.start()?;
        self.reminders = Some(dispatcher);

        self.notifier.notify(REMINDERS_ACTIVATED);
        Ok(())
    }

    /// Starts the daily reminders with a prepared dispatcher
    pub fn activate_reminders_with(&mut self, mut dispatcher: ReminderDispatcher) -> Result<()> {
        if self.reminders.as_ref().is_some_and(|d| d.is_running()) {
            info!("Daily reminders already active");
            return Ok(());
        }

        if !dispatcher.is_running() {
            dispatcher.start()?;
        }
        self.reminders = Some(dispatcher);

        self.notifier.notify(REMINDERS_ACTIVATED);
        Ok(())
    }

    pub async fn deactivate_reminders(&mut self) -> Result<()> {
        if let Some(mut dispatcher) = self.reminders.take() {
            dispatcher.stop().await?;
        }
        Ok(())
    }

    pub fn reminder_status(&self) -> ReminderDispatcherStatus {
        self.reminders
            .as_ref()
            .map(ReminderDispatcher::status)
            .unwrap_or_default()
    }
}
