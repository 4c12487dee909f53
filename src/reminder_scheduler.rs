// src/reminder_scheduler.rs - Daily reminder dispatcher
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveTime};
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::{format_clock, CareError, Notifier, Result, CLOCK_FORMAT};

/// One line of the daily reminder table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEntry {
    /// Time of day as the clock shows it, e.g. `08:00 AM`
    pub trigger_time: String,
    /// What to say when the time comes
    pub message: String,
}

impl ReminderEntry {
    pub fn new(trigger_time: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            trigger_time: trigger_time.into(),
            message: message.into(),
        }
    }
}

/// Validated, ordered reminder table.
///
/// Trigger times are compared to the clock by string equality, so every
/// entry must be spelled exactly the way the clock is formatted.
#[derive(Debug, Clone, Default)]
pub struct ReminderTable {
    entries: Vec<ReminderEntry>,
}

impl ReminderTable {
    pub fn new(entries: Vec<ReminderEntry>) -> Result<Self> {
        for entry in &entries {
            let canonical = NaiveTime::parse_from_str(&entry.trigger_time, CLOCK_FORMAT)
                .map(format_clock)
                .ok();

            if canonical.as_deref() != Some(entry.trigger_time.as_str()) {
                return Err(CareError::InvalidTriggerTime {
                    value: entry.trigger_time.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReminderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages of every entry set for `clock_reading`, in table order
    pub fn due<'a>(&'a self, clock_reading: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.trigger_time == clock_reading)
            .map(|entry| entry.message.as_str())
    }
}

/// Source of the current time of day
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Local wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    time: Mutex<NaiveTime>,
}

impl ManualClock {
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    pub fn set(&self, time: NaiveTime) {
        *self.time.lock().unwrap_or_else(|p| p.into_inner()) = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveTime {
        *self.time.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReminderDispatcherStatus {
    /// Whether the dispatcher loop is running
    pub is_running: bool,
    /// The last clock reading the table was scanned for
    pub last_scanned_minute: Option<String>,
    /// Number of reminders announced since start
    pub reminders_fired: u64,
}

#[derive(Debug, Clone)]
pub enum ReminderCommand {
    /// Scan the table immediately
    CheckNow,
    /// Stop the dispatcher
    Stop,
}

// State shared between the dispatcher handle and its task
struct DispatchContext {
    table: ReminderTable,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    status: Mutex<ReminderDispatcherStatus>,
}

impl DispatchContext {
    fn status(&self) -> MutexGuard<'_, ReminderDispatcherStatus> {
        self.status.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Announces every reminder due at the current minute and returns how many.
    ///
    /// A minute already scanned is skipped, so two scans within one minute
    /// announce nothing twice.
    fn scan(&self) -> usize {
        let reading = format_clock(self.clock.now());

        {
            let mut status = self.status();
            if status.last_scanned_minute.as_deref() == Some(reading.as_str()) {
                trace!("Already scanned {}", reading);
                return 0;
            }
            status.last_scanned_minute = Some(reading.clone());
        }

        let mut fired = 0;
        for message in self.table.due(&reading) {
            debug!("Reminder due at {}: {}", reading, message);
            self.notifier.notify(message);
            fired += 1;
        }

        if fired > 0 {
            self.status().reminders_fired += fired as u64;
            info!("Announced {} reminder(s) for {}", fired, reading);
        }
        fired
    }
}

/// Background task that speaks the reminder table as the day goes by.
///
/// Once started it wakes every `interval`, reads the clock and announces
/// the entries whose trigger time matches. Reminders whose minute passes
/// while the dispatcher is not running are never announced.
pub struct ReminderDispatcher {
    /// Interval between two scans
    interval: Duration,

    /// Table, clock, notifier and status, shared with the task
    context: Arc<DispatchContext>,

    /// Channel to send commands to the dispatcher task
    command_tx: Option<mpsc::Sender<ReminderCommand>>,

    /// Handle to the dispatcher task
    dispatcher_task: Option<JoinHandle<()>>,
}

impl ReminderDispatcher {
    /// Create a dispatcher reading the local wall clock
    pub fn new(table: ReminderTable, interval: Duration, notifier: Arc<dyn Notifier>) -> Self {
        info!(
            "Initializing reminder dispatcher with {} entries every {:?}",
            table.len(),
            interval
        );

        Self {
            interval,
            context: Arc::new(DispatchContext {
                table,
                notifier,
                clock: Arc::new(SystemClock),
                status: Mutex::new(ReminderDispatcherStatus::default()),
            }),
            command_tx: None,
            dispatcher_task: None,
        }
    }

    /// Replace the clock. Only takes effect before `start`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        match Arc::get_mut(&mut self.context) {
            Some(context) => context.clock = clock,
            None => warn!("Dispatcher already started, keeping its clock"),
        }
        self
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Start the dispatcher loop on the current tokio runtime
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(CareError::SchedulerError {
                message: "Reminder dispatcher is already running".to_string(),
            });
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            error!("Cannot start reminder dispatcher: {}", e);
            CareError::SchedulerError {
                message: format!("No async runtime available: {}", e),
            }
        })?;

        info!("Starting reminder dispatcher...");
        let (command_tx, mut command_rx) = mpsc::channel(10);
        self.command_tx = Some(command_tx);

        let period = self.interval;
        let context = Arc::clone(&self.context);

        let task = runtime.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        run_scan(&context).await;
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(ReminderCommand::CheckNow) => {
                            run_scan(&context).await;
                        }
                        Some(ReminderCommand::Stop) | None => {
                            info!("Reminder dispatcher stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.dispatcher_task = Some(task);
        self.context.status().is_running = true;

        Ok(())
    }

    /// Stop the dispatcher if it's running and wait for its task to end
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.dispatcher_task.take() {
            if let Some(command_tx) = self.command_tx.take() {
                if let Err(e) = command_tx.send(ReminderCommand::Stop).await {
                    debug!("Dispatcher task already gone: {}", e);
                }
            }

            self.context.status().is_running = false;

            if let Err(e) = task.await {
                let error_msg = format!("Failed to stop reminder dispatcher: {}", e);
                error!("{}", error_msg);
                return Err(CareError::SchedulerError { message: error_msg });
            }

            info!("Reminder dispatcher stopped");
        } else {
            debug!("Reminder dispatcher is not running");
        }

        Ok(())
    }

    /// Scan the table now, regardless of the interval
    pub async fn check_now(&self) -> Result<()> {
        let command_tx = match (&self.command_tx, self.is_running()) {
            (Some(command_tx), true) => command_tx,
            _ => {
                return Err(CareError::SchedulerError {
                    message: "Reminder dispatcher is not running".to_string(),
                })
            }
        };

        command_tx
            .send(ReminderCommand::CheckNow)
            .await
            .map_err(|e| CareError::SchedulerError {
                message: format!("Failed to send check command: {}", e),
            })
    }

    /// Get the current status of the dispatcher
    pub fn status(&self) -> ReminderDispatcherStatus {
        let mut status = self.context.status().clone();
        status.is_running = self.is_running();
        status
    }
}

// Speaking blocks until the utterance ends, so scans run off the async workers.
async fn run_scan(context: &Arc<DispatchContext>) {
    let context = Arc::clone(context);
    if let Err(e) = tokio::task::spawn_blocking(move || context.scan()).await {
        error!("Reminder scan failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingNotifier;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn water_table() -> ReminderTable {
        ReminderTable::new(vec![ReminderEntry::new("08:00 AM", "Drink water")]).unwrap()
    }

    fn context(table: ReminderTable, clock: Arc<ManualClock>) -> (DispatchContext, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let context = DispatchContext {
            table,
            notifier: notifier.clone(),
            clock,
            status: Mutex::new(ReminderDispatcherStatus::default()),
        };
        (context, notifier)
    }

    #[test]
    fn test_table_rejects_times_the_clock_never_shows() {
        for bad in ["8:00 AM", "08:00", "13:00 PM", "08:00 am", "noon"] {
            let result = ReminderTable::new(vec![ReminderEntry::new(bad, "x")]);
            assert!(
                matches!(result, Err(CareError::InvalidTriggerTime { ref value }) if value == bad),
                "{} should be rejected",
                bad
            );
        }
        assert!(ReminderTable::new(vec![ReminderEntry::new("12:30 PM", "Lunch")]).is_ok());
    }

    #[test]
    fn test_due_returns_all_matches_in_order() {
        let table = ReminderTable::new(vec![
            ReminderEntry::new("02:00 PM", "Afternoon hydration break."),
            ReminderEntry::new("08:00 AM", "Drink water"),
            ReminderEntry::new("02:00 PM", "Afternoon medication reminder."),
        ])
        .unwrap();

        let due: Vec<&str> = table.due("02:00 PM").collect();
        assert_eq!(
            due,
            vec!["Afternoon hydration break.", "Afternoon medication reminder."]
        );
        assert_eq!(table.due("02:01 PM").count(), 0);
    }

    #[test]
    fn test_scan_fires_once_per_minute() {
        let clock = Arc::new(ManualClock::new(at(8, 0)));
        let (context, notifier) = context(water_table(), clock.clone());

        assert_eq!(context.scan(), 1);
        assert_eq!(context.scan(), 0);

        clock.set(at(8, 1));
        assert_eq!(context.scan(), 0);

        assert_eq!(notifier.messages(), vec!["Drink water"]);
        assert_eq!(context.status().reminders_fired, 1);
        assert_eq!(context.status().last_scanned_minute.as_deref(), Some("08:01 AM"));
    }

    #[test]
    fn test_same_time_next_day_fires_again() {
        let clock = Arc::new(ManualClock::new(at(8, 0)));
        let (context, notifier) = context(water_table(), clock.clone());

        context.scan();
        clock.set(at(20, 0));
        context.scan();
        clock.set(at(8, 0));
        context.scan();

        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatcher_announces_due_reminder_and_stops() {
        let clock = Arc::new(ManualClock::new(at(8, 0)));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dispatcher =
            ReminderDispatcher::new(water_table(), Duration::from_millis(10), notifier.clone())
                .with_clock(clock.clone());

        dispatcher.start().unwrap();
        assert!(dispatcher.is_running());

        time::sleep(Duration::from_millis(100)).await;
        clock.set(at(8, 1));
        time::sleep(Duration::from_millis(100)).await;

        dispatcher.stop().await.unwrap();

        assert!(!dispatcher.is_running());
        assert_eq!(notifier.messages(), vec!["Drink water"]);

        let status = dispatcher.status();
        assert!(!status.is_running);
        assert_eq!(status.reminders_fired, 1);
    }

    #[tokio::test]
    async fn test_stopped_dispatcher_stays_silent() {
        let clock = Arc::new(ManualClock::new(at(7, 59)));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dispatcher =
            ReminderDispatcher::new(water_table(), Duration::from_millis(10), notifier.clone())
                .with_clock(clock.clone());

        dispatcher.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;
        dispatcher.stop().await.unwrap();

        clock.set(at(8, 0));
        time::sleep(Duration::from_millis(50)).await;

        assert!(notifier.messages().is_empty());
        assert!(dispatcher.check_now().await.is_err());
    }

    #[tokio::test]
    async fn test_check_now_scans_between_ticks() {
        let clock = Arc::new(ManualClock::new(at(7, 59)));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dispatcher =
            ReminderDispatcher::new(water_table(), Duration::from_secs(3600), notifier.clone())
                .with_clock(clock.clone());

        dispatcher.start().unwrap();
        time::sleep(Duration::from_millis(50)).await;

        clock.set(at(8, 0));
        dispatcher.check_now().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;

        dispatcher.stop().await.unwrap();
        assert_eq!(notifier.messages(), vec!["Drink water"]);
    }

    #[tokio::test]
    async fn test_second_start_is_refused() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dispatcher =
            ReminderDispatcher::new(water_table(), Duration::from_secs(60), notifier);

        dispatcher.start().unwrap();
        assert!(matches!(
            dispatcher.start(),
            Err(CareError::SchedulerError { .. })
        ));
        dispatcher.stop().await.unwrap();
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dispatcher =
            ReminderDispatcher::new(water_table(), Duration::from_secs(60), notifier);

        assert!(matches!(
            dispatcher.start(),
            Err(CareError::SchedulerError { .. })
        ));
    }
}
