//! CLI module for the carevox application
//!
//! This module handles the command-line interface: it plays the role of the
//! menu a caregiver or senior clicks through, turning each subcommand into
//! session operations and printing the result.
use std::{
    io::{stdin, stdout, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use console::style;
use log::{debug, info};
use tokio::sync::Mutex;

use crate::{
    diet_conditions, diet_plan, medication_conditions, medication_suggestion, play_routine,
    predict_adherence, Adherence, Appointment, CareError, Commands, Config, Feature, NewAppointment, Result,
    Routine, Session,
};

/// CLI Application handler - processes CLI commands and interfaces with the session
pub struct App {
    /// The user's session
    session: Arc<Mutex<Session>>,

    /// Application configuration
    config: Config,

    /// Where the configuration is stored
    config_path: PathBuf,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given session and config
    pub fn new(session: Session, config: Config, config_path: PathBuf, verbose: bool) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            config,
            config_path,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        debug!("Running command: {:?}", command);

        match command {
            Commands::Dashboard => self.show_dashboard().await,

            Commands::Add {
                title,
                date,
                time,
                details,
            } => {
                let new = NewAppointment::new(
                    title,
                    date.format("%Y-%m-%d").to_string(),
                    time.format("%H:%M").to_string(),
                    details,
                );
                self.add_appointment(new).await
            }

            Commands::List { json } => self.list_appointments(json).await,

            Commands::Remove { id, force } => self.handle_remove(id, force).await,

            Commands::Reminders => self.run_reminders().await,

            Commands::Routine { routine, speak } => self.show_routine(routine, speak).await,

            Commands::Diet { condition } => self.recommend_diet(&condition).await,

            Commands::Medication {
                condition,
                past_adherence,
                activity_level,
            } => {
                self.check_medication(&condition, past_adherence, activity_level)
                    .await
            }

            Commands::Config { reset } => self.handle_config(reset),
        }
    }

    async fn show_dashboard(&self) -> Result<()> {
        let mut session = self.session.lock().await;

        println!("{}", style("CareVox").bold());
        println!("A smart voice for golden years.\n");
        println!("{}", Feature::Dashboard.intro());

        let count = session.appointments().len();
        println!(
            "\nYou have {} appointment{} scheduled.",
            count,
            if count == 1 { "" } else { "s" }
        );

        session.navigate(Feature::Dashboard);
        Ok(())
    }

    async fn add_appointment(&self, new: NewAppointment) -> Result<()> {
        let mut session = self.session.lock().await;
        session.navigate(Feature::Calendar);

        let appointment = session.add_appointment(new)?;

        println!("{}", style("Appointment added successfully!").green());
        if self.verbose {
            println!("ID: {} | {}", appointment.id, appointment.label());
        }
        Ok(())
    }

    async fn list_appointments(&self, json: bool) -> Result<()> {
        let mut session = self.session.lock().await;

        if json {
            println!("{}", serde_json::to_string_pretty(session.appointments())?);
            return Ok(());
        }

        session.navigate(Feature::Calendar);
        self.display_appointments_text(session.appointments());
        Ok(())
    }

    /// Display appointments in text format
    fn display_appointments_text(&self, appointments: &[Appointment]) {
        if appointments.is_empty() {
            println!("No appointments scheduled.");
            return;
        }

        println!("{}", style("Your Appointments:").bold());
        for appointment in appointments {
            println!(
                "[{}] {} - {} at {}",
                appointment.id,
                style(&appointment.title).bold(),
                appointment.date,
                appointment.time
            );
            if !appointment.details.is_empty() {
                println!("    {}", style(&appointment.details).dim());
            }
            println!("---");
        }
    }

    async fn handle_remove(&self, id: u64, force: bool) -> Result<()> {
        // Step 1: Fetch the appointment (to verify it exists and show details in the prompt)
        let appointment = {
            let mut session = self.session.lock().await;
            session.navigate(Feature::Calendar);

            match session.store().get(id) {
                Some(appointment) => appointment.clone(),
                None => return Err(CareError::AppointmentNotFound { id }),
            }
        };

        // Step 2: Prompt for confirmation unless forced, without holding the session
        if !force {
            println!("You are about to remove the following appointment:");
            println!("ID:      {}", appointment.id);
            println!("Title:   {}", appointment.title);
            println!("When:    {} at {}", appointment.date, appointment.time);
            if !appointment.details.is_empty() {
                println!("Details: {}", appointment.details);
            }

            print!("\nAre you sure you want to remove this appointment? [y/N]: ");
            stdout().flush()?;

            let confirmed = tokio::task::spawn_blocking(|| read_confirmation(&mut stdin().lock()))
                .await
                .map_err(|e| CareError::ApplicationError {
                    message: format!("Failed to read confirmation: {}", e),
                })??;

            if !confirmed {
                println!("Removal cancelled.");
                return Ok(());
            }
        }

        // Step 3: Remove and report
        self.session.lock().await.remove_appointment(&appointment)?;
        println!("{}", style("Appointment removed successfully!").green());
        Ok(())
    }

    async fn run_reminders(&self) -> Result<()> {
        {
            let mut session = self.session.lock().await;
            session.navigate(Feature::DailyRoutines);
            session.activate_reminders()?;
        }

        println!(
            "Daily reminders active ({} entries). Press Ctrl-C to stop.",
            self.config.health_alerts.len()
        );
        tokio::signal::ctrl_c().await?;
        info!("Interrupt received");

        let mut session = self.session.lock().await;
        let status = session.reminder_status();
        session.deactivate_reminders().await?;

        println!(
            "\nReminders stopped after announcing {} reminder{}.",
            status.reminders_fired,
            if status.reminders_fired == 1 { "" } else { "s" }
        );
        Ok(())
    }

    async fn show_routine(&self, routine: Routine, speak: bool) -> Result<()> {
        let mut session = self.session.lock().await;
        session.navigate(Feature::DailyRoutines);

        println!("Here is your {}", style(routine.name()).bold());
        for activity in routine.activities() {
            println!("{} {}", style("✓").green(), activity);
        }

        if speak {
            play_routine(routine, session.notifier());
        }
        Ok(())
    }

    async fn recommend_diet(&self, condition: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        session.navigate(Feature::DietRecommendations);

        let recommendation = diet_plan(condition);
        println!(
            "{} {}",
            style(format!("Recommended Diet Plan for {}:", condition)).green(),
            recommendation
        );
        if self.verbose {
            let known: Vec<&str> = diet_conditions().collect();
            println!("Known conditions: {}", known.join(", "));
        }

        session.say(&format!("For {}, {}", condition, recommendation));
        Ok(())
    }

    async fn check_medication(
        &self,
        condition: &str,
        past_adherence: f64,
        activity_level: u32,
    ) -> Result<()> {
        let mut session = self.session.lock().await;
        session.navigate(Feature::MedicationReminder);

        let adherence = predict_adherence(past_adherence, activity_level)?;
        let medication = medication_suggestion(condition).map_err(|e| {
            let known: Vec<&str> = medication_conditions().collect();
            CareError::ApplicationError {
                message: format!("{} (known conditions: {})", e, known.join(", ")),
            }
        })?;

        println!("{}", style(format!("Prediction: {}", adherence.describe())).green());
        println!("Recommended Medication: {}", medication);

        session.say(&medication_announcement(adherence, medication));
        Ok(())
    }

    fn handle_config(&self, reset: bool) -> Result<()> {
        if reset {
            Config::default().save(&self.config_path)?;
            println!(
                "Configuration reset to defaults at {}",
                self.config_path.display()
            );
            return Ok(());
        }

        println!("# {}", self.config_path.display());
        println!("{}", serde_json::to_string_pretty(&self.config)?);
        Ok(())
    }
}

fn medication_announcement(adherence: Adherence, medication: &str) -> String {
    format!(
        "Based on your input, you are {}. Recommended medication: {}",
        adherence.describe(),
        medication
    )
}

/// Reads a yes/no answer; anything but `y` or `yes` counts as no
fn read_confirmation(input: &mut impl BufRead) -> Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use clap::Parser;

    use crate::Cli;

    #[test]
    fn test_confirmation_accepts_yes_only() {
        for (answer, expected) in [
            ("y\n", true),
            ("YES\n", true),
            ("  yes  \n", true),
            ("n\n", false),
            ("\n", false),
            ("yep\n", false),
            ("", false),
        ] {
            let confirmed = read_confirmation(&mut Cursor::new(answer)).unwrap();
            assert_eq!(confirmed, expected, "answer {:?}", answer);
        }
    }

    #[test]
    fn test_medication_announcement_keeps_prediction_wording() {
        assert_eq!(
            medication_announcement(Adherence::Likely, "Metformin or Insulin"),
            "Based on your input, you are Likely to adhere. Recommended medication: Metformin or Insulin"
        );
    }

    #[test]
    fn test_config_command_only_takes_reset() {
        let cli = Cli::try_parse_from(["carevox", "config", "--reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { reset: true }));

        let cli = Cli::try_parse_from(["carevox", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { reset: false }));

        assert!(Cli::try_parse_from(["carevox", "config", "--show"]).is_err());
    }
}
