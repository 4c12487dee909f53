//! Spoken notifications.
//!
//! Everything the assistant says goes through a [`Notifier`]. Speaking is
//! best effort: failures are logged and never reach the caller.
use std::{
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::Duration,
};

use log::{debug, info, trace, warn};

use crate::{CareError, Config, Result};

/// Poll period while waiting for an utterance to finish
const PLAYBACK_POLL: Duration = Duration::from_millis(50);

/// Renders text audibly (or the closest thing available).
pub trait Notifier: Send + Sync {
    /// Speaks `text`. Must not panic and must not report failure upward.
    fn notify(&self, text: &str);
}

/// Speaks through an external text-to-speech program.
///
/// Only one utterance plays at a time: a new call kills whatever is still
/// playing, whichever thread started it.
pub struct SpeechNotifier {
    program: String,
    args: Vec<String>,
    current: Mutex<Option<Child>>,
}

impl SpeechNotifier {
    /// Builds a notifier from a shell-style command line such as `espeak -s 140`.
    /// The text to speak is passed as the final argument.
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = shell_words::split(command_line).map_err(|e| CareError::ConfigError {
            message: format!("Failed to parse speech command: {}", e),
        })?;

        if parts.is_empty() {
            return Err(CareError::ConfigError {
                message: "Empty speech command".to_string(),
            });
        }

        let program = parts.remove(0);
        debug!("Speech engine: {} {:?}", program, parts);

        Ok(Self {
            program,
            args: parts,
            current: Mutex::new(None),
        })
    }

    fn slot(&self) -> MutexGuard<'_, Option<Child>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn interrupt_current(slot: &mut Option<Child>) {
        if let Some(mut child) = slot.take() {
            if let Ok(None) = child.try_wait() {
                debug!("Interrupting utterance (pid {})", child.id());
                if let Err(e) = child.kill() {
                    warn!("Failed to stop previous utterance: {}", e);
                }
            }
            let _ = child.wait();
        }
    }

    // Blocks until our utterance ends or another call replaces it.
    fn wait_for(&self, pid: u32) {
        loop {
            {
                let mut slot = self.slot();
                match slot.as_mut() {
                    Some(child) if child.id() == pid => match child.try_wait() {
                        Ok(Some(status)) => {
                            if !status.success() {
                                warn!("Speech engine exited with {}", status);
                            }
                            slot.take();
                            return;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Lost track of speech engine: {}", e);
                            slot.take();
                            return;
                        }
                    },
                    _ => {
                        trace!("Utterance {} was interrupted", pid);
                        return;
                    }
                }
            }
            thread::sleep(PLAYBACK_POLL);
        }
    }
}

impl Notifier for SpeechNotifier {
    fn notify(&self, text: &str) {
        info!("Speaking: {}", text);

        let pid = {
            let mut slot = self.slot();
            Self::interrupt_current(&mut slot);

            let spawned = Command::new(&self.program)
                .args(&self.args)
                .arg(text)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(child) => {
                    let pid = child.id();
                    *slot = Some(child);
                    pid
                }
                Err(e) => {
                    warn!("Error in text-to-speech: {}", e);
                    return;
                }
            }
        };

        self.wait_for(pid);
    }
}

impl Drop for SpeechNotifier {
    fn drop(&mut self) {
        let slot = self
            .current
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self::interrupt_current(slot);
    }
}

/// Prints what would have been spoken. Used when speech is off or no engine exists.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, text: &str) {
        info!("Announcement: {}", text);
        println!("{} {}", console::style("»").cyan().bold(), console::style(text).italic());
    }
}

/// Keeps every message in memory. Handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, text: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(text.to_string());
        }
    }
}

/// Picks the notifier matching the configuration
pub fn notifier_from_config(config: &Config) -> Arc<dyn Notifier> {
    if !config.speech_enabled {
        debug!("Speech disabled, announcements go to the console");
        return Arc::new(ConsoleNotifier);
    }

    match config.get_speech_command() {
        Some(command) => match SpeechNotifier::new(&command) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!("{}; falling back to console announcements", e);
                Arc::new(ConsoleNotifier)
            }
        },
        None => {
            warn!("No text-to-speech engine found; falling back to console announcements");
            Arc::new(ConsoleNotifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_command_is_split_like_a_shell() {
        let notifier = SpeechNotifier::new("espeak -v 'en-us' -s 140").unwrap();
        assert_eq!(notifier.program, "espeak");
        assert_eq!(notifier.args, vec!["-v", "en-us", "-s", "140"]);
    }

    #[test]
    fn test_empty_speech_command_is_rejected() {
        assert!(matches!(
            SpeechNotifier::new("   "),
            Err(CareError::ConfigError { .. })
        ));
        assert!(matches!(
            SpeechNotifier::new("say 'unterminated"),
            Err(CareError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_engine_does_not_panic() {
        let notifier = SpeechNotifier::new("carevox-no-such-tts-engine").unwrap();
        notifier.notify("Hello");
        assert!(notifier.slot().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_notify_waits_for_playback() {
        let notifier = SpeechNotifier::new("true").unwrap();
        notifier.notify("Drink water");
        assert!(notifier.slot().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_message_interrupts_previous_one() {
        let notifier = Arc::new(SpeechNotifier::new("sleep").unwrap());

        let long = {
            let notifier = Arc::clone(&notifier);
            thread::spawn(move || notifier.notify("30"))
        };
        thread::sleep(Duration::from_millis(200));

        let started = std::time::Instant::now();
        notifier.notify("0");
        long.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_drop_stops_utterance_in_flight() {
        let notifier = SpeechNotifier::new("sleep").unwrap();
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        *notifier.slot() = Some(child);

        let started = std::time::Instant::now();
        drop(notifier);

        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("first");
        notifier.notify("second");
        assert_eq!(notifier.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_disabled_speech_uses_console() {
        let config = Config {
            speech_enabled: false,
            speech_command: Some("carevox-no-such-tts-engine".to_string()),
            ..Config::default()
        };
        // Any notifier is fine as long as choosing one does not fail.
        notifier_from_config(&config).notify("hello");
    }
}
