//! Contact form submission state machine.
//!
//! `idle -> success | error` when a send completes, then back to `idle`
//! [`STATUS_RESET_DELAY`] later. A new submission cancels the reset still
//! pending from the previous one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use site_core::{Config, Timer, TimerHandle};
use tracing::{debug, error, info};

use crate::emailjs::{EmailSender, TemplateParams};
use crate::form::{ContactFormState, Field, FormErrors};

pub const STATUS_RESET_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Success,
    Error,
}

#[derive(Default)]
struct SubmitterState {
    form: ContactFormState,
    errors: FormErrors,
    status: SubmissionStatus,
    submitting: bool,
    generation: u64,
    pending_reset: Option<TimerHandle>,
}

fn lock(state: &Mutex<SubmitterState>) -> MutexGuard<'_, SubmitterState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct ContactFormSubmitter {
    sender: Arc<dyn EmailSender>,
    timer: Arc<dyn Timer>,
    destination: String,
    state: Arc<Mutex<SubmitterState>>,
}

/// Clears the submitting flag and arms the status reset however the send
/// ends, including when the submit future is dropped.
struct FinishGuard<'a> {
    submitter: &'a ContactFormSubmitter,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.submitter.state);
        state.submitting = false;
        self.submitter.schedule_reset(&mut state);
    }
}

impl ContactFormSubmitter {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        timer: Arc<dyn Timer>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            timer,
            destination: destination.into(),
            state: Arc::new(Mutex::new(SubmitterState::default())),
        }
    }

    /// Mail goes to `config.contact_email`.
    pub fn from_config(
        sender: Arc<dyn EmailSender>,
        timer: Arc<dyn Timer>,
        config: &Config,
    ) -> Self {
        Self::new(sender, timer, config.contact_email.clone())
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn form(&self) -> ContactFormState {
        lock(&self.state).form.clone()
    }

    pub fn errors(&self) -> FormErrors {
        lock(&self.state).errors.clone()
    }

    pub fn status(&self) -> SubmissionStatus {
        lock(&self.state).status
    }

    pub fn is_submitting(&self) -> bool {
        lock(&self.state).submitting
    }

    /// Update one field. A non-empty value clears that field's error.
    pub fn update_field(&self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let mut state = lock(&self.state);
        if !value.is_empty() {
            state.errors.clear(field);
        }
        state.form.set(field, value);
    }

    /// Validate `form` and, if it passes, send it.
    ///
    /// Returns the status after the attempt: unchanged when validation fails
    /// or another submission is still in flight, otherwise `Success` or
    /// `Error`.
    pub async fn submit(&self, form: ContactFormState) -> SubmissionStatus {
        let params = {
            let mut state = lock(&self.state);
            if state.submitting {
                debug!("Submission already in flight, ignoring");
                return state.status;
            }

            state.form = form;
            state.errors = state.form.validate();
            if !state.errors.is_empty() {
                info!(
                    invalid_fields = state.errors.len(),
                    "Contact form failed validation"
                );
                return state.status;
            }

            state.submitting = true;
            state.status = SubmissionStatus::Idle;
            state.generation += 1;
            if let Some(previous) = state.pending_reset.take() {
                previous.cancel();
            }

            TemplateParams::from_form(&state.form, &self.destination, local_timestamp())
        };

        let _finish = FinishGuard { submitter: self };

        let result = self.sender.send(&params).await;

        let mut state = lock(&self.state);
        state.status = match result {
            Ok(()) => {
                info!("Contact email sent");
                state.form.clear();
                SubmissionStatus::Success
            }
            Err(e) => {
                error!("EmailJS error: {}", e);
                SubmissionStatus::Error
            }
        };
        state.status
    }

    fn schedule_reset(&self, state: &mut SubmitterState) {
        let generation = state.generation;
        let shared = Arc::clone(&self.state);

        let handle = self.timer.schedule(
            STATUS_RESET_DELAY,
            Box::new(move || {
                let mut state = lock(&shared);
                if state.generation == generation {
                    state.status = SubmissionStatus::Idle;
                    state.pending_reset = None;
                }
            }),
        );

        if let Some(previous) = state.pending_reset.replace(handle) {
            previous.cancel();
        }
    }
}

/// Local wall-clock time, formatted like `1/2/2026, 3:04:05 PM`.
fn local_timestamp() -> String {
    chrono::Local::now()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
