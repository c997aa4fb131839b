//! contact_mailer - Contact form flow for the portfolio site
//!
//! - `form` - form fields, per-field errors and validation
//! - `emailjs` - the email delivery client
//! - `submitter` - submission state machine with the timed status reset

pub mod emailjs;
pub mod error;
pub mod form;
pub mod submitter;

pub use emailjs::{EmailJsClient, EmailSender, TemplateParams};
pub use error::{MailError, Result};
pub use form::{ContactFormState, Field, FormErrors};
pub use submitter::{ContactFormSubmitter, SubmissionStatus, STATUS_RESET_DELAY};
