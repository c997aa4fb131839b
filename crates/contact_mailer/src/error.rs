use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Mail configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MailError>;
