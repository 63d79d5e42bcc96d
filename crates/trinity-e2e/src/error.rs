// Error types for trinity-e2e
//
// Every failure except a skipped fixture row is fatal to the run. Variants
// carry the widget, selector, or actor involved so a halted run can be
// resumed from the log alone.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for trinity-e2e operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the application
#[derive(Debug, Error)]
pub enum Error {
    /// The widget trigger never became visible and enabled.
    #[error("Widget '{widget}' was not interactable after {waited:?} (selecting '{text}')")]
    ElementNotInteractable {
        widget: String,
        text: String,
        waited: Duration,
    },

    /// None of the option surface candidates appeared after opening the widget.
    #[error("No option surface appeared for widget '{widget}' after {waited:?} (selecting '{text}')")]
    SurfaceNotFound {
        widget: String,
        text: String,
        waited: Duration,
    },

    /// No rendered option contained the requested text.
    #[error("Widget '{widget}' has no option containing '{text}'. Options seen: {seen:?}")]
    OptionNotFound {
        widget: String,
        text: String,
        seen: Vec<String>,
    },

    /// The option surface was still visible after the close sequence.
    #[error("Option surface of widget '{widget}' did not close after selecting '{text}'")]
    SurfaceDidNotClose { widget: String, text: String },

    /// The trigger label never showed the selected value.
    #[error("Widget '{widget}' label is '{label}', expected it to contain '{text}'")]
    SelectionNotReflected {
        widget: String,
        text: String,
        label: String,
    },

    /// An awaited asynchronous data load never signalled success.
    #[error("Data load '{signal}' did not complete for widget '{widget}': {reason}")]
    DataLoadTimeout {
        widget: String,
        signal: String,
        reason: String,
    },

    /// The submission loop exhausted its attempt budget.
    #[error("'{action}' did not reach '{condition}' after {attempts} attempt(s)")]
    SubmissionFailed {
        action: String,
        condition: String,
        attempts: u32,
    },

    /// Login request returned a non-success status.
    #[error("Authentication failed for '{username}' with status {status}")]
    AuthenticationFailed { username: String, status: u16 },

    /// Login succeeded but the response lacked a required field.
    #[error("Login response for '{username}' is missing '{field}': {body}")]
    MalformedAuthResponse {
        username: String,
        field: String,
        body: String,
    },

    /// Record creation through the API was rejected.
    #[error("API rejected record with status {status}: {body}")]
    RecordRejected { status: u16, body: String },

    /// A fixture row had no value for the grouping column.
    ///
    /// Only ever logged: the transformer skips such rows.
    #[error("Row {row} has no value for grouping column '{column}'")]
    GroupingKeyMissing { row: usize, column: String },

    /// A work item lacks a field the workflow needs.
    #[error("Work item #{ordinal} is missing field '{field}'")]
    MissingField { field: String, ordinal: usize },

    /// A fixture value could not be interpreted.
    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidFixtureValue {
        field: String,
        value: String,
        reason: String,
    },

    /// An element needed for a geometric or attribute read is absent.
    #[error("Element not found: selector '{0}'")]
    ElementNotFound(String),

    /// A polling expectation on the UI timed out.
    #[error("Assertion timeout: {0}")]
    AssertionTimeout(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A run stopped at a specific actor and row.
    #[error("Run halted at actor '{actor}' row {row}: {source}")]
    RunHalted {
        actor: String,
        row: usize,
        #[source]
        source: Box<Error>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL construction error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Browser automation error
    #[cfg(feature = "browser")]
    #[error("Browser error: {0}")]
    Browser(#[from] playwright_rs::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, looking through `Context` and `RunHalted`.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context(_, inner) => inner.root(),
            Error::RunHalted { source, .. } => source.root(),
            other => other,
        }
    }
}
