use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Field-level messages keyed by form field name (`amount`, `reference`, `tips.<id>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ShopError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Config directory not found at {0}. Run 'timax init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write state file: {0}")]
    StateWrite(String),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {field} '{value}': must be a number")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid input ({0})")]
    Validation(FieldErrors),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        fields: FieldErrors,
    },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Could not reach the backend: {0}")]
    Transport(String),

    #[error("Unexpected response from the backend: {0}")]
    Decode(String),

    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Settlement '{0}' not found in the journal")]
    SettlementNotFound(String),

    #[error("Settlement {id} stopped at {step}: {reason}. Run 'timax resume {id}' to retry.")]
    SettlementIncomplete {
        id: String,
        step: String,
        reason: String,
    },

    #[error("Settlement {id}: {created} exists on the backend but could not be journalled ({reason}). Record it by hand before resuming or abandoning.")]
    SettlementUnjournalled {
        id: String,
        created: String,
        reason: String,
    },

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),
}

impl ShopError {
    /// Whether a failed backend call may be issued again.
    ///
    /// Authorization failures are final; local errors never reached the backend.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::Rejected { .. }
                | ShopError::Server { .. }
                | ShopError::Transport(_)
                | ShopError::Decode(_)
        )
    }

    /// Field errors carried by this error, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ShopError::Validation(fields) => Some(fields),
            ShopError::Rejected { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
