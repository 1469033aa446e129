//! Error types for the theme engine

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a theme could not be fetched from the hosting service
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("theme request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("theme `{0}` not found")]
    NotFound(String),

    /// A 5xx (or any other unexpected status), or a body that is not a valid
    /// theme. `status` is `None` for malformed bodies.
    #[error("theme service error{}: {message}", status_suffix(.status))]
    Server { status: Option<u16>, message: String },

    #[error("network error: {0}")]
    Network(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout(_) => FetchErrorKind::Timeout,
            Self::NotFound(_) => FetchErrorKind::NotFound,
            Self::Server { .. } => FetchErrorKind::Server,
            Self::Network(_) => FetchErrorKind::Network,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }
}

/// Discriminant of [`FetchError`], handy for matching in logs and tests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Timeout,
    NotFound,
    Server,
    Network,
}

/// A descriptor field that failed validation
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid theme field `{field}`: {message}")]
pub struct DescriptorError {
    pub field: String,
    pub message: String,
}

impl DescriptorError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A view failed to render under the active theme
#[derive(Clone, Debug, Error)]
#[error("render failed: {message}")]
pub struct RenderError {
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap the error that made the view fail
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "view panicked".to_string()
        };
        Self::new(message)
    }
}

// Sources compare by identity
impl PartialEq for RenderError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && match (&self.source, &other.source) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl Eq for RenderError {}

/// Engine configuration could not be read or written
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
