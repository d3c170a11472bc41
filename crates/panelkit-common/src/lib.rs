//! # Panelkit Common
//!
//! Common utilities, error types, and logging configuration for the
//! Panelkit optimistic panel engine.
//!
//! ## Features
//!
//! - Unified error type with source chains
//! - Logging configuration and setup
//! - Result and Option extension traits

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for Panelkit.
#[derive(Error, Debug)]
pub enum PanelKitError {
    /// Panel DOM errors (missing nodes, bad attributes).
    #[error("DOM error: {message}")]
    Dom {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// State machine errors.
    #[error("Machine error: {message}")]
    Machine {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Animation coordination errors (ghost, FLIP, effects).
    #[error("Animation error: {message}")]
    Animation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        backtrace: Option<backtrace::Backtrace>,
    },
}

impl PanelKitError {
    /// Create a DOM error.
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
            source: None,
        }
    }

    /// Create a DOM error with source.
    pub fn dom_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Dom {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a machine error.
    pub fn machine(message: impl Into<String>) -> Self {
        Self::Machine {
            message: message.into(),
            source: None,
        }
    }

    /// Create an animation error.
    pub fn animation(message: impl Into<String>) -> Self {
        Self::Animation {
            message: message.into(),
            source: None,
        }
    }

    /// Create an animation error with source.
    pub fn animation_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Animation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with backtrace.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }

    /// Check if this error is a documented degradation: the visual
    /// effect it belongs to is skipped but the lifecycle proceeds.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            PanelKitError::Animation { .. } | PanelKitError::NotFound(_)
        )
    }

    /// Get the error category for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            PanelKitError::Dom { .. } => "dom",
            PanelKitError::Machine { .. } => "machine",
            PanelKitError::Animation { .. } => "animation",
            PanelKitError::Config { .. } => "config",
            PanelKitError::NotFound(_) => "not_found",
            PanelKitError::InvalidArgument(_) => "invalid_argument",
            PanelKitError::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for Panelkit operations.
pub type Result<T> = std::result::Result<T, PanelKitError>;

/// Extension trait for Result.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| PanelKitError::Internal {
            message: format!("{}: {}", message.into(), e),
            backtrace: Some(backtrace::Backtrace::new()),
        })
    }
}

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a NotFound error.
    fn ok_or_missing(self, resource: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, resource: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| PanelKitError::NotFound(resource.into()))
    }
}
