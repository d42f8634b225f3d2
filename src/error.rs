//! Error types for dockerbox.

use std::fmt;
use thiserror::Error;

/// Which kind of reference could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    BeforeHook,
    AfterHook,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::BeforeHook => write!(f, "before hook"),
            ReferenceKind::AfterHook => write!(f, "after hook"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DockerboxError {
    #[error("{origin}: {path}: {message}")]
    ConfigValidation {
        origin: String,
        path: String,
        message: String,
    },

    #[error(
        "{entity} '{name}' field '{field}': conflicting values {first} ({first_origin}) and {second} ({second_origin})"
    )]
    UnificationConflict {
        entity: &'static str,
        name: String,
        field: &'static str,
        first: String,
        first_origin: String,
        second: String,
        second_origin: String,
    },

    #[error("circular hook reference detected: {applet}")]
    Cycle { applet: String },

    #[error("{kind} '{name}' referenced by applet '{referrer}' not found")]
    MissingReference {
        kind: ReferenceKind,
        name: String,
        referrer: String,
    },

    #[error("applet '{0}' not found")]
    AppletNotFound(String),

    #[error("command `{command}` failed with exit code {code}")]
    CommandExecution { command: String, code: i32 },

    #[error("registry error: {0}")]
    Registry(String),

    #[error("failed to fetch {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DockerboxError {
    /// Build a validation error for a field path inside a fragment.
    pub fn validation(
        origin: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DockerboxError::ConfigValidation {
            origin: origin.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Exit code a failing process should mirror, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            DockerboxError::CommandExecution { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DockerboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_display() {
        let err = DockerboxError::Cycle {
            applet: "web".to_string(),
        };
        assert_eq!(err.to_string(), "circular hook reference detected: web");
    }

    #[test]
    fn missing_reference_display_names_kind() {
        let err = DockerboxError::MissingReference {
            kind: ReferenceKind::AfterHook,
            name: "cleanup".to_string(),
            referrer: "web".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "after hook 'cleanup' referenced by applet 'web' not found"
        );
    }

    #[test]
    fn conflict_display_names_both_values() {
        let err = DockerboxError::UnificationConflict {
            entity: "applet",
            name: "web".to_string(),
            field: "image",
            first: "\"nginx\"".to_string(),
            first_origin: "a.dbx.yaml".to_string(),
            second: "\"httpd\"".to_string(),
            second_origin: "b.dbx.yaml".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("field 'image'"));
        assert!(msg.contains("\"nginx\" (a.dbx.yaml)"));
        assert!(msg.contains("\"httpd\" (b.dbx.yaml)"));
    }

    #[test]
    fn only_command_failures_carry_exit_code() {
        let err = DockerboxError::CommandExecution {
            command: "docker run x".to_string(),
            code: 3,
        };
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(DockerboxError::AppletNotFound("x".into()).exit_code(), None);
    }
}
