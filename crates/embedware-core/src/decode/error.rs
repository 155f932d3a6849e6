//! Decoder error type.

use std::fmt::Display;

use thiserror::Error;

/// Errors raised while materializing a configuration bag.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The plugin's default configuration could not be snapshotted as a map.
    #[error("configuration defaults are not representable as a map: {0}")]
    Defaults(String),

    /// The bag does not fit the configuration type.
    #[error("{}", render(.path, .message))]
    Mismatch {
        /// Dotted path of the offending field, empty at the root.
        path: String,
        /// What went wrong at that path.
        message: String,
    },
}

impl DecodeError {
    /// Returns `true` when the decoder could not even be set up.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::Defaults(_))
    }

    /// Path of the offending field, if the error is tied to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Mismatch { path, .. } if !path.is_empty() => Some(path),
            _ => None,
        }
    }

    /// Prefixes the error path with `segment` (a field name or `[index]`).
    pub(crate) fn within(self, segment: &str) -> Self {
        match self {
            Self::Mismatch { path, message } => {
                let path = if path.is_empty() {
                    segment.to_string()
                } else if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                Self::Mismatch { path, message }
            }
            other => other,
        }
    }
}

impl serde::de::Error for DecodeError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Mismatch {
            path: String::new(),
            message: msg.to_string(),
        }
    }
}

fn render(path: &str, message: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("'{path}': {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn test_paths_compose() {
        let err = DecodeError::custom("bad")
            .within("burst")
            .within("[2]")
            .within("limits");
        assert_eq!(err.path(), Some("limits[2].burst"));
        assert_eq!(err.to_string(), "'limits[2].burst': bad");
    }

    #[test]
    fn test_root_error_has_no_path() {
        let err = DecodeError::custom("bad");
        assert_eq!(err.path(), None);
        assert_eq!(err.to_string(), "bad");
    }
}
