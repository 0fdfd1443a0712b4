use crate::point_set::ScalarKind;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("missing required field(s): {}", .0.join(", "))]
    MissingField(Vec<String>),

    #[error("input contains no points")]
    EmptyInput,

    #[error("output already exists: {} (use --force to overwrite)", .0.display())]
    OutputExists(PathBuf),

    #[error("field '{name}' has {found} values, but the point set has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("cannot store a {found} value in a {expected} column")]
    KindMismatch {
        expected: ScalarKind,
        found: ScalarKind,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_every_field() {
        let err = Error::MissingField(vec!["y".into(), "z".into()]);
        assert_eq!(err.to_string(), "missing required field(s): y, z");
    }

    #[test]
    fn output_exists_mentions_force() {
        let err = Error::OutputExists(PathBuf::from("out/scene_local.ply"));
        let msg = err.to_string();
        assert!(msg.contains("out/scene_local.ply"));
        assert!(msg.contains("--force"));
    }

    #[test]
    fn io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
