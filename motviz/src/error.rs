use thiserror::Error;

use crate::kinematics::KinematicsError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Structural defect in the motion file. Fatal for the whole conversion.
    #[error("malformed motion file: {0}")]
    MalformedMotionFile(String),

    /// One or more must-resolve model coordinates had no matching motion
    /// column, alias included.
    #[error("unresolved model coordinate(s): {}", .0.join(", "))]
    CoordinateMismatch(Vec<String>),

    /// The kinematics backend failed; `frame` is the zero-based index of
    /// the motion row being converted.
    #[error("kinematics failure at frame {frame}: {source}")]
    Kinematics {
        frame: usize,
        source: KinematicsError,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure was caused by the caller's input files, as
    /// opposed to an internal one. Delivery wrappers use this to pick
    /// between a client-facing error (bad upload, wrong coordinate set)
    /// and a generic server error.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Error::MalformedMotionFile(_) | Error::CoordinateMismatch(_)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mismatch_message_names_coordinates() {
        let err = Error::CoordinateMismatch(vec![
            "knee_angle_r_beta".into(),
            "knee_angle_l_beta".into(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("knee_angle_r_beta"));
        assert!(msg.contains("knee_angle_l_beta"));
        assert!(err.is_client_fault());
    }

    #[test]
    fn kinematics_failures_are_not_client_fault() {
        let err = Error::Kinematics {
            frame: 3,
            source: KinematicsError("singular pose".into()),
        };
        assert!(!err.is_client_fault());
        assert!(err.to_string().contains("frame 3"));
    }
}
