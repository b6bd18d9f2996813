//! Error types for the acquisition cycle

use std::io;
use thiserror::Error;

/// Errors that end the cycle loop
#[derive(Error, Debug)]
pub enum CycleError {
    /// The socket failed out from under us
    #[error("socket receive failed: {0}")]
    Socket(#[from] io::Error),

    /// Asked to record before the calibration window filled
    #[error("uncalibrated sensor: calibration window is not filled")]
    Uncalibrated,
}

/// Errors local to one frame; the cycle is skipped, the loop keeps going
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProcessError {
    #[error("bad frame length: expected {expected} taxels, got {actual}")]
    BadLength { expected: usize, actual: usize },
}

impl CycleError {
    /// True for the hard-stop raised when recording starts too early,
    /// as opposed to transport failures that propagate to the process.
    pub fn is_precondition(&self) -> bool {
        matches!(self, CycleError::Uncalibrated)
    }
}
